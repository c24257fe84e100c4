use clap::Parser;
use std::error::Error;
use vigil_mcp::{Cli, init_tracing, run};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();
    run(cli).await
}
