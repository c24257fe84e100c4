use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "vigil-mcp",
    version,
    about = "MCP server exposing a remote uptime-monitoring service as agent tools"
)]
pub struct Cli {
    /// Base URL of the remote monitoring service
    #[arg(long)]
    pub url: Option<String>,

    /// Username for password authentication
    #[arg(long)]
    pub username: Option<String>,

    /// Password for password authentication
    #[arg(long)]
    pub password: Option<String>,

    /// Bearer token; takes precedence over username/password
    #[arg(long)]
    pub token: Option<String>,

    /// dotenv file to load before reading the environment
    #[arg(long)]
    pub env_file: Option<PathBuf>,
}
