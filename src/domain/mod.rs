pub mod monitor;
pub mod project;
pub mod validate;

pub use monitor::{Monitor, MonitorConfig, MonitorSummary, MonitorType};
pub use project::{apply_create_defaults, project};
pub use validate::{ValidationError, validate};
