pub mod config;
pub mod error;
pub mod traits;
pub mod types;
pub mod workflow;

pub use config::AppConfig;
pub use error::{Result, VireoError};
pub use types::*;
pub use workflow::{Component, Connection, WorkflowDefinition};
