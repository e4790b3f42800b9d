use thiserror::Error;

mod app_config;
mod config;
pub mod page;
pub mod password;
pub mod platform;
pub mod window;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use page::{Page, PageRequest};
pub use platform::Platform;
pub use window::{DateWindow, WindowPreset};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
