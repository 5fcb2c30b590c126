//! Gate Core
//!
//! Error handling, layered configuration and logging setup shared by the
//! approval gate crates.

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{
    load_config, load_config_or_default, AppConfig, ConfigSource, InferenceConfig, LayeredConfig,
};
pub use error::{CoreError, Result};
pub use logging::init_logging;
