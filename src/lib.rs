pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::cli::LocalStorage;
pub use config::toml_config::{AppSettings, TomlConfig};
pub use crate::core::{
    engine::{LogoEngine, RunOutcome},
    xapi::XapiClient,
};
pub use utils::error::{LogoError, Result};
