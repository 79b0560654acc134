use crate::config::cli::LocalStorage;
use crate::config::toml_config::AppSettings;
use crate::core::command::parse_command;
use crate::core::engine::{LogoEngine, RunOutcome};
use crate::core::xapi::XapiClient;
use crate::domain::model::Command;
use crate::utils::error::Result;

/// Runs one command line against the configured device.
///
/// `help` returns before the cache folder or the xAPI client are touched.
pub async fn run(settings: AppSettings, command_line: &str) -> Result<RunOutcome> {
    let command = parse_command(command_line)?;
    tracing::debug!("command: {:?}", command);
    if command == Command::Help {
        return Ok(RunOutcome::Help);
    }

    let storage = LocalStorage::new(settings.cache_folder.clone());
    storage.ensure_dir()?;
    tracing::debug!("image cache: {}", storage.base_path().display());

    let channel = XapiClient::new(
        &settings.endpoint_address,
        &settings.xapi_token,
        settings.request_timeout,
    )?;
    let engine = LogoEngine::new(settings, storage, channel)?;

    engine.run(command).await
}
