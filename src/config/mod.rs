pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;

/// Default settings file, looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "webexlogo_settings.toml";

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "webexlogo")]
#[command(about = "Embed a logo or text in the virtual background of a video device")]
pub struct CliConfig {
    /// DOMAIN | EMAIL | URL | FILE_NAME | clear | user1/2/3 [FILE_NAME/URL] | text MESSAGE | help
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,

    #[arg(short, long, default_value = DEFAULT_SETTINGS_FILE, help = "Path to the TOML settings file")]
    pub config: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 將所有位置參數以單一空白串接
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}
