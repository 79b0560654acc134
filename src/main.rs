use clap::Parser;
use webex_bg_logo::app;
use webex_bg_logo::core::command::help_text;
use webex_bg_logo::utils::error::ErrorSeverity;
use webex_bg_logo::utils::{alert, logger};
use webex_bg_logo::{CliConfig, LogoError, RunOutcome, TomlConfig};

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting webexlogo");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    match run(&config).await {
        Ok(RunOutcome::Help) => {}
        Ok(RunOutcome::Switched(slot)) => {
            tracing::info!("✅ switched to {}", slot);
            alert::beep(1);
        }
        Ok(RunOutcome::Uploaded { slot, result_file }) => {
            tracing::info!("✅ background uploaded to {}", slot);
            tracing::info!("📁 copy saved to: {}", result_file.display());
            alert::beep(1);
        }
        Err(e) => report_failure(e),
    }
}

async fn run(config: &CliConfig) -> Result<RunOutcome, LogoError> {
    let settings = TomlConfig::load_or_create(&config.config)?.into_app_settings()?;
    let slot = settings.background_slot;

    let outcome = app::run(settings, &config.command_line()).await?;
    if outcome == RunOutcome::Help {
        println!("{}", help_text(slot));
    }
    Ok(outcome)
}

fn report_failure(e: LogoError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ webexlogo failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    match e.severity() {
        ErrorSeverity::Low => println!("\n*NOTE* {}\n", e.user_friendly_message()),
        _ => println!("\n**ERROR** {}\n", e.user_friendly_message()),
    }
    println!("💡 {}", e.recovery_suggestion());

    if e.alerts() {
        alert::beep(3);
    }
    std::process::exit(e.exit_code());
}
