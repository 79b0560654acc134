use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogoError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration entry: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Network error ({target}): {message}")]
    NetworkError { target: String, message: String },

    #[error("Video device returned an error: {message}")]
    RemoteApiError { message: String },

    #[error("Invalid input: {message}")]
    InputValidationError { message: String },

    #[error("Invalid dimension for {what}: {width}x{height}")]
    InvalidDimension {
        what: String,
        width: u32,
        height: u32,
    },

    #[error("Settings file '{path}' did not exist; a template was written")]
    SettingsTemplateCreated { path: String },

    #[error("No external participants found in the active call")]
    NoExternalParticipants,

    #[error("No active call on the video device")]
    NoActiveCall,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    RemoteDevice,
    Input,
    Participants,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LogoError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::InputValidationError {
            message: message.into(),
        }
    }

    pub fn network(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NetworkError {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::SettingsTemplateCreated { .. } => ErrorCategory::Configuration,
            Self::NetworkError { .. } | Self::HttpError(_) => ErrorCategory::Network,
            Self::RemoteApiError { .. } => ErrorCategory::RemoteDevice,
            Self::InputValidationError { .. } | Self::InvalidDimension { .. } => {
                ErrorCategory::Input
            }
            Self::NoExternalParticipants | Self::NoActiveCall => ErrorCategory::Participants,
            Self::IoError(_) | Self::ImageError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        if let Self::SettingsTemplateCreated { .. } = self {
            return ErrorSeverity::Low;
        }
        match self.category() {
            ErrorCategory::Participants => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::RemoteDevice => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 給終端使用者看的訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::NoActiveCall => "No active call".to_string(),
            Self::SettingsTemplateCreated { path } => format!(
                "settings file did not exist\n  ---> open the generated '{}' to configure this tool",
                path
            ),
            Self::NoExternalParticipants => {
                "No external users found in the call - stopping".to_string()
            }
            Self::NetworkError { target, message } => {
                format!("Connecting to {} failed. Message: {}", target, message)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the settings file; every '_PLACEHOLDER_' value must be configured"
            }
            ErrorCategory::Network => {
                "Make sure the video device is reachable from this computer"
            }
            ErrorCategory::RemoteDevice => "Check the xAPI token and the background slot name",
            ErrorCategory::Input => "Run with 'help' to see the supported arguments",
            ErrorCategory::Participants => {
                "Pass a domain, e-mail address, URL or file name explicitly"
            }
            ErrorCategory::System => "Check file permissions and the image files involved",
        }
    }

    /// 以嚴重程度決定結束碼，所有錯誤都不回傳 0
    /// Whether the terminal bell should sound for this error.
    pub fn alerts(&self) -> bool {
        !matches!(self, Self::SettingsTemplateCreated { .. })
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 4,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, LogoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_and_severity() {
        let err = LogoError::config("missing token");
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);

        let err = LogoError::network("10.0.0.5", "timed out");
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);

        assert_eq!(LogoError::NoActiveCall.severity(), ErrorSeverity::Low);
    }

    #[test]
    fn test_new_settings_template_is_a_quiet_note() {
        let err = LogoError::SettingsTemplateCreated {
            path: "webexlogo_settings.toml".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert!(!err.alerts());
        assert!(err.user_friendly_message().contains("webexlogo_settings.toml"));

        assert!(LogoError::NoActiveCall.alerts());
    }

    #[test]
    fn test_every_error_exits_non_zero() {
        let errors = vec![
            LogoError::config("x"),
            LogoError::input("x"),
            LogoError::network("x", "y"),
            LogoError::RemoteApiError {
                message: "x".to_string(),
            },
            LogoError::NoExternalParticipants,
            LogoError::IoError(std::io::Error::other("disk")),
        ];
        for err in errors {
            assert_ne!(err.exit_code(), 0, "{err} should exit non-zero");
        }
    }

    #[test]
    fn test_error_display() {
        let err = LogoError::InvalidDimension {
            what: "overlay".to_string(),
            width: 0,
            height: 10,
        };
        assert_eq!(err.to_string(), "Invalid dimension for overlay: 0x10");

        let err = LogoError::InvalidConfigValueError {
            field: "logo_start".to_string(),
            value: "abc".to_string(),
            reason: "expected XxY".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value 'abc' for 'logo_start': expected XxY"
        );
    }
}
