use crate::core::placement::DEFAULT_MIN_FONT_SIZE;
use crate::core::text::{parse_color, Color};
use crate::domain::model::{BackgroundSlot, Rectangle};
use crate::utils::error::{LogoError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LOGO_SERVICE_URL: &str = "https://logo.clearbit.com/www.{domain}";
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 20;

/// Keys every settings file must carry under `[settings]`.
const REQUIRED_KEYS: &[&str] = &[
    "endpoint_address",
    "background_file",
    "cache_folder",
    "xapi_token",
    "background_slot",
    "ignored_domains",
    "logo_start",
    "logo_end",
    "scale_logo",
    "font_size",
    "font_color",
    "font_file",
];

const SETTINGS_TEMPLATE: &str = r#"# Settings for webexlogo
[settings]
# IP address or host name of your video unit (has to be accessible by this computer)
endpoint_address = "_VIDEO_UNIT_IP_ADDRESS_"
# Base image of your virtual background
background_file = "_BACKGROUND_IMAGE_FILENAME_"
# Folder where downloaded images are cached. Empty: current folder
cache_folder = ""
# Token to access your video endpoint (base64 of user:password). ${ENV_VAR} is expanded
xapi_token = "_YOUR_VIDEO_TOKEN_"
# Slot name for your virtual background: User1, User2 or User3
background_slot = "User3"
# When checking active call participants, ignore users from these domains.
# You want your CUSTOMER logo, not yours.
ignored_domains = []
# START and END coordinates of the area where logo and text are placed (XxY)
logo_start = "_LOGO_START_XxY_"
logo_end = "_LOGO_END_XxY_"
# Scale your logo to fit the area?
scale_logo = true
# The max font size when embedding text
font_size = 36
# Font color for embedded text (name or #hex)
font_color = "yellow"
# Font file used for embedded text (empty = Arial or a system font)
font_file = ""
"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub settings: SettingsSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsSection {
    pub endpoint_address: String,
    pub background_file: String,
    pub cache_folder: String,
    pub xapi_token: String,
    pub background_slot: String,
    pub ignored_domains: Vec<String>,
    pub logo_start: String,
    pub logo_end: String,
    pub scale_logo: bool,
    pub font_size: u32,
    pub font_color: String,
    pub font_file: String,
    pub min_font_size: Option<u32>,
    pub logo_service_url: Option<String>,
    pub request_timeout_seconds: Option<u64>,
}

/// Validated, immutable settings handed to every operation.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub endpoint_address: String,
    pub background_file: PathBuf,
    pub cache_folder: PathBuf,
    pub xapi_token: String,
    pub background_slot: BackgroundSlot,
    pub ignored_domains: Vec<String>,
    pub logo_area: Rectangle,
    pub scale_logo: bool,
    pub font_size: u32,
    pub min_font_size: u32,
    pub font_color: Color,
    pub font_file: Option<PathBuf>,
    pub logo_service_url: String,
    pub request_timeout: Duration,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            LogoError::config(format!(
                "reading settings file '{}' failed: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// 設定檔不存在時寫出範本並要求使用者先完成設定
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            Self::write_template(path)?;
            return Err(LogoError::SettingsTemplateCreated {
                path: path.display().to_string(),
            });
        }
        Self::from_file(path)
    }

    pub fn write_template(path: &Path) -> Result<()> {
        std::fs::write(path, SETTINGS_TEMPLATE).map_err(|e| {
            LogoError::config(format!(
                "creating settings file '{}' failed: {}",
                path.display(),
                e
            ))
        })
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        let table: toml::Table = toml::from_str(&processed_content).map_err(|e| {
            LogoError::config(format!("TOML parsing error: {}", e))
        })?;

        let settings = table
            .get("settings")
            .and_then(|v| v.as_table())
            .ok_or_else(|| LogoError::MissingConfigError {
                field: "[settings]".to_string(),
            })?;

        for key in REQUIRED_KEYS {
            match settings.get(*key) {
                None => {
                    return Err(LogoError::MissingConfigError {
                        field: key.to_string(),
                    })
                }
                Some(toml::Value::String(value)) => {
                    validation::validate_not_placeholder(key, value)?
                }
                Some(_) => {}
            }
        }

        toml::Value::Table(table)
            .try_into::<TomlConfig>()
            .map_err(|e: toml::de::Error| {
                LogoError::config(format!("invalid settings: {}", e.message()))
            })
    }

    /// 替換環境變數 (例如 ${XAPI_TOKEN})
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static pattern"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    /// 驗證後轉成執行期使用的設定
    pub fn into_app_settings(self) -> Result<AppSettings> {
        self.validate()?;
        let s = self.settings;

        let cache_folder = s.cache_folder.trim().trim_end_matches(['/', '\\']);
        let cache_folder = if cache_folder.is_empty() { "." } else { cache_folder };

        let font_file = s.font_file.trim();

        Ok(AppSettings {
            endpoint_address: s.endpoint_address.trim().to_string(),
            background_file: PathBuf::from(s.background_file.trim()),
            cache_folder: PathBuf::from(cache_folder),
            xapi_token: s.xapi_token.trim().to_string(),
            background_slot: s.background_slot.parse()?,
            ignored_domains: s
                .ignored_domains
                .iter()
                .map(|d| d.trim().to_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
            logo_area: Rectangle::from_corners(&s.logo_start, &s.logo_end)?,
            scale_logo: s.scale_logo,
            font_size: s.font_size,
            min_font_size: s.min_font_size.unwrap_or(DEFAULT_MIN_FONT_SIZE),
            font_color: parse_color(&s.font_color)?,
            font_file: (!font_file.is_empty()).then(|| PathBuf::from(font_file)),
            logo_service_url: s
                .logo_service_url
                .unwrap_or_else(|| DEFAULT_LOGO_SERVICE_URL.to_string()),
            request_timeout: Duration::from_secs(
                s.request_timeout_seconds
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECONDS),
            ),
        })
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        let s = &self.settings;
        validation::validate_non_empty_string("endpoint_address", &s.endpoint_address)?;
        validation::validate_non_empty_string("xapi_token", &s.xapi_token)?;
        validation::validate_path("background_file", s.background_file.trim())?;
        validation::validate_file_extension(
            "background_file",
            s.background_file.trim(),
            crate::core::command::IMAGE_EXTENSIONS,
        )?;
        validation::validate_range("font_size", s.font_size, 1, 1000)?;
        if let Some(min) = s.min_font_size {
            validation::validate_range("min_font_size", min, 1, 1000)?;
        }
        if let Some(timeout) = s.request_timeout_seconds {
            validation::validate_range("request_timeout_seconds", timeout, 1, 600)?;
        }
        if let Some(service) = &s.logo_service_url {
            if !service.contains("{domain}") {
                return Err(LogoError::InvalidConfigValueError {
                    field: "logo_service_url".to_string(),
                    value: service.clone(),
                    reason: "must contain the {domain} placeholder".to_string(),
                });
            }
            validation::validate_url("logo_service_url", &service.replace("{domain}", "example.com"))?;
        }
        Ok(())
    }
}
