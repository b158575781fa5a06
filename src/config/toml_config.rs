use crate::adapters::nominatim::{DEFAULT_BASE_URL, DEFAULT_REVERSE_ZOOM, DEFAULT_USER_AGENT};
use crate::core::geo::DEFAULT_AVERAGE_SPEED_KMH;
use crate::core::submission::DEFAULT_REFERENCE_PREFIX;
use crate::domain::model::GeoPoint;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{QuoteError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub geocoding: GeocodingConfig,
    pub routing: RoutingConfig,
    pub device: DeviceConfig,
    pub submission: SubmissionConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub reverse_zoom: u8,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: 10,
            reverse_zoom: DEFAULT_REVERSE_ZOOM,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub average_speed_kmh: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timeout_seconds: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    pub simulated_delay_ms: u64,
    pub reference_prefix: String,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            simulated_delay_ms: 2000,
            reference_prefix: DEFAULT_REFERENCE_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub state_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: "./.courier-quote".to_string(),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(QuoteError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 載入配置；檔案不存在時使用預設值
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| QuoteError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${NOMINATIM_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| QuoteError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_url("geocoding.base_url", &self.geocoding.base_url)?;
        validate_non_empty_string("geocoding.user_agent", &self.geocoding.user_agent).map_err(
            |_| QuoteError::MissingConfigError {
                field: "geocoding.user_agent".to_string(),
            },
        )?;
        validate_positive_number("geocoding.timeout_seconds", self.geocoding.timeout_seconds, 1)?;

        if self.geocoding.reverse_zoom > 18 {
            return Err(QuoteError::InvalidConfigValueError {
                field: "geocoding.reverse_zoom".to_string(),
                value: self.geocoding.reverse_zoom.to_string(),
                reason: "Zoom must be between 0 and 18".to_string(),
            });
        }

        let speed = self.routing.average_speed_kmh;
        if !(speed.is_finite() && speed > 0.0) {
            return Err(QuoteError::InvalidConfigValueError {
                field: "routing.average_speed_kmh".to_string(),
                value: speed.to_string(),
                reason: "Average speed must be a positive number".to_string(),
            });
        }

        // 經緯度必須成對設定
        match (self.device.latitude, self.device.longitude) {
            (Some(lat), Some(lng)) => {
                GeoPoint::new(lat, lng).map_err(|e| QuoteError::InvalidConfigValueError {
                    field: "device".to_string(),
                    value: format!("{}, {}", lat, lng),
                    reason: e.to_string(),
                })?;
            }
            (None, None) => {}
            (Some(_), None) => {
                return Err(QuoteError::MissingConfigError {
                    field: "device.longitude".to_string(),
                })
            }
            (None, Some(_)) => {
                return Err(QuoteError::MissingConfigError {
                    field: "device.latitude".to_string(),
                })
            }
        }
        validate_positive_number("device.timeout_seconds", self.device.timeout_seconds, 1)?;

        if self.submission.reference_prefix.trim().is_empty() {
            return Err(QuoteError::MissingConfigError {
                field: "submission.reference_prefix".to_string(),
            });
        }

        validate_path("storage.state_dir", &self.storage.state_dir)?;

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn geocoder_base_url(&self) -> &str {
        &self.geocoding.base_url
    }

    fn geocoder_user_agent(&self) -> &str {
        &self.geocoding.user_agent
    }

    fn geocoder_timeout(&self) -> Duration {
        Duration::from_secs(self.geocoding.timeout_seconds)
    }

    fn reverse_zoom(&self) -> u8 {
        self.geocoding.reverse_zoom
    }

    fn average_speed_kmh(&self) -> f64 {
        self.routing.average_speed_kmh
    }

    fn device_position(&self) -> Option<GeoPoint> {
        match (self.device.latitude, self.device.longitude) {
            (Some(lat), Some(lng)) => GeoPoint::new(lat, lng).ok(),
            _ => None,
        }
    }

    fn device_timeout(&self) -> Duration {
        Duration::from_secs(self.device.timeout_seconds)
    }

    fn submission_delay(&self) -> Duration {
        Duration::from_millis(self.submission.simulated_delay_ms)
    }

    fn reference_prefix(&self) -> &str {
        &self.submission.reference_prefix
    }

    fn state_dir(&self) -> &str {
        &self.storage.state_dir
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
