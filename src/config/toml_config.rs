use crate::config::{SliceSettings, DEFAULT_ARCHIVE_NAME, DEFAULT_DATA_PATH, DEFAULT_OUTPUT_EXTENSION};
use crate::utils::error::{Result, SliceError};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub path: Option<String>,
    pub timeout_seconds: Option<u64>,
    #[serde(default = "default_output_extension")]
    pub output_extension: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: None,
            timeout_seconds: None,
            output_extension: default_output_extension(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_path")]
    pub data_path: String,
    pub temp_dir: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            temp_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_archive_name")]
    pub archive_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            archive_name: default_archive_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    /// `compact` (default) or `json`
    pub format: Option<String>,
}

fn default_output_extension() -> String {
    DEFAULT_OUTPUT_EXTENSION.to_string()
}

fn default_data_path() -> String {
    DEFAULT_DATA_PATH.to_string()
}

fn default_archive_name() -> String {
    DEFAULT_ARCHIVE_NAME.to_string()
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SliceError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SliceError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ORCASLICER_PATH})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SliceError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn is_json_logging(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.format.as_deref())
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    /// An engine path that is empty or still an unresolved `${VAR}` counts as unset.
    pub fn into_settings(self) -> SliceSettings {
        let engine_path = self
            .engine
            .path
            .filter(|p| !p.trim().is_empty() && !p.contains("${"))
            .map(PathBuf::from);

        SliceSettings {
            engine_path,
            data_path: PathBuf::from(self.storage.data_path),
            temp_dir: self
                .storage
                .temp_dir
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            timeout_seconds: self.engine.timeout_seconds,
            output_extension: self.engine.output_extension,
            archive_name: self.output.archive_name,
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(format) = self.logging.as_ref().and_then(|l| l.format.as_deref()) {
            if !["compact", "json"].contains(&format) {
                return Err(SliceError::InvalidConfigValueError {
                    field: "logging.format".to_string(),
                    value: format.to_string(),
                    reason: "Valid formats: compact, json".to_string(),
                });
            }
        }
        if let Some(path) = &self.engine.path {
            if path.trim().is_empty() {
                return Err(SliceError::InvalidConfigValueError {
                    field: "engine.path".to_string(),
                    value: path.clone(),
                    reason: "Remove the key or point it at the engine executable".to_string(),
                });
            }
        }
        self.clone().into_settings().validate()
    }
}
