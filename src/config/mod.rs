#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::ServiceConfig;
use crate::utils::error::{Result, SliceError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_OUTPUT_EXTENSION: &str = "gcode";
pub const DEFAULT_ARCHIVE_NAME: &str = "result.zip";
pub const DEFAULT_DATA_PATH: &str = "./data";

/// Resolved service settings, from the environment or a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceSettings {
    pub engine_path: Option<PathBuf>,
    pub data_path: PathBuf,
    pub temp_dir: Option<PathBuf>,
    pub timeout_seconds: Option<u64>,
    pub output_extension: String,
    pub archive_name: String,
}

impl Default for SliceSettings {
    fn default() -> Self {
        Self {
            engine_path: None,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            temp_dir: None,
            timeout_seconds: None,
            output_extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
        }
    }
}

impl SliceSettings {
    /// `ORCASLICER_PATH`, `DATA_PATH`, `SLICE_TEMP_DIR`, `SLICE_TIMEOUT_SECONDS`.
    pub fn from_env() -> Result<Self> {
        let timeout_seconds = match env::var("SLICE_TIMEOUT_SECONDS") {
            Ok(raw) if !raw.trim().is_empty() => Some(raw.trim().parse::<u64>().map_err(|e| {
                SliceError::InvalidConfigValueError {
                    field: "SLICE_TIMEOUT_SECONDS".to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?),
            _ => None,
        };

        Ok(Self {
            engine_path: non_empty_var("ORCASLICER_PATH").map(PathBuf::from),
            data_path: non_empty_var("DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
            temp_dir: non_empty_var("SLICE_TEMP_DIR").map(PathBuf::from),
            timeout_seconds,
            ..Self::default()
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ServiceConfig for SliceSettings {
    fn engine_path(&self) -> Option<&Path> {
        self.engine_path.as_deref()
    }

    fn data_path(&self) -> &Path {
        &self.data_path
    }

    fn temp_root(&self) -> Option<&Path> {
        self.temp_dir.as_deref()
    }

    fn engine_timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    fn output_extension(&self) -> &str {
        &self.output_extension
    }

    fn archive_name(&self) -> &str {
        &self.archive_name
    }
}

impl Validate for SliceSettings {
    fn validate(&self) -> Result<()> {
        // 引擎路徑未設定不在這裡報錯，由每個請求回報設定錯誤
        if let Some(engine) = &self.engine_path {
            validation::validate_path("engine.path", &engine.to_string_lossy())?;
        }
        validation::validate_path("storage.data_path", &self.data_path.to_string_lossy())?;
        if let Some(temp) = &self.temp_dir {
            validation::validate_path("storage.temp_dir", &temp.to_string_lossy())?;
        }
        if let Some(timeout) = self.timeout_seconds {
            validation::validate_positive_number("engine.timeout_seconds", timeout, 1)?;
        }
        validation::validate_non_empty_string("engine.output_extension", &self.output_extension)?;
        validation::validate_non_empty_string("output.archive_name", &self.archive_name)?;
        let plain_name = Path::new(&self.archive_name)
            .file_name()
            .and_then(|n| n.to_str())
            == Some(self.archive_name.as_str());
        if !plain_name {
            return Err(SliceError::InvalidConfigValueError {
                field: "output.archive_name".to_string(),
                value: self.archive_name.clone(),
                reason: "Archive name must be a plain file name".to_string(),
            });
        }
        Ok(())
    }
}
