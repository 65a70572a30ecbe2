use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SliceError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Profile '{name}' not found in {category}")]
    ProfileNotFound { category: String, name: String },

    #[error("Slicing engine at {} could not be started: {source}", .path.display())]
    EngineNotRunnable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // diagnostics 只留在伺服器端，不進入 Display
    #[error("Slicing engine exited with status {}", exit_label(.status))]
    EngineFailed {
        status: Option<i32>,
        diagnostics: String,
    },

    #[error("Slicing engine did not finish within {seconds}s")]
    EngineTimeout { seconds: u64 },

    #[error("Slicing engine reported success but produced no output")]
    NoOutputProduced,

    #[error("Failed to read slice metadata from {}: {reason}", .path.display())]
    MetadataParseError { path: PathBuf, reason: String },

    #[error("Workspace error: {message}: {source}")]
    WorkspaceError {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SliceError>;

fn exit_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "unknown (terminated by signal)".to_string(),
    }
}

/// Who is at fault for a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Configuration,
    Engine,
    OutputIntegrity,
    Resource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SliceError {
    pub fn validation(message: impl Into<String>) -> Self {
        SliceError::ValidationError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SliceError::ValidationError { .. } | SliceError::ProfileNotFound { .. } => {
                ErrorCategory::Validation
            }
            SliceError::ConfigError { .. }
            | SliceError::MissingConfigError { .. }
            | SliceError::InvalidConfigValueError { .. }
            | SliceError::EngineNotRunnable { .. } => ErrorCategory::Configuration,
            SliceError::EngineFailed { .. } | SliceError::EngineTimeout { .. } => {
                ErrorCategory::Engine
            }
            SliceError::NoOutputProduced | SliceError::MetadataParseError { .. } => {
                ErrorCategory::OutputIntegrity
            }
            SliceError::ZipError(_)
            | SliceError::IoError(_)
            | SliceError::SerializationError(_)
            | SliceError::WorkspaceError { .. } => ErrorCategory::Resource,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation => ErrorSeverity::Medium,
            ErrorCategory::Engine | ErrorCategory::OutputIntegrity => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Resource => ErrorSeverity::Critical,
        }
    }

    /// HTTP-style status for whichever transport sits in front of the orchestrator.
    pub fn status_code(&self) -> u16 {
        match self.category() {
            ErrorCategory::Validation => 400,
            _ => 500,
        }
    }

    /// Message safe to show the caller. Never includes engine output.
    pub fn user_friendly_message(&self) -> String {
        match self {
            SliceError::ValidationError { message } => message.clone(),
            SliceError::ProfileNotFound { category, name } => {
                format!("Profile '{}' does not exist in {}", name, category)
            }
            SliceError::ConfigError { .. }
            | SliceError::MissingConfigError { .. }
            | SliceError::InvalidConfigValueError { .. }
            | SliceError::EngineNotRunnable { .. } => {
                "Slicing is not configured properly on the server".to_string()
            }
            SliceError::EngineFailed { .. } | SliceError::EngineTimeout { .. } => {
                "Failed to slice the model".to_string()
            }
            SliceError::NoOutputProduced => "Slicing produced no output".to_string(),
            SliceError::MetadataParseError { .. } => {
                "Slicing output could not be read".to_string()
            }
            SliceError::ZipError(_)
            | SliceError::IoError(_)
            | SliceError::SerializationError(_)
            | SliceError::WorkspaceError { .. } => "Failed to prepare slicing".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Validation => {
                "Check the model file, the bed type and that every profile exists or is uploaded"
            }
            ErrorCategory::Configuration => {
                "Set ORCASLICER_PATH (or [engine].path) to an executable slicing engine"
            }
            ErrorCategory::Engine => {
                "Inspect the server logs for the engine diagnostics; the profiles may not match the model"
            }
            ErrorCategory::OutputIntegrity => {
                "Check that the engine version writes toolpaths with a summary block"
            }
            ErrorCategory::Resource => "Check free disk space and permissions of the temp directory",
        }
    }

    /// Captured engine output for server-side logs.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            SliceError::EngineFailed { diagnostics, .. } => Some(diagnostics.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_failure_hides_diagnostics() {
        let err = SliceError::EngineFailed {
            status: Some(3),
            diagnostics: "segfault in arrange: /secret/path".to_string(),
        };

        assert_eq!(err.category(), ErrorCategory::Engine);
        assert_eq!(err.status_code(), 500);
        assert!(!err.to_string().contains("secret"));
        assert!(!err.user_friendly_message().contains("secret"));
        assert_eq!(err.diagnostics(), Some("segfault in arrange: /secret/path"));
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            SliceError::validation("bad").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            SliceError::ProfileNotFound {
                category: "printers".to_string(),
                name: "ghost".to_string()
            }
            .status_code(),
            400
        );
        assert_eq!(
            SliceError::MissingConfigError {
                field: "engine.path".to_string()
            }
            .category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            SliceError::NoOutputProduced.category(),
            ErrorCategory::OutputIntegrity
        );
        assert_eq!(
            SliceError::EngineTimeout { seconds: 5 }.severity(),
            ErrorSeverity::High
        );
    }
}
