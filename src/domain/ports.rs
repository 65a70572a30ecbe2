use crate::domain::model::ProfileCategory;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Read-only view of the stored profiles.
#[async_trait]
pub trait ProfileCatalogue: Send + Sync {
    async fn list_names(&self, category: ProfileCategory) -> Result<Vec<String>>;
    async fn document_path(&self, category: ProfileCategory, name: &str) -> Result<PathBuf>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs an external program to completion, stdin closed, output captured.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, command: &ProcessCommand) -> Result<ProcessOutput>;
}

pub trait ServiceConfig: Send + Sync {
    fn engine_path(&self) -> Option<&Path>;
    fn data_path(&self) -> &Path;
    fn temp_root(&self) -> Option<&Path>;
    fn engine_timeout(&self) -> Option<Duration>;
    fn output_extension(&self) -> &str;
    fn archive_name(&self) -> &str;
}
