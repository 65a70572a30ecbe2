use crate::domain::model::{BedType, EngineInvocation, ProfilePaths};
use crate::domain::ports::{ProcessCommand, ProcessRunner};
use crate::utils::error::{Result, SliceError};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Drives the external slicing engine with its fixed command line.
#[derive(Clone)]
pub struct EngineInvoker {
    executable: Option<PathBuf>,
    runner: Arc<dyn ProcessRunner>,
}

impl EngineInvoker {
    pub fn new(executable: Option<PathBuf>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { executable, runner }
    }

    /// Fails with a configuration error when no engine path is set.
    pub fn ensure_configured(&self) -> Result<&Path> {
        match self.executable.as_deref() {
            Some(path) if !path.as_os_str().is_empty() => Ok(path),
            _ => Err(SliceError::MissingConfigError {
                field: "ORCASLICER_PATH".to_string(),
            }),
        }
    }

    pub fn build_args(
        model: &Path,
        profiles: &ProfilePaths,
        output_dir: &Path,
        bed_type: &BedType,
    ) -> Vec<String> {
        let settings = format!(
            "{};{}",
            profiles.printer.display(),
            profiles.preset.display()
        );

        vec![
            "--arrange".to_string(),
            "1".to_string(),
            "--orient".to_string(),
            "1".to_string(),
            "--slice".to_string(),
            "1".to_string(),
            "--allow-newer-file".to_string(),
            "--load-settings".to_string(),
            settings,
            "--load-filaments".to_string(),
            profiles.filament.display().to_string(),
            "--outputdir".to_string(),
            output_dir.display().to_string(),
            "--curr-bed-type".to_string(),
            bed_type.as_str().to_string(),
            model.display().to_string(),
        ]
    }

    /// Runs the engine once and waits for it. A non-zero exit becomes
    /// `EngineFailed` carrying the captured output.
    pub async fn invoke(
        &self,
        model: &Path,
        profiles: &ProfilePaths,
        output_dir: &Path,
        bed_type: &BedType,
    ) -> Result<EngineInvocation> {
        let executable = self.ensure_configured()?.to_path_buf();
        let command = ProcessCommand {
            program: executable.clone(),
            args: Self::build_args(model, profiles, output_dir, bed_type),
            working_dir: output_dir.parent().map(Path::to_path_buf),
        };

        tracing::info!("⚙️ Running slicing engine {}", executable.display());
        tracing::debug!("Engine arguments: {:?}", command.args);

        let output = self.runner.run(&command).await?;
        let invocation = EngineInvocation {
            executable,
            args: command.args,
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        };

        if !invocation.succeeded() {
            tracing::error!(
                "❌ Slicing engine exited with {:?}; stderr: {}",
                invocation.status,
                invocation.stderr.trim()
            );
            return Err(SliceError::EngineFailed {
                status: invocation.status,
                diagnostics: diagnostics_text(&invocation),
            });
        }

        tracing::debug!("Engine stdout: {}", invocation.stdout.trim());
        Ok(invocation)
    }
}

fn diagnostics_text(invocation: &EngineInvocation) -> String {
    let mut text = String::new();
    if !invocation.stderr.trim().is_empty() {
        text.push_str(invocation.stderr.trim());
    }
    if !invocation.stdout.trim().is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(invocation.stdout.trim());
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ProcessOutput;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingRunner {
        output: ProcessOutput,
        calls: Mutex<Vec<ProcessCommand>>,
    }

    impl RecordingRunner {
        fn new(status: i32, stderr: &str) -> Self {
            Self {
                output: ProcessOutput {
                    status: Some(status),
                    stdout: String::new(),
                    stderr: stderr.to_string(),
                },
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ProcessRunner for RecordingRunner {
        async fn run(&self, command: &ProcessCommand) -> Result<ProcessOutput> {
            self.calls.lock().unwrap().push(command.clone());
            Ok(self.output.clone())
        }
    }

    fn profiles() -> ProfilePaths {
        ProfilePaths {
            printer: PathBuf::from("/data/printers/x1c.json"),
            preset: PathBuf::from("/data/presets/fine.json"),
            filament: PathBuf::from("/data/filaments/pla.json"),
        }
    }

    #[test]
    fn test_build_args_shape() {
        let args = EngineInvoker::build_args(
            Path::new("/ws/input/Cube.3mf"),
            &profiles(),
            Path::new("/ws/output"),
            &BedType::new("textured").unwrap(),
        );

        assert_eq!(
            args,
            vec![
                "--arrange",
                "1",
                "--orient",
                "1",
                "--slice",
                "1",
                "--allow-newer-file",
                "--load-settings",
                "/data/printers/x1c.json;/data/presets/fine.json",
                "--load-filaments",
                "/data/filaments/pla.json",
                "--outputdir",
                "/ws/output",
                "--curr-bed-type",
                "textured",
                "/ws/input/Cube.3mf",
            ]
        );
    }

    #[tokio::test]
    async fn test_invoke_without_executable_is_config_error() {
        let runner = Arc::new(RecordingRunner::new(0, ""));
        let invoker = EngineInvoker::new(None, runner.clone());

        let err = invoker
            .invoke(
                Path::new("/ws/input/Cube.3mf"),
                &profiles(),
                Path::new("/ws/output"),
                &BedType::new("textured").unwrap(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SliceError::MissingConfigError { .. }));
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invoke_non_zero_exit_keeps_diagnostics() {
        let runner = Arc::new(RecordingRunner::new(255, "Invalid printer profile"));
        let invoker = EngineInvoker::new(Some(PathBuf::from("/opt/orca")), runner.clone());

        let err = invoker
            .invoke(
                Path::new("/ws/input/Cube.3mf"),
                &profiles(),
                Path::new("/ws/output"),
                &BedType::new("textured").unwrap(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SliceError::EngineFailed { status: Some(255), .. }));
        assert_eq!(err.diagnostics(), Some("Invalid printer profile"));
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let runner = Arc::new(RecordingRunner::new(0, ""));
        let invoker = EngineInvoker::new(Some(PathBuf::from("/opt/orca")), runner.clone());

        let invocation = invoker
            .invoke(
                Path::new("/ws/input/Cube.3mf"),
                &profiles(),
                Path::new("/ws/output"),
                &BedType::new("textured").unwrap(),
            )
            .await
            .unwrap();

        assert!(invocation.succeeded());
        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].program, PathBuf::from("/opt/orca"));
        assert_eq!(calls[0].working_dir, Some(PathBuf::from("/ws")));
    }
}
