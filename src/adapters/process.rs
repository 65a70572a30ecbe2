use crate::core::{ProcessCommand, ProcessOutput, ProcessRunner};
use crate::utils::error::{Result, SliceError};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Spawns real OS processes. With a timeout set, a process that runs past it
/// is killed.
#[derive(Debug, Clone, Default)]
pub struct SystemProcessRunner {
    timeout: Option<Duration>,
}

impl SystemProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn run(&self, command: &ProcessCommand) -> Result<ProcessOutput> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|source| SliceError::EngineNotRunnable {
            path: command.program.clone(),
            source,
        })?;
        tracing::debug!("Spawned {} (pid {:?})", command.program.display(), child.id());

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output?,
                Err(_) => {
                    // 逾時：future 被丟棄時 kill_on_drop 會結束子行程
                    tracing::warn!(
                        "⏱️ {} exceeded {:?}, killing it",
                        command.program.display(),
                        limit
                    );
                    return Err(SliceError::EngineTimeout {
                        seconds: limit.as_secs(),
                    });
                }
            },
            None => child.wait_with_output().await?,
        };

        Ok(ProcessOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
