use crate::core::discovery::discover_artifacts;
use crate::core::engine::EngineInvoker;
use crate::core::metadata;
use crate::core::packager::{OutputPackager, SliceResponse};
use crate::core::profiles::ProfileResolver;
use crate::core::workspace::{WorkspaceManager, WorkspaceStats};
use crate::domain::model::{SliceMetadata, SlicingRequest};
use crate::domain::ports::{ProcessRunner, ProfileCatalogue, ServiceConfig};
use crate::utils::error::{Result, SliceError};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceStage {
    Validating,
    ResolvingProfiles,
    PreparingWorkspace,
    Invoking,
    DiscoveringOutputs,
    ExtractingMetadata,
    Packaging,
    Done,
    Failed,
}

impl fmt::Display for SliceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SliceStage::Validating => "validating",
            SliceStage::ResolvingProfiles => "resolving profiles",
            SliceStage::PreparingWorkspace => "preparing workspace",
            SliceStage::Invoking => "invoking engine",
            SliceStage::DiscoveringOutputs => "discovering outputs",
            SliceStage::ExtractingMetadata => "extracting metadata",
            SliceStage::Packaging => "packaging",
            SliceStage::Done => "done",
            SliceStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Runs one slicing request end to end. Holds no per-request state, so a
/// single instance can serve concurrent requests.
#[derive(Clone)]
pub struct SlicingOrchestrator {
    resolver: ProfileResolver,
    workspaces: WorkspaceManager,
    invoker: EngineInvoker,
    packager: OutputPackager,
    output_extension: String,
}

impl SlicingOrchestrator {
    pub fn new(
        resolver: ProfileResolver,
        workspaces: WorkspaceManager,
        invoker: EngineInvoker,
        packager: OutputPackager,
        output_extension: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            workspaces,
            invoker,
            packager,
            output_extension: output_extension.into(),
        }
    }

    pub fn from_config<C: ServiceConfig + ?Sized>(
        config: &C,
        catalogue: Arc<dyn ProfileCatalogue>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self::new(
            ProfileResolver::new(catalogue),
            WorkspaceManager::new(config.temp_root()),
            EngineInvoker::new(config.engine_path().map(|p| p.to_path_buf()), runner),
            OutputPackager::new(config.archive_name()),
            config.output_extension(),
        )
    }

    pub fn workspace_stats(&self) -> Arc<WorkspaceStats> {
        self.workspaces.stats()
    }

    pub async fn slice(&self, request: SlicingRequest) -> Result<SliceResponse> {
        let started = Instant::now();
        let mut stage = SliceStage::Validating;

        match self.run(&request, &mut stage).await {
            Ok(response) => {
                tracing::info!(
                    "✅ Sliced into {} in {:?}",
                    response.file_name(),
                    started.elapsed()
                );
                Ok(response)
            }
            Err(e) => {
                // 工作目錄已隨 Workspace drop 釋放
                tracing::error!(
                    "❌ Slicing failed while {}: {} (Category: {:?})",
                    stage,
                    e,
                    e.category()
                );
                if let Some(diagnostics) = e.diagnostics() {
                    tracing::error!("Engine diagnostics:\n{}", diagnostics);
                }
                advance(&mut stage, SliceStage::Failed);
                Err(e)
            }
        }
    }

    async fn run(&self, request: &SlicingRequest, stage: &mut SliceStage) -> Result<SliceResponse> {
        let (model, bed_type) = request.validate()?;
        self.invoker.ensure_configured()?;

        advance(stage, SliceStage::ResolvingProfiles);
        self.resolver.check(&request.profiles).await?;

        advance(stage, SliceStage::PreparingWorkspace);
        let workspace = self.workspaces.acquire()?;
        let model_path = workspace.input_dir().join(
            model
                .file_name()
                .ok_or_else(|| SliceError::validation("Model file name is invalid"))?,
        );
        tokio::fs::write(&model_path, &model.bytes).await?;
        let profiles = self.resolver.resolve_all(&request.profiles, &workspace).await?;

        advance(stage, SliceStage::Invoking);
        self.invoker
            .invoke(&model_path, &profiles, workspace.output_dir(), &bed_type)
            .await?;

        advance(stage, SliceStage::DiscoveringOutputs);
        let output = discover_artifacts(workspace.output_dir(), &self.output_extension)?;
        tracing::info!("🔍 Engine produced {} toolpath file(s)", output.len());
        if output.is_empty() {
            return Err(SliceError::NoOutputProduced);
        }

        advance(stage, SliceStage::ExtractingMetadata);
        let totals = extract_all(&output.artifacts)?;

        advance(stage, SliceStage::Packaging);
        let response = self.packager.package(workspace, &output, totals)?;

        advance(stage, SliceStage::Done);
        Ok(response)
    }
}

fn advance(stage: &mut SliceStage, next: SliceStage) {
    tracing::debug!("Stage {} -> {}", stage, next);
    *stage = next;
}

fn extract_all(artifacts: &[PathBuf]) -> Result<SliceMetadata> {
    let per_artifact = artifacts
        .iter()
        .map(|path| metadata::extract(path))
        .collect::<Result<Vec<_>>>()?;
    Ok(metadata::aggregate(&per_artifact))
}
