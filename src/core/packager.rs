use crate::core::workspace::Workspace;
use crate::domain::model::{SliceMetadata, SliceOutput};
use crate::utils::error::{Result, SliceError};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use zip::write::{SimpleFileOptions, ZipWriter};

pub const PRINT_TIME_HEADER: &str = "X-Print-Time-Seconds";
pub const FILAMENT_GRAMS_HEADER: &str = "X-Filament-Used-G";
pub const FILAMENT_MM_HEADER: &str = "X-Filament-Used-Mm";

const TOOLPATH_CONTENT_TYPE: &str = "application/octet-stream";
const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Toolpath,
    Archive,
}

/// How a transfer ended, handed to the completion hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Completed { bytes: u64 },
    Failed,
    Abandoned,
}

type CompletionHook = Box<dyn FnOnce(TransferOutcome) + Send + 'static>;

/// A packaged slicing result. Holds the workspace until the body has been
/// delivered or the response is dropped, whichever comes first.
pub struct SliceResponse {
    kind: BodyKind,
    body_path: PathBuf,
    file_name: String,
    metadata: SliceMetadata,
    workspace: Option<Workspace>,
    on_complete: Option<CompletionHook>,
}

impl SliceResponse {
    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    pub fn is_archive(&self) -> bool {
        self.kind == BodyKind::Archive
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &'static str {
        match self.kind {
            BodyKind::Toolpath => TOOLPATH_CONTENT_TYPE,
            BodyKind::Archive => ARCHIVE_CONTENT_TYPE,
        }
    }

    pub fn metadata(&self) -> &SliceMetadata {
        &self.metadata
    }

    pub fn body_path(&self) -> &Path {
        &self.body_path
    }

    /// The three response annotations.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        metadata_headers(&self.metadata)
    }

    /// Registers a callback run once the transfer concludes, however it ends.
    pub fn on_complete<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(TransferOutcome) + Send + 'static,
    {
        self.on_complete = Some(Box::new(hook));
        self
    }

    /// Streams the body into `sink`, then releases the workspace whether or
    /// not the copy succeeded.
    pub async fn deliver<W>(mut self, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let result = self.stream_into(sink).await;
        let outcome = match &result {
            Ok(bytes) => TransferOutcome::Completed { bytes: *bytes },
            Err(_) => TransferOutcome::Failed,
        };
        self.finish(outcome);
        result
    }

    pub async fn into_bytes(self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.deliver(&mut buffer).await?;
        Ok(buffer)
    }

    async fn stream_into<W>(&mut self, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut file = tokio::fs::File::open(&self.body_path).await?;
        let bytes = tokio::io::copy(&mut file, sink).await?;
        sink.flush().await?;
        Ok(bytes)
    }

    fn finish(&mut self, outcome: TransferOutcome) {
        if let Some(workspace) = self.workspace.take() {
            tracing::debug!("📦 Transfer of {} ended: {:?}", self.file_name, outcome);
            workspace.release();
            if let Some(hook) = self.on_complete.take() {
                hook(outcome);
            }
        }
    }
}

impl Drop for SliceResponse {
    fn drop(&mut self) {
        self.finish(TransferOutcome::Abandoned);
    }
}

impl std::fmt::Debug for SliceResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SliceResponse")
            .field("kind", &self.kind)
            .field("file_name", &self.file_name)
            .field("metadata", &self.metadata)
            .finish()
    }
}

pub fn metadata_headers(metadata: &SliceMetadata) -> Vec<(&'static str, String)> {
    vec![
        (PRINT_TIME_HEADER, metadata.print_time_seconds.to_string()),
        (
            FILAMENT_GRAMS_HEADER,
            format_decimal(metadata.filament_used_grams),
        ),
        (
            FILAMENT_MM_HEADER,
            format_decimal(metadata.filament_used_millimeters),
        ),
    ]
}

/// Two decimal places at most, no trailing zeros.
pub fn format_decimal(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{}", rounded)
}

#[derive(Debug, Clone)]
pub struct OutputPackager {
    archive_name: String,
}

impl OutputPackager {
    pub fn new(archive_name: impl Into<String>) -> Self {
        Self {
            archive_name: archive_name.into(),
        }
    }

    /// Takes ownership of the workspace; it now lives as long as the response.
    pub fn package(
        &self,
        workspace: Workspace,
        output: &SliceOutput,
        metadata: SliceMetadata,
    ) -> Result<SliceResponse> {
        let (kind, body_path, file_name) = match output.artifacts.as_slice() {
            [] => return Err(SliceError::NoOutputProduced),
            [single] => {
                let file_name = base_name(single)?;
                (BodyKind::Toolpath, single.clone(), file_name)
            }
            many => {
                let archive_path = workspace.path().join(&self.archive_name);
                write_archive(&archive_path, many)?;
                (BodyKind::Archive, archive_path, self.archive_name.clone())
            }
        };

        tracing::info!(
            "📦 Packaged {} artifact(s) as {} ({:?})",
            output.len(),
            file_name,
            kind
        );

        Ok(SliceResponse {
            kind,
            body_path,
            file_name,
            metadata,
            workspace: Some(workspace),
            on_complete: None,
        })
    }
}

fn base_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| SliceError::MetadataParseError {
            path: path.to_path_buf(),
            reason: "artifact has no usable file name".to_string(),
        })
}

/// Flat archive, one entry per artifact named by its base file name.
fn write_archive(archive_path: &Path, artifacts: &[PathBuf]) -> Result<()> {
    tracing::debug!("Creating ZIP file with {} files", artifacts.len());

    let file = File::create(archive_path)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for artifact in artifacts {
        zip.start_file(base_name(artifact)?, options)?;
        let mut source = File::open(artifact)?;
        std::io::copy(&mut source, &mut zip)?;
    }

    // 完成並寫回磁碟
    let writer = zip.finish()?;
    writer
        .into_inner()
        .map_err(|e| SliceError::IoError(e.into_error()))?;
    Ok(())
}
