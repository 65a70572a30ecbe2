use crate::config::SliceSettings;
use crate::core::{ModelFile, ProfileReference, ProfileSelection, SlicingRequest};
use crate::utils::error::{Result, SliceError};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Parser)]
#[command(name = "slice-runner")]
#[command(about = "Slice 3D models with an external slicing engine")]
pub struct Cli {
    /// Path to a TOML configuration file; environment variables are used otherwise
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Slice a model and write the toolpath (or archive of toolpaths)
    Slice(SliceArgs),
    /// Inspect the stored profile catalogue
    Profiles {
        #[command(subcommand)]
        command: ProfilesCommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ProfilesCommand {
    /// List the names stored under a category
    List { category: String },
    /// Print one stored profile
    Show { category: String, name: String },
}

#[derive(Debug, Clone, Args)]
pub struct SliceArgs {
    /// Model file (.stl, .step, .stp or .3mf)
    pub model: PathBuf,

    /// Media type of the model; guessed from the extension when omitted
    #[arg(long)]
    pub media_type: Option<String>,

    /// Stored printer profile name
    #[arg(long)]
    pub printer: Option<String>,

    /// Stored process preset name
    #[arg(long)]
    pub preset: Option<String>,

    /// Stored filament profile name
    #[arg(long)]
    pub filament: Option<String>,

    /// Printer profile document; takes precedence over --printer
    #[arg(long)]
    pub printer_profile: Option<PathBuf>,

    /// Preset profile document; takes precedence over --preset
    #[arg(long)]
    pub preset_profile: Option<PathBuf>,

    /// Filament profile document; takes precedence over --filament
    #[arg(long)]
    pub filament_profile: Option<PathBuf>,

    /// Bed surface type passed to the engine
    #[arg(long)]
    pub bed_type: String,

    /// Directory the result is written to
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Also write the metadata as JSON to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Slicing engine executable
    #[arg(long, env = "ORCASLICER_PATH")]
    pub engine: Option<PathBuf>,

    /// Profile catalogue root
    #[arg(long, env = "DATA_PATH")]
    pub data_path: Option<PathBuf>,

    /// Kill the engine after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl SliceArgs {
    pub fn apply_overrides(&self, settings: &mut SliceSettings) {
        if let Some(engine) = &self.engine {
            settings.engine_path = Some(engine.clone());
        }
        if let Some(data_path) = &self.data_path {
            settings.data_path = data_path.clone();
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_seconds = Some(timeout);
        }
    }

    /// 讀取本機檔案組成請求
    pub async fn to_request(&self) -> Result<SlicingRequest> {
        let bytes = tokio::fs::read(&self.model).await?;
        let original_name = self
            .model
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SliceError::validation("Model file name is invalid"))?
            .to_string();
        let media_type = self
            .media_type
            .clone()
            .unwrap_or_else(|| guess_media_type(&self.model).to_string());

        Ok(SlicingRequest {
            model: Some(ModelFile::new(bytes, original_name, media_type)),
            profiles: ProfileSelection {
                printer: reference(&self.printer, &self.printer_profile).await?,
                preset: reference(&self.preset, &self.preset_profile).await?,
                filament: reference(&self.filament, &self.filament_profile).await?,
            },
            bed_type: self.bed_type.clone(),
        })
    }
}

async fn reference(
    name: &Option<String>,
    document: &Option<PathBuf>,
) -> Result<Option<ProfileReference>> {
    let upload = match document {
        Some(path) => Some(tokio::fs::read(path).await?),
        None => None,
    };
    Ok(ProfileReference::from_parts(name.clone(), upload))
}

pub fn guess_media_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("stl") => "model/stl",
        Some("step") | Some("stp") => "model/step",
        Some("3mf") => "model/3mf",
        _ => "application/octet-stream",
    }
}
