use crate::utils::error::{Result, SliceError};
use crate::utils::validation::{validate_model_file, validate_profile_name};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileCategory {
    Printers,
    Presets,
    Filaments,
}

impl ProfileCategory {
    pub const ALL: [ProfileCategory; 3] = [
        ProfileCategory::Printers,
        ProfileCategory::Presets,
        ProfileCategory::Filaments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileCategory::Printers => "printers",
            ProfileCategory::Presets => "presets",
            ProfileCategory::Filaments => "filaments",
        }
    }

    /// File name used when an uploaded document is written into a workspace.
    pub fn inline_file_name(&self) -> &'static str {
        match self {
            ProfileCategory::Printers => "printer.json",
            ProfileCategory::Presets => "preset.json",
            ProfileCategory::Filaments => "filament.json",
        }
    }
}

impl fmt::Display for ProfileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileCategory {
    type Err = SliceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "printers" => Ok(ProfileCategory::Printers),
            "presets" => Ok(ProfileCategory::Presets),
            "filaments" => Ok(ProfileCategory::Filaments),
            _ => Err(SliceError::validation("Invalid or missing category")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileReference {
    Named(String),
    Inline(Vec<u8>),
}

impl ProfileReference {
    /// Builds a reference from the two optional request fields. An uploaded
    /// document always wins over a catalogue name.
    pub fn from_parts(name: Option<String>, upload: Option<Vec<u8>>) -> Option<Self> {
        match (upload, name) {
            (Some(bytes), _) => Some(ProfileReference::Inline(bytes)),
            (None, Some(name)) if !name.trim().is_empty() => Some(ProfileReference::Named(name)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileSelection {
    pub printer: Option<ProfileReference>,
    pub preset: Option<ProfileReference>,
    pub filament: Option<ProfileReference>,
}

impl ProfileSelection {
    pub fn get(&self, category: ProfileCategory) -> Option<&ProfileReference> {
        match category {
            ProfileCategory::Printers => self.printer.as_ref(),
            ProfileCategory::Presets => self.preset.as_ref(),
            ProfileCategory::Filaments => self.filament.as_ref(),
        }
    }

    pub fn require(&self, category: ProfileCategory) -> Result<&ProfileReference> {
        self.get(category)
            .ok_or_else(|| SliceError::validation("Invalid or missing slicing settings"))
    }
}

#[derive(Debug, Clone)]
pub struct ModelFile {
    pub bytes: Vec<u8>,
    pub original_name: String,
    pub media_type: String,
}

impl ModelFile {
    pub fn new(
        bytes: Vec<u8>,
        original_name: impl Into<String>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            original_name: original_name.into(),
            media_type: media_type.into(),
        }
    }

    /// The original name stripped of any directory components.
    pub fn file_name(&self) -> Option<&str> {
        Path::new(&self.original_name)
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.starts_with('.'))
    }
}

/// Engine-recognised print surface, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedType(String);

impl BedType {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() || value.chars().any(|c| c.is_control()) {
            return Err(SliceError::validation("Invalid or missing slicing settings"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct SlicingRequest {
    pub model: Option<ModelFile>,
    pub profiles: ProfileSelection,
    pub bed_type: String,
}

impl SlicingRequest {
    /// Request-shape checks that need neither the catalogue nor a workspace.
    pub fn validate(&self) -> Result<(&ModelFile, BedType)> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| SliceError::validation("File is required for slicing"))?;

        if model.bytes.is_empty() {
            return Err(SliceError::validation("Uploaded model file is empty"));
        }
        let file_name = model
            .file_name()
            .ok_or_else(|| SliceError::validation("Model file name is invalid"))?;
        validate_model_file(file_name, &model.media_type)?;

        for category in ProfileCategory::ALL {
            if let ProfileReference::Named(name) = self.profiles.require(category)? {
                validate_profile_name(name)?;
            }
        }

        let bed_type = BedType::new(self.bed_type.clone())?;
        Ok((model, bed_type))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePaths {
    pub printer: PathBuf,
    pub preset: PathBuf,
    pub filament: PathBuf,
}

#[derive(Debug, Clone)]
pub struct EngineInvocation {
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl EngineInvocation {
    pub fn succeeded(&self) -> bool {
        self.status == Some(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceOutput {
    pub artifacts: Vec<PathBuf>,
}

impl SliceOutput {
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SliceMetadata {
    pub print_time_seconds: u64,
    pub filament_used_grams: f64,
    pub filament_used_millimeters: f64,
}

impl Add for SliceMetadata {
    type Output = SliceMetadata;

    fn add(self, other: SliceMetadata) -> SliceMetadata {
        SliceMetadata {
            print_time_seconds: self
                .print_time_seconds
                .saturating_add(other.print_time_seconds),
            filament_used_grams: self.filament_used_grams + other.filament_used_grams,
            filament_used_millimeters: self.filament_used_millimeters
                + other.filament_used_millimeters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SlicingRequest {
        SlicingRequest {
            model: Some(ModelFile::new(b"solid".to_vec(), "Cube.3mf", "model/3mf")),
            profiles: ProfileSelection {
                printer: Some(ProfileReference::Named("bambu".to_string())),
                preset: Some(ProfileReference::Named("fine".to_string())),
                filament: Some(ProfileReference::Inline(b"{}".to_vec())),
            },
            bed_type: "textured".to_string(),
        }
    }

    #[test]
    fn test_inline_wins_over_name() {
        let reference =
            ProfileReference::from_parts(Some("stored".to_string()), Some(b"{}".to_vec()));
        assert_eq!(reference, Some(ProfileReference::Inline(b"{}".to_vec())));

        let reference = ProfileReference::from_parts(Some("stored".to_string()), None);
        assert_eq!(reference, Some(ProfileReference::Named("stored".to_string())));

        assert_eq!(ProfileReference::from_parts(Some("  ".to_string()), None), None);
        assert_eq!(ProfileReference::from_parts(None, None), None);
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!(
            "filaments".parse::<ProfileCategory>().unwrap(),
            ProfileCategory::Filaments
        );
        assert!("invalid".parse::<ProfileCategory>().is_err());
        assert_eq!(ProfileCategory::Presets.inline_file_name(), "preset.json");
    }

    #[test]
    fn test_request_validation() {
        let valid = request();
        let (model, bed) = valid.validate().unwrap();
        assert_eq!(model.file_name(), Some("Cube.3mf"));
        assert_eq!(bed.as_str(), "textured");

        let mut missing_model = request();
        missing_model.model = None;
        assert!(missing_model.validate().is_err());

        let mut missing_profile = request();
        missing_profile.profiles.preset = None;
        assert!(missing_profile.validate().is_err());

        let mut bad_name = request();
        bad_name.profiles.printer = Some(ProfileReference::Named("../../etc".to_string()));
        assert!(bad_name.validate().is_err());

        let mut no_bed = request();
        no_bed.bed_type = String::new();
        assert!(no_bed.validate().is_err());
    }

    #[test]
    fn test_model_file_name_strips_directories() {
        let model = ModelFile::new(vec![1], "../../tmp/Cube.3mf", "model/3mf");
        assert_eq!(model.file_name(), Some("Cube.3mf"));
    }
}
