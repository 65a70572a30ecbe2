use crate::utils::error::{Result, SliceError};
use std::collections::HashSet;
use std::path::Path;

pub const ALLOWED_MODEL_EXTENSIONS: &[&str] = &["stl", "step", "stp", "3mf"];
pub const ALLOWED_MODEL_MEDIA_TYPES: &[&str] =
    &["model/stl", "application/step", "model/step", "model/3mf"];

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(SliceError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(SliceError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(SliceError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SliceError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Profile names are stored as `<name>.json`, so only letters and digits are accepted.
pub fn validate_profile_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SliceError::validation("Name cannot be empty"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(SliceError::validation(
            "Name must only contain letters and numbers",
        ));
    }
    Ok(())
}

/// 檢查模型檔名的副檔名與宣告的 media type
pub fn validate_model_file(file_name: &str, media_type: &str) -> Result<()> {
    let allowed_set: HashSet<&str> = ALLOWED_MODEL_EXTENSIONS.iter().copied().collect();

    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    let extension_ok = extension
        .as_deref()
        .map(|ext| allowed_set.contains(ext))
        .unwrap_or(false);

    if !extension_ok || !ALLOWED_MODEL_MEDIA_TYPES.contains(&media_type) {
        return Err(SliceError::validation(
            "Invalid file type. Only STL, STEP, and 3MF files are allowed.",
        ));
    }

    Ok(())
}
