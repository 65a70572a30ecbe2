use crate::domain::model::SliceOutput;
use crate::utils::error::Result;
use std::path::Path;

/// Lists the toolpath files directly under `output_dir`, sorted by file name.
/// Matching is case-insensitive on the extension; directories and other
/// files are skipped.
pub fn discover_artifacts(output_dir: &Path, extension: &str) -> Result<SliceOutput> {
    let wanted = extension.trim_start_matches('.').to_ascii_lowercase();
    let mut artifacts = Vec::new();

    for entry in std::fs::read_dir(output_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase() == wanted)
            .unwrap_or(false);

        if matches {
            artifacts.push(path);
        } else {
            tracing::debug!("Skipping non-toolpath output {}", path.display());
        }
    }

    artifacts.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(SliceOutput { artifacts })
}
