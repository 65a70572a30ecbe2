use crate::core::{ProfileCatalogue, ProfileCategory};
use crate::utils::error::{Result, SliceError};
use crate::utils::validation::validate_profile_name;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Profiles stored as `<base>/<category>/<name>.json`.
#[derive(Debug, Clone)]
pub struct FsProfileCatalogue {
    base_path: PathBuf,
}

impl FsProfileCatalogue {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn category_dir(&self, category: ProfileCategory) -> PathBuf {
        self.base_path.join(category.as_str())
    }

    pub async fn read_document(
        &self,
        category: ProfileCategory,
        name: &str,
    ) -> Result<serde_json::Value> {
        let path = self.document_path(category, name).await?;
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SliceError::ProfileNotFound {
                    category: category.to_string(),
                    name: name.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&data)?)
    }
}

#[async_trait]
impl ProfileCatalogue for FsProfileCatalogue {
    async fn list_names(&self, category: ProfileCategory) -> Result<Vec<String>> {
        let dir = self.category_dir(category);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    async fn document_path(&self, category: ProfileCategory, name: &str) -> Result<PathBuf> {
        validate_profile_name(name)?;
        Ok(self.category_dir(category).join(format!("{}.json", name)))
    }
}
