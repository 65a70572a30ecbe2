use crate::core::workspace::Workspace;
use crate::domain::model::{ProfileCategory, ProfilePaths, ProfileReference, ProfileSelection};
use crate::domain::ports::ProfileCatalogue;
use crate::utils::error::{Result, SliceError};
use std::path::PathBuf;
use std::sync::Arc;

/// Turns a request's profile selection into files the engine can load.
#[derive(Clone)]
pub struct ProfileResolver {
    catalogue: Arc<dyn ProfileCatalogue>,
}

impl ProfileResolver {
    pub fn new(catalogue: Arc<dyn ProfileCatalogue>) -> Self {
        Self { catalogue }
    }

    /// Confirms every named reference exists in the catalogue and every inline
    /// document is a JSON object. Touches no workspace.
    pub async fn check(&self, selection: &ProfileSelection) -> Result<()> {
        for category in ProfileCategory::ALL {
            match selection.require(category)? {
                ProfileReference::Named(name) => {
                    let names = self.catalogue.list_names(category).await?;
                    if !names.iter().any(|n| n == name) {
                        return Err(SliceError::ProfileNotFound {
                            category: category.to_string(),
                            name: name.clone(),
                        });
                    }
                }
                ProfileReference::Inline(bytes) => check_inline_document(category, bytes)?,
            }
        }
        Ok(())
    }

    pub async fn resolve(
        &self,
        category: ProfileCategory,
        reference: &ProfileReference,
        workspace: &Workspace,
    ) -> Result<PathBuf> {
        match reference {
            ProfileReference::Named(name) => {
                let path = self.catalogue.document_path(category, name).await?;
                tracing::debug!("Using stored {} profile '{}'", category, name);
                Ok(path)
            }
            ProfileReference::Inline(bytes) => {
                let path = workspace.input_dir().join(category.inline_file_name());
                tokio::fs::write(&path, bytes).await?;
                tracing::debug!(
                    "Wrote uploaded {} profile ({} bytes) to {}",
                    category,
                    bytes.len(),
                    path.display()
                );
                Ok(path)
            }
        }
    }

    pub async fn resolve_all(
        &self,
        selection: &ProfileSelection,
        workspace: &Workspace,
    ) -> Result<ProfilePaths> {
        Ok(ProfilePaths {
            printer: self
                .resolve(
                    ProfileCategory::Printers,
                    selection.require(ProfileCategory::Printers)?,
                    workspace,
                )
                .await?,
            preset: self
                .resolve(
                    ProfileCategory::Presets,
                    selection.require(ProfileCategory::Presets)?,
                    workspace,
                )
                .await?,
            filament: self
                .resolve(
                    ProfileCategory::Filaments,
                    selection.require(ProfileCategory::Filaments)?,
                    workspace,
                )
                .await?,
        })
    }
}

fn check_inline_document(category: ProfileCategory, bytes: &[u8]) -> Result<()> {
    match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(serde_json::Value::Object(_)) => Ok(()),
        _ => Err(SliceError::validation(format!(
            "Uploaded {} profile is not a valid JSON document",
            category
        ))),
    }
}
