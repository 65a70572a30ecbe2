pub mod discovery;
pub mod engine;
pub mod metadata;
pub mod orchestrator;
pub mod packager;
pub mod profiles;
pub mod workspace;

pub use crate::domain::model::{
    BedType, EngineInvocation, ModelFile, ProfileCategory, ProfilePaths, ProfileReference,
    ProfileSelection, SliceMetadata, SliceOutput, SlicingRequest,
};
pub use crate::domain::ports::{
    ProcessCommand, ProcessOutput, ProcessRunner, ProfileCatalogue, ServiceConfig,
};
pub use crate::utils::error::Result;
