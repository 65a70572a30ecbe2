// Adapters layer: concrete implementations of the domain ports.

pub mod catalogue;
pub mod process;

pub use catalogue::FsProfileCatalogue;
pub use process::SystemProcessRunner;
