pub mod bump;
pub mod clippy;
pub mod manifest;
pub mod registry;

pub use bump::{bump_manifest, BumpOptions, BumpOutcome, VersionSpec};
pub use manifest::{Bin, CargoManifest, Dependencies, DependencySpec, Package, Workspace, WorkspacePackage};
pub use registry::{CargoRegistry, CargoSettings};
