pub mod buildsystem;
pub mod settings;
pub mod slap;

pub use buildsystem::{detect_build_system, require_build_system, ManagedEnvironment, PythonBuildSystem};
pub use settings::{PythonConfig, PythonIndex, PythonSettings};
