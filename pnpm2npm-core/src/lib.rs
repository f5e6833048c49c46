pub mod convert;
pub mod error;
pub mod graph;
pub mod integrity;
pub mod location;
pub mod lockfile;
pub mod npm;
pub mod registry;

pub use convert::{Conversion, ConvertOptions, ConvertWarning, ImporterManifest, convert};
pub use error::ConvertError;
pub use graph::{LockGraph, PackageId};
pub use npm::NpmLockfile;
pub use registry::Registry;

pub type Result<T> = std::result::Result<T, ConvertError>;
