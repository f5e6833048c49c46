use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Malformed pnpm lockfile: {reason}")]
    MalformedLockfile { reason: String },

    #[error("Package {package} has no usable resolution: {reason}")]
    MissingResolution { package: String, reason: String },

    #[error("{dependent} depends on {name}@{reference}, which is not in the lockfile")]
    DanglingDependency {
        dependent: String,
        name: String,
        reference: String,
    },

    #[error("Dependency chain deeper than {depth} levels, likely a hard dependency cycle: {chain}")]
    CyclicHardDependency { chain: String, depth: usize },
}

impl ConvertError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        ConvertError::MalformedLockfile {
            reason: reason.into(),
        }
    }
}
