use std::path::PathBuf;
use thiserror::Error;

/// Broad class of a failure, used to pick the header of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// A bug or misconfiguration of the CI itself.
    Generic,
    /// Nothing reliable was executed; users should reach the administrators.
    Contacts,
    BrewBuild,
    DistGit,
    Jenkins,
}

#[derive(Debug, Error)]
pub enum PciError {
    #[error("PLATFORM_CI_HOME is not set")]
    HomeNotSet,

    #[error("PLATFORM_CI_HOME does not reference a directory: {}", .0.display())]
    HomeNotDirectory(PathBuf),

    #[error("invalid component name '{0}'")]
    InvalidComponent(String),

    #[error("invalid jenkins-jobs mode '{0}': expected 'test' or 'update'")]
    InvalidJjbMode(String),

    #[error("{0}")]
    DistGit(String),

    #[error("{0}")]
    Jenkins(String),

    #[error("{0}")]
    Job(String),

    #[error("{0}")]
    Brew(String),

    #[error("jenkins-jobs failed: {0}")]
    Jjb(String),

    #[error("git failed: {0}")]
    Git(String),

    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid ci.yaml at {}: {message}", path.display())]
    CiConfig { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl PciError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PciError::DistGit(_) | PciError::Git(_) => ErrorClass::DistGit,
            PciError::Jenkins(_) | PciError::Jjb(_) => ErrorClass::Jenkins,
            PciError::Brew(_) => ErrorClass::BrewBuild,
            PciError::Job(_) | PciError::CiConfig { .. } => ErrorClass::Contacts,
            _ => ErrorClass::Generic,
        }
    }
}

pub type Result<T> = std::result::Result<T, PciError>;
