//! The `ci.yaml` control file.
//!
//! Developers commit a `ci.yaml` into a dist-git branch to ask for that
//! branch to be built on every push, similar to how Travis CI works:
//!
//! ```yaml
//! auto-build:
//!   targets:
//!     - rhel-7.3-candidate
//! ```

use crate::error::{PciError, Result};
use crate::paths;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitCiConfig {
    #[serde(rename = "auto-build")]
    pub auto_build: AutoBuild,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AutoBuild {
    pub targets: Vec<String>,
}

impl CommitCiConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::parse(&data).map_err(|e| PciError::CiConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn parse(data: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(data)
    }

    pub fn targets(&self) -> &[String] {
        &self.auto_build.targets
    }
}

/// Path of the component's `ci.yaml`, if the checked-out branch has one.
pub fn find_ci_config(workspace: &Path, component: &str) -> Option<PathBuf> {
    let path = paths::ci_config_path(workspace, component);
    path.is_file().then_some(path)
}

/// The `--config=` argument handed to the Build-on-Push decision: empty when
/// the branch has no `ci.yaml`.
pub fn config_argument(workspace: &Path, component: &str) -> String {
    match find_ci_config(workspace, component) {
        Some(_) => format!("--config={component}/{}", paths::CI_CONFIG_FILE),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
