use crate::error::{PciError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Layout constants
// ---------------------------------------------------------------------------

pub const JENKINS_DIR: &str = "jenkins";
pub const JJB_CONFIG_FILE: &str = "jenkins/config.ini";
pub const JOBS_DIR: &str = "jenkins/jobs";
pub const VIEW_TEMPLATE_FILE: &str = "jenkins/view-template.xml";

pub const CI_CONFIG_FILE: &str = "ci.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Resolve the Platform-CI checkout that holds the Jenkins configuration.
///
/// Every entry point calls this first: a missing or non-directory home is
/// fatal before any external tool is run.
pub fn resolve_home(explicit: Option<&Path>) -> Result<PathBuf> {
    let home = explicit.ok_or(PciError::HomeNotSet)?;
    if !home.is_dir() {
        return Err(PciError::HomeNotDirectory(home.to_path_buf()));
    }
    Ok(home.to_path_buf())
}

pub fn jjb_config_path(home: &Path) -> PathBuf {
    home.join(JJB_CONFIG_FILE)
}

pub fn jobs_dir(home: &Path) -> PathBuf {
    home.join(JOBS_DIR)
}

pub fn view_template_path(home: &Path) -> PathBuf {
    home.join(VIEW_TEMPLATE_FILE)
}

/// `ci.yaml` control file of a component cloned under `workspace/<component>`.
pub fn ci_config_path(workspace: &Path, component: &str) -> PathBuf {
    workspace.join(component).join(CI_CONFIG_FILE)
}

pub fn brew_log_path(logdir: &Path, target: &str) -> PathBuf {
    logdir.join(format!("build-{target}.log"))
}

pub fn committer_mapping_path(task_id: &str) -> PathBuf {
    std::env::temp_dir().join(format!("platform-ci-{task_id}.mapping"))
}

// ---------------------------------------------------------------------------
// Component validation
// ---------------------------------------------------------------------------

static COMPONENT_RE: OnceLock<Regex> = OnceLock::new();

fn component_re() -> &'static Regex {
    COMPONENT_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._+-]*$").unwrap())
}

/// Component names end up in job names, URLs and paths; only package-name
/// characters are accepted.
pub fn validate_component(component: &str) -> Result<()> {
    if component.is_empty() || component.len() > 128 || !component_re().is_match(component) {
        return Err(PciError::InvalidComponent(component.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
