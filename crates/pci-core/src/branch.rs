//! Dist-git branch naming.
//!
//! Everything here works on branch *names* only: no clone of, or access to,
//! dist-git is needed to classify a branch or derive its Brew target.

use crate::error::{PciError, Result};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

const REMOTE_PREFIX: &str = "origin/";

// Standard: rhel-7.3, extras-rhel-7.2, rhscl-2.1-rh-ruby22-rhel-7
const STANDARD_PATTERN: &str = r"(?P<base>(?:extras-|rhscl-\d\.\d-rh-\w+?-)?rhel-\d(?:\.\d)?)";

// Staging: rhel-7.3-staging, extras-rhel-7.2-staging
const STAGING_PATTERN: &str = r"(?P<base>(?:extras-|rhscl-\d\.\d-rh-\w+?-)?rhel-\d(?:\.\d)?-staging)";

static STANDARD_RE: OnceLock<Regex> = OnceLock::new();
static STAGING_RE: OnceLock<Regex> = OnceLock::new();
static PRIVATE_STAGING_RE: OnceLock<Regex> = OnceLock::new();

fn standard_re() -> &'static Regex {
    STANDARD_RE.get_or_init(|| Regex::new(&format!("^{STANDARD_PATTERN}$")).unwrap())
}

fn staging_re() -> &'static Regex {
    STAGING_RE.get_or_init(|| Regex::new(&format!("^{STAGING_PATTERN}$")).unwrap())
}

// Only private staging branches may carry a suffix after `-staging`.
fn private_staging_re() -> &'static Regex {
    PRIVATE_STAGING_RE
        .get_or_init(|| Regex::new(&format!(r"^private-[\w-]*?{STAGING_PATTERN}")).unwrap())
}

/// Strip the `origin/` remote prefix Jenkins puts in front of `GIT_BRANCH`.
pub fn short_branch_name(git_branch: &str) -> &str {
    git_branch.strip_prefix(REMOTE_PREFIX).unwrap_or(git_branch)
}

// ---------------------------------------------------------------------------
// BranchType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchType {
    Standard,
    Staging,
    PrivateStaging,
    Private,
}

impl BranchType {
    pub fn as_str(self) -> &'static str {
        match self {
            BranchType::Standard => "standard",
            BranchType::Staging => "staging",
            BranchType::PrivateStaging => "private staging",
            BranchType::Private => "private",
        }
    }
}

impl fmt::Display for BranchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DistGitBranch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistGitBranch {
    pub name: String,
}

impl DistGitBranch {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn staging_base(&self) -> Option<&str> {
        staging_re()
            .captures(&self.name)
            .or_else(|| private_staging_re().captures(&self.name))
            .and_then(|c| c.name("base"))
            .map(|m| m.as_str())
    }

    fn standard_base(&self) -> Option<&str> {
        standard_re()
            .captures(&self.name)
            .and_then(|c| c.name("base"))
            .map(|m| m.as_str())
    }

    pub fn is_staging(&self) -> bool {
        self.staging_base().is_some()
    }

    pub fn is_standard(&self) -> bool {
        self.standard_base().is_some()
    }

    pub fn branch_type(&self) -> BranchType {
        if self.is_staging() {
            if self.name.starts_with("private-") {
                BranchType::PrivateStaging
            } else {
                BranchType::Staging
            }
        } else if self.is_standard() {
            BranchType::Standard
        } else {
            BranchType::Private
        }
    }

    /// Brew target associated with the branch name.
    ///
    /// `rhel-7.3-staging` and `private-jdoe-rhel-7.3-staging-bz1` map to
    /// `rhel-7.3-candidate`, the standard `rhel-7.3` maps to the same target.
    ///
    /// A major-only branch such as `rhel-6-staging` maps to `rhel-6-candidate`,
    /// which is not necessarily the latest RHEL 6 target.
    pub fn staging_target(&self) -> Result<String> {
        if let Some(base) = self.staging_base() {
            return Ok(base.replace("staging", "candidate"));
        }
        if let Some(base) = self.standard_base() {
            return Ok(format!("{base}-candidate"));
        }
        Err(PciError::DistGit(format!(
            "{} is not a staging or standard branch",
            self.name
        )))
    }
}

impl fmt::Display for DistGitBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
