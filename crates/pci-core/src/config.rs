use serde::Serialize;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Environment variable names
// ---------------------------------------------------------------------------

pub const ENV_HOME: &str = "PLATFORM_CI_HOME";
pub const ENV_PROJECT: &str = "PLATFORM_CI_PROJECT";
pub const ENV_ADMINS: &str = "PLATFORM_CI_ADMINS";
pub const ENV_BUG_DESTINATION: &str = "PLATFORM_CI_BUG_DESTINATION";
pub const ENV_DIST_GIT_URL: &str = "BOP_DIST_GIT_URL";
pub const ENV_STAGING_BRANCH_DOC: &str = "BOP_STAGING_BRANCH_DOC";
pub const ENV_JENKINS_CLI: &str = "BOP_JENKINS_CLI";
pub const ENV_JENKINS_URL: &str = "JENKINS_URL";
pub const ENV_JOB_NAME: &str = "JOB_NAME";
pub const ENV_BUILD_NUMBER: &str = "BUILD_NUMBER";
pub const ENV_BUILD_URL: &str = "BUILD_URL";

// ---------------------------------------------------------------------------
// PlatformCiConfig
// ---------------------------------------------------------------------------

/// Settings of a Platform-CI instance.
///
/// Everything is optional: Jenkins exposes these as global environment
/// variables and an unset value only degrades the produced job definitions
/// or messages (plain text instead of a link, for example). Operations that
/// cannot work without a value report it themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformCiConfig {
    pub project_url: Option<String>,
    pub distgit_url: Option<String>,
    pub jenkins_url: Option<String>,
    pub staging_branch_doc_url: Option<String>,
    pub admins: Option<String>,
    pub bug_destination: Option<String>,
    pub jenkins_cli: Option<String>,
    pub job_name: Option<String>,
    pub build_number: Option<String>,
    pub build_url: Option<String>,
}

impl PlatformCiConfig {
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build a config from `(name, value)` pairs. Empty values count as unset.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.is_empty())
            .collect();
        let mut take = |name: &str| vars.remove(name);

        Self {
            project_url: take(ENV_PROJECT),
            distgit_url: take(ENV_DIST_GIT_URL),
            jenkins_url: take(ENV_JENKINS_URL),
            staging_branch_doc_url: take(ENV_STAGING_BRANCH_DOC),
            admins: take(ENV_ADMINS),
            bug_destination: take(ENV_BUG_DESTINATION),
            jenkins_cli: take(ENV_JENKINS_CLI),
            job_name: take(ENV_JOB_NAME),
            build_number: take(ENV_BUILD_NUMBER),
            build_url: take(ENV_BUILD_URL),
        }
    }

    /// Link to the console log of the running Jenkins build, or `unknown`.
    pub fn debug_log_url(&self) -> String {
        match &self.build_url {
            Some(url) => format!("{url}/console"),
            None => "unknown".to_string(),
        }
    }

    /// `<a>` to the project page when configured, plain text otherwise.
    pub fn project_link(&self) -> String {
        html_link(self.project_url.as_deref(), "Platform CI Project")
    }

    pub fn staging_branch_doc_link(&self) -> String {
        html_link(self.staging_branch_doc_url.as_deref(), "staging branch")
    }
}

pub(crate) fn html_link(url: Option<&str>, label: &str) -> String {
    match url {
        Some(url) => format!("<a href=\"{url}\">{label}</a>"),
        None => label.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
