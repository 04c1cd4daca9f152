//! Build-on-Push, the "CI for component" functionality.
//!
//! Enabling a CI functionality for a component means a certain set of Jenkins
//! jobs must exist and be enabled. For Build-on-Push that is one dispatcher
//! job per component, which reacts to every push to the component's dist-git
//! repository, plus one worker job per dist-git branch that should be built.
//!
//! A branch is built when it is a (private) staging branch, or when it
//! carries a `ci.yaml` control file listing Brew targets.

use crate::branch::DistGitBranch;
use crate::ci_config::CommitCiConfig;
use crate::commit::DistGitCommit;
use crate::error::Result;
use crate::jenkins::Jenkins;
use crate::jobs::{JenkinsJob, JobBuildOnCommit, JobCommitDispatcher};
use serde::Serialize;
use std::path::Path;

pub const BREW_TARGETS_PARAM: &str = "BREW_TARGETS";

/// Where worker jobs fetch Platform-CI itself from: a GitHub user or
/// organisation and a branch of its repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformCiSource {
    pub user: String,
    pub branch: String,
}

impl PlatformCiSource {
    pub fn new(user: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            branch: branch.into(),
        }
    }

    pub fn from_user(user: impl Into<String>) -> Self {
        Self::new(user, "master")
    }
}

// ---------------------------------------------------------------------------
// CommitCi
// ---------------------------------------------------------------------------

pub struct CommitCi<'a, J: ?Sized> {
    jenkins: &'a J,
    component: String,
}

impl<'a, J: Jenkins + ?Sized> CommitCi<'a, J> {
    pub fn new(jenkins: &'a J, component: impl Into<String>) -> Self {
        Self {
            jenkins,
            component: component.into(),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    /// Create the job, or refresh it from the current templates and enable
    /// it when it already exists.
    fn enable_job(&self, job: &dyn JenkinsJob) -> Result<()> {
        if self.jenkins.job_exists(job)? {
            self.jenkins.update_job(job)?;
            self.jenkins.enable_job(job)
        } else {
            self.jenkins.create_job(job)
        }
    }

    fn disable_job(&self, job: &dyn JenkinsJob) -> Result<()> {
        if self.jenkins.job_exists(job)? {
            self.jenkins.disable_job(job)?;
        }
        Ok(())
    }

    fn delete_job(&self, job: &dyn JenkinsJob) -> Result<()> {
        if self.jenkins.job_exists(job)? {
            self.jenkins.delete_job(job)?;
        }
        Ok(())
    }

    /// Turn Build-on-Push on: ensure the component's dispatcher job.
    pub fn enable(&self, slave: &str, source: &PlatformCiSource) -> Result<()> {
        tracing::info!(component = %self.component, "enabling Build-on-Push");
        let dispatcher = JobCommitDispatcher::with_source(&self.component, slave, source.clone());
        self.enable_job(&dispatcher)
    }

    pub fn disable(&self) -> Result<()> {
        tracing::info!(component = %self.component, "disabling Build-on-Push");
        self.disable_job(&JobCommitDispatcher::new(&self.component))
    }

    /// Delete the dispatcher job. Worker jobs keep their build history.
    pub fn remove(&self) -> Result<()> {
        tracing::info!(component = %self.component, "removing Build-on-Push dispatcher");
        self.delete_job(&JobCommitDispatcher::new(&self.component))
    }

    /// Ensure the branch's worker job and trigger it for `targets`.
    pub fn run_on_targets(
        &self,
        branch: &str,
        targets: &[String],
        slave: &str,
        source: &PlatformCiSource,
    ) -> Result<()> {
        let worker = JobBuildOnCommit::new(&self.component, branch, slave, source.clone());
        self.enable_job(&worker)?;
        self.jenkins
            .trigger_job(&worker, &[(BREW_TARGETS_PARAM, targets.join(" "))])
    }

    /// Build a staging branch: its own staging target always, plus whatever
    /// the branch's `ci.yaml` lists.
    pub fn run_on_staging(
        &self,
        branch: &DistGitBranch,
        slave: &str,
        source: &PlatformCiSource,
        config_file: Option<&Path>,
    ) -> Result<Vec<String>> {
        let mut targets = match config_file {
            Some(path) => {
                tracing::info!("config file is present in the branch: {}", path.display());
                let targets = CommitCiConfig::load(path)?.auto_build.targets;
                tracing::info!("targets from config file: {}", targets.join(", "));
                targets
            }
            None => {
                tracing::info!(
                    "config file is not present in the branch: only the staging target will be built"
                );
                Vec::new()
            }
        };

        let staging_target = branch.staging_target()?;
        tracing::info!("staging target: {staging_target}");
        if !targets.contains(&staging_target) {
            targets.push(staging_target);
        }

        self.run_on_targets(&branch.name, &targets, slave, source)?;
        Ok(targets)
    }

    pub fn run_by_config(
        &self,
        branch: &DistGitBranch,
        slave: &str,
        source: &PlatformCiSource,
        config_file: &Path,
    ) -> Result<Vec<String>> {
        let targets = CommitCiConfig::load(config_file)?.auto_build.targets;
        tracing::info!("targets from config file: {}", targets.join(", "));
        self.run_on_targets(&branch.name, &targets, slave, source)?;
        Ok(targets)
    }

    /// Decide whether the pushed branch is built, trigger its worker if so,
    /// and describe the decision on the current Jenkins build.
    ///
    /// Returns the Brew targets that will be built, empty when the branch is
    /// not handled by CI.
    pub fn consider_build(
        &self,
        commit: &DistGitCommit,
        slave: &str,
        source: &PlatformCiSource,
        config_file: Option<&Path>,
    ) -> Result<Vec<String>> {
        let branch = &commit.branch;

        let built_targets = if branch.is_staging() {
            tracing::info!("branch [{branch}] should be built: it is a staging branch");
            self.run_on_staging(branch, slave, source, config_file)?
        } else if let Some(path) = config_file {
            tracing::info!("branch [{branch}] should be built: it contains a 'ci.yaml' file");
            self.run_by_config(branch, slave, source, path)?
        } else {
            tracing::warn!(
                "branch [{branch}] is not a staging branch and 'ci.yaml' file was not found"
            );
            tracing::warn!("branch [{branch}] should not be built");
            Vec::new()
        };

        let description = JobCommitDispatcher::create_description(
            commit,
            &built_targets,
            self.jenkins.url(),
            &self.component,
        );
        self.jenkins.set_current_build_description(&description)?;
        Ok(built_targets)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
