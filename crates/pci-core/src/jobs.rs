//! Jenkins job kinds managed by Platform-CI.
//!
//! A job is described by a name, a human-oriented display name and the YAML
//! which instantiates its Jenkins Job Builder template. The YAML is a list of
//! two entries: a `job-template` pointing at the shared defaults, and a
//! `project` carrying the values substituted into it.

use crate::ci::PlatformCiSource;
use crate::commit::DistGitCommit;
use crate::config::{html_link, PlatformCiConfig};
use crate::error::{PciError, Result};
use serde::Serialize;

pub const WORKER_DEFAULTS: &str = "ci-workflow-brew-build";
pub const DISPATCHER_DEFAULTS: &str = "ci-dispatcher-commit";

/// A Jenkins job that can be rendered through JJB.
pub trait JenkinsJob {
    fn name(&self) -> String;
    fn display_name(&self) -> String;
    fn as_yaml(&self, config: &PlatformCiConfig) -> Result<String>;
}

// ---------------------------------------------------------------------------
// JJB document
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct TemplateEntry {
    #[serde(rename = "job-template")]
    job_template: JobTemplate,
}

#[derive(Serialize)]
struct JobTemplate {
    name: String,
    defaults: &'static str,
}

#[derive(Serialize)]
struct ProjectEntry {
    project: Project,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct Project {
    name: String,
    component: String,
    jobs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    git_branch: Option<String>,
    display_name: String,
    team_slave: String,
    platform_ci_branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dispatcher_link: Option<String>,
    platform_ci_project_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    staging_branch_doc_link: Option<String>,
    distgit_root_url: String,
    github_user: String,
}

fn render(job_name: String, defaults: &'static str, project: Project) -> Result<String> {
    let template = TemplateEntry {
        job_template: JobTemplate {
            name: job_name,
            defaults,
        },
    };
    Ok(serde_yaml::to_string(&(template, ProjectEntry { project }))?)
}

fn require_distgit_url(config: &PlatformCiConfig, what: &str) -> Result<String> {
    config
        .distgit_url
        .clone()
        .ok_or_else(|| PciError::Job(format!("DistGit URL not set: cannot create a {what} job")))
}

// ---------------------------------------------------------------------------
// JobBuildOnCommit (worker)
// ---------------------------------------------------------------------------

/// Build-on-Push worker job: issues Brew scratch builds of one dist-git
/// branch. There is one per branch, so its history is the buildability
/// history of that branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobBuildOnCommit {
    pub component: String,
    pub branch: String,
    pub slave: String,
    pub source: PlatformCiSource,
}

impl JobBuildOnCommit {
    pub fn new(
        component: impl Into<String>,
        branch: impl Into<String>,
        slave: impl Into<String>,
        source: PlatformCiSource,
    ) -> Self {
        Self {
            component: component.into(),
            branch: branch.into(),
            slave: slave.into(),
            source,
        }
    }

    /// Name of the worker job for `component` and `branch`, for call sites
    /// which only need to refer to the job.
    pub fn job_name(component: &str, branch: &str) -> String {
        format!("ci-{component}-commit-{branch}")
    }
}

impl JenkinsJob for JobBuildOnCommit {
    fn name(&self) -> String {
        Self::job_name(&self.component, &self.branch)
    }

    fn display_name(&self) -> String {
        format!("{}: Build branch {} in Brew", self.component, self.branch)
    }

    fn as_yaml(&self, config: &PlatformCiConfig) -> Result<String> {
        let distgit_root_url = require_distgit_url(config, "commit worker")?;

        let dispatcher_link = match &config.jenkins_url {
            Some(url) => format!(
                "<a href=\"{url}/job/{}\">commit dispatcher</a>",
                JobCommitDispatcher::job_name(&self.component)
            ),
            None => "commit dispatcher".to_string(),
        };

        let project = Project {
            name: self.component.clone(),
            component: self.component.clone(),
            jobs: vec![self.name()],
            git_branch: Some(self.branch.clone()),
            display_name: self.display_name(),
            team_slave: self.slave.clone(),
            platform_ci_branch: self.source.branch.clone(),
            dispatcher_link: Some(dispatcher_link),
            platform_ci_project_link: config.project_link(),
            staging_branch_doc_link: None,
            distgit_root_url,
            github_user: self.source.user.clone(),
        };
        render(self.name(), WORKER_DEFAULTS, project)
    }
}

// ---------------------------------------------------------------------------
// JobCommitDispatcher
// ---------------------------------------------------------------------------

/// Build-on-Push dispatcher job: watches every push to a component's
/// dist-git repository and decides per branch whether a worker should run.
/// There is one per component.
///
/// `slave` and `source` are only needed to render the job; disabling an
/// existing dispatcher needs just the component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCommitDispatcher {
    pub component: String,
    pub slave: Option<String>,
    pub source: Option<PlatformCiSource>,
}

impl JobCommitDispatcher {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            slave: None,
            source: None,
        }
    }

    pub fn with_source(
        component: impl Into<String>,
        slave: impl Into<String>,
        source: PlatformCiSource,
    ) -> Self {
        Self {
            component: component.into(),
            slave: Some(slave.into()),
            source: Some(source),
        }
    }

    pub fn job_name(component: &str) -> String {
        format!("ci-{component}-dispatcher-commit")
    }

    /// HTML build description of a dispatcher run.
    pub fn create_description(
        commit: &DistGitCommit,
        built_targets: &[String],
        jenkins_url: &str,
        component: &str,
    ) -> String {
        let branch = &commit.branch;
        let mut lines = vec![format!(
            "<strong>Dist-git branch</strong>: {} ({} branch)",
            branch.name,
            branch.branch_type()
        )];

        if let Some(hash) = commit.hash.as_deref().filter(|h| !h.is_empty()) {
            lines.push(format!("<strong>Commit:</strong> {hash}"));
        }

        if built_targets.is_empty() {
            lines.push(format!(
                "<strong>No brew build was issued</strong> ({} is not handled by CI)",
                branch.name
            ));
        } else {
            let worker = JobBuildOnCommit::job_name(component, &branch.name);
            let url = format!("{jenkins_url}/job/{worker}");
            lines.push(format!(
                "<strong>Triggered job: </strong>{}",
                html_link(
                    Some(url.as_str()),
                    &format!("Worker job for branch {}", branch.name)
                )
            ));
        }

        if let Some(description) = commit.description.as_deref().filter(|d| !d.is_empty()) {
            lines.push("<hr/><strong>Commit description:</strong>".to_string());
            lines.extend(description.split('\n').map(str::to_string));
        }

        format!("<p>{}</p>", lines.join("<br>"))
    }
}

impl JenkinsJob for JobCommitDispatcher {
    fn name(&self) -> String {
        Self::job_name(&self.component)
    }

    fn display_name(&self) -> String {
        format!("{}: Schedule Brew build", self.component)
    }

    fn as_yaml(&self, config: &PlatformCiConfig) -> Result<String> {
        let (slave, source) = match (&self.slave, &self.source) {
            (Some(slave), Some(source)) => (slave, source),
            _ => {
                return Err(PciError::Job(format!(
                    "dispatcher for {} needs a slave and a Platform CI source",
                    self.component
                )))
            }
        };
        let distgit_root_url = require_distgit_url(config, "commit dispatcher")?;

        let project = Project {
            name: self.component.clone(),
            component: self.component.clone(),
            jobs: vec![self.name()],
            git_branch: None,
            display_name: self.display_name(),
            team_slave: slave.clone(),
            platform_ci_branch: source.branch.clone(),
            dispatcher_link: None,
            platform_ci_project_link: config.project_link(),
            staging_branch_doc_link: Some(config.staging_branch_doc_link()),
            distgit_root_url,
            github_user: source.user.clone(),
        };
        render(self.name(), DISPATCHER_DEFAULTS, project)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
