pub mod branch;
pub mod build;
pub mod config;
pub mod dispatch;
pub mod jenkins_jobs;
pub mod setup;
pub mod view;

use anyhow::Context as _;
use pci_core::config::PlatformCiConfig;
use pci_core::jenkins::JavaCliJenkins;
use pci_core::paths;
use pci_core::process::SystemRunner;
use std::path::{Path, PathBuf};

/// Global options shared by every subcommand.
pub struct Context {
    pub home: Option<PathBuf>,
    pub jenkins_url: Option<String>,
    pub json: bool,
}

impl Context {
    /// The Platform-CI home, which must be an existing directory.
    pub fn home(&self) -> anyhow::Result<PathBuf> {
        Ok(paths::resolve_home(self.home.as_deref())?)
    }

    pub fn jenkins_url(&self) -> anyhow::Result<String> {
        let url = self
            .jenkins_url
            .as_deref()
            .context("Jenkins URL is not set (use --jenkins-url or JENKINS_URL)")?;
        Ok(url.trim_end_matches('/').to_string())
    }

    /// `config` with the resolved Jenkins URL, so links rendered into jobs
    /// point at the same instance the client talks to.
    pub fn settings(&self, mut config: PlatformCiConfig) -> anyhow::Result<PlatformCiConfig> {
        config.jenkins_url = Some(self.jenkins_url()?);
        Ok(config)
    }

    /// Jenkins client instantiating jobs from the home's templates.
    pub fn jenkins(
        &self,
        home: &Path,
        config: PlatformCiConfig,
    ) -> anyhow::Result<JavaCliJenkins<SystemRunner>> {
        Ok(JavaCliJenkins::new(
            self.jenkins_url()?,
            paths::jobs_dir(home),
            self.settings(config)?,
            SystemRunner,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pci_core::ci::PlatformCiSource;
    use pci_core::config::{ENV_DIST_GIT_URL, ENV_JENKINS_URL};
    use pci_core::jobs::{JenkinsJob, JobBuildOnCommit};

    fn context(url: Option<&str>) -> Context {
        Context {
            home: None,
            jenkins_url: url.map(str::to_string),
            json: false,
        }
    }

    #[test]
    fn jenkins_url_is_trimmed() {
        let ctx = context(Some("https://jenkins.example.com/"));
        assert_eq!(ctx.jenkins_url().unwrap(), "https://jenkins.example.com");
        assert!(context(None).jenkins_url().is_err());
    }

    #[test]
    fn worker_links_use_resolved_url() {
        let ctx = context(Some("https://flag.example.com/"));
        let env = PlatformCiConfig::from_vars([
            (ENV_JENKINS_URL, "https://env.example.com/"),
            (ENV_DIST_GIT_URL, "git://pkgs.example.com"),
        ]);
        let config = ctx.settings(env).unwrap();
        assert_eq!(config.jenkins_url.as_deref(), Some("https://flag.example.com"));

        let worker = JobBuildOnCommit::new(
            "glibc",
            "rhel-7.3-staging",
            "builder",
            PlatformCiSource::new("RHQE", "master"),
        );
        let yaml = worker.as_yaml(&config).unwrap();
        assert!(yaml.contains("https://flag.example.com/job/ci-glibc-dispatcher-commit"));
        assert!(!yaml.contains("//job/"));
        assert!(!yaml.contains("env.example.com"));
    }
}
