//! The Jenkins instance serving Platform-CI.
//!
//! [`Jenkins`] is the set of operations the Build-on-Push workflow needs.
//! [`JavaCliJenkins`] implements it by wrapping `jenkins-cli.jar`. Job XML
//! is produced by JJB from the Platform-CI templates and fed on stdin.

use crate::config::PlatformCiConfig;
use crate::error::{PciError, Result};
use crate::jjb::JenkinsJobBuilder;
use crate::jobs::JenkinsJob;
use crate::process::{CommandRunner, Invocation};
use std::path::{Path, PathBuf};

pub const DEFAULT_CLI: [&str; 4] = [
    "/usr/bin/java",
    "-jar",
    "/var/lib/jenkins/jenkins-cli.jar",
    "-noCertificateCheck",
];
const NO_CERTIFICATE_CHECK: &str = "-noCertificateCheck";

pub const GET_VIEW: &str = "get-view";
pub const UPDATE_VIEW: &str = "update-view";
pub const CREATE_VIEW: &str = "create-view";
pub const LIST_JOBS: &str = "list-jobs";
pub const DELETE_JOB: &str = "delete-job";
pub const BUILD_JOB: &str = "build";
pub const CREATE_JOB: &str = "create-job";
pub const UPDATE_JOB: &str = "update-job";
pub const ENABLE_JOB: &str = "enable-job";
pub const DISABLE_JOB: &str = "disable-job";
pub const SET_DESCRIPTION: &str = "set-build-description";
pub const SET_DISPLAY_NAME: &str = "set-build-display-name";

/// Job-level operations on a Jenkins instance.
pub trait Jenkins {
    fn url(&self) -> &str;
    fn job_exists(&self, job: &dyn JenkinsJob) -> Result<bool>;
    fn create_job(&self, job: &dyn JenkinsJob) -> Result<()>;
    fn update_job(&self, job: &dyn JenkinsJob) -> Result<()>;
    fn enable_job(&self, job: &dyn JenkinsJob) -> Result<()>;
    fn disable_job(&self, job: &dyn JenkinsJob) -> Result<()>;
    fn delete_job(&self, job: &dyn JenkinsJob) -> Result<()>;
    fn trigger_job(&self, job: &dyn JenkinsJob, parameters: &[(&str, String)]) -> Result<()>;
    /// Describe the build this process runs in. A no-op outside Jenkins.
    fn set_current_build_description(&self, description: &str) -> Result<()>;
    /// Rename the build this process runs in. A no-op outside Jenkins.
    fn set_current_build_display_name(&self, display_name: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// JavaCliJenkins
// ---------------------------------------------------------------------------

pub struct JavaCliJenkins<R> {
    url: String,
    cli: Vec<String>,
    template_dir: PathBuf,
    config: PlatformCiConfig,
    runner: R,
}

impl<R: CommandRunner> JavaCliJenkins<R> {
    /// The CLI is `$BOP_JENKINS_CLI` when configured, the stock
    /// `java -jar jenkins-cli.jar` otherwise; either way talking to `url`.
    pub fn new(
        url: impl Into<String>,
        template_dir: impl Into<PathBuf>,
        config: PlatformCiConfig,
        runner: R,
    ) -> Self {
        let url = url.into();
        let mut cli: Vec<String> = match &config.jenkins_cli {
            Some(custom) => custom
                .split_whitespace()
                .map(str::to_string)
                .chain(std::iter::once(NO_CERTIFICATE_CHECK.to_string()))
                .collect(),
            None => DEFAULT_CLI.iter().map(|s| s.to_string()).collect(),
        };
        cli.extend(["-s".to_string(), url.clone()]);

        Self {
            url,
            cli,
            template_dir: template_dir.into(),
            config,
            runner,
        }
    }

    /// Command line prefix shared by every operation.
    pub fn cli(&self) -> &[String] {
        &self.cli
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    fn command<I, S>(&self, args: I) -> Result<Invocation>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = self.cli.clone();
        argv.extend(args.into_iter().map(Into::into));
        Invocation::from_argv(argv)
    }

    /// Run a command which must succeed, failing with `what` otherwise.
    fn checked<I, S>(&self, args: I, stdin: Option<String>, what: String) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut invocation = self.command(args)?;
        invocation.stdin = stdin;
        let out = self.runner.run(&invocation)?;
        if !out.success() {
            if !out.stdout.trim().is_empty() {
                tracing::info!("{}", out.stdout.trim());
            }
            if !out.stderr.trim().is_empty() {
                tracing::error!("{}", out.stderr.trim());
            }
            return Err(PciError::Jenkins(what));
        }
        Ok(())
    }

    fn job_xml(&self, job: &dyn JenkinsJob) -> Result<String> {
        JenkinsJobBuilder::new(&self.runner, &self.template_dir).job_as_xml(job, &self.config)
    }

    pub fn view_exists(&self, view: &str) -> Result<bool> {
        let out = self.runner.run(&self.command([GET_VIEW, view])?)?;
        Ok(out.success())
    }

    /// Create `view`, or update it when it exists, from an XML definition file.
    pub fn set_view(&self, view: &str, view_xml: &Path) -> Result<()> {
        let command = if self.view_exists(view)? {
            UPDATE_VIEW
        } else {
            CREATE_VIEW
        };
        let xml = std::fs::read_to_string(view_xml)?;
        self.checked(
            [command, view],
            Some(xml),
            format!("Setting view failed: {view}"),
        )
    }

    pub fn set_build_description(&self, job_name: &str, build: &str, description: &str) -> Result<()> {
        self.checked(
            [SET_DESCRIPTION, job_name, build, description],
            None,
            format!(
                "Setting build description failed (job={job_name}, build={build}, description='{description}')"
            ),
        )
    }

    pub fn set_build_display_name(&self, job_name: &str, build: &str, display_name: &str) -> Result<()> {
        self.checked(
            [SET_DISPLAY_NAME, job_name, build, display_name],
            None,
            format!("Setting build display name failed (job={job_name}, build={build})"),
        )
    }

    fn current_build(&self) -> Option<(&str, &str)> {
        match (&self.config.job_name, &self.config.build_number) {
            (Some(job), Some(build)) => Some((job.as_str(), build.as_str())),
            _ => None,
        }
    }
}

impl<R: CommandRunner> Jenkins for JavaCliJenkins<R> {
    fn url(&self) -> &str {
        &self.url
    }

    /// Jenkins lists jobs by name; display names are matched too.
    fn job_exists(&self, job: &dyn JenkinsJob) -> Result<bool> {
        let out = self.runner.run(&self.command([LIST_JOBS])?)?;
        if !out.success() {
            return Err(PciError::Jenkins(format!(
                "Listing jobs failed: {}",
                out.stderr.trim()
            )));
        }
        let (name, display_name) = (job.name(), job.display_name());
        Ok(out
            .stdout
            .lines()
            .any(|line| line == name || line == display_name))
    }

    fn create_job(&self, job: &dyn JenkinsJob) -> Result<()> {
        let xml = self.job_xml(job)?;
        let name = job.name();
        tracing::info!(job = %name, "creating job");
        self.checked(
            [CREATE_JOB, name.as_str()],
            Some(xml),
            format!("Creating job failed: {name}"),
        )
    }

    fn update_job(&self, job: &dyn JenkinsJob) -> Result<()> {
        let xml = self.job_xml(job)?;
        let name = job.name();
        tracing::info!(job = %name, "updating job");
        self.checked(
            [UPDATE_JOB, name.as_str()],
            Some(xml),
            format!("Updating job failed: {name}"),
        )
    }

    fn enable_job(&self, job: &dyn JenkinsJob) -> Result<()> {
        let name = job.name();
        self.checked(
            [ENABLE_JOB, name.as_str()],
            None,
            format!("Enabling job failed: {name}"),
        )
    }

    fn disable_job(&self, job: &dyn JenkinsJob) -> Result<()> {
        let name = job.name();
        self.checked(
            [DISABLE_JOB, name.as_str()],
            None,
            format!("Disabling job failed: {name}"),
        )
    }

    /// Deleting is best effort: a failure is logged, never returned.
    fn delete_job(&self, job: &dyn JenkinsJob) -> Result<()> {
        let name = job.name();
        let out = self.runner.run(&self.command([DELETE_JOB, name.as_str()])?)?;
        if !out.success() {
            tracing::warn!(job = %name, "deleting job failed");
        }
        Ok(())
    }

    fn trigger_job(&self, job: &dyn JenkinsJob, parameters: &[(&str, String)]) -> Result<()> {
        let name = job.name();
        let mut args = vec![BUILD_JOB.to_string(), name.clone()];
        for (key, value) in parameters {
            args.push("-p".to_string());
            args.push(format!("{key}={value}"));
        }
        tracing::info!(job = %name, "triggering job");
        self.checked(args, None, format!("Triggering job failed: {name}"))
    }

    fn set_current_build_description(&self, description: &str) -> Result<()> {
        match self.current_build() {
            Some((job, build)) => self.set_build_description(job, build, description),
            None => {
                tracing::debug!("not running inside a Jenkins build, description not set");
                Ok(())
            }
        }
    }

    fn set_current_build_display_name(&self, display_name: &str) -> Result<()> {
        match self.current_build() {
            Some((job, build)) => self.set_build_display_name(job, build, display_name),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ci::PlatformCiSource;
    use crate::config::{ENV_BUILD_NUMBER, ENV_DIST_GIT_URL, ENV_JENKINS_CLI, ENV_JOB_NAME};
    use crate::jobs::JobCommitDispatcher;
    use crate::process::testing::RecordingRunner;
    use crate::process::CommandOutput;
    use tempfile::TempDir;

    fn job() -> JobCommitDispatcher {
        JobCommitDispatcher::with_source("component", "slave", PlatformCiSource::new("RHQE", "branch"))
    }

    fn expected(jenkins: &JavaCliJenkins<&RecordingRunner>, tail: &[&str]) -> Vec<String> {
        let mut argv = jenkins.cli().to_vec();
        argv.extend(tail.iter().map(|s| s.to_string()));
        argv
    }

    fn argv(inv: &Invocation) -> Vec<String> {
        let mut argv = vec![inv.program.clone()];
        argv.extend(inv.args.iter().cloned());
        argv
    }

    #[test]
    fn default_cli_prefix() {
        let runner = RecordingRunner::succeeding();
        let jenkins = JavaCliJenkins::new("https://j", "/t", PlatformCiConfig::default(), &runner);
        assert_eq!(
            jenkins.cli(),
            [
                "/usr/bin/java",
                "-jar",
                "/var/lib/jenkins/jenkins-cli.jar",
                "-noCertificateCheck",
                "-s",
                "https://j"
            ]
        );
        assert_eq!(jenkins.url(), "https://j");
    }

    #[test]
    fn custom_cli_prefix() {
        let runner = RecordingRunner::succeeding();
        let config = PlatformCiConfig::from_vars([(ENV_JENKINS_CLI, "java -jar /opt/cli.jar -i key")]);
        let jenkins = JavaCliJenkins::new("url", "/t", config, &runner);
        assert_eq!(
            jenkins.cli(),
            ["java", "-jar", "/opt/cli.jar", "-i", "key", "-noCertificateCheck", "-s", "url"]
        );
    }

    #[test]
    fn view_exists_uses_get_view() {
        let runner = RecordingRunner::responding(|_| CommandOutput::with_code(1));
        let jenkins = JavaCliJenkins::new("url", "/t", PlatformCiConfig::default(), &runner);
        assert!(!jenkins.view_exists("view").unwrap());
        assert_eq!(argv(&runner.last()), expected(&jenkins, &[GET_VIEW, "view"]));
    }

    #[test]
    fn set_view_creates_or_updates() {
        let dir = TempDir::new().unwrap();
        let xml = dir.path().join("view.xml");
        std::fs::write(&xml, "<view/>").unwrap();

        // get-view succeeds: the view exists and is updated.
        let runner = RecordingRunner::succeeding();
        let jenkins = JavaCliJenkins::new("url", "/t", PlatformCiConfig::default(), &runner);
        jenkins.set_view("view", &xml).unwrap();
        let last = runner.last();
        assert_eq!(argv(&last), expected(&jenkins, &[UPDATE_VIEW, "view"]));
        assert_eq!(last.stdin.as_deref(), Some("<view/>"));

        // get-view fails: the view is created.
        let runner = RecordingRunner::responding(|inv| {
            if inv.args.iter().any(|a| a == GET_VIEW) {
                CommandOutput::with_code(1)
            } else {
                CommandOutput::with_code(0)
            }
        });
        let jenkins = JavaCliJenkins::new("url", "/t", PlatformCiConfig::default(), &runner);
        jenkins.set_view("view", &xml).unwrap();
        assert_eq!(argv(&runner.last()), expected(&jenkins, &[CREATE_VIEW, "view"]));
    }

    #[test]
    fn job_exists_matches_listed_names() {
        let runner = RecordingRunner::responding(|_| {
            CommandOutput::with_stdout("job1\nci-component-dispatcher-commit\n")
        });
        let jenkins = JavaCliJenkins::new("url", "/t", PlatformCiConfig::default(), &runner);
        assert!(jenkins.job_exists(&job()).unwrap());
        assert_eq!(argv(&runner.last()), expected(&jenkins, &[LIST_JOBS]));

        let other = JobCommitDispatcher::new("other");
        assert!(!jenkins.job_exists(&other).unwrap());
    }

    #[test]
    fn enable_job_maps_failure() {
        let runner = RecordingRunner::succeeding();
        let jenkins = JavaCliJenkins::new("url", "/t", PlatformCiConfig::default(), &runner);
        jenkins.enable_job(&job()).unwrap();
        assert_eq!(
            argv(&runner.last()),
            expected(&jenkins, &[ENABLE_JOB, "ci-component-dispatcher-commit"])
        );

        let runner = RecordingRunner::responding(|_| CommandOutput::with_code(1));
        let jenkins = JavaCliJenkins::new("url", "/t", PlatformCiConfig::default(), &runner);
        let err = jenkins.enable_job(&job()).unwrap_err();
        assert!(matches!(err, PciError::Jenkins(ref m) if m == "Enabling job failed: ci-component-dispatcher-commit"));
        assert!(matches!(jenkins.disable_job(&job()), Err(PciError::Jenkins(_))));
    }

    #[test]
    fn delete_job_ignores_failure() {
        let runner = RecordingRunner::responding(|_| CommandOutput::with_code(1));
        let jenkins = JavaCliJenkins::new("url", "/t", PlatformCiConfig::default(), &runner);
        jenkins.delete_job(&job()).unwrap();
        assert_eq!(
            argv(&runner.last()),
            expected(&jenkins, &[DELETE_JOB, "ci-component-dispatcher-commit"])
        );
    }

    #[test]
    fn trigger_job_passes_parameters() {
        let runner = RecordingRunner::succeeding();
        let jenkins = JavaCliJenkins::new("url", "/t", PlatformCiConfig::default(), &runner);
        jenkins.trigger_job(&job(), &[]).unwrap();
        assert_eq!(
            argv(&runner.last()),
            expected(&jenkins, &[BUILD_JOB, "ci-component-dispatcher-commit"])
        );

        jenkins
            .trigger_job(
                &job(),
                &[("param1", "param1-value".into()), ("param2", "param2-value".into())],
            )
            .unwrap();
        assert_eq!(
            argv(&runner.last()),
            expected(
                &jenkins,
                &[
                    BUILD_JOB,
                    "ci-component-dispatcher-commit",
                    "-p",
                    "param1=param1-value",
                    "-p",
                    "param2=param2-value"
                ]
            )
        );

        let runner = RecordingRunner::responding(|_| CommandOutput::with_code(1));
        let jenkins = JavaCliJenkins::new("url", "/t", PlatformCiConfig::default(), &runner);
        assert!(matches!(jenkins.trigger_job(&job(), &[]), Err(PciError::Jenkins(_))));
    }

    #[test]
    fn create_and_update_feed_rendered_xml() {
        let templates = TempDir::new().unwrap();
        let runner = RecordingRunner::responding(|inv| {
            if inv.program == "jenkins-jobs" {
                CommandOutput::with_stdout("<project>job as xml</project>")
            } else {
                CommandOutput::with_code(0)
            }
        });
        let config = PlatformCiConfig::from_vars([(ENV_DIST_GIT_URL, "git://fake")]);
        let jenkins = JavaCliJenkins::new("url", templates.path(), config, &runner);

        jenkins.create_job(&job()).unwrap();
        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].program, "jenkins-jobs");
        assert_eq!(
            argv(&calls[1]),
            expected(&jenkins, &[CREATE_JOB, "ci-component-dispatcher-commit"])
        );
        assert_eq!(calls[1].stdin.as_deref(), Some("<project>job as xml</project>"));

        jenkins.update_job(&job()).unwrap();
        let last = runner.last();
        assert_eq!(
            argv(&last),
            expected(&jenkins, &[UPDATE_JOB, "ci-component-dispatcher-commit"])
        );
        assert_eq!(last.stdin.as_deref(), Some("<project>job as xml</project>"));
    }

    #[test]
    fn create_job_failure() {
        let templates = TempDir::new().unwrap();
        let runner = RecordingRunner::responding(|inv| {
            if inv.program == "jenkins-jobs" {
                CommandOutput::with_stdout("<project/>")
            } else {
                CommandOutput::with_code(1)
            }
        });
        let config = PlatformCiConfig::from_vars([(ENV_DIST_GIT_URL, "git://fake")]);
        let jenkins = JavaCliJenkins::new("url", templates.path(), config, &runner);
        assert!(matches!(jenkins.create_job(&job()), Err(PciError::Jenkins(_))));
        assert!(matches!(jenkins.update_job(&job()), Err(PciError::Jenkins(_))));
    }

    #[test]
    fn current_build_description_only_inside_jenkins() {
        let runner = RecordingRunner::succeeding();
        let jenkins = JavaCliJenkins::new("url", "/t", PlatformCiConfig::default(), &runner);
        jenkins.set_current_build_description("<p>x</p>").unwrap();
        jenkins.set_current_build_display_name("rhel-7.3").unwrap();
        assert!(runner.calls().is_empty());

        let config = PlatformCiConfig::from_vars([(ENV_JOB_NAME, "dispatcher"), (ENV_BUILD_NUMBER, "42")]);
        let jenkins = JavaCliJenkins::new("url", "/t", config, &runner);
        jenkins.set_current_build_description("<p>x</p>").unwrap();
        assert_eq!(
            argv(&runner.last()),
            expected(&jenkins, &[SET_DESCRIPTION, "dispatcher", "42", "<p>x</p>"])
        );
        jenkins.set_current_build_display_name("rhel-7.3 abc1234").unwrap();
        assert_eq!(
            argv(&runner.last()),
            expected(&jenkins, &[SET_DISPLAY_NAME, "dispatcher", "42", "rhel-7.3 abc1234"])
        );
    }

    #[test]
    fn build_description_failure() {
        let runner = RecordingRunner::responding(|_| CommandOutput::with_code(2));
        let jenkins = JavaCliJenkins::new("url", "/t", PlatformCiConfig::default(), &runner);
        let err = jenkins.set_build_description("job", "1", "desc").unwrap_err();
        assert!(matches!(err, PciError::Jenkins(ref m) if m.contains("job=job, build=1")));
    }
}
