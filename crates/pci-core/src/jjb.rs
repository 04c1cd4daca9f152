//! Thin wrapper over the Jenkins Job Builder command line.

use crate::config::PlatformCiConfig;
use crate::error::{PciError, Result};
use crate::jobs::JenkinsJob;
use crate::process::{CommandRunner, Invocation};
use std::fmt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const JJB_PROGRAM: &str = "jenkins-jobs";
pub const JJB_PACKAGE: &str = "jenkins-job-builder";

/// `jenkins-jobs test` renders job XML without touching Jenkins,
/// `jenkins-jobs update` applies the definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JjbMode {
    Test,
    Update,
}

impl JjbMode {
    pub fn as_str(self) -> &'static str {
        match self {
            JjbMode::Test => "test",
            JjbMode::Update => "update",
        }
    }
}

impl fmt::Display for JjbMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JjbMode {
    type Err = PciError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "test" => Ok(JjbMode::Test),
            "update" => Ok(JjbMode::Update),
            _ => Err(PciError::InvalidJjbMode(s.to_string())),
        }
    }
}

pub struct JenkinsJobBuilder<R> {
    runner: R,
    template_dir: PathBuf,
}

impl<R: CommandRunner> JenkinsJobBuilder<R> {
    pub fn new(runner: R, template_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            template_dir: template_dir.into(),
        }
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    /// Install or upgrade JJB for the current user.
    pub fn install(&self) -> Result<()> {
        let invocation = Invocation::new("pip", ["install", "--user", "--upgrade", JJB_PACKAGE])
            .inherit_output();
        tracing::info!("installing {JJB_PACKAGE}");
        let out = self.runner.run(&invocation)?;
        if !out.success() {
            return Err(PciError::Jjb(format!(
                "'{}' exited with {:?}",
                invocation.display(),
                out.code
            )));
        }
        Ok(())
    }

    /// Run JJB over the whole job tree, output going straight to the console.
    pub fn run(&self, mode: JjbMode, config_ini: &Path) -> Result<()> {
        let invocation = Invocation::new(
            JJB_PROGRAM,
            [
                "--conf".to_string(),
                config_ini.to_string_lossy().into_owned(),
                mode.to_string(),
                self.template_dir.to_string_lossy().into_owned(),
            ],
        )
        .inherit_output();
        tracing::info!(%mode, dir = %self.template_dir.display(), "running jenkins-jobs");
        let out = self.runner.run(&invocation)?;
        if !out.success() {
            return Err(PciError::Jjb(format!(
                "'{}' exited with {:?}",
                invocation.display(),
                out.code
            )));
        }
        Ok(())
    }

    /// Instantiate `job` from the templates and return its Jenkins XML.
    ///
    /// The templates are copied into a scratch directory next to the job's
    /// own YAML, so the checkout is never modified.
    pub fn job_as_xml(&self, job: &dyn JenkinsJob, config: &PlatformCiConfig) -> Result<String> {
        let workdir = TempDir::new()?;
        copy_files(&self.template_dir, workdir.path())?;

        let name = job.name();
        std::fs::write(
            workdir.path().join(format!("{name}.yaml")),
            job.as_yaml(config)?,
        )?;

        let invocation = Invocation::new(
            JJB_PROGRAM,
            [
                "test".to_string(),
                workdir.path().to_string_lossy().into_owned(),
                name.clone(),
            ],
        );
        let out = self.runner.run(&invocation)?;
        if !out.success() {
            return Err(PciError::Jjb(format!(
                "cannot instantiate job {name}: {}",
                out.stderr.trim()
            )));
        }
        Ok(out.stdout)
    }
}

/// Copy the regular files of `from` (not recursing) into `to`.
fn copy_files(from: &Path, to: &Path) -> Result<()> {
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            std::fs::copy(entry.path(), to.join(entry.file_name()))?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ci::PlatformCiSource;
    use crate::config::ENV_DIST_GIT_URL;
    use crate::jobs::JobCommitDispatcher;
    use crate::process::testing::RecordingRunner;
    use crate::process::CommandOutput;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn mode_parsing() {
        assert_eq!("test".parse::<JjbMode>().unwrap(), JjbMode::Test);
        assert_eq!("update".parse::<JjbMode>().unwrap(), JjbMode::Update);
        assert!(matches!(
            "delete".parse::<JjbMode>(),
            Err(PciError::InvalidJjbMode(_))
        ));
    }

    #[test]
    fn run_passes_config_and_tree() {
        let runner = RecordingRunner::succeeding();
        let jjb = JenkinsJobBuilder::new(&runner, "/home/pci/jenkins/jobs");
        jjb.run(JjbMode::Update, Path::new("/home/pci/jenkins/config.ini"))
            .unwrap();
        let call = runner.last();
        assert_eq!(call.program, "jenkins-jobs");
        assert_eq!(
            call.args,
            vec![
                "--conf",
                "/home/pci/jenkins/config.ini",
                "update",
                "/home/pci/jenkins/jobs"
            ]
        );
        assert!(!call.capture);
    }

    #[test]
    fn install_failure_is_reported() {
        let runner = RecordingRunner::responding(|_| CommandOutput::with_code(1));
        let jjb = JenkinsJobBuilder::new(&runner, "/tmp");
        assert!(matches!(jjb.install(), Err(PciError::Jjb(_))));
        assert_eq!(
            runner.last().args,
            vec!["install", "--user", "--upgrade", "jenkins-job-builder"]
        );
    }

    #[test]
    fn job_as_xml_renders_in_scratch_copy() {
        let templates = TempDir::new().unwrap();
        std::fs::write(templates.path().join("defaults.yaml"), "- defaults: {}\n").unwrap();
        std::fs::create_dir(templates.path().join("nested")).unwrap();

        // The scratch directory only exists during the call: inspect it there.
        let seen: Rc<RefCell<Vec<String>>> = Rc::default();
        let seen_in = Rc::clone(&seen);
        let runner = RecordingRunner::responding(move |inv| {
            let dir = Path::new(&inv.args[1]);
            let mut names: Vec<String> = std::fs::read_dir(dir)
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            *seen_in.borrow_mut() = names;
            CommandOutput::with_stdout("<project/>")
        });

        let jjb = JenkinsJobBuilder::new(&runner, templates.path());
        let job = JobCommitDispatcher::with_source("glibc", "slave", PlatformCiSource::new("RHQE", "master"));
        let config = PlatformCiConfig::from_vars([(ENV_DIST_GIT_URL, "git://fake")]);
        let xml = jjb.job_as_xml(&job, &config).unwrap();

        assert_eq!(xml, "<project/>");
        assert_eq!(
            *seen.borrow(),
            vec!["ci-glibc-dispatcher-commit.yaml", "defaults.yaml"]
        );
        let call = runner.last();
        assert_eq!(call.args[0], "test");
        assert_eq!(call.args[2], "ci-glibc-dispatcher-commit");
        assert!(!Path::new(&call.args[1]).exists());
    }
}
