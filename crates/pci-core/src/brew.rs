//! Brew scratch builds issued through `rhpkg`.
//!
//! Builds run from a checked-out dist-git branch (the current directory).
//! Several targets are built at once: every `rhpkg` child is spawned before
//! any is waited on.

use crate::error::{PciError, Result};
use crate::paths;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

pub const RHPKG: &str = "rhpkg";

const TASK_INFO_PREFIX: &str = "Task info: ";
const CREATED_TASK_PREFIX: &str = "Created task: ";

pub fn rhpkg_args(target: &str) -> Vec<String> {
    ["build", "--scratch", "--skip-nvr-check", "--target", target]
        .into_iter()
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// BrewBuildAttempt
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct BrewBuildAttempt {
    target: String,
    logfile_path: PathBuf,
    program: String,
    child: Option<Child>,
    success: Option<bool>,
}

impl BrewBuildAttempt {
    pub fn new(target: impl Into<String>, logdir: &Path) -> Self {
        Self::with_program(target, logdir, RHPKG)
    }

    /// Use `program` in place of `rhpkg`, called with the same arguments.
    pub fn with_program(target: impl Into<String>, logdir: &Path, program: impl Into<String>) -> Self {
        let target = target.into();
        Self {
            logfile_path: paths::brew_log_path(logdir, &target),
            target,
            program: program.into(),
            child: None,
            success: None,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn logfile_path(&self) -> &Path {
        &self.logfile_path
    }

    /// Issue the scratch build request and return without waiting for it.
    pub fn execute(&mut self) -> Result<()> {
        tracing::info!("building for target [{}]", self.target);
        let log = File::create(&self.logfile_path)?;
        let log_err = log.try_clone()?;
        let child = Command::new(&self.program)
            .args(rhpkg_args(&self.target))
            .stdin(Stdio::null())
            .stdout(log)
            .stderr(log_err)
            .spawn()
            .map_err(|source| PciError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        self.child = Some(child);
        Ok(())
    }

    /// Block until the request finishes; the result is then available from
    /// [`passed`](Self::passed).
    pub fn wait(&mut self) -> Result<()> {
        let mut child = self.child.take().ok_or_else(|| {
            PciError::Brew(format!("Brew build for target [{}] was not executed", self.target))
        })?;
        let status = child.wait()?;
        if status.success() {
            tracing::info!("Brew build for target [{}] was successful", self.target);
        } else {
            tracing::error!("Brew build for target [{}] failed", self.target);
        }
        self.success = Some(status.success());
        Ok(())
    }

    pub fn passed(&self) -> Result<bool> {
        self.success.ok_or_else(|| {
            PciError::Brew("Brew build success was not set in wait() method".to_string())
        })
    }

    pub fn short_result(&self) -> Result<&'static str> {
        Ok(if self.passed()? { "PASS" } else { "FAIL" })
    }

    /// URL of the Brew task, read from the build log.
    pub fn url(&self) -> Result<Option<String>> {
        self.log_value(TASK_INFO_PREFIX)
    }

    pub fn task_id(&self) -> Result<Option<String>> {
        self.log_value(CREATED_TASK_PREFIX)
    }

    fn log_value(&self, prefix: &str) -> Result<Option<String>> {
        let reader = BufReader::new(File::open(&self.logfile_path)?);
        for line in reader.lines() {
            let line = line?;
            if let Some(value) = line.strip_prefix(prefix) {
                return Ok(Some(value.trim().to_string()));
            }
        }
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// BrewBuildAttempts
// ---------------------------------------------------------------------------

/// Simultaneous build attempts of one branch in several targets.
#[derive(Debug)]
pub struct BrewBuildAttempts {
    targets: Vec<String>,
    logdir: PathBuf,
    program: String,
    builds: Vec<BrewBuildAttempt>,
}

impl BrewBuildAttempts {
    pub fn new(targets: Vec<String>, logdir: impl Into<PathBuf>) -> Self {
        Self::with_program(targets, logdir, RHPKG)
    }

    /// Repeated targets are built once; each target owns its log file.
    pub fn with_program(targets: Vec<String>, logdir: impl Into<PathBuf>, program: impl Into<String>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(targets.len());
        for target in targets {
            if !unique.contains(&target) {
                unique.push(target);
            }
        }
        Self {
            targets: unique,
            logdir: logdir.into(),
            program: program.into(),
            builds: Vec::new(),
        }
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn logdir(&self) -> &Path {
        &self.logdir
    }

    pub fn all(&self) -> &[BrewBuildAttempt] {
        &self.builds
    }

    pub fn execute(&mut self) -> Result<()> {
        for target in &self.targets {
            let mut build = BrewBuildAttempt::with_program(target, &self.logdir, &self.program);
            build.execute()?;
            self.builds.push(build);
        }
        Ok(())
    }

    pub fn wait(&mut self) -> Result<()> {
        for build in &mut self.builds {
            build.wait()?;
        }
        Ok(())
    }

    pub fn all_successful(&self) -> Result<bool> {
        for build in &self.builds {
            if !build.passed()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn count_failed(&self) -> Result<usize> {
        let mut failed = 0;
        for build in &self.builds {
            if !build.passed()? {
                failed += 1;
            }
        }
        Ok(failed)
    }
}

// ---------------------------------------------------------------------------
// BuildToCommitterMapping
// ---------------------------------------------------------------------------

/// Remembers who pushed the commit behind a CI-issued Brew task.
///
/// Brew records the CI machine account as the issuer of every automatic
/// build, so later notifications about a task would reach that account.
/// The mapping lives in the temporary directory of the slave, which means
/// later processing has to happen on the same slave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildToCommitterMapping {
    pub task_id: String,
    pub committer: String,
}

impl BuildToCommitterMapping {
    pub fn new(task_id: impl Into<String>, committer: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            committer: committer.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        paths::committer_mapping_path(&self.task_id)
    }

    pub fn save(&self) -> Result<()> {
        std::fs::write(self.path(), &self.committer)?;
        Ok(())
    }

    pub fn load(task_id: &str) -> Result<Self> {
        let committer = std::fs::read_to_string(paths::committer_mapping_path(task_id))?;
        Ok(Self::new(task_id, committer))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
