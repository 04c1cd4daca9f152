//! Invocation of external programs (`java -jar jenkins-cli.jar`, `jenkins-jobs`,
//! `pip`, `git`).
//!
//! All of them go through [`CommandRunner`] so the command lines this crate
//! builds can be asserted in tests without the tools being installed.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::{PciError, Result};

/// A single program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Written to the child's stdin, which is closed afterwards.
    pub stdin: Option<String>,
    /// Capture stdout/stderr instead of passing them through to our own.
    pub capture: bool,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            stdin: None,
            capture: true,
        }
    }

    /// Split a `program arg arg` vector; an empty vector is rejected.
    pub fn from_argv(argv: Vec<String>) -> Result<Self> {
        let mut iter = argv.into_iter();
        let program = iter
            .next()
            .ok_or_else(|| PciError::Jenkins("empty command line".to_string()))?;
        Ok(Self::new(program, iter))
    }

    pub fn stdin(mut self, data: impl Into<String>) -> Self {
        self.stdin = Some(data.into());
        self
    }

    pub fn inherit_output(mut self) -> Self {
        self.capture = false;
        self
    }

    /// Shell-like rendering for log lines.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the child was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn with_code(code: i32) -> Self {
        Self {
            code: Some(code),
            ..Self::default()
        }
    }

    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }
}

/// Runs external programs to completion.
///
/// A non-zero exit is not an error at this level; callers decide what a
/// failure means for their operation. Failing to start the program is.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        (**self).run(invocation)
    }
}

/// [`CommandRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        tracing::debug!(command = %invocation.display(), "running");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        cmd.stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        if invocation.capture {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }

        let spawn_err = |source| PciError::Spawn {
            program: invocation.program.clone(),
            source,
        };
        let mut child = cmd.spawn().map_err(spawn_err)?;

        // Input is fed from its own thread while output is drained here, so a
        // child filling its output pipe before reading all input cannot block.
        // Dropping the handle closes the pipe so the child sees EOF.
        let writer = match (child.stdin.take(), &invocation.stdin) {
            (Some(mut stdin), Some(data)) => {
                let data = data.clone();
                Some(std::thread::spawn(move || stdin.write_all(data.as_bytes())))
            }
            _ => None,
        };

        let output = child.wait_with_output()?;

        // A child exiting without reading its input is judged by its exit
        // status alone.
        if let Some(writer) = writer {
            match writer.join() {
                Ok(Err(e)) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e.into()),
                Ok(_) => {}
                Err(_) => {
                    return Err(PciError::Io(std::io::Error::other(format!(
                        "stdin writer for '{}' panicked",
                        invocation.program
                    ))))
                }
            }
        }

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;

    type Responder = Box<dyn Fn(&Invocation) -> CommandOutput>;

    /// Records every invocation and answers with a scripted output.
    pub(crate) struct RecordingRunner {
        pub calls: RefCell<Vec<Invocation>>,
        respond: Responder,
    }

    impl RecordingRunner {
        pub(crate) fn succeeding() -> Self {
            Self::responding(|_| CommandOutput::with_code(0))
        }

        pub(crate) fn responding(respond: impl Fn(&Invocation) -> CommandOutput + 'static) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                respond: Box::new(respond),
            }
        }

        pub(crate) fn calls(&self) -> Vec<Invocation> {
            self.calls.borrow().clone()
        }

        pub(crate) fn last(&self) -> Invocation {
            self.calls
                .borrow()
                .last()
                .cloned()
                .expect("no command was run")
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
            self.calls.borrow_mut().push(invocation.clone());
            Ok((self.respond)(invocation))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
