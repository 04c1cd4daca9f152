use crate::branch::DistGitBranch;
use crate::error::{PciError, Result};
use crate::process::{CommandRunner, Invocation};
use std::path::{Path, PathBuf};

pub const SHORT_HASH_LEN: usize = 7;

/// A commit pushed to a dist-git branch, as seen by the dispatcher job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistGitCommit {
    pub branch: DistGitBranch,
    pub hash: Option<String>,
    pub description: Option<String>,
}

impl DistGitCommit {
    pub fn new(branch: DistGitBranch, hash: Option<String>, description: Option<String>) -> Self {
        Self {
            branch,
            hash,
            description,
        }
    }
}

pub fn short_hash(hash: &str) -> &str {
    match hash.char_indices().nth(SHORT_HASH_LEN) {
        Some((idx, _)) => &hash[..idx],
        None => hash,
    }
}

/// Escape text for inclusion in a Jenkins build description, which Jenkins
/// renders as HTML.
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// GitRepo
// ---------------------------------------------------------------------------

/// Read-only view of a git checkout.
pub struct GitRepo<R> {
    dir: PathBuf,
    runner: R,
}

impl<R: CommandRunner> GitRepo<R> {
    pub fn new(dir: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            dir: dir.into(),
            runner,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Author line and full message of `commit`.
    pub fn commit_log(&self, commit: &str) -> Result<String> {
        let dir = self.dir.to_string_lossy().into_owned();
        let invocation = Invocation::new(
            "git",
            [
                "-C".to_string(),
                dir,
                "log".to_string(),
                "-1".to_string(),
                "--format=%an <%ae>%n%n%B".to_string(),
                commit.to_string(),
            ],
        );
        let out = self.runner.run(&invocation)?;
        if !out.success() {
            return Err(PciError::Git(format!(
                "cannot read commit {commit} in {}: {}",
                self.dir.display(),
                out.stderr.trim()
            )));
        }
        Ok(out.stdout.trim_end().to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::RecordingRunner;
    use crate::process::CommandOutput;

    #[test]
    fn short_hash_truncates() {
        assert_eq!(short_hash("0123456789abcdef"), "0123456");
        assert_eq!(short_hash("abc"), "abc");
        assert_eq!(short_hash(""), "");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            html_escape("Fix <script> & \"quotes\" 'here'"),
            "Fix &lt;script&gt; &amp; &quot;quotes&quot; &#39;here&#39;"
        );
        assert_eq!(html_escape("plain text"), "plain text");
    }

    #[test]
    fn commit_log_runs_git_in_checkout() {
        let runner = RecordingRunner::responding(|_| {
            CommandOutput::with_stdout("Jane Doe <jane@example.com>\n\nResolves: bz#1\n\n")
        });
        let repo = GitRepo::new("/ws/glibc", &runner);
        let log = repo.commit_log("deadbeef").unwrap();
        assert_eq!(log, "Jane Doe <jane@example.com>\n\nResolves: bz#1");

        let call = runner.last();
        assert_eq!(call.program, "git");
        assert_eq!(call.args[..4], ["-C", "/ws/glibc", "log", "-1"]);
        assert_eq!(call.args.last().unwrap(), "deadbeef");
    }

    #[test]
    fn commit_log_failure_is_git_error() {
        let runner = RecordingRunner::responding(|_| CommandOutput {
            code: Some(128),
            stdout: String::new(),
            stderr: "fatal: bad object".into(),
        });
        let repo = GitRepo::new("/ws/glibc", &runner);
        let err = repo.commit_log("nope").unwrap_err();
        assert!(matches!(err, PciError::Git(ref m) if m.contains("bad object")));
    }
}
