use std::path::{Path, PathBuf};

/// Resolve the Jenkins workspace holding the component checkouts.
///
/// Priority:
/// 1. `--workspace` flag / `WORKSPACE` env var (passed in as `explicit`)
/// 2. Fall back to `cwd`
pub fn resolve_workspace(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_workspace_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_workspace(Some(dir.path()));
        assert_eq!(result, dir.path());
    }

    #[test]
    fn defaults_to_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(resolve_workspace(None), cwd);
    }
}
