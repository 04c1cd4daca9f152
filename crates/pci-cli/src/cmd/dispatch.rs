use super::Context;
use crate::output::print_json;
use anyhow::Context as _;
use pci_core::branch::{short_branch_name, DistGitBranch};
use pci_core::ci::{CommitCi, PlatformCiSource};
use pci_core::ci_config::{config_argument, find_ci_config};
use pci_core::commit::{html_escape, short_hash, DistGitCommit, GitRepo};
use pci_core::config::PlatformCiConfig;
use pci_core::jenkins::Jenkins;
use pci_core::paths;
use pci_core::process::SystemRunner;
use serde::Serialize;
use std::path::PathBuf;

pub struct DispatchArgs {
    pub component: String,
    pub git_branch: String,
    pub platform_ci_repo: String,
    pub platform_ci_branch: String,
    pub slave: String,
    pub commit: Option<String>,
    pub workspace: PathBuf,
}

#[derive(Serialize)]
struct DispatchResult<'a> {
    component: &'a str,
    branch: &'a str,
    branch_type: &'static str,
    commit: Option<&'a str>,
    targets: &'a [String],
}

pub fn run(ctx: &Context, args: DispatchArgs) -> anyhow::Result<()> {
    let home = ctx.home()?;
    paths::validate_component(&args.component)?;

    let branch = DistGitBranch::new(short_branch_name(&args.git_branch));
    let hash = args
        .commit
        .as_deref()
        .map(str::trim)
        .filter(|h| !h.is_empty());

    let description = match hash {
        Some(hash) => {
            let repo = GitRepo::new(args.workspace.join(&args.component), SystemRunner);
            let log = repo
                .commit_log(hash)
                .with_context(|| format!("cannot read commit {hash} of {}", args.component))?;
            Some(html_escape(&log))
        }
        None => None,
    };

    let config_file = find_ci_config(&args.workspace, &args.component);
    tracing::info!(
        "config file argument: '{}'",
        config_argument(&args.workspace, &args.component)
    );

    let jenkins = ctx.jenkins(&home, PlatformCiConfig::from_env())?;
    let display_name = match hash {
        Some(hash) => format!("{branch} {}", short_hash(hash)),
        None => branch.to_string(),
    };
    jenkins.set_current_build_display_name(&display_name)?;

    let commit = DistGitCommit::new(branch, hash.map(str::to_string), description);
    let source = PlatformCiSource::new(&args.platform_ci_repo, &args.platform_ci_branch);
    let targets = CommitCi::new(&jenkins, &args.component)
        .consider_build(&commit, &args.slave, &source, config_file.as_deref())
        .with_context(|| format!("dispatching {} branch {} failed", args.component, commit.branch))?;

    if ctx.json {
        print_json(&DispatchResult {
            component: &args.component,
            branch: &commit.branch.name,
            branch_type: commit.branch.branch_type().as_str(),
            commit: commit.hash.as_deref(),
            targets: &targets,
        })?;
    } else if targets.is_empty() {
        println!(
            "{} branch {} is not handled by CI: no build triggered",
            args.component, commit.branch
        );
    } else {
        println!(
            "{} branch {}: triggered {} for {}",
            args.component,
            commit.branch,
            pci_core::jobs::JobBuildOnCommit::job_name(&args.component, &commit.branch.name),
            targets.join(" ")
        );
    }
    Ok(())
}
