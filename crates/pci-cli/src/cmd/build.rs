use super::Context;
use crate::output::print_json;
use anyhow::Context as _;
use pci_core::branch::short_branch_name;
use pci_core::brew::{BrewBuildAttempts, BuildToCommitterMapping};
use pci_core::config::PlatformCiConfig;
use pci_core::notifications::{BrewBuildsErrorNotification, BrewBuildsNotification};
use pci_core::paths;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub struct BuildArgs {
    pub component: String,
    pub git_branch: String,
    pub targets: Vec<String>,
    pub logdir: PathBuf,
    pub committer: Option<String>,
    pub notification: Option<PathBuf>,
}

#[derive(Serialize)]
struct TargetResult {
    target: String,
    result: &'static str,
    url: Option<String>,
    task_id: Option<String>,
}

pub fn run(ctx: &Context, args: BuildArgs) -> anyhow::Result<()> {
    paths::validate_component(&args.component)?;
    let config = PlatformCiConfig::from_env();
    let branch = short_branch_name(&args.git_branch);
    let targets: Vec<String> = args
        .targets
        .into_iter()
        .filter(|t| !t.trim().is_empty())
        .collect();
    if targets.is_empty() {
        anyhow::bail!("no Brew targets to build (use --targets or BREW_TARGETS)");
    }

    let mut builds = BrewBuildAttempts::new(targets.clone(), &args.logdir);
    let attempt = builds.execute().and_then(|()| builds.wait());
    if let Err(e) = attempt {
        let message =
            BrewBuildsErrorNotification::from_error(&e, &args.component, branch, &targets, &config);
        emit(args.notification.as_deref(), &message.to_string(), ctx.json)?;
        return Err(e).context("Brew builds could not be attempted");
    }

    let mut results = Vec::with_capacity(builds.all().len());
    for build in builds.all() {
        let task_id = build.task_id()?;
        if let (Some(task_id), Some(committer)) = (&task_id, &args.committer) {
            BuildToCommitterMapping::new(task_id, committer)
                .save()
                .with_context(|| format!("cannot save committer of task {task_id}"))?;
        }
        results.push(TargetResult {
            target: build.target().to_string(),
            result: build.short_result()?,
            url: build.url()?,
            task_id,
        });
    }

    let message = BrewBuildsNotification::new(&builds, &args.component, branch, &config).render()?;
    emit(args.notification.as_deref(), &message, ctx.json)?;
    if ctx.json {
        print_json(&results)?;
    }

    let failed = builds.count_failed()?;
    if failed > 0 {
        anyhow::bail!("{failed} of {} Brew builds failed", builds.targets().len());
    }
    Ok(())
}

/// Notification text goes to `path` when given, else to stdout. With
/// `--json` stdout carries the results, so the text moves to stderr.
fn emit(path: Option<&Path>, message: &str, json: bool) -> anyhow::Result<()> {
    match path {
        Some(path) => std::fs::write(path, message)
            .with_context(|| format!("cannot write notification to {}", path.display())),
        None if json => {
            eprint!("{message}");
            Ok(())
        }
        None => {
            print!("{message}");
            Ok(())
        }
    }
}
