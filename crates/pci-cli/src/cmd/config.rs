use super::Context;
use crate::output::{print_fields, print_json};
use clap::Subcommand;
use pci_core::config::PlatformCiConfig;
use pci_core::jjb::JJB_PROGRAM;
use pci_core::{brew, jenkins};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the settings and external tools this instance would use
    Show,
}

pub fn run(ctx: &Context, subcmd: ConfigSubcommand) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(ctx),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Tool {
    name: String,
    path: Option<PathBuf>,
}

#[derive(Serialize)]
struct ConfigReport {
    home: Option<PathBuf>,
    home_is_dir: bool,
    jenkins_url: Option<String>,
    settings: PlatformCiConfig,
    tools: Vec<Tool>,
}

/// Tools shelled out to. The Jenkins CLI is the first word of
/// `BOP_JENKINS_CLI` when set.
fn tool_names(config: &PlatformCiConfig) -> Vec<String> {
    let jenkins_cli = config
        .jenkins_cli
        .as_deref()
        .and_then(|cli| cli.split_whitespace().next())
        .unwrap_or(jenkins::DEFAULT_CLI[0]);
    [jenkins_cli, JJB_PROGRAM, "git", "pip", brew::RHPKG]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn show(ctx: &Context) -> anyhow::Result<()> {
    let settings = PlatformCiConfig::from_env();
    let tools = tool_names(&settings)
        .into_iter()
        .map(|name| Tool {
            path: which::which(&name).ok(),
            name,
        })
        .collect();
    let report = ConfigReport {
        home_is_dir: ctx.home.as_deref().is_some_and(|h| h.is_dir()),
        home: ctx.home.clone(),
        jenkins_url: ctx.jenkins_url.clone(),
        settings,
        tools,
    };

    if ctx.json {
        return print_json(&report);
    }

    let unset = || "(not set)".to_string();
    let opt = |v: &Option<String>| v.clone().unwrap_or_else(unset);
    let s = &report.settings;
    let home = match &report.home {
        Some(home) if report.home_is_dir => home.display().to_string(),
        Some(home) => format!("{} (not a directory)", home.display()),
        None => unset(),
    };
    let mut fields = vec![
        ("home", home),
        ("jenkins url", opt(&report.jenkins_url)),
        ("jenkins cli", opt(&s.jenkins_cli)),
        ("dist-git url", opt(&s.distgit_url)),
        ("project url", opt(&s.project_url)),
        ("staging doc", opt(&s.staging_branch_doc_url)),
        ("admins", opt(&s.admins)),
        ("bug destination", opt(&s.bug_destination)),
        ("job", opt(&s.job_name)),
        ("build", opt(&s.build_number)),
    ];
    for tool in &report.tools {
        let path = match &tool.path {
            Some(path) => path.display().to_string(),
            None => "not found".to_string(),
        };
        fields.push((tool.name.as_str(), path));
    }
    print_fields(&fields);
    Ok(())
}
