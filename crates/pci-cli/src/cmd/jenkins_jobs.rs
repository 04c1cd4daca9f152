use super::Context;
use anyhow::Context as _;
use pci_core::jjb::{JenkinsJobBuilder, JjbMode};
use pci_core::paths;
use pci_core::process::SystemRunner;

pub fn run(ctx: &Context, mode: &str, skip_install: bool) -> anyhow::Result<()> {
    let home = ctx.home()?;
    let mode: JjbMode = mode.parse()?;

    let jjb = JenkinsJobBuilder::new(SystemRunner, paths::jobs_dir(&home));
    if skip_install {
        tracing::info!("skipping jenkins-job-builder installation");
    } else {
        jjb.install().context("cannot install jenkins-job-builder")?;
    }

    let config_ini = paths::jjb_config_path(&home);
    jjb.run(mode, &config_ini)
        .with_context(|| format!("jenkins-jobs {mode} failed"))?;
    tracing::info!("jenkins-jobs {mode} finished");
    Ok(())
}
