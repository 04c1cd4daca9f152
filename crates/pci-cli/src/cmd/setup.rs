use super::Context;
use anyhow::Context as _;
use pci_core::ci::{CommitCi, PlatformCiSource};
use pci_core::config::PlatformCiConfig;
use pci_core::paths;

pub fn run(
    ctx: &Context,
    component: &str,
    build_on_commit: bool,
    slave: &str,
    platform_ci_repo: &str,
    platform_ci_branch: &str,
) -> anyhow::Result<()> {
    let home = ctx.home()?;
    paths::validate_component(component)?;

    let jenkins = ctx.jenkins(&home, PlatformCiConfig::from_env())?;
    let ci = CommitCi::new(&jenkins, component);
    if build_on_commit {
        let source = PlatformCiSource::new(platform_ci_repo, platform_ci_branch);
        ci.enable(slave, &source)
            .with_context(|| format!("cannot enable Build-on-Push for {component}"))?;
        println!("Build-on-Push enabled for {component}");
    } else {
        ci.disable()
            .with_context(|| format!("cannot disable Build-on-Push for {component}"))?;
        println!("Build-on-Push disabled for {component}");
    }
    Ok(())
}

pub fn teardown(ctx: &Context, component: &str) -> anyhow::Result<()> {
    let home = ctx.home()?;
    paths::validate_component(component)?;

    let jenkins = ctx.jenkins(&home, PlatformCiConfig::from_env())?;
    CommitCi::new(&jenkins, component)
        .remove()
        .with_context(|| format!("cannot remove Build-on-Push for {component}"))?;
    println!("Build-on-Push removed for {component}");
    Ok(())
}
