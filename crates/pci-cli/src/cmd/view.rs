use super::Context;
use anyhow::Context as _;
use pci_core::config::PlatformCiConfig;
use pci_core::paths;
use std::path::Path;

pub fn run(ctx: &Context, name: &str, file: Option<&Path>) -> anyhow::Result<()> {
    let home = ctx.home()?;
    let view_xml = match file {
        Some(file) => file.to_path_buf(),
        None => paths::view_template_path(&home),
    };
    if !view_xml.is_file() {
        anyhow::bail!("view definition not found: {}", view_xml.display());
    }

    let jenkins = ctx.jenkins(&home, PlatformCiConfig::from_env())?;
    jenkins
        .set_view(name, &view_xml)
        .with_context(|| format!("cannot set view {name}"))?;
    println!("View {name} updated from {}", view_xml.display());
    Ok(())
}
