use crate::output::{print_json, print_table};
use pci_core::branch::{short_branch_name, BranchType, DistGitBranch};
use serde::Serialize;

#[derive(Serialize)]
struct BranchInfo {
    name: String,
    #[serde(rename = "type")]
    branch_type: BranchType,
    staging_target: Option<String>,
}

pub fn run(names: &[String], json: bool) -> anyhow::Result<()> {
    let infos: Vec<BranchInfo> = names
        .iter()
        .map(|name| {
            let branch = DistGitBranch::new(short_branch_name(name));
            BranchInfo {
                branch_type: branch.branch_type(),
                staging_target: branch.staging_target().ok(),
                name: branch.name,
            }
        })
        .collect();

    if json {
        return print_json(&infos);
    }

    let rows = infos
        .into_iter()
        .map(|info| {
            vec![
                info.name,
                info.branch_type.to_string(),
                info.staging_target.unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(&["BRANCH", "TYPE", "STAGING TARGET"], rows);
    Ok(())
}
