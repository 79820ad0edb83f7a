// ABOUTME: `list` command: prints the organization's workspace inventory
// ABOUTME: Marks which workspaces carry state and can be migrated

use anyhow::Result;
use std::fmt::Write;

use super::build_migrator;
use crate::config::Config;
use crate::source::Workspace;

pub async fn list(config: &Config) -> Result<()> {
    let migrator = build_migrator(config).await?;
    let workspaces = migrator.list_workspaces().await?;

    print!(
        "{}",
        render_inventory(&config.terraform_cloud.organization, &workspaces)?
    );
    Ok(())
}

pub fn render_inventory(organization: &str, workspaces: &[Workspace]) -> Result<String> {
    let with_state = workspaces.iter().filter(|ws| ws.has_state).count();
    let without_state = workspaces.len() - with_state;
    let mut out = String::new();

    writeln!(out, "\nWorkspaces in organization '{}':\n", organization)?;

    for (i, ws) in workspaces.iter().enumerate() {
        let (marker, label) = if ws.has_state {
            ("✓", "HAS STATE")
        } else {
            ("✗", "NO STATE")
        };
        writeln!(out, "{}. {} {} ({})", i + 1, marker, ws.name, label)?;
        if let Some(description) = &ws.description {
            writeln!(out, "   Description: {}", description)?;
        }
        writeln!(out, "   ID: {}", ws.id)?;
        if let Some(version) = &ws.current_state_version {
            writeln!(out, "   State version: {}", version)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "Summary:")?;
    writeln!(out, "   Total workspaces: {}", workspaces.len())?;
    writeln!(out, "   With state (migratable): {}", with_state)?;
    writeln!(out, "   Without state (ignored): {}", without_state)?;

    if with_state > 0 {
        writeln!(out, "\nTo migrate every workspace with state:")?;
        writeln!(out, "   tfc-state-migrator migrate")?;
        writeln!(out, "To migrate specific workspaces:")?;
        writeln!(
            out,
            "   tfc-state-migrator migrate --projects \"workspace1,workspace2\""
        )?;
        writeln!(out, "To simulate first:")?;
        writeln!(out, "   tfc-state-migrator migrate --dry-run")?;
    }

    Ok(out)
}
