//! Roles command - List agent roles.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use desk_agents::{AgentRegistry, AgentRole};

use super::print_json;

#[derive(Args)]
pub struct RolesArgs {
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct RoleInfo {
    role: AgentRole,
    description: &'static str,
    capabilities: Vec<&'static str>,
}

pub fn execute(args: RolesArgs) -> Result<()> {
    let registry = AgentRegistry::standard();
    let roles: Vec<RoleInfo> = AgentRole::ALL
        .into_iter()
        .map(|role| RoleInfo {
            role,
            description: role.description(),
            capabilities: registry
                .get(role)
                .map(|agent| agent.capabilities())
                .unwrap_or_default(),
        })
        .collect();

    if args.json {
        return print_json(&roles);
    }

    for info in &roles {
        println!("{:<20} {}", info.role.as_str(), info.description);
        if !info.capabilities.is_empty() {
            println!("{:<20} capabilities: {}", "", info.capabilities.join(", "));
        }
    }
    Ok(())
}
