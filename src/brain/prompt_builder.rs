//! System prompt assembly.
//!
//! Renders the configured template by substituting the practice name and
//! each service list (as `- item` bullet lines).

use crate::config::AgentSettings;

pub fn render_system_prompt(template: &str, agent: &AgentSettings) -> String {
    template
        .replace("{practice_name}", &agent.practice_name)
        .replace("{primary_services}", &bullets(&agent.primary_services))
        .replace("{diagnostic_services}", &bullets(&agent.diagnostic_services))
        .replace(
            "{specialized_procedures}",
            &bullets(&agent.specialized_procedures),
        )
}

fn bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}
