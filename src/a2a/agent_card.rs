//! Agent Card generation for discovery.
//!
//! Builds an `AgentCard` from the running configuration, advertising the
//! practice's cardiology skills and the server's A2A capabilities.

use crate::a2a::types::*;
use crate::config::Config;

fn skill(id: &str, name: &str, description: &str, tags: &[&str], examples: &[&str]) -> AgentSkill {
    AgentSkill {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        examples: examples.iter().map(|e| e.to_string()).collect(),
    }
}

/// The fixed interventional cardiology skill set.
pub fn cardiology_skills() -> Vec<AgentSkill> {
    vec![
        skill(
            "interventional_procedures",
            "Interventional Cardiology Procedures",
            "Coordinate and provide information about advanced interventional cardiology \
             procedures including angiography, angioplasty, stenting, and complex coronary \
             interventions",
            &["interventional", "angiography", "angioplasty", "stenting", "procedures"],
            &[
                "I need information about angiography procedures",
                "Can you coordinate an angioplasty consultation?",
                "What does the stent placement procedure involve?",
                "Schedule interventional cardiology evaluation",
            ],
        ),
        skill(
            "heart_failure_management",
            "Heart Failure Management",
            "Provide coordination and information for comprehensive heart failure management, \
             including optimization therapy, monitoring protocols, and advanced treatment options",
            &["heart failure", "management", "optimization", "monitoring"],
            &[
                "Heart failure management consultation needed",
                "What are the latest heart failure treatment protocols?",
                "Coordinate heart failure monitoring program",
                "Advanced heart failure therapy options",
            ],
        ),
        skill(
            "ischemic_heart_disease",
            "Ischemic Heart Disease Treatment",
            "Coordinate treatment and management of ischemic heart disease, including acute \
             coronary syndromes, chronic CAD, and secondary prevention protocols",
            &["ischemic", "CAD", "coronary", "acute coronary syndrome"],
            &[
                "Ischemic heart disease evaluation needed",
                "Acute coronary syndrome management",
                "Chronic CAD treatment coordination",
                "Secondary prevention protocol information",
            ],
        ),
        skill(
            "stroke_prevention_management",
            "Stroke Prevention and Management",
            "Coordinate stroke prevention strategies and acute stroke management in the context \
             of cardiovascular disease, including anticoagulation and risk factor modification",
            &["stroke", "prevention", "management", "anticoagulation"],
            &[
                "Stroke prevention consultation needed",
                "Anticoagulation management for stroke prevention",
                "Cardiovascular stroke risk assessment",
                "Acute stroke management protocols",
            ],
        ),
        skill(
            "cardiac_diagnostics",
            "Comprehensive Cardiac Diagnostics",
            "Coordinate comprehensive cardiac diagnostic services including stress testing, \
             electrocardiography, echocardiography, and cardiac catheterization procedures",
            &["diagnostics", "stress test", "ECG", "echo", "catheterization"],
            &[
                "Schedule cardiac stress test",
                "ECG interpretation consultation needed",
                "2D echocardiography with Doppler",
                "Cardiac catheterization procedure coordination",
            ],
        ),
    ]
}

/// Build the Agent Card for this practice.
pub fn build_agent_card(config: &Config) -> AgentCard {
    let card = AgentCard {
        protocol_version: config.server.protocol_version.clone(),
        name: config.agent.name.clone(),
        description: config.agent.description.clone(),
        url: config.server.base_url.clone(),
        version: config.agent.version.clone(),
        provider: Some(AgentProvider {
            organization: config.agent.practice_name.clone(),
            url: None,
        }),
        capabilities: AgentCapabilities {
            streaming: config.server.streaming_enabled,
            push_notifications: config.server.push_notifications_enabled,
            state_transition_history: true,
        },
        default_input_modes: config.server.default_input_modes.clone(),
        default_output_modes: config.server.default_output_modes.clone(),
        skills: cardiology_skills(),
        metadata: Some(serde_json::json!({
            "specialization": "interventional_cardiology",
            "practice_name": config.agent.practice_name,
            "medical_focus": "advanced_cardiac_procedures",
            "target_users": [
                "healthcare_providers",
                "medical_coordinators",
                "specialist_referrals"
            ]
        })),
    };

    tracing::debug!(
        "Built agent card for {} at {} with {} skills",
        card.name,
        card.url,
        card.skills.len()
    );
    card
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::{config_from, test_config};

    #[test]
    fn test_build_agent_card() {
        let config = test_config();
        let card = build_agent_card(&config);
        assert_eq!(card.name, config.agent.name);
        assert_eq!(card.url, config.server.base_url);
        assert_eq!(card.skills.len(), 5);
        assert_eq!(
            card.provider.as_ref().expect("provider").organization,
            config.agent.practice_name
        );
        assert!(card.capabilities.state_transition_history);
    }

    #[test]
    fn test_skill_ids_are_unique() {
        let skills = cardiology_skills();
        let mut ids: Vec<&str> = skills.iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), skills.len());
        assert!(skills.iter().all(|s| s.examples.len() == 4));
    }

    #[test]
    fn test_capabilities_follow_config() {
        let config = config_from(&[
            ("STREAMING_ENABLED", "false"),
            ("PUSH_NOTIFICATIONS_ENABLED", "true"),
            ("BASE_URL", "https://cardio.example.org"),
        ])
        .expect("config");
        let card = build_agent_card(&config);
        assert!(!card.capabilities.streaming);
        assert!(card.capabilities.push_notifications);
        assert_eq!(card.url, "https://cardio.example.org");
    }

    #[test]
    fn test_card_serializes_camel_case() {
        let json = serde_json::to_value(build_agent_card(&test_config())).expect("json");
        assert!(json.get("protocolVersion").is_some());
        assert!(json.get("defaultInputModes").is_some());
        assert_eq!(json["capabilities"]["pushNotifications"], false);
        assert_eq!(json["metadata"]["specialization"], "interventional_cardiology");
    }
}
