//! Decide whether a reply is substantial enough to publish as a named
//! artifact, and what to call it.

const MIN_ARTIFACT_CHARS: usize = 500;

const ARTIFACT_KEYWORDS: &[&str] = &[
    "procedure",
    "assessment",
    "recommendation",
    "treatment plan",
    "follow-up",
];

/// First match wins.
const ARTIFACT_NAMES: &[(&str, &str)] = &[
    ("procedure", "procedure_information.md"),
    ("assessment", "medical_assessment.md"),
    ("treatment", "treatment_plan.md"),
    ("follow-up", "follow_up_care.md"),
];

pub const DEFAULT_ARTIFACT_NAME: &str = "cardiology_consultation.md";

pub fn should_create_artifact(text: &str) -> bool {
    if text.chars().count() > MIN_ARTIFACT_CHARS {
        return true;
    }
    let lowered = text.to_lowercase();
    ARTIFACT_KEYWORDS.iter().any(|k| lowered.contains(k))
}

pub fn artifact_name(text: &str) -> &'static str {
    let lowered = text.to_lowercase();
    ARTIFACT_NAMES
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, name)| *name)
        .unwrap_or(DEFAULT_ARTIFACT_NAME)
}
