//! Agent persona composition ("anatomy").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchetypeRow {
    pub name: String,
    #[serde(rename = "trait")]
    pub trait_text: String,
}

/// Every text field is free-form; only presence is enforced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgeState {
    pub agent_name: String,
    pub tagline: String,
    pub identity_intro: String,
    pub core_behavior: String,
    pub rules: String,
    pub output_format: String,
    pub github_repo_urls: String,
    pub github_focus_files: String,
    pub github_alignment_rules: String,
    #[serde(default)]
    pub archetypes: Vec<ArchetypeRow>,
}
