//! Built-in skills shipped with the binary.

use once_cell::sync::Lazy;
use serde::Deserialize;
use tracing::warn;

use crate::schema::{SkillSourceFile, SkillSpec};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSkill {
    pub id: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub skill_spec: SkillSpec,
    #[serde(default)]
    pub source_files: Vec<SkillSourceFile>,
}

#[derive(Debug, Default, Deserialize)]
struct SeedPack {
    #[serde(default)]
    salesforce: Vec<SeedSkill>,
    #[serde(default)]
    examples: Vec<SeedSkill>,
}

static SEED_PACK: Lazy<SeedPack> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../assets/seed_skills.json")).unwrap_or_else(|e| {
        warn!("Built-in seed skills failed to parse: {}", e);
        SeedPack::default()
    })
});

/// Salesforce skill pack.
pub fn salesforce_skills() -> &'static [SeedSkill] {
    &SEED_PACK.salesforce
}

/// Example skills, including the YouTube analyzer with its helper script.
pub fn example_skills() -> &'static [SeedSkill] {
    &SEED_PACK.examples
}
