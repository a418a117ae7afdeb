//! Constructors that fill every required field with defaults.
//!
//! All three stamp `createdAt = updatedAt = lastUsedAt = now`.

use crate::schema::{
    AnatomyPayload, ForgeState, ItemPayload, LibraryItem, LibraryStatus, PromptPayload,
    PromptSource, PromptSpec, SkillPayload, SkillSpec, UiPromptSpec,
};
use crate::util::generate_id;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn base(id: String, title: String, payload: ItemPayload, now: i64) -> LibraryItem {
    LibraryItem {
        id,
        title,
        description: None,
        tags: Vec::new(),
        targets: Vec::new(),
        status: LibraryStatus::Draft,
        favorite: false,
        archived: false,
        created_at: now,
        updated_at: now,
        last_used_at: now,
        payload,
    }
}

/// New draft skill built from the default skill spec.
pub fn create_skill_item(now: i64) -> LibraryItem {
    create_skill_item_from(SkillSpec::default(), now)
}

/// Skill item whose title and description come from `spec`.
pub fn create_skill_item_from(spec: SkillSpec, now: i64) -> LibraryItem {
    let title = spec.name.clone();
    let description = spec.description.clone();
    let mut item = base(
        generate_id("skill"),
        title,
        ItemPayload::Skill(SkillPayload {
            skill_spec: spec,
            source_files: Vec::new(),
        }),
        now,
    );
    item.description = Some(description);
    item.tags = strings(&["skill"]);
    item.targets = strings(&["claude"]);
    item
}

#[derive(Debug, Clone, Default)]
pub struct PromptItemOptions {
    /// Appended after the leading `prompt` tag.
    pub extra_tags: Vec<String>,
    pub source: Option<PromptSource>,
    pub ui_prompt_spec: Option<UiPromptSpec>,
}

/// Prompt item wrapping `spec`; the description is the spec's goal.
pub fn create_prompt_item(
    title: impl Into<String>,
    spec: PromptSpec,
    options: PromptItemOptions,
    now: i64,
) -> LibraryItem {
    let description = spec.goal.clone();
    let mut item = base(
        generate_id("prompt"),
        title.into(),
        ItemPayload::Prompt(PromptPayload {
            prompt_spec: spec,
            source: Some(options.source.unwrap_or(PromptSource::PromptBuilder)),
            ui_prompt_spec: options.ui_prompt_spec,
        }),
        now,
    );
    item.description = Some(description);
    item.tags = std::iter::once("prompt".to_string())
        .chain(options.extra_tags)
        .collect();
    item.targets = strings(&["codex", "chatgpt"]);
    item
}

pub fn create_anatomy_item(
    title: impl Into<String>,
    forge_state: ForgeState,
    prompt_text: impl Into<String>,
    selected_preset_id: Option<String>,
    now: i64,
) -> LibraryItem {
    let mut item = base(
        generate_id("anatomy"),
        title.into(),
        ItemPayload::Anatomy(AnatomyPayload {
            forge_state,
            prompt_text: prompt_text.into(),
            selected_preset_id,
        }),
        now,
    );
    item.tags = strings(&["anatomy", "prompt-forge"]);
    item.targets = strings(&["claude", "chatgpt", "codex"]);
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ItemType, Validate};
    use chrono::Utc;

    #[test]
    fn test_skill_defaults() {
        let item = create_skill_item(42);
        assert_eq!(item.item_type(), ItemType::Skill);
        assert!(item.id.starts_with("skill-"));
        assert_eq!(item.title, "Untitled Skill");
        assert_eq!(item.tags, vec!["skill"]);
        assert_eq!(item.targets, vec!["claude"]);
        assert_eq!(item.status, LibraryStatus::Draft);
        assert_eq!(
            (item.created_at, item.updated_at, item.last_used_at),
            (42, 42, 42)
        );
        assert!(item.validated().is_ok());
    }

    #[test]
    fn test_prompt_defaults() {
        let mut spec = PromptSpec::new_at(Utc::now());
        spec.goal = "Ship it".to_string();
        let item = create_prompt_item(
            "Release",
            spec,
            PromptItemOptions {
                extra_tags: vec!["release".to_string()],
                ..Default::default()
            },
            7,
        );
        assert_eq!(item.description.as_deref(), Some("Ship it"));
        assert_eq!(item.tags, vec!["prompt", "release"]);
        assert_eq!(item.targets, vec!["codex", "chatgpt"]);
        assert_eq!(
            item.as_prompt().unwrap().source,
            Some(PromptSource::PromptBuilder)
        );
        assert!(item.validated().is_ok());
    }

    #[test]
    fn test_anatomy_defaults() {
        let item = create_anatomy_item("Forge", ForgeState::default(), "You are...", None, 3);
        assert!(item.id.starts_with("anatomy-"));
        assert_eq!(item.tags, vec!["anatomy", "prompt-forge"]);
        assert_eq!(item.targets, vec!["claude", "chatgpt", "codex"]);
    }
}
