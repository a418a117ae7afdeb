//! Boot-time bootstrap: one-shot import of legacy prompt-builder storage and
//! idempotent insertion of the built-in skills.

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use super::factory::{create_prompt_item, create_skill_item_from, PromptItemOptions};
use super::seeds::{example_skills, salesforce_skills, SeedSkill};
use super::store::LibraryStore;
use super::{LibraryError, LEGACY_CUSTOM_PRESETS_KEY, LEGACY_DRAFT_KEY};
use crate::schema::{
    ItemPayload, ItemType, LibraryItem, LibraryStatus, LibraryStoreMeta, PromptPreset, PromptSpec,
};

const FALLBACK_DRAFT_TITLE: &str = "Migrated Draft Prompt";
const DRAFT_DESCRIPTION: &str = "Migrated from legacy draft storage";

/// Counts of what a seeding pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub added: usize,
    pub backfilled: usize,
}

impl SeedReport {
    pub fn changed(&self) -> bool {
        self.added > 0 || self.backfilled > 0
    }
}

fn migrated_prompt(
    store: &LibraryStore,
    title: String,
    description: String,
    spec: PromptSpec,
) -> LibraryItem {
    let mut item = create_prompt_item(title, spec, PromptItemOptions::default(), store.now_ms());
    item.description = Some(description);
    item.tags = vec!["migrated".to_string(), "prompt-builder".to_string()];
    item
}

fn read_json(store: &LibraryStore, key: &str) -> Option<Value> {
    let raw = store.kv().get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Ignoring unparseable legacy slot {}: {}", key, e);
            None
        }
    }
}

/// Wrap the legacy draft and custom presets as prompt items, once per storage.
///
/// The meta flag is set even when there was nothing to import, so later calls
/// return immediately without writing. Returns the number of items imported.
pub fn migrate_legacy_prompt_storage_if_needed(store: &LibraryStore) -> Result<usize, LibraryError> {
    if !store.is_available() {
        return Ok(0);
    }
    if store.read_meta().migrated_from_legacy_prompt_store {
        return Ok(0);
    }

    let items = store.read_items();
    let mut migrated: Vec<LibraryItem> = Vec::new();

    if let Some(draft) = read_json(store, LEGACY_DRAFT_KEY) {
        match PromptSpec::parse(draft) {
            Ok(spec) => {
                let title = if spec.title.is_empty() {
                    FALLBACK_DRAFT_TITLE.to_string()
                } else {
                    spec.title.clone()
                };
                migrated.push(migrated_prompt(
                    store,
                    title,
                    DRAFT_DESCRIPTION.to_string(),
                    spec,
                ));
            }
            Err(e) => debug!("Skipping legacy draft: {}", e),
        }
    }

    if let Some(Value::Array(presets)) = read_json(store, LEGACY_CUSTOM_PRESETS_KEY) {
        for value in presets {
            let preset = match PromptPreset::parse(value) {
                Ok(preset) => preset,
                Err(e) => {
                    debug!("Skipping legacy preset: {}", e);
                    continue;
                }
            };
            let mut item = migrated_prompt(
                store,
                format!("Preset: {}", preset.name),
                preset.description,
                preset.spec,
            );
            item.tags.push("preset".to_string());
            migrated.push(item);
        }
    }

    let count = migrated.len();
    if count > 0 {
        let mut next = items;
        next.extend(migrated);
        store.write_items(&next)?;
        info!("Migrated {} item(s) from legacy prompt storage", count);
    }

    store.write_meta(&LibraryStoreMeta {
        schema_version: 1,
        migrated_from_legacy_prompt_store: true,
    })?;
    store.emit_change();
    Ok(count)
}

fn seed_item(store: &LibraryStore, seed: &SeedSkill) -> LibraryItem {
    let mut item = create_skill_item_from(seed.skill_spec.clone(), store.now_ms());
    item.id = seed.id.clone();
    item.title = seed.title.clone();
    item.description = Some(seed.description.clone());
    item.tags = seed.tags.clone();
    item.targets = vec![
        "claude".to_string(),
        "codex".to_string(),
        "chatgpt".to_string(),
    ];
    item.status = LibraryStatus::Stable;
    if let ItemPayload::Skill(p) = &mut item.payload {
        p.source_files = seed.source_files.clone();
    }
    item
}

/// Insert every seed whose id and (case-insensitive) title are both unused, then
/// backfill source files onto seeded skills that lost them.
fn seed_skills(
    store: &LibraryStore,
    seeds: &[SeedSkill],
    backfill: bool,
) -> Result<SeedReport, LibraryError> {
    if !store.is_available() {
        return Ok(SeedReport::default());
    }

    let items = store.read_items();
    let existing_ids: HashSet<&str> = items.iter().map(|item| item.id.as_str()).collect();
    let existing_titles: HashSet<String> = items
        .iter()
        .filter(|item| item.item_type() == ItemType::Skill)
        .map(|item| item.title.trim().to_lowercase())
        .collect();

    let additions: Vec<LibraryItem> = seeds
        .iter()
        .filter(|seed| {
            !existing_ids.contains(seed.id.as_str())
                && !existing_titles.contains(&seed.title.trim().to_lowercase())
        })
        .map(|seed| seed_item(store, seed))
        .collect();

    let mut report = SeedReport {
        added: additions.len(),
        backfilled: 0,
    };

    let by_id: HashMap<&str, &SeedSkill> = seeds.iter().map(|s| (s.id.as_str(), s)).collect();
    let mut next = items;
    if backfill {
        for item in next.iter_mut() {
            let Some(seed) = by_id.get(item.id.as_str()) else {
                continue;
            };
            if seed.source_files.is_empty() {
                continue;
            }
            let ItemPayload::Skill(payload) = &mut item.payload else {
                continue;
            };
            if !payload.source_files.is_empty() {
                continue;
            }
            payload.source_files = seed.source_files.clone();
            item.updated_at = store.now_ms().max(item.updated_at);
            report.backfilled += 1;
        }
    }

    if !report.changed() {
        return Ok(report);
    }

    next.extend(additions);
    store.write_items(&next)?;
    info!(
        "Seeded {} skill(s), backfilled {}",
        report.added, report.backfilled
    );
    store.emit_change();
    Ok(report)
}

pub fn seed_default_example_skills_if_missing(
    store: &LibraryStore,
) -> Result<SeedReport, LibraryError> {
    seed_skills(store, example_skills(), true)
}

pub fn seed_default_salesforce_skills_if_missing(
    store: &LibraryStore,
) -> Result<SeedReport, LibraryError> {
    seed_skills(store, salesforce_skills(), false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::store::ListOptions;
    use crate::library::LIBRARY_ITEMS_KEY;
    use serde_json::json;

    fn draft_json(title: &str) -> Value {
        json!({
            "title": title,
            "goal": "Refactor the billing module",
            "assumptionsPolicy": { "mode": "proceed_with_assumptions" },
            "metadata": {
                "version": 1,
                "createdAt": "2024-01-01T00:00:00.000Z",
                "updatedAt": "2024-01-01T00:00:00.000Z"
            }
        })
    }

    #[test]
    fn test_draft_migrates_once() {
        let store = LibraryStore::in_memory();
        store
            .kv()
            .set(LEGACY_DRAFT_KEY, &draft_json("Legacy Draft").to_string())
            .unwrap();

        assert_eq!(migrate_legacy_prompt_storage_if_needed(&store).unwrap(), 1);
        let prompts = store.list_items(&ListOptions::of_type(ItemType::Prompt));
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].title, "Legacy Draft");
        assert_eq!(prompts[0].tags, vec!["migrated", "prompt-builder"]);
        assert_eq!(
            prompts[0].description.as_deref(),
            Some("Migrated from legacy draft storage")
        );

        let before = store.kv().get(LIBRARY_ITEMS_KEY);
        assert_eq!(migrate_legacy_prompt_storage_if_needed(&store).unwrap(), 0);
        assert_eq!(store.kv().get(LIBRARY_ITEMS_KEY), before);
        assert_eq!(
            store.list_items(&ListOptions::of_type(ItemType::Prompt)).len(),
            1
        );
    }

    #[test]
    fn test_blank_draft_title_falls_back() {
        let store = LibraryStore::in_memory();
        store
            .kv()
            .set(LEGACY_DRAFT_KEY, &draft_json("  ").to_string())
            .unwrap();
        migrate_legacy_prompt_storage_if_needed(&store).unwrap();
        let prompts = store.list_items(&ListOptions::default());
        assert_eq!(prompts[0].title, FALLBACK_DRAFT_TITLE);
    }

    #[test]
    fn test_presets_migrate_and_bad_entries_skip() {
        let store = LibraryStore::in_memory();
        let presets = json!([
            {
                "id": "mine",
                "name": "Mine",
                "description": "My preset",
                "spec": draft_json("Preset spec")
            },
            { "id": "broken" }
        ]);
        store
            .kv()
            .set(LEGACY_CUSTOM_PRESETS_KEY, &presets.to_string())
            .unwrap();
        store.kv().set(LEGACY_DRAFT_KEY, "not json").unwrap();

        assert_eq!(migrate_legacy_prompt_storage_if_needed(&store).unwrap(), 1);
        let items = store.list_items(&ListOptions::default());
        assert_eq!(items[0].title, "Preset: Mine");
        assert_eq!(items[0].description.as_deref(), Some("My preset"));
        assert_eq!(items[0].tags, vec!["migrated", "prompt-builder", "preset"]);
    }

    #[test]
    fn test_nothing_to_migrate_still_sets_flag() {
        let store = LibraryStore::in_memory();
        assert_eq!(migrate_legacy_prompt_storage_if_needed(&store).unwrap(), 0);
        assert!(store.read_meta().migrated_from_legacy_prompt_store);
        assert!(store.kv().get(LIBRARY_ITEMS_KEY).is_none());
    }

    #[test]
    fn test_seeding_is_idempotent() {
        let store = LibraryStore::in_memory();
        let first = seed_default_salesforce_skills_if_missing(&store).unwrap();
        assert_eq!(first.added, 6);
        let snapshot = store.kv().get(LIBRARY_ITEMS_KEY);

        let second = seed_default_salesforce_skills_if_missing(&store).unwrap();
        assert!(!second.changed());
        assert_eq!(store.kv().get(LIBRARY_ITEMS_KEY), snapshot);
    }

    #[test]
    fn test_seed_skipped_when_title_exists() {
        let store = LibraryStore::in_memory();
        let mut mine = crate::library::create_skill_item(store.now_ms());
        mine.title = "  SF-APEX ".to_string();
        store.upsert_item(mine).unwrap();

        let report = seed_default_salesforce_skills_if_missing(&store).unwrap();
        assert_eq!(report.added, 5);
        assert!(store.get_item("skill-sf-apex").is_none());
    }

    #[test]
    fn test_example_seed_backfills_source_files() {
        let store = LibraryStore::in_memory();
        seed_default_example_skills_if_missing(&store).unwrap();

        let mut youtube = store
            .get_item("skill-example-youtube-video-analyzer")
            .unwrap();
        let before = youtube.updated_at;
        youtube.title = "My Analyzer".to_string();
        if let ItemPayload::Skill(p) = &mut youtube.payload {
            p.source_files.clear();
        }
        store.upsert_item(youtube).unwrap();

        let report = seed_default_example_skills_if_missing(&store).unwrap();
        assert_eq!(report, SeedReport { added: 0, backfilled: 1 });

        let restored = store
            .get_item("skill-example-youtube-video-analyzer")
            .unwrap();
        assert_eq!(restored.title, "My Analyzer");
        assert_eq!(restored.as_skill().unwrap().source_files.len(), 1);
        assert!(restored.updated_at >= before);
    }
}
