//! Device-local library: the store, item factories, legacy upgrade, migration and seeding.

pub mod factory;
pub mod legacy;
pub mod migrate;
pub mod seeds;
pub mod store;

pub use factory::{
    create_anatomy_item, create_prompt_item, create_skill_item, create_skill_item_from,
    PromptItemOptions,
};
pub use migrate::{
    migrate_legacy_prompt_storage_if_needed, seed_default_example_skills_if_missing,
    seed_default_salesforce_skills_if_missing,
};
pub use store::{LibraryStore, ListOptions};

use crate::schema::ValidationError;

pub const LIBRARY_ITEMS_KEY: &str = "prmpt.library.v1.items";
pub const LIBRARY_META_KEY: &str = "prmpt.library.v1.meta";
pub const LEGACY_DRAFT_KEY: &str = "prompt-builder:draft:v1";
pub const LEGACY_CUSTOM_PRESETS_KEY: &str = "prompt-builder:custom-presets:v1";

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("invalid library item: {0}")]
    Validation(#[from] ValidationError),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("failed to serialize library data: {0}")]
    Serialize(#[from] serde_json::Error),
}
