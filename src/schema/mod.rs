//! Persisted entity shapes and their validators.
//!
//! Every [`LibraryItem`] is a tagged union over `type`: the base fields are shared
//! and `payload` must match the declared type exactly. Validation is explicit:
//! serde checks structure, then [`Validate`] enforces value constraints and trims
//! string fields in place.

pub mod anatomy;
pub mod error;
pub mod prompt;
pub mod skill;
pub mod ui_builder;

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub use anatomy::{ArchetypeRow, ForgeState};
pub use error::{Issues, Validate, ValidationError, ValidationIssue};
pub use prompt::{PromptPreset, PromptSpec};
pub use skill::{SkillInput, SkillSourceFile, SkillSpec};
pub use ui_builder::UiPromptSpec;

use error::field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Prompt,
    Skill,
    Anatomy,
}

impl ItemType {
    pub fn as_str(&self) -> &str {
        match self {
            ItemType::Prompt => "prompt",
            ItemType::Skill => "skill",
            ItemType::Anatomy => "anatomy",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "prompt" | "prompts" => Ok(ItemType::Prompt),
            "skill" | "skills" => Ok(ItemType::Skill),
            "anatomy" | "anatomies" => Ok(ItemType::Anatomy),
            _ => anyhow::bail!("Unknown item type: {}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryStatus {
    #[default]
    Draft,
    Stable,
    Deprecated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptSource {
    PromptBuilder,
    UiBuilder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptPayload {
    pub prompt_spec: PromptSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PromptSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_prompt_spec: Option<UiPromptSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillPayload {
    pub skill_spec: SkillSpec,
    #[serde(default)]
    pub source_files: Vec<SkillSourceFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnatomyPayload {
    pub forge_state: ForgeState,
    pub prompt_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_preset_id: Option<String>,
}

/// Variant payload; serializes as the bare inner object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ItemPayload {
    Prompt(PromptPayload),
    Skill(SkillPayload),
    Anatomy(AnatomyPayload),
}

impl ItemPayload {
    pub fn item_type(&self) -> ItemType {
        match self {
            ItemPayload::Prompt(_) => ItemType::Prompt,
            ItemPayload::Skill(_) => ItemType::Skill,
            ItemPayload::Anatomy(_) => ItemType::Anatomy,
        }
    }

    /// Decode `value` as the payload for `item_type`, and nothing else.
    pub fn from_value(item_type: ItemType, value: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match item_type {
            ItemType::Prompt => ItemPayload::Prompt(serde_json::from_value(value)?),
            ItemType::Skill => ItemPayload::Skill(serde_json::from_value(value)?),
            ItemType::Anatomy => ItemPayload::Anatomy(serde_json::from_value(value)?),
        })
    }
}

/// The sole persisted entity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawLibraryItem")]
pub struct LibraryItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub targets: Vec<String>,
    pub status: LibraryStatus,
    pub favorite: bool,
    pub archived: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_used_at: i64,
    pub payload: ItemPayload,
}

/// Wire shape before the payload is resolved against `type`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLibraryItem {
    id: String,
    #[serde(rename = "type")]
    item_type: ItemType,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    targets: Vec<String>,
    #[serde(default)]
    status: LibraryStatus,
    #[serde(default)]
    favorite: bool,
    #[serde(default)]
    archived: bool,
    created_at: i64,
    updated_at: i64,
    last_used_at: i64,
    payload: serde_json::Value,
}

impl TryFrom<RawLibraryItem> for LibraryItem {
    type Error = String;

    fn try_from(raw: RawLibraryItem) -> Result<Self, Self::Error> {
        let payload = ItemPayload::from_value(raw.item_type, raw.payload)
            .map_err(|e| format!("invalid {} payload: {}", raw.item_type, e))?;
        Ok(Self {
            id: raw.id,
            title: raw.title,
            description: raw.description,
            tags: raw.tags,
            targets: raw.targets,
            status: raw.status,
            favorite: raw.favorite,
            archived: raw.archived,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            last_used_at: raw.last_used_at,
            payload,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LibraryItemRef<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    item_type: ItemType,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    tags: &'a [String],
    targets: &'a [String],
    status: LibraryStatus,
    favorite: bool,
    archived: bool,
    created_at: i64,
    updated_at: i64,
    last_used_at: i64,
    payload: &'a ItemPayload,
}

impl Serialize for LibraryItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        LibraryItemRef {
            id: &self.id,
            item_type: self.item_type(),
            title: &self.title,
            description: self.description.as_deref(),
            tags: &self.tags,
            targets: &self.targets,
            status: self.status,
            favorite: self.favorite,
            archived: self.archived,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_used_at: self.last_used_at,
            payload: &self.payload,
        }
        .serialize(serializer)
    }
}

impl LibraryItem {
    pub fn item_type(&self) -> ItemType {
        self.payload.item_type()
    }

    /// Structural + value validation of an untrusted JSON document.
    pub fn parse(value: serde_json::Value) -> Result<Self, ValidationError> {
        serde_json::from_value::<Self>(value)
            .map_err(ValidationError::shape)?
            .validated()
    }

    pub fn as_skill(&self) -> Option<&SkillPayload> {
        match &self.payload {
            ItemPayload::Skill(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_prompt(&self) -> Option<&PromptPayload> {
        match &self.payload {
            ItemPayload::Prompt(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_anatomy(&self) -> Option<&AnatomyPayload> {
        match &self.payload {
            ItemPayload::Anatomy(p) => Some(p),
            _ => None,
        }
    }

    /// Case-insensitive haystack for list queries: title, description, tags.
    pub fn search_text(&self) -> String {
        let mut parts: Vec<&str> = vec![
            self.title.as_str(),
            self.description.as_deref().unwrap_or(""),
        ];
        parts.extend(self.tags.iter().map(String::as_str));
        parts.join(" ").to_lowercase()
    }
}

impl Validate for LibraryItem {
    fn check(&mut self, path: &str, issues: &mut Issues) {
        issues.present(&field(path, "id"), &self.id);
        issues.non_empty(&field(path, "title"), &mut self.title);
        issues.trimmed_opt(&mut self.description);
        issues.non_empty_list(&field(path, "tags"), &mut self.tags);
        issues.non_empty_list(&field(path, "targets"), &mut self.targets);
        issues.positive(&field(path, "createdAt"), self.created_at);
        issues.positive(&field(path, "updatedAt"), self.updated_at);
        issues.positive(&field(path, "lastUsedAt"), self.last_used_at);

        let payload_path = field(path, "payload");
        match &mut self.payload {
            ItemPayload::Prompt(p) => {
                p.prompt_spec
                    .check(&field(&payload_path, "promptSpec"), issues);
                if let Some(ui) = p.ui_prompt_spec.as_mut() {
                    ui.check(&field(&payload_path, "uiPromptSpec"), issues);
                }
            }
            ItemPayload::Skill(p) => {
                p.skill_spec
                    .check(&field(&payload_path, "skillSpec"), issues);
                let files_path = field(&payload_path, "sourceFiles");
                for (i, file) in p.source_files.iter_mut().enumerate() {
                    file.check(&error::index(&files_path, i), issues);
                }
            }
            ItemPayload::Anatomy(p) => {
                issues.trimmed_opt(&mut p.selected_preset_id);
            }
        }
    }
}

/// Persisted store meta record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStoreMeta {
    pub schema_version: i64,
    #[serde(default)]
    pub migrated_from_legacy_prompt_store: bool,
}

impl Default for LibraryStoreMeta {
    fn default() -> Self {
        Self {
            schema_version: 1,
            migrated_from_legacy_prompt_store: false,
        }
    }
}

impl LibraryStoreMeta {
    pub fn parse(value: serde_json::Value) -> Result<Self, ValidationError> {
        let meta: Self = serde_json::from_value(value).map_err(ValidationError::shape)?;
        if meta.schema_version != 1 {
            return Err(ValidationError::single(
                "schemaVersion",
                format!("unsupported schema version {}", meta.schema_version),
            ));
        }
        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn skill_json() -> serde_json::Value {
        json!({
            "id": "skill-1",
            "type": "skill",
            "title": "Skill A",
            "createdAt": 10,
            "updatedAt": 10,
            "lastUsedAt": 10,
            "payload": {
                "skillSpec": { "name": "A", "description": "B", "steps": ["go"] }
            }
        })
    }

    #[test]
    fn test_parse_applies_base_defaults() {
        let item = LibraryItem::parse(skill_json()).unwrap();
        assert_eq!(item.item_type(), ItemType::Skill);
        assert_eq!(item.status, LibraryStatus::Draft);
        assert!(!item.favorite);
        assert!(!item.archived);
        assert!(item.tags.is_empty());
        assert!(item.as_skill().unwrap().source_files.is_empty());
    }

    #[test]
    fn test_payload_must_match_declared_type() {
        let mut value = skill_json();
        value["type"] = json!("prompt");
        let err = LibraryItem::parse(value).unwrap_err();
        assert!(err.to_string().contains("invalid prompt payload"));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut value = skill_json();
        value["type"] = json!("workflow");
        assert!(LibraryItem::parse(value).is_err());
    }

    #[test]
    fn test_timestamps_must_be_positive() {
        let mut value = skill_json();
        value["createdAt"] = json!(0);
        let err = LibraryItem::parse(value).unwrap_err();
        assert!(err.mentions("createdAt"));
    }

    #[test]
    fn test_fractional_timestamp_rejected() {
        let mut value = skill_json();
        value["updatedAt"] = json!(10.5);
        assert!(LibraryItem::parse(value).is_err());
    }

    #[test]
    fn test_serialize_writes_type_tag_and_bare_payload() {
        let item = LibraryItem::parse(skill_json()).unwrap();
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "skill");
        assert_eq!(value["payload"]["skillSpec"]["name"], "A");
        assert!(value.get("description").is_none());
        let back = LibraryItem::parse(value).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_search_text_is_lowercase() {
        let mut item = LibraryItem::parse(skill_json()).unwrap();
        item.description = Some("Apex Review".to_string());
        item.tags = vec!["SalesForce".to_string()];
        assert_eq!(item.search_text(), "skill a apex review salesforce");
    }

    #[test]
    fn test_item_type_from_str() {
        assert_eq!("Skills".parse::<ItemType>().unwrap(), ItemType::Skill);
        assert!("widget".parse::<ItemType>().is_err());
    }

    #[test]
    fn test_meta_defaults_and_version() {
        let meta = LibraryStoreMeta::parse(json!({ "schemaVersion": 1 })).unwrap();
        assert!(!meta.migrated_from_legacy_prompt_store);
        assert!(LibraryStoreMeta::parse(json!({ "schemaVersion": 2 })).is_err());
    }
}
