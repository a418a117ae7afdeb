//! Mapping between library items and the remote document shape.
//!
//! The remote side stores the payload untyped under `spec` plus a derived
//! lowercase `contentSearch` string for server-side search. That string is
//! recomputed on every write and never read back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{ItemType, LibraryItem, LibraryStatus, ValidationError};

pub const REMOTE_SCHEMA_VERSION: i64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDocument {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub targets: Vec<String>,
    pub status: LibraryStatus,
    pub favorite: bool,
    pub archived: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_used_at: i64,
    #[serde(default = "default_schema_version")]
    pub schema_version: i64,
    pub spec: Value,
    #[serde(default)]
    pub content_search: String,
}

fn default_schema_version() -> i64 {
    REMOTE_SCHEMA_VERSION
}

pub fn content_search(item: &LibraryItem) -> String {
    let payload = serde_json::to_string(&item.payload).unwrap_or_default();
    let mut parts: Vec<&str> = vec![
        item.title.as_str(),
        item.description.as_deref().unwrap_or(""),
    ];
    parts.extend(item.tags.iter().map(String::as_str));
    parts.push(&payload);
    parts.join(" ").to_lowercase()
}

pub fn to_remote(item: &LibraryItem) -> RemoteDocument {
    RemoteDocument {
        id: item.id.clone(),
        item_type: item.item_type(),
        title: item.title.clone(),
        description: item.description.clone(),
        tags: item.tags.clone(),
        targets: item.targets.clone(),
        status: item.status,
        favorite: item.favorite,
        archived: item.archived,
        created_at: item.created_at,
        updated_at: item.updated_at,
        last_used_at: item.last_used_at,
        schema_version: REMOTE_SCHEMA_VERSION,
        spec: serde_json::to_value(&item.payload).unwrap_or(Value::Null),
        content_search: content_search(item),
    }
}

/// Strict: a document that does not validate is an error, not a skipped entry.
pub fn from_remote(doc: RemoteDocument) -> Result<LibraryItem, ValidationError> {
    let mut value = serde_json::json!({
        "id": doc.id,
        "type": doc.item_type,
        "title": doc.title,
        "tags": doc.tags,
        "targets": doc.targets,
        "status": doc.status,
        "favorite": doc.favorite,
        "archived": doc.archived,
        "createdAt": doc.created_at,
        "updatedAt": doc.updated_at,
        "lastUsedAt": doc.last_used_at,
        "payload": doc.spec,
    });
    if let Some(description) = doc.description {
        value["description"] = Value::String(description);
    }
    LibraryItem::parse(value)
}
