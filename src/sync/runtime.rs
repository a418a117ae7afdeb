//! Contract between the local store and whatever mirrors its writes remotely.

use anyhow::Result;
use async_trait::async_trait;

use crate::schema::LibraryItem;

/// Mirror target the store calls after each successful local write.
///
/// Failures are logged and dropped by the store; implementations that want the
/// error to be visible (e.g. in sync settings) must record it themselves.
#[async_trait]
pub trait CloudSyncRuntime: Send + Sync {
    fn is_active(&self) -> bool;

    async fn on_upsert(&self, item: &LibraryItem) -> Result<()>;

    async fn on_delete(&self, id: &str) -> Result<()>;

    async fn on_touch_last_used(&self, id: &str) -> Result<()>;

    async fn on_toggle_favorite(&self, id: &str) -> Result<()>;

    async fn on_toggle_archived(&self, id: &str) -> Result<()>;
}

/// One local mutation waiting to be mirrored.
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorOp {
    Upsert(LibraryItem),
    Delete(String),
    TouchLastUsed(String),
    ToggleFavorite(String),
    ToggleArchived(String),
}

impl MirrorOp {
    pub fn label(&self) -> &'static str {
        match self {
            MirrorOp::Upsert(_) => "upsert",
            MirrorOp::Delete(_) => "delete",
            MirrorOp::TouchLastUsed(_) => "touch_last_used",
            MirrorOp::ToggleFavorite(_) => "toggle_favorite",
            MirrorOp::ToggleArchived(_) => "toggle_archived",
        }
    }

    pub fn item_id(&self) -> &str {
        match self {
            MirrorOp::Upsert(item) => &item.id,
            MirrorOp::Delete(id)
            | MirrorOp::TouchLastUsed(id)
            | MirrorOp::ToggleFavorite(id)
            | MirrorOp::ToggleArchived(id) => id,
        }
    }

    pub async fn apply(&self, runtime: &dyn CloudSyncRuntime) -> Result<()> {
        match self {
            MirrorOp::Upsert(item) => runtime.on_upsert(item).await,
            MirrorOp::Delete(id) => runtime.on_delete(id).await,
            MirrorOp::TouchLastUsed(id) => runtime.on_touch_last_used(id).await,
            MirrorOp::ToggleFavorite(id) => runtime.on_toggle_favorite(id).await,
            MirrorOp::ToggleArchived(id) => runtime.on_toggle_archived(id).await,
        }
    }
}
