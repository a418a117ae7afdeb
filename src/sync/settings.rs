//! Persisted cloud-sync state with change notification.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::kv::KeyValueStore;
use crate::listeners::{ListenerId, ListenerRegistry};

pub const SYNC_SETTINGS_KEY: &str = "prmpt.sync.v1.settings";

/// Only one provider exists; any stored value reads back as it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncProvider {
    #[default]
    Convex,
}

impl<'de> Deserialize<'de> for SyncProvider {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde::de::IgnoredAny::deserialize(deserializer)?;
        Ok(SyncProvider::Convex)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub provider: SyncProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrated_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_user_id: Option<String>,
}

pub struct SyncSettingsStore {
    kv: Arc<dyn KeyValueStore>,
    listeners: ListenerRegistry,
}

impl SyncSettingsStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            listeners: ListenerRegistry::new(),
        }
    }

    /// Stored settings over the defaults; unreadable data yields the defaults.
    pub fn get(&self) -> SyncSettings {
        let Some(raw) = self.kv.get(SYNC_SETTINGS_KEY) else {
            return SyncSettings::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            debug!("Ignoring unreadable sync settings: {}", e);
            SyncSettings::default()
        })
    }

    /// Persist `next` and notify subscribers.
    pub fn set(&self, mut next: SyncSettings) -> Result<SyncSettings> {
        next.provider = SyncProvider::Convex;
        let raw = serde_json::to_string(&next).context("Failed to serialize sync settings")?;
        self.kv
            .set(SYNC_SETTINGS_KEY, &raw)
            .context("Failed to write sync settings")?;
        self.listeners.notify();
        Ok(next)
    }

    /// Read-modify-write of the current settings.
    pub fn update<F>(&self, change: F) -> Result<SyncSettings>
    where
        F: FnOnce(&mut SyncSettings),
    {
        let mut next = self.get();
        change(&mut next);
        self.set(next)
    }

    pub fn clear_error(&self) -> Result<()> {
        if self.get().last_error.is_none() {
            return Ok(());
        }
        self.update(|s| s.last_error = None)?;
        Ok(())
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }
}
