//! Cloud mirror orchestration: activation, enable (push + pull + merge),
//! sign-in hydration, and the mirror runtime handed to the store.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::auth::AuthProvider;
use super::merge::merge;
use super::remote::RemoteLibrary;
use super::runtime::CloudSyncRuntime;
use super::settings::{SyncSettings, SyncSettingsStore};
use super::SyncError;
use crate::library::{LibraryError, LibraryStore, ListOptions};
use crate::schema::LibraryItem;
use crate::util::SecretString;

/// Outcome of pushing the local collection to the remote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
}

/// Push every item, counting failures instead of stopping at the first one.
/// `progress` receives `(completed + failed, total)` after each item.
pub async fn migrate_local_items_to_cloud<F>(
    remote: &dyn RemoteLibrary,
    items: &[LibraryItem],
    token: Option<&SecretString>,
    mut progress: F,
) -> MigrationReport
where
    F: FnMut(usize, usize),
{
    let mut report = MigrationReport {
        total: items.len(),
        ..MigrationReport::default()
    };

    for item in items {
        match remote.upsert_item(token, item).await {
            Ok(()) => report.completed += 1,
            Err(e) => {
                debug!("Failed to push {}: {:#}", item.id, e);
                report.failed += 1;
            }
        }
        progress(report.completed + report.failed, report.total);
    }

    report
}

fn settings_error(e: anyhow::Error) -> SyncError {
    SyncError::Library(LibraryError::Storage(format!("{:#}", e)))
}

/// Mirrors store writes to the remote and records failures in the sync settings.
pub struct MirrorRuntime {
    settings: Arc<SyncSettingsStore>,
    auth: Arc<dyn AuthProvider>,
    remote: Arc<dyn RemoteLibrary>,
}

impl MirrorRuntime {
    pub fn new(
        settings: Arc<SyncSettingsStore>,
        auth: Arc<dyn AuthProvider>,
        remote: Arc<dyn RemoteLibrary>,
    ) -> Self {
        Self {
            settings,
            auth,
            remote,
        }
    }

    fn record(&self, result: Result<()>) -> Result<()> {
        if let Err(e) = &result {
            let message = format!("{:#}", e);
            if let Err(write_err) = self.settings.update(|s| s.last_error = Some(message)) {
                warn!("Failed to record sync error: {:#}", write_err);
            }
        }
        result
    }
}

#[async_trait]
impl CloudSyncRuntime for MirrorRuntime {
    fn is_active(&self) -> bool {
        self.settings.get().enabled
    }

    async fn on_upsert(&self, item: &LibraryItem) -> Result<()> {
        let result = async {
            let token = self.auth.get_token().await?;
            self.remote.upsert_item(token.as_ref(), item).await
        }
        .await;
        self.record(result)
    }

    async fn on_delete(&self, id: &str) -> Result<()> {
        let result = async {
            let token = self.auth.get_token().await?;
            self.remote.delete_item(token.as_ref(), id).await
        }
        .await;
        self.record(result)
    }

    async fn on_touch_last_used(&self, id: &str) -> Result<()> {
        let result = async {
            let token = self.auth.get_token().await?;
            self.remote.touch_last_used(token.as_ref(), id).await
        }
        .await;
        self.record(result)
    }

    async fn on_toggle_favorite(&self, id: &str) -> Result<()> {
        let result = async {
            let token = self.auth.get_token().await?;
            self.remote.toggle_favorite(token.as_ref(), id).await
        }
        .await;
        self.record(result)
    }

    async fn on_toggle_archived(&self, id: &str) -> Result<()> {
        let result = async {
            let token = self.auth.get_token().await?;
            self.remote.toggle_archived(token.as_ref(), id).await
        }
        .await;
        self.record(result)
    }
}

pub struct CloudSync {
    store: Arc<LibraryStore>,
    settings: Arc<SyncSettingsStore>,
    auth: Arc<dyn AuthProvider>,
    remote: Option<Arc<dyn RemoteLibrary>>,
    hydrated_key: Mutex<Option<String>>,
}

impl CloudSync {
    /// `remote` is `None` when no remote deployment is configured.
    pub fn new(
        store: Arc<LibraryStore>,
        settings: Arc<SyncSettingsStore>,
        auth: Arc<dyn AuthProvider>,
        remote: Option<Arc<dyn RemoteLibrary>>,
    ) -> Self {
        Self {
            store,
            settings,
            auth,
            remote,
            hydrated_key: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> SyncSettings {
        self.settings.get()
    }

    pub fn is_configured(&self) -> bool {
        self.remote.is_some()
    }

    pub fn can_enable(&self) -> bool {
        self.auth.is_enabled() && self.auth.is_signed_in() && self.is_configured()
    }

    fn remote(&self) -> Result<&Arc<dyn RemoteLibrary>, SyncError> {
        self.remote.as_ref().ok_or(SyncError::NotConfigured)
    }

    /// Bring the store's mirror registration in line with settings and auth.
    /// Returns whether a mirror runtime is now registered.
    pub fn activate(&self) -> Result<bool, SyncError> {
        let settings = self.settings.get();

        if settings.enabled && self.auth.is_enabled() && !self.auth.is_signed_in() {
            info!("Signed out; disabling cloud sync");
            self.settings
                .update(|s| {
                    s.enabled = false;
                    s.active_user_id = None;
                })
                .map_err(settings_error)?;
            self.store.register_cloud_runtime(None);
            return Ok(false);
        }

        let remote = match &self.remote {
            Some(remote) if settings.enabled && self.auth.is_signed_in() => Arc::clone(remote),
            _ => {
                self.store.register_cloud_runtime(None);
                return Ok(false);
            }
        };

        self.store
            .register_cloud_runtime(Some(Arc::new(MirrorRuntime::new(
                Arc::clone(&self.settings),
                Arc::clone(&self.auth),
                remote,
            ))));
        debug!("Cloud mirror runtime registered");
        Ok(true)
    }

    async fn pull_and_merge(&self, remote: &dyn RemoteLibrary) -> Result<usize, SyncError> {
        let local = self.store.list_items(&ListOptions {
            include_archived: true,
            ..ListOptions::default()
        });
        let token = self.auth.get_token().await.map_err(SyncError::Remote)?;
        let cloud = remote
            .list_items(token.as_ref(), true)
            .await
            .map_err(SyncError::Remote)?;
        let merged = merge(local, cloud);
        let count = merged.len();
        self.store.replace_all_items(merged)?;
        Ok(count)
    }

    /// Reconcile with the remote once per signed-in user and enable timestamp.
    /// Returns `Ok(false)` when there was nothing to do.
    pub async fn hydrate_on_sign_in(&self) -> Result<bool, SyncError> {
        let settings = self.settings.get();
        let Some(remote) = self.remote.as_ref() else {
            return Ok(false);
        };
        if !settings.enabled || !self.auth.is_signed_in() {
            return Ok(false);
        }

        let key = format!(
            "{}:{}",
            self.auth.user_id().unwrap_or_else(|| "unknown".to_string()),
            settings.migrated_at.unwrap_or(0)
        );
        {
            let Ok(mut hydrated) = self.hydrated_key.lock() else {
                return Ok(false);
            };
            if hydrated.as_deref() == Some(key.as_str()) {
                return Ok(false);
            }
            *hydrated = Some(key);
        }

        match self.pull_and_merge(remote.as_ref()).await {
            Ok(count) => {
                let user_id = self.auth.user_id();
                self.settings
                    .update(|s| {
                        s.last_error = None;
                        s.active_user_id = user_id;
                    })
                    .map_err(settings_error)?;
                info!("Hydrated {} item(s) from cloud", count);
                Ok(true)
            }
            Err(e) => {
                let message = e.to_string();
                self.settings
                    .update(|s| s.last_error = Some(message))
                    .map_err(settings_error)?;
                Err(e)
            }
        }
    }

    /// Push the whole local collection, pull the remote back, merge, and enable
    /// sync. Any failure after the push leaves sync disabled with `lastError` set.
    pub async fn migrate_and_hydrate<F>(&self, progress: F) -> Result<MigrationReport, SyncError>
    where
        F: FnMut(usize, usize) + Send,
    {
        if !self.auth.is_signed_in() {
            return Err(SyncError::NotSignedIn);
        }
        let remote = Arc::clone(self.remote()?);

        let result = self.push_pull(remote.as_ref(), progress).await;
        match result {
            Ok(report) => {
                let user_id = self.auth.user_id();
                let now = self.store.now_ms();
                self.settings
                    .update(|s| {
                        s.enabled = true;
                        s.active_user_id = user_id;
                        s.migrated_at = Some(now);
                        s.last_error = None;
                    })
                    .map_err(settings_error)?;
                self.activate()?;
                info!(
                    "Cloud sync enabled: {}/{} pushed, {} failed",
                    report.completed, report.total, report.failed
                );
                Ok(report)
            }
            Err(e) => {
                let message = e.to_string();
                self.settings
                    .update(|s| {
                        s.enabled = false;
                        s.last_error = Some(message);
                    })
                    .map_err(settings_error)?;
                Err(e)
            }
        }
    }

    async fn push_pull<F>(
        &self,
        remote: &dyn RemoteLibrary,
        progress: F,
    ) -> Result<MigrationReport, SyncError>
    where
        F: FnMut(usize, usize) + Send,
    {
        let local = self.store.list_items(&ListOptions {
            include_archived: true,
            ..ListOptions::default()
        });
        let token = self.auth.get_token().await.map_err(SyncError::Remote)?;
        let report = migrate_local_items_to_cloud(remote, &local, token.as_ref(), progress).await;

        let cloud = remote
            .list_items(token.as_ref(), true)
            .await
            .map_err(SyncError::Remote)?;
        self.store.replace_all_items(merge(local, cloud))?;
        Ok(report)
    }

    /// Turn sync off and stop mirroring. Local data is untouched.
    pub fn disable(&self) -> Result<(), SyncError> {
        self.settings
            .update(|s| {
                s.enabled = false;
                s.active_user_id = None;
            })
            .map_err(settings_error)?;
        self.store.register_cloud_runtime(None);
        Ok(())
    }

    /// Manual reconcile: pull the remote collection and merge it into the store.
    /// Returns the size of the merged collection.
    pub async fn pull(&self) -> Result<usize, SyncError> {
        if !self.auth.is_signed_in() {
            return Err(SyncError::NotSignedIn);
        }
        let remote = Arc::clone(self.remote()?);
        self.pull_and_merge(remote.as_ref()).await
    }

    /// Explicit remote listing; failures surface to the caller.
    pub async fn list_cloud_items(&self, include_archived: bool) -> Result<Vec<LibraryItem>, SyncError> {
        if !self.auth.is_signed_in() {
            return Err(SyncError::NotSignedIn);
        }
        let remote = self.remote()?;
        let token = self.auth.get_token().await.map_err(SyncError::Remote)?;
        remote
            .list_items(token.as_ref(), include_archived)
            .await
            .map_err(SyncError::Remote)
    }
}
