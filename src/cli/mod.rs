//! Command handlers for the `prmpt` binary.

pub mod library;
pub mod lint;
pub mod sync;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::kv::KeyValueStore;
use crate::library::{
    migrate_legacy_prompt_storage_if_needed, seed_default_example_skills_if_missing,
    seed_default_salesforce_skills_if_missing, LibraryStore,
};
use crate::schema::LibraryItem;
use crate::sync::{CloudSync, SyncSettingsStore};

/// Everything a subcommand needs, wired once per invocation.
pub struct App {
    pub config: Config,
    pub store: Arc<LibraryStore>,
    pub settings: Arc<SyncSettingsStore>,
    pub sync: CloudSync,
}

impl App {
    /// Load config, open storage, then run the boot sequence: legacy migration,
    /// both seeders, mirror activation and sign-in hydration.
    pub async fn boot(config_path: Option<String>, data_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::load_with_path(config_path)?;
        if let Some(dir) = data_dir {
            config.storage.dir = Some(dir);
        }

        let kv: Arc<dyn KeyValueStore> = Arc::new(config.open_store().with_context(|| {
            format!(
                "failed to open library storage at {}",
                config.storage.resolved_dir().display()
            )
        })?);
        debug!("Library storage: {}", config.storage.resolved_dir().display());

        let store = Arc::new(LibraryStore::new(Arc::clone(&kv)));
        let settings = Arc::new(SyncSettingsStore::new(kv));
        let sync = CloudSync::new(
            Arc::clone(&store),
            Arc::clone(&settings),
            config.auth_provider(),
            config.remote()?,
        );

        let app = Self {
            config,
            store,
            settings,
            sync,
        };
        app.prepare_library();
        app.start_sync().await;
        Ok(app)
    }

    fn prepare_library(&self) {
        match migrate_legacy_prompt_storage_if_needed(&self.store) {
            Ok(0) => {}
            Ok(n) => info!("Migrated {} legacy prompt(s)", n),
            Err(e) => warn!("Legacy prompt migration failed: {}", e),
        }
        match seed_default_example_skills_if_missing(&self.store) {
            Ok(report) if report.changed() => debug!(
                "Example skills: {} added, {} backfilled",
                report.added, report.backfilled
            ),
            Ok(_) => {}
            Err(e) => warn!("Seeding example skills failed: {}", e),
        }
        match seed_default_salesforce_skills_if_missing(&self.store) {
            Ok(report) if report.changed() => {
                debug!("Salesforce skills: {} added", report.added)
            }
            Ok(_) => {}
            Err(e) => warn!("Seeding Salesforce skills failed: {}", e),
        }
    }

    async fn start_sync(&self) {
        if let Err(e) = self.sync.activate() {
            warn!("Cloud sync activation failed: {}", e);
            return;
        }
        if let Err(e) = self.sync.hydrate_on_sign_in().await {
            warn!("Cloud hydration failed: {}", e);
        }
    }

    /// Look up an item or fail with a readable message.
    pub fn require_item(&self, id: &str) -> Result<LibraryItem> {
        self.store
            .get_item(id)
            .with_context(|| format!("Item not found: {}", id))
    }

    /// Wait for pending mirror writes before the process exits.
    pub async fn shutdown(&self) {
        let pending = self.store.pending_mirrors();
        if pending > 0 {
            debug!("Waiting for {} mirror write(s)", pending);
        }
        self.store.drain_mirrors().await;
    }
}
