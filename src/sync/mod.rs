//! Optional cloud mirror.
//!
//! Local writes are replicated fire-and-forget through a [`runtime::CloudSyncRuntime`]
//! registered with the store. Enabling sync pushes the whole local collection,
//! pulls the remote one back and keeps the newer version of every item.

pub mod auth;
pub mod cloud;
pub mod document;
pub mod merge;
pub mod remote;
pub mod runtime;
pub mod settings;

pub use auth::{AuthProvider, DisabledAuth, TokenAuth};
pub use cloud::{migrate_local_items_to_cloud, CloudSync, MigrationReport, MirrorRuntime};
pub use merge::merge;
pub use remote::{HttpRemoteLibrary, InMemoryRemote, RemoteLibrary};
pub use runtime::{CloudSyncRuntime, MirrorOp};
pub use settings::{SyncProvider, SyncSettings, SyncSettingsStore};

use crate::library::LibraryError;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("You must sign in before enabling cloud sync")]
    NotSignedIn,

    #[error("Cloud sync is not configured; set [sync] url in the config file")]
    NotConfigured,

    #[error("{0:#}")]
    Remote(anyhow::Error),

    #[error(transparent)]
    Library(#[from] LibraryError),
}
