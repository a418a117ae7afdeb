//! The device-local collection.
//!
//! Every operation reads the whole collection fresh from the key-value backend
//! and writes the whole collection back. Nothing is cached between calls, so the
//! last writer wins in full when two mutations race.

use serde_json::Value;
use std::sync::{Arc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::legacy::upgrade_legacy_skill;
use super::{LibraryError, LIBRARY_ITEMS_KEY, LIBRARY_META_KEY};
use crate::kv::{KeyValueStore, MemoryStore};
use crate::listeners::{ListenerId, ListenerRegistry};
use crate::schema::{ItemType, LibraryItem, LibraryStoreMeta, Validate};
use crate::sync::runtime::{CloudSyncRuntime, MirrorOp};
use crate::util::{generate_id, Clock, SystemClock};

/// Filters for [`LibraryStore::list_items`].
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub item_type: Option<ItemType>,
    pub include_archived: bool,
    pub query: Option<String>,
    pub favorite_only: bool,
}

impl ListOptions {
    pub fn of_type(item_type: ItemType) -> Self {
        Self {
            item_type: Some(item_type),
            ..Self::default()
        }
    }
}

pub struct LibraryStore {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    listeners: ListenerRegistry,
    runtime: RwLock<Option<Arc<dyn CloudSyncRuntime>>>,
    mirrors: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for LibraryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryStore")
            .field("available", &self.kv.is_available())
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl LibraryStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(kv, Arc::new(SystemClock))
    }

    pub fn with_clock(kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            kv,
            clock,
            listeners: ListenerRegistry::new(),
            runtime: RwLock::new(None),
            mirrors: Mutex::new(Vec::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn kv(&self) -> &Arc<dyn KeyValueStore> {
        &self.kv
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn is_available(&self) -> bool {
        self.kv.is_available()
    }

    // ---- persistence ---------------------------------------------------------

    pub(crate) fn read_meta(&self) -> LibraryStoreMeta {
        let Some(raw) = self.kv.get(LIBRARY_META_KEY) else {
            return LibraryStoreMeta::default();
        };
        match serde_json::from_str::<Value>(&raw)
            .map_err(|e| e.to_string())
            .and_then(|v| LibraryStoreMeta::parse(v).map_err(|e| e.to_string()))
        {
            Ok(meta) => meta,
            Err(e) => {
                debug!("Ignoring unreadable library meta: {}", e);
                LibraryStoreMeta::default()
            }
        }
    }

    pub(crate) fn write_meta(&self, meta: &LibraryStoreMeta) -> Result<(), LibraryError> {
        let raw = serde_json::to_string(meta)?;
        self.kv
            .set(LIBRARY_META_KEY, &raw)
            .map_err(|e| LibraryError::Storage(format!("{:#}", e)))
    }

    /// Permissive read: entries that fail validation are dropped, legacy
    /// placeholder skills are upgraded.
    pub(crate) fn read_items(&self) -> Vec<LibraryItem> {
        let Some(raw) = self.kv.get(LIBRARY_ITEMS_KEY) else {
            return Vec::new();
        };
        let entries = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                debug!("Library items slot is not an array; treating as empty");
                return Vec::new();
            }
            Err(e) => {
                debug!("Library items slot is not valid JSON: {}", e);
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .enumerate()
            .filter_map(|(i, entry)| match LibraryItem::parse(entry) {
                Ok(item) => Some(item),
                Err(e) => {
                    debug!("Dropping invalid library item at index {}: {}", i, e);
                    None
                }
            })
            .map(upgrade_legacy_skill)
            .collect()
    }

    pub(crate) fn write_items(&self, items: &[LibraryItem]) -> Result<(), LibraryError> {
        let raw = serde_json::to_string(items)?;
        self.kv
            .set(LIBRARY_ITEMS_KEY, &raw)
            .map_err(|e| LibraryError::Storage(format!("{:#}", e)))
    }

    pub(crate) fn emit_change(&self) {
        self.listeners.notify();
    }

    /// `now`, but never earlier than `previous` so `updatedAt` cannot go backwards.
    fn stamp(&self, previous: i64) -> i64 {
        self.clock.now_ms().max(previous)
    }

    // ---- queries -------------------------------------------------------------

    /// Filtered items sorted by `updatedAt` descending.
    pub fn list_items(&self, options: &ListOptions) -> Vec<LibraryItem> {
        let query = options
            .query
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());

        let mut items: Vec<LibraryItem> = self
            .read_items()
            .into_iter()
            .filter(|item| options.item_type.is_none_or(|t| item.item_type() == t))
            .filter(|item| options.include_archived || !item.archived)
            .filter(|item| !options.favorite_only || item.favorite)
            .filter(|item| match &query {
                Some(q) => item.search_text().contains(q.as_str()),
                None => true,
            })
            .collect();

        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        items
    }

    pub fn get_item(&self, id: &str) -> Option<LibraryItem> {
        self.read_items().into_iter().find(|item| item.id == id)
    }

    // ---- mutations -----------------------------------------------------------

    /// Strict write: the item is validated first and nothing is written if it fails.
    /// Replaces the item with the same id or appends it. `updatedAt` is left as given.
    pub fn upsert_item(&self, item: LibraryItem) -> Result<LibraryItem, LibraryError> {
        let parsed = item.validated()?;
        let mut items = self.read_items();
        match items.iter_mut().find(|existing| existing.id == parsed.id) {
            Some(slot) => *slot = parsed.clone(),
            None => items.push(parsed.clone()),
        }

        self.write_items(&items)?;
        debug!("Upserted {} {}", parsed.item_type(), parsed.id);
        self.emit_change();
        self.mirror(MirrorOp::Upsert(parsed.clone()));
        Ok(parsed)
    }

    pub fn delete_item(&self, id: &str) -> Result<(), LibraryError> {
        let items: Vec<LibraryItem> = self
            .read_items()
            .into_iter()
            .filter(|item| item.id != id)
            .collect();

        self.write_items(&items)?;
        debug!("Deleted {}", id);
        self.emit_change();
        self.mirror(MirrorOp::Delete(id.to_string()));
        Ok(())
    }

    /// Clone `id` under a fresh id with " Copy" appended to the title.
    pub fn duplicate_item(&self, id: &str) -> Result<Option<LibraryItem>, LibraryError> {
        let Some(source) = self.get_item(id) else {
            return Ok(None);
        };

        let timestamp = self.clock.now_ms();
        let mut duplicate = source;
        duplicate.id = generate_id(duplicate.item_type().as_str());
        duplicate.title = format!("{} Copy", duplicate.title);
        duplicate.favorite = false;
        duplicate.created_at = timestamp;
        duplicate.updated_at = timestamp;
        duplicate.last_used_at = timestamp;

        self.upsert_item(duplicate).map(Some)
    }

    /// Sets `lastUsedAt` only.
    pub fn touch_last_used(&self, id: &str) -> Result<Option<LibraryItem>, LibraryError> {
        let timestamp = self.clock.now_ms();
        self.update_one(id, MirrorOp::TouchLastUsed(id.to_string()), |item| {
            item.last_used_at = timestamp;
        })
    }

    pub fn toggle_favorite(&self, id: &str) -> Result<Option<LibraryItem>, LibraryError> {
        self.update_one(id, MirrorOp::ToggleFavorite(id.to_string()), |item| {
            item.favorite = !item.favorite;
            item.updated_at = self.stamp(item.updated_at);
        })
    }

    pub fn toggle_archived(&self, id: &str) -> Result<Option<LibraryItem>, LibraryError> {
        self.update_one(id, MirrorOp::ToggleArchived(id.to_string()), |item| {
            item.archived = !item.archived;
            item.updated_at = self.stamp(item.updated_at);
        })
    }

    /// Read-modify-write of the matching item. The collection is written, listeners
    /// notified and the op mirrored even when `id` is absent.
    fn update_one<F>(
        &self,
        id: &str,
        op: MirrorOp,
        change: F,
    ) -> Result<Option<LibraryItem>, LibraryError>
    where
        F: FnOnce(&mut LibraryItem),
    {
        let mut items = self.read_items();
        let updated = match items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                change(item);
                Some(item.clone())
            }
            None => None,
        };

        self.write_items(&items)?;
        debug!("Applied {} to {}", op.label(), id);
        self.emit_change();
        self.mirror(op);
        Ok(updated)
    }

    /// Trusted bulk load: every item must validate or nothing is written.
    pub fn replace_all_items(&self, items: Vec<LibraryItem>) -> Result<(), LibraryError> {
        let parsed = items
            .into_iter()
            .map(Validate::validated)
            .collect::<Result<Vec<_>, _>>()?;

        self.write_items(&parsed)?;
        debug!("Replaced library with {} items", parsed.len());
        self.emit_change();
        Ok(())
    }

    // ---- observers -----------------------------------------------------------

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    // ---- cloud mirror --------------------------------------------------------

    /// Install (or with `None`, remove) the mirror runtime.
    pub fn register_cloud_runtime(&self, runtime: Option<Arc<dyn CloudSyncRuntime>>) {
        if let Ok(mut slot) = self.runtime.write() {
            *slot = runtime;
        }
    }

    pub fn cloud_runtime(&self) -> Option<Arc<dyn CloudSyncRuntime>> {
        self.runtime.read().ok().and_then(|slot| slot.clone())
    }

    /// Fire-and-forget: spawn the mirror call on the ambient runtime and log any failure.
    /// Tasks are detached; dropping the store does not cancel them.
    fn mirror(&self, op: MirrorOp) {
        let Some(runtime) = self.cloud_runtime() else {
            return;
        };
        if !runtime.is_active() {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("No async runtime; skipping cloud mirror of {}", op.label());
            return;
        };
        let Ok(mut mirrors) = self.mirrors.lock() else {
            return;
        };
        mirrors.retain(|task| !task.is_finished());

        mirrors.push(handle.spawn(async move {
            if let Err(e) = op.apply(runtime.as_ref()).await {
                warn!(
                    "Cloud mirror {} for {} failed: {:#}",
                    op.label(),
                    op.item_id(),
                    e
                );
            }
        }));
    }

    /// Wait for every mirror call spawned so far.
    pub async fn drain_mirrors(&self) {
        let pending = match self.mirrors.lock() {
            Ok(mut mirrors) => std::mem::take(&mut *mirrors),
            Err(_) => return,
        };
        for task in pending {
            if let Err(e) = task.await {
                warn!("Cloud mirror task aborted: {}", e);
            }
        }
    }

    pub fn pending_mirrors(&self) -> usize {
        self.mirrors
            .lock()
            .map(|m| m.iter().filter(|t| !t.is_finished()).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::factory::create_skill_item;
    use crate::util::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store() -> LibraryStore {
        LibraryStore::with_clock(Arc::new(MemoryStore::new()), Arc::new(ManualClock::new(1_000)))
    }

    #[test]
    fn test_upsert_then_get_round_trips() {
        let store = store();
        let item = create_skill_item(store.now_ms());
        let saved = store.upsert_item(item.clone()).unwrap();
        assert_eq!(saved, item);
        assert_eq!(store.get_item(&item.id), Some(item));
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let store = store();
        let mut item = create_skill_item(store.now_ms());
        store.upsert_item(item.clone()).unwrap();
        item.title = "Renamed".to_string();
        store.upsert_item(item.clone()).unwrap();

        let all = store.list_items(&ListOptions::default());
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Renamed");
    }

    #[test]
    fn test_invalid_upsert_leaves_collection_unchanged() {
        let store = store();
        let good = create_skill_item(store.now_ms());
        store.upsert_item(good.clone()).unwrap();

        let mut bad = create_skill_item(store.now_ms());
        if let crate::schema::ItemPayload::Skill(p) = &mut bad.payload {
            p.skill_spec.steps.clear();
        }
        let err = store.upsert_item(bad.clone()).unwrap_err();
        assert!(matches!(err, LibraryError::Validation(_)));
        assert!(store.get_item(&bad.id).is_none());
        assert_eq!(store.list_items(&ListOptions::default()), vec![good]);
    }

    #[test]
    fn test_read_drops_invalid_entries() {
        let store = store();
        let item = create_skill_item(store.now_ms());
        let raw = serde_json::json!([item, { "id": "broken", "type": "skill" }]);
        store.kv().set(LIBRARY_ITEMS_KEY, &raw.to_string()).unwrap();

        let items = store.list_items(&ListOptions::default());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, item.id);
    }

    #[test]
    fn test_non_array_slot_reads_empty() {
        let store = store();
        store.kv().set(LIBRARY_ITEMS_KEY, "{\"nope\":1}").unwrap();
        assert!(store.list_items(&ListOptions::default()).is_empty());
    }

    #[test]
    fn test_toggle_favorite_twice_restores_value_and_advances_updated_at() {
        let store = store();
        let item = store.upsert_item(create_skill_item(store.now_ms())).unwrap();

        let once = store.toggle_favorite(&item.id).unwrap().unwrap();
        assert!(once.favorite);
        assert!(once.updated_at > item.updated_at);

        let twice = store.toggle_favorite(&item.id).unwrap().unwrap();
        assert!(!twice.favorite);
        assert!(twice.updated_at > once.updated_at);
    }

    #[test]
    fn test_toggle_never_moves_updated_at_backwards() {
        let clock = Arc::new(ManualClock::new(100));
        let store = LibraryStore::with_clock(Arc::new(MemoryStore::new()), clock.clone());
        let mut item = create_skill_item(store.now_ms());
        item.updated_at = 5_000;
        store.upsert_item(item.clone()).unwrap();

        let toggled = store.toggle_archived(&item.id).unwrap().unwrap();
        assert_eq!(toggled.updated_at, 5_000);
    }

    #[test]
    fn test_touch_last_used_changes_only_last_used_at() {
        let store = store();
        let item = store.upsert_item(create_skill_item(store.now_ms())).unwrap();
        let touched = store.touch_last_used(&item.id).unwrap().unwrap();
        assert!(touched.last_used_at > item.last_used_at);
        assert_eq!(touched.updated_at, item.updated_at);
        assert_eq!(touched.payload, item.payload);
    }

    #[test]
    fn test_toggle_on_missing_id_is_noop() {
        let store = store();
        let item = store.upsert_item(create_skill_item(store.now_ms())).unwrap();
        assert!(store.toggle_favorite("missing").unwrap().is_none());
        assert_eq!(store.list_items(&ListOptions::default()), vec![item]);
    }

    #[test]
    fn test_duplicate_resets_identity_and_timestamps() {
        let store = store();
        let mut source = create_skill_item(store.now_ms());
        source.favorite = true;
        let source = store.upsert_item(source).unwrap();

        let copy = store.duplicate_item(&source.id).unwrap().unwrap();
        assert_ne!(copy.id, source.id);
        assert!(copy.id.starts_with("skill-"));
        assert!(copy.title.ends_with(" Copy"));
        assert!(!copy.favorite);
        assert_eq!(copy.created_at, copy.updated_at);
        assert_eq!(copy.updated_at, copy.last_used_at);
        assert!(copy.created_at >= source.updated_at);
        assert_eq!(copy.payload, source.payload);
        assert!(store.duplicate_item("missing").unwrap().is_none());
    }

    #[test]
    fn test_delete_removes_item() {
        let store = store();
        let item = store.upsert_item(create_skill_item(store.now_ms())).unwrap();
        store.delete_item(&item.id).unwrap();
        assert!(store.get_item(&item.id).is_none());
        store.delete_item("missing").unwrap();
    }

    #[test]
    fn test_listeners_fire_on_each_mutation() {
        let store = store();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let id = store.subscribe(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        let item = store.upsert_item(create_skill_item(store.now_ms())).unwrap();
        store.toggle_favorite(&item.id).unwrap();
        store.touch_last_used(&item.id).unwrap();
        store.delete_item(&item.id).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 4);

        assert!(store.unsubscribe(id));
        store.replace_all_items(Vec::new()).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_failed_upsert_does_not_notify() {
        let store = store();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        store.subscribe(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        let mut bad = create_skill_item(store.now_ms());
        bad.title = "   ".to_string();
        assert!(store.upsert_item(bad).is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_replace_all_rejects_any_invalid_item() {
        let store = store();
        let existing = store.upsert_item(create_skill_item(store.now_ms())).unwrap();

        let mut bad = create_skill_item(store.now_ms());
        bad.created_at = 0;
        let result = store.replace_all_items(vec![create_skill_item(store.now_ms()), bad]);
        assert!(result.is_err());
        assert_eq!(store.list_items(&ListOptions::default()), vec![existing]);
    }

    #[test]
    fn test_unavailable_storage_degrades_to_empty() {
        let store = LibraryStore::new(Arc::new(crate::kv::UnavailableStore));
        let item = store.upsert_item(create_skill_item(store.now_ms())).unwrap();
        assert!(store.get_item(&item.id).is_none());
        assert!(store.list_items(&ListOptions::default()).is_empty());
    }
}
