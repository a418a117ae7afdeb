//! Remote document store: the RPC contract, an HTTP client, and an in-memory
//! stand-in that applies the same server-side rules.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use super::document::{from_remote, to_remote, RemoteDocument};
use crate::schema::LibraryItem;
use crate::util::{Clock, SecretString, SystemClock};

pub const LIST_ITEMS: &str = "libraryItems:listLibraryItems";
pub const UPSERT_ITEM: &str = "libraryItems:upsertLibraryItem";
pub const DELETE_ITEM: &str = "libraryItems:deleteLibraryItem";
pub const TOUCH_LAST_USED: &str = "libraryItems:touchLastUsed";
pub const TOGGLE_FAVORITE: &str = "libraryItems:toggleFavorite";
pub const TOGGLE_ARCHIVED: &str = "libraryItems:toggleArchived";

/// All calls are scoped server-side to the identity behind `token`.
#[async_trait]
pub trait RemoteLibrary: Send + Sync {
    /// Fails if any returned document does not validate.
    async fn list_items(
        &self,
        token: Option<&SecretString>,
        include_archived: bool,
    ) -> Result<Vec<LibraryItem>>;

    async fn upsert_item(&self, token: Option<&SecretString>, item: &LibraryItem) -> Result<()>;

    async fn delete_item(&self, token: Option<&SecretString>, id: &str) -> Result<()>;

    async fn touch_last_used(&self, token: Option<&SecretString>, id: &str) -> Result<()>;

    async fn toggle_favorite(&self, token: Option<&SecretString>, id: &str) -> Result<()>;

    async fn toggle_archived(&self, token: Option<&SecretString>, id: &str) -> Result<()>;
}

fn parse_documents(value: Value) -> Result<Vec<LibraryItem>> {
    let docs: Vec<RemoteDocument> =
        serde_json::from_value(value).context("Remote list returned malformed documents")?;
    docs.into_iter()
        .map(|doc| {
            let id = doc.id.clone();
            from_remote(doc).with_context(|| format!("Remote document {} is invalid", id))
        })
        .collect()
}

// ============================================================================
// HTTP client
// ============================================================================

pub struct HttpRemoteLibrary {
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct FunctionCall<'a> {
    path: &'a str,
    args: Value,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum FunctionResult {
    Success {
        #[serde(default)]
        value: Value,
    },
    Error {
        #[serde(rename = "errorMessage", default)]
        error_message: String,
    },
}

impl HttpRemoteLibrary {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            bail!("Remote sync URL is empty");
        }
        Ok(Self {
            base_url,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .context("failed to build HTTP client")?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call(
        &self,
        kind: &str,
        path: &str,
        args: Value,
        token: Option<&SecretString>,
    ) -> Result<Value> {
        let url = format!("{}/api/{}", self.base_url, kind);
        debug!("Calling remote {} {}", kind, path);

        let mut request = self.client.post(&url).json(&FunctionCall {
            path,
            args,
            format: "json",
        });
        if let Some(token) = token {
            request = request.bearer_auth(token.expose());
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!("Remote {} error {}: {}", path, status, error_text);
        }

        let result: FunctionResult = response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", path))?;

        match result {
            FunctionResult::Success { value } => Ok(value),
            FunctionResult::Error { error_message } => {
                bail!("Remote {} failed: {}", path, error_message)
            }
        }
    }

    async fn mutation(&self, path: &str, args: Value, token: Option<&SecretString>) -> Result<()> {
        self.call("mutation", path, args, token).await.map(|_| ())
    }
}

#[async_trait]
impl RemoteLibrary for HttpRemoteLibrary {
    async fn list_items(
        &self,
        token: Option<&SecretString>,
        include_archived: bool,
    ) -> Result<Vec<LibraryItem>> {
        let value = self
            .call(
                "query",
                LIST_ITEMS,
                json!({ "includeArchived": include_archived }),
                token,
            )
            .await?;
        parse_documents(value)
    }

    async fn upsert_item(&self, token: Option<&SecretString>, item: &LibraryItem) -> Result<()> {
        let doc = serde_json::to_value(to_remote(item)).context("Failed to encode item")?;
        self.mutation(UPSERT_ITEM, json!({ "item": doc }), token).await
    }

    async fn delete_item(&self, token: Option<&SecretString>, id: &str) -> Result<()> {
        self.mutation(DELETE_ITEM, json!({ "id": id }), token).await
    }

    async fn touch_last_used(&self, token: Option<&SecretString>, id: &str) -> Result<()> {
        self.mutation(TOUCH_LAST_USED, json!({ "id": id }), token).await
    }

    async fn toggle_favorite(&self, token: Option<&SecretString>, id: &str) -> Result<()> {
        self.mutation(TOGGLE_FAVORITE, json!({ "id": id }), token).await
    }

    async fn toggle_archived(&self, token: Option<&SecretString>, id: &str) -> Result<()> {
        self.mutation(TOGGLE_ARCHIVED, json!({ "id": id }), token).await
    }
}

// ============================================================================
// In-memory remote
// ============================================================================

#[derive(Default)]
struct InMemoryState {
    docs: Vec<RemoteDocument>,
    failing_ids: Vec<String>,
    fail_list: bool,
    calls: Vec<String>,
}

/// Single-user remote kept in memory. Requires a token on every call, ignores
/// upserts older than the stored copy, and stamps its own clock on the narrow
/// mutations, like the hosted store does.
pub struct InMemoryRemote {
    state: Mutex<InMemoryState>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(InMemoryState::default()),
            clock,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, InMemoryState>> {
        self.state
            .lock()
            .map_err(|_| anyhow::anyhow!("in-memory remote lock poisoned"))
    }

    /// Store `item` as-is, bypassing the newer-wins check.
    pub fn seed(&self, item: &LibraryItem) -> Result<()> {
        let mut state = self.lock()?;
        state.docs.retain(|d| d.id != item.id);
        state.docs.push(to_remote(item));
        Ok(())
    }

    /// Store a raw document, valid or not.
    pub fn seed_document(&self, doc: RemoteDocument) -> Result<()> {
        let mut state = self.lock()?;
        state.docs.retain(|d| d.id != doc.id);
        state.docs.push(doc);
        Ok(())
    }

    pub fn document(&self, id: &str) -> Option<RemoteDocument> {
        let state = self.lock().ok()?;
        state.docs.iter().find(|d| d.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|s| s.docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every upsert of `id` fail.
    pub fn fail_upserts_for(&self, id: &str) {
        if let Ok(mut state) = self.lock() {
            state.failing_ids.push(id.to_string());
        }
    }

    pub fn set_fail_list(&self, fail: bool) {
        if let Ok(mut state) = self.lock() {
            state.fail_list = fail;
        }
    }

    /// Function paths called so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    fn begin(&self, path: &str, token: Option<&SecretString>) -> Result<std::sync::MutexGuard<'_, InMemoryState>> {
        let mut state = self.lock()?;
        state.calls.push(path.to_string());
        if token.is_none_or(|t| t.is_empty()) {
            bail!("Authentication required");
        }
        Ok(state)
    }

    fn patch<F>(&self, path: &str, token: Option<&SecretString>, id: &str, change: F) -> Result<()>
    where
        F: FnOnce(&mut RemoteDocument, i64),
    {
        let now = self.clock.now_ms();
        let mut state = self.begin(path, token)?;
        if let Some(doc) = state.docs.iter_mut().find(|d| d.id == id) {
            change(doc, now);
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteLibrary for InMemoryRemote {
    async fn list_items(
        &self,
        token: Option<&SecretString>,
        include_archived: bool,
    ) -> Result<Vec<LibraryItem>> {
        let mut docs = {
            let state = self.begin(LIST_ITEMS, token)?;
            if state.fail_list {
                bail!("Remote {} failed: list unavailable", LIST_ITEMS);
            }
            state.docs.clone()
        };
        if !include_archived {
            docs.retain(|d| !d.archived);
        }
        docs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        parse_documents(serde_json::to_value(docs)?)
    }

    async fn upsert_item(&self, token: Option<&SecretString>, item: &LibraryItem) -> Result<()> {
        let mut state = self.begin(UPSERT_ITEM, token)?;
        if state.failing_ids.iter().any(|id| *id == item.id) {
            bail!("Remote {} failed for {}", UPSERT_ITEM, item.id);
        }
        let incoming = to_remote(item);
        match state.docs.iter_mut().find(|d| d.id == item.id) {
            Some(existing) if existing.updated_at > incoming.updated_at => {}
            Some(existing) => *existing = incoming,
            None => state.docs.push(incoming),
        }
        Ok(())
    }

    async fn delete_item(&self, token: Option<&SecretString>, id: &str) -> Result<()> {
        let mut state = self.begin(DELETE_ITEM, token)?;
        state.docs.retain(|d| d.id != id);
        Ok(())
    }

    async fn touch_last_used(&self, token: Option<&SecretString>, id: &str) -> Result<()> {
        self.patch(TOUCH_LAST_USED, token, id, |doc, now| {
            doc.last_used_at = now;
            doc.updated_at = now;
        })
    }

    async fn toggle_favorite(&self, token: Option<&SecretString>, id: &str) -> Result<()> {
        self.patch(TOGGLE_FAVORITE, token, id, |doc, now| {
            doc.favorite = !doc.favorite;
            doc.updated_at = now;
        })
    }

    async fn toggle_archived(&self, token: Option<&SecretString>, id: &str) -> Result<()> {
        self.patch(TOGGLE_ARCHIVED, token, id, |doc, now| {
            doc.archived = !doc.archived;
            doc.updated_at = now;
        })
    }
}
