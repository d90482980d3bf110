//! Registry of configured wikis and their sessions.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use wikimcp_core::{ApiError, Config, Error, WikiConfig};

use crate::dispatch::RequestDispatcher;
use crate::http::HttpClient;
use crate::session::SessionManager;

/// Configured wikis, the current selection, and one session per wiki.
///
/// Configurations are handed out as `Arc` snapshots: replacing a wiki's
/// configuration or switching the current wiki never changes a snapshot
/// that a request already holds.
pub struct WikiRegistry {
    http: HttpClient,
    default_wiki: String,
    cache_ttl: Duration,
    wikis: RwLock<BTreeMap<String, Arc<WikiConfig>>>,
    current: RwLock<String>,
    sessions: Mutex<HashMap<String, Arc<SessionManager>>>,
}

impl WikiRegistry {
    /// Build a registry (and its HTTP client) from configuration.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let http = HttpClient::new(&config.http)?;
        Ok(Self::new(http, config))
    }

    /// Build a registry that shares an existing HTTP client.
    pub fn new(http: HttpClient, config: &Config) -> Self {
        let wikis = config
            .wikis
            .iter()
            .map(|(id, wiki)| (id.clone(), Arc::new(wiki.clone())))
            .collect();

        Self {
            http,
            default_wiki: config.default_wiki.clone(),
            cache_ttl: Duration::from_secs(config.http.auth_cache_secs),
            wikis: RwLock::new(wikis),
            current: RwLock::new(config.default_wiki.clone()),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Shared HTTP client.
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Id of the current wiki.
    pub async fn current_id(&self) -> String {
        self.current.read().await.clone()
    }

    /// Snapshot of the current wiki's configuration.
    pub async fn current(&self) -> Result<Arc<WikiConfig>, ApiError> {
        let id = self.current.read().await;
        self.get(&id)
            .await
            .ok_or_else(|| ApiError::UnknownWiki(id.clone()))
    }

    /// Snapshot of a wiki's configuration.
    pub async fn get(&self, id: &str) -> Option<Arc<WikiConfig>> {
        self.wikis.read().await.get(id).cloned()
    }

    /// Whether `id` is configured.
    pub async fn contains(&self, id: &str) -> bool {
        self.wikis.read().await.contains_key(id)
    }

    /// All configured wikis.
    pub async fn all_wikis(&self) -> BTreeMap<String, Arc<WikiConfig>> {
        self.wikis.read().await.clone()
    }

    /// Make `id` the current wiki.
    pub async fn set_current_wiki(&self, id: &str) -> Result<(), ApiError> {
        if !self.contains(id).await {
            return Err(ApiError::UnknownWiki(id.to_string()));
        }
        *self.current.write().await = id.to_string();
        info!(wiki = %id, "Current wiki changed");
        Ok(())
    }

    /// Insert or replace a wiki's configuration (in memory only).
    ///
    /// Any cached session for `id` is dropped; the next request logs in
    /// again with the new credentials.
    pub async fn update_wiki_config(&self, id: &str, mut wiki: WikiConfig) {
        wiki.normalize();
        self.wikis
            .write()
            .await
            .insert(id.to_string(), Arc::new(wiki));
        self.sessions.lock().await.remove(id);
        debug!(wiki = %id, "Wiki config updated");
    }

    /// Switch back to the configured default wiki.
    pub async fn reset(&self) {
        *self.current.write().await = self.default_wiki.clone();
    }

    /// Session manager for `id`, created on first use.
    pub async fn session(&self, id: &str) -> Result<Arc<SessionManager>, ApiError> {
        let wiki = self
            .get(id)
            .await
            .ok_or_else(|| ApiError::UnknownWiki(id.to_string()))?;

        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(id.to_string()).or_insert_with(|| {
            debug!(wiki = %id, "Creating session");
            Arc::new(SessionManager::new(self.http.clone(), &wiki).with_cache_ttl(self.cache_ttl))
        });
        Ok(session.clone())
    }

    /// Dispatcher bound to the current wiki as of this call.
    pub async fn dispatcher(&self) -> Result<RequestDispatcher, ApiError> {
        let id = self.current_id().await;
        self.dispatcher_for(&id).await
    }

    /// Dispatcher bound to `id`.
    pub async fn dispatcher_for(&self, id: &str) -> Result<RequestDispatcher, ApiError> {
        let wiki = self
            .get(id)
            .await
            .ok_or_else(|| ApiError::UnknownWiki(id.to_string()))?;
        let session = self.session(id).await?;
        Ok(RequestDispatcher::new(self.http.clone(), wiki, session))
    }
}

impl std::fmt::Debug for WikiRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikiRegistry")
            .field("default_wiki", &self.default_wiki)
            .field("cache_ttl", &self.cache_ttl)
            .finish_non_exhaustive()
    }
}
