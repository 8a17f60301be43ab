//! Session module - clear-identifier storage
//!
//! The session store is the only place the clear msisdn and channel id survive
//! once identifiers are hashed. Losing a record makes replies to that session
//! impossible.
//!
//! Two implementations are provided:
//! - [`MemorySessionStore`]: process-local map, for tests and single-instance use
//! - [`FileSessionStore`]: one JSON file per session, survives restarts
//!
//! # Example
//!
//! ```
//! use chatapps_bridge::session::{MemorySessionStore, SessionKey, SessionRecord, SessionStore};
//!
//! # tokio_test::block_on(async {
//! let store = MemorySessionStore::new();
//! let key = SessionKey::new("hashed-user", "hashed-session");
//!
//! let mut record = SessionRecord::default();
//! record.bind("+6512345678", "channel-1");
//! store.put(&key, record).await.unwrap();
//!
//! let loaded = store.get(&key).await.unwrap().unwrap();
//! assert_eq!(loaded.clear_user_id.as_deref(), Some("+6512345678"));
//! # })
//! ```

mod file;
pub mod types;

pub use file::FileSessionStore;
pub use types::{Binding, SessionKey, SessionRecord, Touch};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::{Config, SessionBackend};
use crate::error::Result;

/// Key-value storage for session records.
///
/// No transactional guarantee is made across a `get` followed by a `put`;
/// concurrent writers for the same key race and the last write wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the record for `key`, if one exists.
    async fn get(&self, key: &SessionKey) -> Result<Option<SessionRecord>>;

    /// Insert or replace the record for `key`.
    async fn put(&self, key: &SessionKey, record: SessionRecord) -> Result<()>;
}

/// Create-or-fetch: returns the stored record or an empty one.
pub async fn fetch_or_default(store: &dyn SessionStore, key: &SessionKey) -> Result<SessionRecord> {
    Ok(store.get(key).await?.unwrap_or_default())
}

/// Build the store selected by `session.backend`.
pub fn store_from_config(config: &Config) -> Result<Arc<dyn SessionStore>> {
    match config.session.backend {
        SessionBackend::Memory => Ok(Arc::new(MemorySessionStore::new())),
        SessionBackend::File => Ok(Arc::new(FileSessionStore::new(config.session_path())?)),
    }
}

/// In-memory session store.
///
/// Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    records: Arc<RwLock<HashMap<SessionKey, SessionRecord>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &SessionKey) -> Result<Option<SessionRecord>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn put(&self, key: &SessionKey, record: SessionRecord) -> Result<()> {
        self.records.write().await.insert(key.clone(), record);
        Ok(())
    }
}
