//! File-backed session store.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{SessionKey, SessionRecord, SessionStore};
use crate::error::{BridgeError, Result};

/// Stores each session record as `<dir>/<key>.json`.
///
/// Writes go to a uniquely named temp file in the same directory and are
/// renamed over the target, so readers see either the old or the new record.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Create the store, creating `dir` if it doesn't exist.
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn file_path(&self, key: &SessionKey) -> PathBuf {
        self.dir
            .join(format!("{}.json", sanitize_key(&key.to_string())))
    }
}

/// Percent-encode characters that are problematic in filenames.
///
/// Clear identifiers end up here when redaction is disabled, so `+`, `:` and
/// path separators must be handled.
fn sanitize_key(key: &str) -> String {
    let mut result = String::with_capacity(key.len() * 3);
    for c in key.chars() {
        match c {
            '/' => result.push_str("%2F"),
            '\\' => result.push_str("%5C"),
            ':' => result.push_str("%3A"),
            '*' => result.push_str("%2A"),
            '?' => result.push_str("%3F"),
            '"' => result.push_str("%22"),
            '<' => result.push_str("%3C"),
            '>' => result.push_str("%3E"),
            '|' => result.push_str("%7C"),
            '%' => result.push_str("%25"),
            c => result.push(c),
        }
    }
    result
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, key: &SessionKey) -> Result<Option<SessionRecord>> {
        let path = self.file_path(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let record = serde_json::from_str(&content).map_err(|e| {
                    BridgeError::Session(format!("corrupt session file {}: {}", path.display(), e))
                })?;
                Ok(Some(record))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BridgeError::Session(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn put(&self, key: &SessionKey, record: SessionRecord) -> Result<()> {
        let path = self.file_path(key);
        let content = serde_json::to_string_pretty(&record)?;
        let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));

        tokio::fs::write(&tmp, content).await.map_err(|e| {
            BridgeError::Session(format!("failed to write {}: {}", tmp.display(), e))
        })?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                warn!(path = %tmp.display(), error = %cleanup, "failed to remove temp session file");
            }
            return Err(BridgeError::Session(format!(
                "failed to replace {}: {}",
                path.display(),
                e
            )));
        }
        debug!(path = %path.display(), "session record written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("abc:def"), "abc%3Adef");
        assert_eq!(sanitize_key("a/b\\c"), "a%2Fb%5Cc");
        assert_eq!(sanitize_key("100%"), "100%25");
        assert_eq!(sanitize_key("+6512345678"), "+6512345678");
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().to_path_buf()).unwrap();
        let key = SessionKey::new("+6512345678", "chan/1");

        assert!(store.get(&key).await.unwrap().is_none());

        let mut record = SessionRecord::default();
        record.bind("+6512345678", "chan/1");
        record.touch(123, 1800);
        store.put(&key, record.clone()).await.unwrap();

        assert_eq!(store.get(&key).await.unwrap(), Some(record));
        assert!(dir.path().join("+6512345678%3Achan%2F1.json").exists());
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let key = SessionKey::new("u", "s");
        {
            let store = FileSessionStore::new(dir.path().to_path_buf()).unwrap();
            let mut record = SessionRecord::default();
            record.bind("+1", "c");
            store.put(&key, record).await.unwrap();
        }
        let store = FileSessionStore::new(dir.path().to_path_buf()).unwrap();
        let record = store.get(&key).await.unwrap().unwrap();
        assert_eq!(record.clear_session_id.as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn test_concurrent_put_and_get_never_see_partial_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(FileSessionStore::new(dir.path().to_path_buf()).unwrap());
        let key = SessionKey::new("u", "s");

        let mut record = SessionRecord::default();
        record.bind("+6512345678", "channel-with-a-long-identifier");
        store.put(&key, record.clone()).await.unwrap();

        let writer = {
            let store = std::sync::Arc::clone(&store);
            let key = key.clone();
            tokio::spawn(async move {
                for i in 0..300 {
                    let mut next = record.clone();
                    next.timestamp = Some(i);
                    store.put(&key, next).await.unwrap();
                }
            })
        };

        for _ in 0..300 {
            let loaded = store.get(&key).await.unwrap().unwrap();
            assert_eq!(loaded.clear_user_id.as_deref(), Some("+6512345678"));
        }
        writer.await.unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {:?}", leftovers);
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("u%3As.json"), "not json").unwrap();
        let err = store.get(&SessionKey::new("u", "s")).await.unwrap_err();
        assert!(matches!(err, BridgeError::Session(_)));
    }
}
