use crate::errors::{LoadError, PersistenceError};
use crate::persistence::local::LocalSaveStore;
use crate::persistence::record::SaveRecord;
use crate::persistence::remote::RemoteSaveStore;
use async_trait::async_trait;
use std::future::{pending, Future};
use std::path::PathBuf;

/// Anything that can hold a save record under a player key.
#[async_trait]
pub trait SaveBackend: Send + Sync {
    async fn save(&self, key: &str, record: &SaveRecord) -> Result<(), PersistenceError>;
    async fn load(&self, key: &str) -> Result<Option<SaveRecord>, PersistenceError>;
}

#[async_trait]
impl SaveBackend for RemoteSaveStore {
    async fn save(&self, key: &str, record: &SaveRecord) -> Result<(), PersistenceError> {
        self.put(key, record).await
    }

    async fn load(&self, key: &str) -> Result<Option<SaveRecord>, PersistenceError> {
        self.get(key).await
    }
}

/// Where a save ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveTarget {
    Remote,
    Local(PathBuf),
    /// The remote store failed and the record was written locally instead.
    LocalFallback { path: PathBuf, reason: String },
}

/// Where a loaded record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveSource {
    Remote,
    Local,
}

/// Saves to the remote store when one is configured, always keeping the local store as
/// the fallback. Only local failures reach the caller.
pub struct PersistenceGateway {
    local: LocalSaveStore,
    remote: Option<Box<dyn SaveBackend>>,
}

impl PersistenceGateway {
    pub fn local_only(local: LocalSaveStore) -> Self {
        Self {
            local,
            remote: None,
        }
    }

    pub fn with_remote(local: LocalSaveStore, remote: Box<dyn SaveBackend>) -> Self {
        Self {
            local,
            remote: Some(remote),
        }
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub async fn save(&self, key: &str, record: &SaveRecord) -> Result<SaveTarget, PersistenceError> {
        self.save_until(key, record, pending()).await
    }

    /// Like [`save`](Self::save), but gives up on the remote store as soon as `abort`
    /// completes and writes locally instead.
    pub async fn save_until<F>(
        &self,
        key: &str,
        record: &SaveRecord,
        abort: F,
    ) -> Result<SaveTarget, PersistenceError>
    where
        F: Future<Output = ()>,
    {
        let reason = match &self.remote {
            Some(remote) => {
                let attempt = tokio::select! {
                    result = remote.save(key, record) => result,
                    _ = abort => Err(PersistenceError::Aborted),
                };
                match attempt {
                    Ok(()) => return Ok(SaveTarget::Remote),
                    Err(err) => {
                        tracing::warn!(error = %err, "remote save failed, saving locally");
                        Some(err.to_string())
                    }
                }
            }
            None => None,
        };

        let path = self.local.save(key, record)?;
        Ok(match reason {
            Some(reason) => SaveTarget::LocalFallback { path, reason },
            None => SaveTarget::Local(path),
        })
    }

    pub async fn load(&self, key: &str) -> Result<(SaveRecord, SaveSource), LoadError> {
        self.load_until(key, pending()).await
    }

    /// Remote first when configured, then the local store. When both hold a record the
    /// newer `saved_at` wins, so a local fallback written while the remote was down is
    /// not shadowed by an older remote copy. `NoSaveFound` only when neither has one.
    pub async fn load_until<F>(&self, key: &str, abort: F) -> Result<(SaveRecord, SaveSource), LoadError>
    where
        F: Future<Output = ()>,
    {
        let remote_record = match &self.remote {
            Some(remote) => {
                let attempt = tokio::select! {
                    result = remote.load(key) => result,
                    _ = abort => Err(PersistenceError::Aborted),
                };
                match attempt {
                    Ok(record) => record,
                    Err(err) => {
                        tracing::warn!(error = %err, "remote load failed, trying local");
                        None
                    }
                }
            }
            None => None,
        };

        let local_record = match self.local.load(key) {
            Ok(record) => record,
            Err(err) if remote_record.is_some() => {
                tracing::warn!(error = %err, "local save unreadable, using the remote one");
                None
            }
            Err(err) => return Err(err.into()),
        };

        match (remote_record, local_record) {
            (Some(remote), Some(local)) if local.saved_at > remote.saved_at => {
                tracing::info!(key, "local save is newer than the remote one");
                Ok((local, SaveSource::Local))
            }
            (Some(remote), _) => Ok((remote, SaveSource::Remote)),
            (None, Some(local)) => Ok((local, SaveSource::Local)),
            (None, None) => Err(LoadError::NoSaveFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::record::{SavedPosition, SAVE_FORMAT_VERSION};
    use crate::persistence::remote::test_server::serve_once;
    use chrono::DateTime;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;

    fn record(x: usize) -> SaveRecord {
        SaveRecord {
            version: SAVE_FORMAT_VERSION,
            position: SavedPosition {
                x,
                y: 1,
                map_id: "overworld".to_string(),
            },
            party: vec![],
            inventory: Default::default(),
            defeated_trainers: vec![],
            saved_at: None,
        }
    }

    fn record_at(x: usize, secs: i64) -> SaveRecord {
        SaveRecord {
            saved_at: DateTime::from_timestamp(secs, 0),
            ..record(x)
        }
    }

    /// In-memory remote that can be told to fail or hang.
    #[derive(Default)]
    struct FakeRemote {
        stored: Mutex<Option<SaveRecord>>,
        fail: AtomicBool,
        hang: bool,
    }

    #[async_trait]
    impl SaveBackend for FakeRemote {
        async fn save(&self, _key: &str, record: &SaveRecord) -> Result<(), PersistenceError> {
            if self.hang {
                pending::<()>().await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(PersistenceError::RemoteStatus(503));
            }
            *self.stored.lock().unwrap() = Some(record.clone());
            Ok(())
        }

        async fn load(&self, _key: &str) -> Result<Option<SaveRecord>, PersistenceError> {
            if self.hang {
                pending::<()>().await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(PersistenceError::Timeout);
            }
            Ok(self.stored.lock().unwrap().clone())
        }
    }

    /// Lets a test flip the remote's health while the gateway owns it.
    #[async_trait]
    impl SaveBackend for Arc<FakeRemote> {
        async fn save(&self, key: &str, record: &SaveRecord) -> Result<(), PersistenceError> {
            self.as_ref().save(key, record).await
        }

        async fn load(&self, key: &str) -> Result<Option<SaveRecord>, PersistenceError> {
            self.as_ref().load(key).await
        }
    }

    fn gateway(dir: &TempDir, remote: FakeRemote) -> PersistenceGateway {
        PersistenceGateway::with_remote(LocalSaveStore::new(dir.path()), Box::new(remote))
    }

    #[tokio::test]
    async fn test_local_only_round_trip() {
        let dir = TempDir::new().unwrap();
        let gateway = PersistenceGateway::local_only(LocalSaveStore::new(dir.path()));

        let target = gateway.save("player", &record(2)).await.unwrap();
        let (loaded, source) = gateway.load("player").await.unwrap();

        assert_eq!(target, SaveTarget::Local(dir.path().join("player.json")));
        assert_eq!(loaded, record(2));
        assert_eq!(source, SaveSource::Local);
    }

    #[tokio::test]
    async fn test_remote_success_skips_local() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(&dir, FakeRemote::default());

        let target = gateway.save("player", &record(2)).await.unwrap();
        let (loaded, source) = gateway.load("player").await.unwrap();

        assert_eq!(target, SaveTarget::Remote);
        assert_eq!(loaded, record(2));
        assert_eq!(source, SaveSource::Remote);
        assert!(!dir.path().join("player.json").exists());
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back_to_local() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(
            &dir,
            FakeRemote {
                fail: AtomicBool::new(true),
                ..Default::default()
            },
        );

        let target = gateway.save("player", &record(3)).await.unwrap();
        let (loaded, source) = gateway.load("player").await.unwrap();

        assert!(matches!(target, SaveTarget::LocalFallback { ref path, .. } if path.exists()));
        assert_eq!(loaded, record(3));
        assert_eq!(source, SaveSource::Local);
    }

    #[tokio::test]
    async fn test_abort_saves_locally_at_once() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(
            &dir,
            FakeRemote {
                hang: true,
                ..Default::default()
            },
        );

        let target = gateway
            .save_until("player", &record(4), async {})
            .await
            .unwrap();

        assert_eq!(
            target,
            SaveTarget::LocalFallback {
                path: dir.path().join("player.json"),
                reason: PersistenceError::Aborted.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_remote_store_falls_back() {
        let dir = TempDir::new().unwrap();
        let remote = RemoteSaveStore::new("http://127.0.0.1:1", "secret", Duration::from_secs(2));
        let gateway = PersistenceGateway::with_remote(LocalSaveStore::new(dir.path()), Box::new(remote));

        let target = gateway.save("player", &record(5)).await.unwrap();

        assert!(matches!(target, SaveTarget::LocalFallback { .. }));
    }

    #[tokio::test]
    async fn test_empty_remote_uses_local_save() {
        let dir = TempDir::new().unwrap();
        LocalSaveStore::new(dir.path()).save("player", &record(6)).unwrap();
        let (base, _head) = serve_once("404 Not Found", String::new()).await;
        let remote = RemoteSaveStore::new(&base, "secret", Duration::from_secs(5));
        let gateway = PersistenceGateway::with_remote(LocalSaveStore::new(dir.path()), Box::new(remote));

        let (loaded, source) = gateway.load("player").await.unwrap();

        assert_eq!(loaded, record(6));
        assert_eq!(source, SaveSource::Local);
    }

    #[tokio::test]
    async fn test_nothing_saved_anywhere() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(
            &dir,
            FakeRemote {
                fail: AtomicBool::new(true),
                ..Default::default()
            },
        );

        let result = gateway.load("player").await;

        assert!(matches!(result, Err(LoadError::NoSaveFound)));
        assert_eq!(
            result.map(|_| ()).unwrap_err().to_string(),
            "No saved game found."
        );
    }

    #[tokio::test]
    async fn test_newer_local_fallback_beats_stale_remote() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let remote = Arc::new(FakeRemote::default());
        let gateway = PersistenceGateway::with_remote(LocalSaveStore::new(dir.path()), Box::new(remote.clone()));

        // Act: first save reaches the remote, the second lands locally while it is down
        let first = gateway.save("player", &record_at(1, 1_000)).await.unwrap();
        remote.fail.store(true, Ordering::SeqCst);
        let second = gateway.save("player", &record_at(2, 2_000)).await.unwrap();
        remote.fail.store(false, Ordering::SeqCst);
        let (loaded, source) = gateway.load("player").await.unwrap();

        // Assert
        assert_eq!(first, SaveTarget::Remote);
        assert!(matches!(second, SaveTarget::LocalFallback { .. }));
        assert_eq!(loaded, record_at(2, 2_000));
        assert_eq!(source, SaveSource::Local);
    }

    #[tokio::test]
    async fn test_newer_remote_beats_old_local_save() {
        let dir = TempDir::new().unwrap();
        LocalSaveStore::new(dir.path()).save("player", &record_at(1, 1_000)).unwrap();
        let remote = FakeRemote::default();
        *remote.stored.lock().unwrap() = Some(record_at(2, 2_000));
        let gateway = gateway(&dir, remote);

        let (loaded, source) = gateway.load("player").await.unwrap();

        assert_eq!(loaded, record_at(2, 2_000));
        assert_eq!(source, SaveSource::Remote);
    }
}
