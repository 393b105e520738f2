//! The persistent session store: sole durable owner of the token, the session
//! record, the RSVP side-map and the fallback cookie. In-memory holders keep
//! read-through copies only and re-resolve from here after a reload.

use crate::session::model::SessionRecord;
use crate::storage::{
    cookie::TOKEN_COOKIE_MAX_AGE_SECONDS, CookieJar, Storage, StorageError, StorageEvent, RSVP_KEY,
    SESSION_KEY, TOKEN_KEY,
};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};

/// Where [`SessionStore::persist_token`] managed to put the token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenPersistence {
    Storage,
    Cookie,
    Failed,
}

#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    cookies: CookieJar,
}

impl SessionStore {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, cookies: CookieJar) -> Self {
        Self { storage, cookies }
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Change feed for the underlying storage.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.storage.subscribe()
    }

    /// Reads the canonical token key; empty values read as absent.
    ///
    /// # Errors
    /// Returns an error if storage cannot be read.
    pub fn read_token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.storage.get(TOKEN_KEY)?.filter(|token| !token.is_empty()))
    }

    /// Reads the raw session record text.
    ///
    /// # Errors
    /// Returns an error if storage cannot be read.
    pub fn read_session_raw(&self) -> Result<Option<String>, StorageError> {
        self.storage.get(SESSION_KEY)
    }

    #[must_use]
    pub fn cookie_token(&self, now: DateTime<Utc>) -> Option<String> {
        self.cookies.get(TOKEN_KEY, now)
    }

    /// Writes the canonical token key only, without any fallback.
    ///
    /// # Errors
    /// Returns an error if storage rejects the write.
    pub fn write_token_key(&self, token: &str) -> Result<(), StorageError> {
        self.storage.set(TOKEN_KEY, token)
    }

    /// Persists a token to the canonical key and verifies it by reading it
    /// back. A failed write or an empty read-back falls back to the cookie.
    #[instrument(skip(self, token))]
    pub fn persist_token(&self, token: &str, now: DateTime<Utc>) -> TokenPersistence {
        if token.is_empty() {
            warn!("attempted to persist an empty token");
            return TokenPersistence::Failed;
        }

        match self
            .storage
            .set(TOKEN_KEY, token)
            .and_then(|()| self.storage.get(TOKEN_KEY))
        {
            Ok(Some(saved)) if saved == token => {
                debug!("token saved to storage");
                TokenPersistence::Storage
            }
            Ok(Some(_)) => {
                error!("token read back from storage differs from the one written");
                TokenPersistence::Storage
            }
            Ok(None) => {
                error!("token missing from storage right after saving it");
                self.persist_token_cookie(token, now)
            }
            Err(err) => {
                error!("storage error while saving token: {}", err);
                self.persist_token_cookie(token, now)
            }
        }
    }

    fn persist_token_cookie(&self, token: &str, now: DateTime<Utc>) -> TokenPersistence {
        match self
            .cookies
            .set(TOKEN_KEY, token, TOKEN_COOKIE_MAX_AGE_SECONDS, now)
        {
            Ok(()) => {
                info!("token stored in cookie fallback");
                TokenPersistence::Cookie
            }
            Err(err) => {
                error!("cookie fallback also failed: {}", err);
                TokenPersistence::Failed
            }
        }
    }

    /// Removes the canonical token, the session record and the cookie.
    /// Each removal is attempted even if an earlier one fails.
    #[instrument(skip(self))]
    pub fn clear_credentials(&self) {
        for key in [TOKEN_KEY, SESSION_KEY] {
            if let Err(err) = self.storage.remove(key) {
                error!("failed to remove {}: {}", key, err);
            }
        }

        if let Err(err) = self.cookies.clear(TOKEN_KEY) {
            error!("failed to clear token cookie: {}", err);
        }
    }

    /// Removes only the session record.
    ///
    /// # Errors
    /// Returns an error if storage rejects the write.
    pub fn remove_session(&self) -> Result<(), StorageError> {
        self.storage.remove(SESSION_KEY)
    }

    /// Writes a complete session record and reads it back.
    ///
    /// # Errors
    /// Returns an error if the record cannot be written, or if what was read
    /// back is missing or differs from what was written.
    #[instrument(skip(self, record))]
    pub fn seed_session(&self, record: &SessionRecord) -> Result<SessionRecord, StorageError> {
        self.storage
            .set(SESSION_KEY, &serde_json::to_string(record)?)?;

        let saved = self.storage.get(SESSION_KEY)?.ok_or_else(|| {
            StorageError::Unavailable("session record missing after write".to_string())
        })?;
        let saved: SessionRecord = serde_json::from_str(&saved)?;

        if &saved != record {
            return Err(StorageError::Unavailable(
                "session record read back differs from the one written".to_string(),
            ));
        }

        info!("session record saved");

        Ok(saved)
    }

    /// Reads the RSVP side-map. A malformed map reads as empty.
    ///
    /// # Errors
    /// Returns an error if storage cannot be read.
    pub fn read_rsvps(&self) -> Result<Map<String, Value>, StorageError> {
        let Some(raw) = self.storage.get(RSVP_KEY)? else {
            return Ok(Map::new());
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => {
                warn!("ignoring malformed {} contents", RSVP_KEY);
                Ok(Map::new())
            }
        }
    }

    /// Records an RSVP in the side-map, replacing any earlier answer.
    ///
    /// # Errors
    /// Returns an error if storage cannot be read or written.
    pub fn record_rsvp(&self, event_id: &str, status: Value) -> Result<(), StorageError> {
        let mut rsvps = self.read_rsvps()?;
        rsvps.insert(event_id.to_string(), status);
        self.storage
            .set(RSVP_KEY, &serde_json::to_string(&Value::Object(rsvps))?)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("cookies", &self.cookies)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::model::UserProfile;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    /// Storage that rejects every write, like a disabled or full local store.
    struct ReadOnlyStorage(MemoryStorage);

    impl Storage for ReadOnlyStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }
        fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
            self.0.subscribe()
        }
    }

    fn store() -> (Arc<MemoryStorage>, Arc<MemoryStorage>, SessionStore) {
        let storage = Arc::new(MemoryStorage::new());
        let cookies = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone(), CookieJar::new(cookies.clone()));
        (storage, cookies, store)
    }

    #[test]
    fn persist_token_prefers_storage() {
        let (storage, cookies, store) = store();
        assert_eq!(
            store.persist_token("T1", Utc::now()),
            TokenPersistence::Storage
        );
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), Some("T1".to_string()));
        assert_eq!(cookies.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn persist_token_falls_back_to_cookie() {
        let cookies = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(
            Arc::new(ReadOnlyStorage(MemoryStorage::new())),
            CookieJar::new(cookies),
        );
        let now = Utc::now();

        assert_eq!(store.persist_token("T1", now), TokenPersistence::Cookie);
        assert_eq!(store.cookie_token(now), Some("T1".to_string()));
    }

    #[test]
    fn persist_empty_token_is_refused() {
        let (storage, _, store) = store();
        assert_eq!(store.persist_token("", Utc::now()), TokenPersistence::Failed);
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn clear_credentials_removes_everything_but_rsvps() {
        let (storage, _, store) = store();
        let now = Utc::now();
        storage.set(TOKEN_KEY, "T1").unwrap();
        storage.set(SESSION_KEY, r#"{"token":"T1"}"#).unwrap();
        storage.set(RSVP_KEY, r#"{"E1":"yes"}"#).unwrap();
        store.persist_token_cookie("T1", now);

        store.clear_credentials();

        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
        assert_eq!(store.cookie_token(now), None);
        assert!(storage.get(RSVP_KEY).unwrap().is_some());
    }

    #[test]
    fn seed_session_round_trips() {
        let (_, _, store) = store();
        let record = SessionRecord {
            user: Some(UserProfile {
                name: Some("Abir".to_string()),
                ..UserProfile::default()
            }),
            token: Some("T1".to_string()),
            expires_at: Some("2999-01-01T00:00:00Z".to_string()),
        };

        assert_eq!(store.seed_session(&record).unwrap(), record);
    }

    #[test]
    fn rsvps_accumulate_and_tolerate_garbage() {
        let (storage, _, store) = store();
        storage.set(RSVP_KEY, "not json").unwrap();
        assert!(store.read_rsvps().unwrap().is_empty());

        store.record_rsvp("E1", json!("yes")).unwrap();
        store.record_rsvp("E2", json!("maybe")).unwrap();
        store.record_rsvp("E1", json!("no")).unwrap();

        let saved: Value = serde_json::from_str(&storage.get(RSVP_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(saved, json!({"E1": "no", "E2": "maybe"}));
    }
}
