//! Last-resort token persistence. Cookies live in a backend separate from the
//! main storage so that a disabled or full primary store still leaves a place
//! to keep the bearer token.

use super::{Storage, StorageError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Lifetime of the fallback token cookie.
pub const TOKEN_COOKIE_MAX_AGE_SECONDS: i64 = 24 * 60 * 60;

/// Every client request targets the site root, so only root cookies apply.
const COOKIE_PATH: &str = "/";

#[derive(Debug, Serialize, Deserialize)]
struct Cookie {
    value: String,
    path: String,
    expires: DateTime<Utc>,
}

#[derive(Clone)]
pub struct CookieJar {
    backend: Arc<dyn Storage>,
}

impl CookieJar {
    #[must_use]
    pub fn new(backend: Arc<dyn Storage>) -> Self {
        Self { backend }
    }

    /// Returns the cookie value if present, set on path `/` and unexpired at
    /// `now`. Unreadable or malformed cookies read as absent.
    #[must_use]
    pub fn get(&self, name: &str, now: DateTime<Utc>) -> Option<String> {
        let raw = match self.backend.get(name) {
            Ok(raw) => raw?,
            Err(err) => {
                debug!("cookie {} unreadable: {}", name, err);
                return None;
            }
        };

        match serde_json::from_str::<Cookie>(&raw) {
            Ok(cookie) if cookie.path != COOKIE_PATH => {
                debug!("cookie {} is scoped to {}, ignoring it", name, cookie.path);
                None
            }
            Ok(cookie) if cookie.expires > now && !cookie.value.is_empty() => Some(cookie.value),
            Ok(_) => None,
            Err(err) => {
                debug!("cookie {} malformed: {}", name, err);
                None
            }
        }
    }

    /// Sets a cookie on path `/` expiring `max_age_seconds` after `now`.
    ///
    /// # Errors
    /// Returns an error if the cookie backend rejects the write.
    pub fn set(
        &self,
        name: &str,
        value: &str,
        max_age_seconds: i64,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let cookie = Cookie {
            value: value.to_string(),
            path: COOKIE_PATH.to_string(),
            expires: now + Duration::seconds(max_age_seconds),
        };
        self.backend.set(name, &serde_json::to_string(&cookie)?)
    }

    /// Expires a cookie immediately.
    ///
    /// # Errors
    /// Returns an error if the cookie backend rejects the write.
    pub fn clear(&self, name: &str) -> Result<(), StorageError> {
        self.backend.remove(name)
    }
}

impl std::fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieJar").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn cookie_expires_after_max_age() {
        let jar = CookieJar::new(Arc::new(MemoryStorage::new()));
        jar.set("cousinsvault_token", "T1", 60, now()).unwrap();

        assert_eq!(jar.get("cousinsvault_token", now()), Some("T1".to_string()));
        assert_eq!(
            jar.get("cousinsvault_token", now() + Duration::seconds(59)),
            Some("T1".to_string())
        );
        assert_eq!(
            jar.get("cousinsvault_token", now() + Duration::seconds(60)),
            None
        );
    }

    #[test]
    fn clear_removes_cookie() {
        let jar = CookieJar::new(Arc::new(MemoryStorage::new()));
        jar.set("cousinsvault_token", "T1", 60, now()).unwrap();
        jar.clear("cousinsvault_token").unwrap();
        assert_eq!(jar.get("cousinsvault_token", now()), None);
    }

    #[test]
    fn malformed_cookie_reads_as_absent() {
        let backend = Arc::new(MemoryStorage::new());
        backend.set("cousinsvault_token", "garbage").unwrap();
        let jar = CookieJar::new(backend);
        assert_eq!(jar.get("cousinsvault_token", now()), None);
    }

    #[test]
    fn cookie_on_another_path_is_ignored() {
        let backend = Arc::new(MemoryStorage::new());
        backend
            .set(
                "cousinsvault_token",
                r#"{"value":"T1","path":"/admin","expires":"2999-01-01T00:00:00Z"}"#,
            )
            .unwrap();
        let jar = CookieJar::new(backend.clone());
        assert_eq!(jar.get("cousinsvault_token", now()), None);

        jar.set("cousinsvault_token", "T2", 60, now()).unwrap();
        let stored: serde_json::Value =
            serde_json::from_str(&backend.get("cousinsvault_token").unwrap().unwrap()).unwrap();
        assert_eq!(stored["path"], "/");
        assert_eq!(jar.get("cousinsvault_token", now()), Some("T2".to_string()));
    }
}
