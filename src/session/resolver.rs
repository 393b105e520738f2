//! Reconciles the token key, the session record and the cookie fallback into
//! one `(token, user, is_valid)` view. Reads never fail: any storage or parse
//! error degrades to "field absent". The only destructive action is removing a
//! session record that is confirmed expired.

use crate::session::{
    expiry::{parse_expiry, Expiry},
    model::UserProfile,
    store::SessionStore,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// Expiry field aliases, highest priority first.
const EXPIRY_ALIASES: [&str; 3] = ["expires_at", "expiresAt", "expires"];

/// Which storage location produced the resolved token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenSource {
    TokenKey,
    SessionRecord,
    Cookie,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedSession {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
    pub is_valid: bool,
    pub token_source: Option<TokenSource>,
}

/// Fields pulled out of a parsed session record.
#[derive(Debug, Default)]
struct RecordView {
    token: Option<String>,
    user: Option<UserProfile>,
    expiry_raw: Option<Value>,
}

impl RecordView {
    fn from_json(record: &Value) -> Self {
        let data = record.get("data");

        let expiry_raw = EXPIRY_ALIASES
            .iter()
            .filter_map(|alias| record.get(*alias))
            .chain(data.and_then(|data| data.get("expires_at")))
            .find(|value| is_present(value))
            .cloned();

        let user = record
            .get("user")
            .filter(|user| user.is_object())
            .or_else(|| data.and_then(|data| data.get("user")).filter(|u| u.is_object()))
            .and_then(|user| match serde_json::from_value::<UserProfile>(user.clone()) {
                Ok(user) => Some(user),
                Err(err) => {
                    warn!("ignoring malformed session user: {}", err);
                    None
                }
            });

        let token = record
            .get("token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(ToString::to_string);

        Self {
            token,
            user,
            expiry_raw,
        }
    }
}

/// Mirrors how the pages chain aliases with `||`: falsy values fall through.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(text) => !text.is_empty(),
        Value::Number(number) => number.as_f64() != Some(0.0),
        _ => true,
    }
}

#[derive(Clone, Debug)]
pub struct SessionResolver {
    store: SessionStore,
}

impl SessionResolver {
    #[must_use]
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    #[must_use]
    pub fn resolve(&self) -> ResolvedSession {
        self.resolve_at(Utc::now())
    }

    /// Resolves the stored session as of `now`.
    #[instrument(skip(self))]
    pub fn resolve_at(&self, now: DateTime<Utc>) -> ResolvedSession {
        let key_token = match self.store.read_token() {
            Ok(token) => token,
            Err(err) => {
                warn!("token key unreadable: {}", err);
                None
            }
        };

        let record = self.read_record();
        let expiry = record
            .as_ref()
            .and_then(|record| record.expiry_raw.as_ref())
            .map(|raw| parse_expiry(Some(raw)));

        let is_valid = match expiry {
            Some(expiry @ Expiry::At(_)) => expiry.is_valid_at(now),
            // missing or unreadable expiry means a persistent session
            Some(Expiry::Persistent) | None => {
                record.as_ref().is_some_and(|record| record.user.is_some())
            }
        };

        let hard_expired = matches!(expiry, Some(expiry @ Expiry::At(_)) if !expiry.is_valid_at(now));

        // the record token survives an expired record; only the user is discarded
        let (record_token, record_user) = match record {
            Some(record) => (record.token, record.user),
            None => (None, None),
        };
        let user = record_user.filter(|_| is_valid && !hard_expired);

        let (token, token_source) = if let Some(token) = key_token {
            (Some(token), Some(TokenSource::TokenKey))
        } else if let Some(token) = record_token {
            (Some(token), Some(TokenSource::SessionRecord))
        } else if let Some(token) = self.store.cookie_token(now) {
            (Some(token), Some(TokenSource::Cookie))
        } else {
            (None, None)
        };

        if let (Some(token), Some(TokenSource::SessionRecord | TokenSource::Cookie)) =
            (token.as_deref(), token_source)
        {
            debug!("copying recovered token to the canonical key");
            if let Err(err) = self.store.write_token_key(token) {
                warn!("could not persist recovered token: {}", err);
            }
        }

        if hard_expired {
            info!("stored session expired, removing it");
            if let Err(err) = self.store.remove_session() {
                warn!("could not remove expired session: {}", err);
            }
        }

        ResolvedSession {
            token,
            user,
            is_valid,
            token_source,
        }
    }

    fn read_record(&self) -> Option<RecordView> {
        let raw = match self.store.read_session_raw() {
            Ok(raw) => raw?,
            Err(err) => {
                warn!("session record unreadable: {}", err);
                return None;
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(record @ Value::Object(_)) => Some(RecordView::from_json(&record)),
            Ok(_) => {
                warn!("session record is not a JSON object, ignoring it");
                None
            }
            Err(err) => {
                warn!("session record is malformed, ignoring it: {}", err);
                None
            }
        }
    }
}
