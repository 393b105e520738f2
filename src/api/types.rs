//! Request payloads and the few response fields the client interprets. Every
//! other response is handed back to the caller as parsed JSON. Credentials in
//! these payloads must never be logged.

use crate::session::UserProfile;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Role assigned to new accounts unless the form picks another.
pub const DEFAULT_SIGNUP_ROLE: &str = "contributor";

#[derive(Debug)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub password: SecretString,
    pub role: Option<String>,
}

impl SignupRequest {
    /// Username to register: the explicit one, else the email's local part.
    #[must_use]
    pub fn username(&self) -> String {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|username| !username.is_empty())
            .map_or_else(
                || {
                    self.email
                        .split('@')
                        .next()
                        .unwrap_or_default()
                        .to_string()
                },
                ToString::to_string,
            )
    }

    pub(crate) fn to_body(&self) -> Value {
        json!({
            "name": self.name,
            "email": self.email,
            "username": self.username(),
            "password": self.password.expose_secret(),
            "role": self.role.as_deref().unwrap_or(DEFAULT_SIGNUP_ROLE),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RsvpRequest {
    pub event_id: String,
    pub rsvp_status: String,
}

/// Event fields accepted by create and update. Unknown fields pass through.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `data` of a successful login or signup.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthPayload {
    pub token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// `success` flag of a response envelope; missing means false.
pub(crate) fn is_success(response: &Value) -> bool {
    response
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Server-supplied `error` (or `message`) text of a response envelope.
pub(crate) fn error_message(response: &Value) -> Option<&str> {
    response
        .get("error")
        .and_then(Value::as_str)
        .or_else(|| response.get("message").and_then(Value::as_str))
        .filter(|message| !message.trim().is_empty())
}
