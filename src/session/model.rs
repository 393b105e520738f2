//! Session payloads as they are persisted and as the backend returns them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Backend user identifiers arrive as numbers from the API and as strings
/// from hand-written sessions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Numeric(i64),
    Text(String),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Server fields this client does not model, kept for round trips.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Name to show for the user: display name, then username.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| self.username.as_deref().filter(|u| !u.trim().is_empty()))
    }
}

/// The combined `{user, token, expires_at}` record stored under the session key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user: Option<UserProfile>,
    pub token: Option<String>,
    pub expires_at: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_accepts_numeric_and_text_ids() {
        let numeric: UserProfile = serde_json::from_value(json!({"id": 1, "name": "Abir"})).unwrap();
        assert_eq!(numeric.id, Some(UserId::Numeric(1)));

        let text: UserProfile = serde_json::from_value(json!({"id": "u-1"})).unwrap();
        assert_eq!(text.id, Some(UserId::Text("u-1".to_string())));
    }

    #[test]
    fn profile_keeps_unknown_fields() {
        let profile: UserProfile =
            serde_json::from_value(json!({"name": "Abir", "avatar_url": "/a.png"})).unwrap();
        assert_eq!(profile.extra.get("avatar_url"), Some(&json!("/a.png")));

        let back = serde_json::to_value(&profile).unwrap();
        assert_eq!(back, json!({"name": "Abir", "avatar_url": "/a.png"}));
    }

    #[test]
    fn display_name_falls_back_to_username() {
        let profile = UserProfile {
            name: Some(" ".to_string()),
            username: Some("abir".to_string()),
            ..UserProfile::default()
        };
        assert_eq!(profile.display_name(), Some("abir"));
        assert_eq!(UserProfile::default().display_name(), None);
    }

    #[test]
    fn session_record_serializes_nulls() {
        let record = SessionRecord::default();
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"user": null, "token": null, "expires_at": null})
        );
    }
}
