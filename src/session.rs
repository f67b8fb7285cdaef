//! Credential state and authentication payloads

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Active credential state, owned exclusively by the client.
///
/// At most one credential shape is populated at any time; the variant
/// structure enforces the mutual exclusion. Population happens only as
/// the result of a successful handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) enum Credentials {
    #[default]
    None,
    /// Browser-style session identified by an opaque token
    Session { session_id: String },
    /// Stateless per-call credential pair
    ApiKey { uid: i64, key: String },
}

impl Credentials {
    pub fn is_none(&self) -> bool {
        matches!(self, Credentials::None)
    }
}

/// User/session metadata reported by the server on session-based
/// handshakes.
///
/// Only the stable fields are typed; the long tail of server-version
/// dependent keys is kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub uid: i64,
    #[serde(default)]
    pub db: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub partner_id: Option<i64>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub server_version: Option<String>,
    #[serde(default)]
    pub user_context: Option<UserContext>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `user_context` block of a session handshake response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub tz: Option<String>,
    #[serde(default)]
    pub uid: Option<i64>,
}

/// Outcome of a successful handshake
#[derive(Debug, Clone)]
pub enum AuthResponse {
    /// Session-based modes return full user/session metadata
    Session(SessionInfo),
    /// The api-key handshake returns a bare numeric user id
    ApiKey { uid: i64 },
}

impl AuthResponse {
    /// Authenticated user id, whichever handshake produced it
    pub fn uid(&self) -> i64 {
        match self {
            AuthResponse::Session(info) => info.uid,
            AuthResponse::ApiKey { uid } => *uid,
        }
    }

    /// Session metadata, when the handshake produced one
    pub fn session_info(&self) -> Option<&SessionInfo> {
        match self {
            AuthResponse::Session(info) => Some(info),
            AuthResponse::ApiKey { .. } => None,
        }
    }
}

/// Extract the `session_id` value from a `set-cookie` header.
///
/// The header carries semicolon-separated cookie attributes; the token
/// is the value of the attribute whose name contains `session_id`.
pub(crate) fn extract_session_id(set_cookie: &str) -> Option<String> {
    set_cookie
        .split(';')
        .find(|attribute| attribute.contains("session_id"))
        .and_then(|attribute| attribute.split_once('='))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_session_id_from_plain_cookie() {
        assert_eq!(
            extract_session_id("session_id=abc123").as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn extracts_session_id_among_attributes() {
        let cookie = "session_id=dead-beef; Expires=Wed, 01 Jan 2031 00:00:00 GMT; Max-Age=604800; HttpOnly; Path=/";
        assert_eq!(extract_session_id(cookie).as_deref(), Some("dead-beef"));
    }

    #[test]
    fn extracts_session_id_when_not_first() {
        let cookie = "frontend_lang=en_US; session_id=tok42; Path=/";
        assert_eq!(extract_session_id(cookie).as_deref(), Some("tok42"));
    }

    #[test]
    fn rejects_cookie_without_session_id() {
        assert_eq!(extract_session_id("frontend_lang=en_US; Path=/"), None);
    }

    #[test]
    fn rejects_malformed_session_id_attribute() {
        assert_eq!(extract_session_id("session_id"), None);
        assert_eq!(extract_session_id("session_id="), None);
    }

    #[test]
    fn session_info_keeps_unknown_fields() {
        let info: SessionInfo = serde_json::from_value(json!({
            "uid": 2,
            "username": "admin",
            "is_admin": true,
            "server_version": "17.0",
            "user_context": {"lang": "en_US", "tz": "UTC", "uid": 2},
            "max_file_upload_size": 134217728
        }))
        .unwrap();
        assert_eq!(info.uid, 2);
        assert_eq!(info.username.as_deref(), Some("admin"));
        assert!(info.is_admin);
        assert_eq!(info.extra["max_file_upload_size"], json!(134_217_728));
    }

    #[test]
    fn credentials_default_to_none() {
        assert!(Credentials::default().is_none());
    }
}
