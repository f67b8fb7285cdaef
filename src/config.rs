use std::time::Duration;

use crate::error::{OdooError, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for an Odoo server.
///
/// A config may be built incrementally; completeness of the connection
/// triple (base URL, port, database) is only checked at the first
/// connection attempt, so a partially-known config is constructible.
#[derive(Debug, Clone, Default)]
pub struct OdooConfig {
    pub base_url: Option<String>,
    pub port: Option<u16>,
    pub db: Option<String>,
    pub session_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Option<Duration>,
}

/// Authentication strategy derived from the supplied credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Reuse an existing session token
    Session,
    /// Stateless per-call credential: numeric uid + long-lived key
    ApiKey,
    /// Interactive login with username and password
    Credentials,
}

impl OdooConfig {
    /// Create a config with the connection triple filled in
    pub fn new(base_url: impl Into<String>, port: u16, db: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            port: Some(port),
            db: Some(db.into()),
            ..Self::default()
        }
    }

    /// Authenticate by reusing an existing session token
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Authenticate with a username and API key
    pub fn with_api_key(mut self, username: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.api_key = Some(api_key.into());
        self
    }

    /// Authenticate with a username and password
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the transport timeout (default 30 s)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Classify the config into exactly one authentication strategy.
    ///
    /// Precedence: session token, then API key, then interactive
    /// credentials. The classification is total: every config maps to
    /// exactly one method.
    pub fn auth_method(&self) -> AuthMethod {
        if self.session_id.is_some() {
            AuthMethod::Session
        } else if self.api_key.is_some() {
            AuthMethod::ApiKey
        } else {
            AuthMethod::Credentials
        }
    }

    /// Effective transport timeout
    pub(crate) fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Server root URL, validated lazily at first use
    pub(crate) fn server_url(&self) -> Result<String> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| OdooError::Configuration("base URL is required".into()))?;
        let port = self
            .port
            .ok_or_else(|| OdooError::Configuration("port is required".into()))?;
        Ok(format!("{base_url}:{port}"))
    }

    /// Database name, validated lazily at first use
    pub(crate) fn database(&self) -> Result<&str> {
        self.db
            .as_deref()
            .ok_or_else(|| OdooError::Configuration("database is required".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_token_takes_precedence() {
        let config = OdooConfig::new("http://localhost", 8069, "test")
            .with_credentials("admin", "admin")
            .with_api_key("admin", "key")
            .with_session("abc");
        assert_eq!(config.auth_method(), AuthMethod::Session);
    }

    #[test]
    fn api_key_beats_credentials() {
        let config = OdooConfig::new("http://localhost", 8069, "test")
            .with_credentials("admin", "admin")
            .with_api_key("admin", "key");
        assert_eq!(config.auth_method(), AuthMethod::ApiKey);
    }

    #[test]
    fn credentials_is_the_fallback() {
        let config =
            OdooConfig::new("http://localhost", 8069, "test").with_credentials("admin", "admin");
        assert_eq!(config.auth_method(), AuthMethod::Credentials);

        // Classification is total: even an empty config maps somewhere.
        assert_eq!(OdooConfig::default().auth_method(), AuthMethod::Credentials);
    }

    #[test]
    fn server_url_joins_base_and_port() {
        let config = OdooConfig::new("https://erp.example.com", 443, "prod");
        assert_eq!(config.server_url().unwrap(), "https://erp.example.com:443");
    }

    #[test]
    fn incomplete_config_is_rejected_lazily() {
        let config = OdooConfig {
            base_url: Some("http://localhost".into()),
            ..OdooConfig::default()
        };
        assert!(matches!(
            config.server_url(),
            Err(OdooError::Configuration(_))
        ));
        assert!(matches!(config.database(), Err(OdooError::Configuration(_))));
    }

    #[test]
    fn default_timeout() {
        let config = OdooConfig::new("http://localhost", 8069, "test");
        assert_eq!(config.timeout(), Duration::from_secs(30));

        let config = config.with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }
}
