use thiserror::Error;

/// Error taxonomy for Odoo client operations
#[derive(Debug, Error)]
pub enum OdooError {
    /// Connection settings are incomplete (base URL, port, or database missing)
    #[error("incomplete configuration: {0}")]
    Configuration(String),

    /// The authentication handshake failed (missing field, rejected
    /// credentials, or a missing/malformed session cookie)
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Transport failure, non-success HTTP status, or a protocol-level
    /// error object returned by the server
    #[error("rpc failed: {0}")]
    Rpc(String),

    /// An external-identifier lookup matched no registry rows
    #[error("no matching record found for external identifier {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for OdooError {
    fn from(err: reqwest::Error) -> Self {
        OdooError::Rpc(err.to_string())
    }
}

impl From<serde_json::Error> for OdooError {
    fn from(err: serde_json::Error) -> Self {
        OdooError::Rpc(err.to_string())
    }
}

impl OdooError {
    /// Re-classify a call-path failure as a handshake failure.
    ///
    /// The handshake shares the transport helpers with the call path,
    /// where `?` produces `Rpc`; inside the negotiator those same
    /// failures belong to the authentication domain.
    pub(crate) fn into_auth(self) -> Self {
        match self {
            OdooError::Rpc(message) => OdooError::Authentication(message),
            other => other,
        }
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, OdooError>;
