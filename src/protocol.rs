//! JSON-RPC 2.0 wire types for the Odoo protocol

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Session-info endpoint (session-token handshake)
pub(crate) const SESSION_INFO: &str = "/web/session/get_session_info";
/// Interactive login endpoint
pub(crate) const SESSION_AUTHENTICATE: &str = "/web/session/authenticate";
/// Session teardown endpoint
pub(crate) const SESSION_DESTROY: &str = "/web/session/destroy";
/// Generic RPC endpoint (api-key handshake and uid-mode calls)
pub(crate) const JSONRPC: &str = "/jsonrpc";
/// Generic model-call endpoint (session-mode calls)
pub(crate) const DATASET_CALL_KW: &str = "/web/dataset/call_kw";

/// Session token header expected by the server alongside the cookie
pub(crate) const SESSION_ID_HEADER: &str = "X-Openerp-Session-Id";

/// JSON-RPC request envelope: `{jsonrpc: "2.0", method: "call", id, params}`
#[derive(Debug, Serialize)]
pub(crate) struct RpcRequest<P> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub id: u64,
    pub params: P,
}

impl<P: Serialize> RpcRequest<P> {
    pub fn call(params: P) -> Self {
        Self {
            jsonrpc: "2.0",
            method: "call",
            id: next_request_id(),
            params,
        }
    }
}

/// Per-call request identifier: unique within the process, not ordered.
///
/// Seeded from the clock so ids from client restarts are unlikely to
/// collide in server logs, then strictly incremented.
pub(crate) fn next_request_id() -> u64 {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    let counter = COUNTER.get_or_init(|| {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        AtomicU64::new(seed)
    });
    counter.fetch_add(1, Ordering::Relaxed)
}

/// JSON-RPC response body: `{result}` on success, `{error}` on fault
#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcFault>,
}

impl RpcResponse {
    /// Fold the body into the `result` field, surfacing server faults.
    pub fn into_result(self) -> Result<Value, crate::error::OdooError> {
        if let Some(fault) = self.error {
            return Err(crate::error::OdooError::Rpc(fault.into_message()));
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// Protocol-level error object carried in an otherwise successful response
#[derive(Debug, Deserialize)]
pub(crate) struct RpcFault {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<RpcFaultData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcFaultData {
    #[serde(default)]
    pub message: Option<String>,
}

impl RpcFault {
    /// `error.data.message` is the user-visible detail; `error.message`
    /// is the generic fallback.
    pub fn into_message(self) -> String {
        self.data
            .and_then(|data| data.message)
            .or(self.message)
            .unwrap_or_else(|| "unknown server error".to_string())
    }
}

/// Parameter payload for session-mode model calls
#[derive(Debug, Serialize)]
pub(crate) struct CallKwParams<'a> {
    pub model: &'a str,
    pub method: &'a str,
    pub args: &'a [Value],
    pub kwargs: &'a Value,
}

/// Parameter payload for uid-mode calls through the generic endpoint
#[derive(Debug, Serialize)]
pub(crate) struct ServiceParams<'a> {
    pub service: &'a str,
    pub method: &'a str,
    pub args: Vec<Value>,
}

/// Parameter payload for the interactive login handshake
#[derive(Debug, Serialize)]
pub(crate) struct LoginParams<'a> {
    pub db: &'a str,
    pub login: &'a str,
    pub password: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_ids_are_unique() {
        let a = next_request_id();
        let b = next_request_id();
        let c = next_request_id();
        assert_ne!(a, b);
        assert_ne!(b, c);
    }

    #[test]
    fn envelope_shape() {
        let request = RpcRequest::call(json!({"db": "test"}));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["jsonrpc"], json!("2.0"));
        assert_eq!(value["method"], json!("call"));
        assert!(value["id"].is_u64());
        assert_eq!(value["params"]["db"], json!("test"));
    }

    #[test]
    fn fault_prefers_data_message() {
        let response: RpcResponse = serde_json::from_value(json!({
            "error": {"message": "Odoo Server Error", "data": {"message": "x"}}
        }))
        .unwrap();
        let err = response.into_result().unwrap_err();
        assert_eq!(err.to_string(), "rpc failed: x");
    }

    #[test]
    fn fault_falls_back_to_top_level_message() {
        let response: RpcResponse = serde_json::from_value(json!({
            "error": {"message": "Session expired"}
        }))
        .unwrap();
        let err = response.into_result().unwrap_err();
        assert_eq!(err.to_string(), "rpc failed: Session expired");
    }

    #[test]
    fn missing_result_folds_to_null() {
        let response: RpcResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(response.into_result().unwrap(), Value::Null);
    }
}
