use std::collections::HashMap;

use http::StatusCode;
use reqwest::header;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::{AuthMethod, OdooConfig};
use crate::error::{OdooError, Result};
use crate::protocol::{
    CallKwParams, LoginParams, RpcRequest, RpcResponse, ServiceParams, DATASET_CALL_KW, JSONRPC,
    SESSION_AUTHENTICATE, SESSION_DESTROY, SESSION_ID_HEADER, SESSION_INFO,
};
use crate::session::{extract_session_id, AuthResponse, Credentials, SessionInfo};

/// Registry model binding symbolic external identifiers to records
const EXTERNAL_ID_MODEL: &str = "ir.model.data";
/// Module/namespace tag used when the caller does not supply one
const DEFAULT_EXTERNAL_ID_MODULE: &str = "__api__";

/// Options forwarded as kwargs to `search_read`
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchReadOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

/// Resolved external-identifier registry row
#[derive(Debug, serde::Deserialize)]
struct ExternalIdBinding {
    res_id: i64,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Default)]
struct SessionState {
    credentials: Credentials,
    auth_response: Option<AuthResponse>,
}

/// Async JSON-RPC client for an Odoo server.
///
/// Construct with an [`OdooConfig`], then either call [`connect`]
/// explicitly or let the first data operation authenticate on demand.
/// Each instance owns its credential state independently.
///
/// [`connect`]: OdooClient::connect
pub struct OdooClient {
    config: OdooConfig,
    http: reqwest::Client,
    state: Mutex<SessionState>,
}

impl OdooClient {
    /// Create a client from a configuration.
    ///
    /// Completeness of the connection settings is checked at the first
    /// connection attempt, not here; the only construction-time failure
    /// is building the HTTP transport.
    pub fn new(config: OdooConfig) -> Result<Self> {
        let http = build_transport(&config)?;
        Ok(Self {
            config,
            http,
            state: Mutex::new(SessionState::default()),
        })
    }

    /// Replace the configuration, discarding all credential state.
    ///
    /// Stale credentials must never survive a reconfiguration: the
    /// session token, uid, api key, and cached handshake payload are
    /// cleared before the new settings take effect.
    pub fn reconfigure(&mut self, config: OdooConfig) -> Result<()> {
        let http = build_transport(&config)?;
        *self.state.get_mut() = SessionState::default();
        self.config = config;
        self.http = http;
        Ok(())
    }

    /// Whether a handshake has populated credential state
    pub async fn is_connected(&self) -> bool {
        !self.state.lock().await.credentials.is_none()
    }

    /// Active session token, if the client is in session mode
    pub async fn session_id(&self) -> Option<String> {
        match &self.state.lock().await.credentials {
            Credentials::Session { session_id } => Some(session_id.clone()),
            _ => None,
        }
    }

    /// Authenticated user id, from the credential pair or the cached
    /// handshake payload
    pub async fn uid(&self) -> Option<i64> {
        let state = self.state.lock().await;
        match &state.credentials {
            Credentials::ApiKey { uid, .. } => Some(*uid),
            _ => state.auth_response.as_ref().map(AuthResponse::uid),
        }
    }

    /// Cached handshake payload from the last successful connect
    pub async fn auth_response(&self) -> Option<AuthResponse> {
        self.state.lock().await.auth_response.clone()
    }

    /// Run the handshake for the configured authentication method.
    ///
    /// Connecting while already authenticated re-runs the handshake and
    /// replaces the credential state.
    pub async fn connect(&self) -> Result<AuthResponse> {
        let mut state = self.state.lock().await;
        self.authenticate(&mut state).await
    }

    /// Destroy the server-side session and clear all credential state.
    ///
    /// Only session mode holds a server-side session; in any other
    /// state this fails with an authentication error.
    pub async fn disconnect(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let session_id = match &state.credentials {
            Credentials::Session { session_id } => session_id.clone(),
            _ => {
                return Err(OdooError::Authentication(
                    "no active session to destroy; connect first".into(),
                ))
            }
        };
        let response = self
            .send_rpc(SESSION_DESTROY, json!({}), Some(&session_id))
            .await?;
        decode_body(response).await?;
        *state = SessionState::default();
        debug!("session destroyed");
        Ok(())
    }

    /// Call `method` on `model` with positional and keyword arguments.
    ///
    /// Authenticates on demand if no credential state is active, then
    /// dispatches on the populated credential: session mode goes
    /// through the dataset endpoint, uid/key mode through the generic
    /// RPC endpoint. The decoded `result` field is returned verbatim.
    pub async fn call_kw(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Value,
    ) -> Result<Value> {
        let credentials = self.ensure_connected().await?;
        debug!(model, method, "dispatching call");
        match credentials {
            Credentials::Session { session_id } => {
                let params = CallKwParams {
                    model,
                    method,
                    args: &args,
                    kwargs: &kwargs,
                };
                let response = self
                    .send_rpc(DATASET_CALL_KW, params, Some(&session_id))
                    .await?;
                decode_body(response).await
            }
            Credentials::ApiKey { uid, key } => {
                let db = self.config.database()?;
                let params = ServiceParams {
                    service: "object",
                    method: "execute_kw",
                    args: vec![
                        json!(db),
                        json!(uid),
                        json!(key),
                        json!(model),
                        json!(method),
                        Value::Array(args),
                        kwargs,
                    ],
                };
                let response = self.send_rpc(JSONRPC, params, None).await?;
                decode_body(response).await
            }
            Credentials::None => Err(OdooError::Authentication(
                "no active credentials; connect with a session token, api key, or password first"
                    .into(),
            )),
        }
    }

    // ==================== CRUD helpers ====================

    /// Create a record, returning its internal id
    pub async fn create(&self, model: &str, values: Value) -> Result<i64> {
        let result = self.call_kw(model, "create", vec![values], json!({})).await?;
        first_record_id(&result)
            .ok_or_else(|| OdooError::Rpc(format!("create returned no record id: {result}")))
    }

    /// Read the given fields of one or more records
    pub async fn read<T: DeserializeOwned>(
        &self,
        model: &str,
        ids: &[i64],
        fields: &[&str],
    ) -> Result<Vec<T>> {
        let result = self
            .call_kw(model, "read", vec![json!(ids), json!(fields)], json!({}))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Update a record's fields
    pub async fn update(&self, model: &str, id: i64, values: Value) -> Result<bool> {
        let result = self
            .call_kw(model, "write", vec![json!([id]), values], json!({}))
            .await?;
        Ok(result.as_bool().unwrap_or_default())
    }

    /// Update per-language translations of a single field
    pub async fn update_field_translations(
        &self,
        model: &str,
        id: i64,
        field: &str,
        translations: &HashMap<String, String>,
    ) -> Result<bool> {
        let result = self
            .call_kw(
                model,
                "update_field_translations",
                vec![json!([id]), json!(field), json!(translations)],
                json!({}),
            )
            .await?;
        Ok(result.as_bool().unwrap_or_default())
    }

    /// Delete a record
    pub async fn delete(&self, model: &str, id: i64) -> Result<bool> {
        let result = self
            .call_kw(model, "unlink", vec![json!([id])], json!({}))
            .await?;
        Ok(result.as_bool().unwrap_or_default())
    }

    /// Search for record ids matching a domain filter.
    ///
    /// A null server result is normalized to an empty vec.
    pub async fn search(&self, model: &str, domain: Value) -> Result<Vec<i64>> {
        let result = self.call_kw(model, "search", vec![domain], json!({})).await?;
        sequence_or_empty(result)
    }

    /// Search for records and read the given fields in one round trip.
    ///
    /// A null server result is normalized to an empty vec.
    pub async fn search_read<T: DeserializeOwned>(
        &self,
        model: &str,
        domain: Value,
        fields: &[&str],
        options: Option<SearchReadOptions>,
    ) -> Result<Vec<T>> {
        let kwargs = match options {
            Some(options) => serde_json::to_value(options)?,
            None => json!({}),
        };
        let result = self
            .call_kw(model, "search_read", vec![domain, json!(fields)], kwargs)
            .await?;
        sequence_or_empty(result)
    }

    /// Retrieve the field definitions of a model
    pub async fn get_fields(&self, model: &str) -> Result<Value> {
        self.call_kw(model, "fields_get", Vec::new(), json!({})).await
    }

    /// Execute a named action method on the given record ids
    pub async fn action(&self, model: &str, action: &str, ids: &[i64]) -> Result<Value> {
        let args = ids.iter().map(|id| json!(id)).collect();
        self.call_kw(model, action, args, json!({})).await
    }

    // ==================== External identifiers ====================

    /// Bind a symbolic external identifier to an existing record.
    ///
    /// `module` namespaces the identifier; it defaults to `"__api__"`.
    pub async fn create_external_id(
        &self,
        model: &str,
        record_id: i64,
        external_id: &str,
        module: Option<&str>,
    ) -> Result<i64> {
        let row = json!([{
            "model": model,
            "name": external_id,
            "res_id": record_id,
            "module": module.unwrap_or(DEFAULT_EXTERNAL_ID_MODULE),
        }]);
        let result = self
            .call_kw(EXTERNAL_ID_MODEL, "create", vec![row], json!({}))
            .await?;
        first_record_id(&result).ok_or_else(|| {
            OdooError::Rpc(format!("external id creation returned no record id: {result}"))
        })
    }

    /// Resolve a symbolic external identifier to its internal record id
    pub async fn search_by_external_id(&self, external_id: &str) -> Result<i64> {
        let binding = self.resolve_external_id(external_id, &["res_id"]).await?;
        Ok(binding.res_id)
    }

    /// Read a record addressed by its external identifier
    pub async fn read_by_external_id<T: DeserializeOwned>(
        &self,
        external_id: &str,
        fields: &[&str],
    ) -> Result<T> {
        let binding = self
            .resolve_external_id(external_id, &["res_id", "model"])
            .await?;
        let model = owning_model(binding.model, external_id)?;
        let records: Vec<T> = self.read(&model, &[binding.res_id], fields).await?;
        records
            .into_iter()
            .next()
            .ok_or_else(|| OdooError::NotFound(external_id.to_string()))
    }

    /// Update a record addressed by its external identifier
    pub async fn update_by_external_id(&self, external_id: &str, values: Value) -> Result<bool> {
        let binding = self
            .resolve_external_id(external_id, &["res_id", "model"])
            .await?;
        let model = owning_model(binding.model, external_id)?;
        self.update(&model, binding.res_id, values).await
    }

    /// Delete a record addressed by its external identifier
    pub async fn delete_by_external_id(&self, external_id: &str) -> Result<bool> {
        let binding = self
            .resolve_external_id(external_id, &["res_id", "model"])
            .await?;
        let model = owning_model(binding.model, external_id)?;
        self.delete(&model, binding.res_id).await
    }

    /// Look up the registry row for an external identifier.
    ///
    /// Fails fast with `NotFound` on zero rows, before any follow-up
    /// call is attempted. Bindings are never cached; every
    /// external-id-addressed operation re-resolves.
    async fn resolve_external_id(
        &self,
        external_id: &str,
        fields: &[&str],
    ) -> Result<ExternalIdBinding> {
        let rows: Vec<ExternalIdBinding> = self
            .search_read(
                EXTERNAL_ID_MODEL,
                json!([["name", "=", external_id]]),
                fields,
                None,
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| OdooError::NotFound(external_id.to_string()))
    }

    // ==================== Authentication ====================

    /// Authenticate on demand, holding the state lock so concurrent
    /// callers share one in-flight handshake.
    async fn ensure_connected(&self) -> Result<Credentials> {
        let mut state = self.state.lock().await;
        if state.credentials.is_none() {
            self.authenticate(&mut state).await?;
        }
        Ok(state.credentials.clone())
    }

    async fn authenticate(&self, state: &mut SessionState) -> Result<AuthResponse> {
        // Completeness of the connection settings is checked here, at
        // the first connection attempt.
        self.config.server_url()?;
        self.config.database()?;

        let method = self.config.auth_method();
        debug!(?method, "authenticating");
        let (credentials, response) = match method {
            AuthMethod::Session => self.handshake_session().await,
            AuthMethod::ApiKey => self.handshake_api_key().await,
            AuthMethod::Credentials => self.handshake_credentials().await,
        }
        .map_err(OdooError::into_auth)?;

        state.credentials = credentials;
        state.auth_response = Some(response.clone());
        Ok(response)
    }

    /// Validate a caller-supplied session token against the server
    async fn handshake_session(&self) -> Result<(Credentials, AuthResponse)> {
        let session_id = self.config.session_id.clone().ok_or_else(|| {
            OdooError::Authentication("no session token held; supply one in the configuration".into())
        })?;
        let response = self
            .send_rpc(SESSION_INFO, json!({}), Some(&session_id))
            .await?;
        let result = decode_body(response).await?;
        let info: SessionInfo = serde_json::from_value(result)?;
        Ok((
            Credentials::Session { session_id },
            AuthResponse::Session(info),
        ))
    }

    /// Exchange username + api key for a numeric user id
    async fn handshake_api_key(&self) -> Result<(Credentials, AuthResponse)> {
        let db = self.config.database()?;
        let username = self.config.username.as_deref().ok_or_else(|| {
            OdooError::Authentication("username is required for api-key authentication".into())
        })?;
        let key = self.config.api_key.clone().ok_or_else(|| {
            OdooError::Authentication("api key is required for api-key authentication".into())
        })?;
        let params = ServiceParams {
            service: "common",
            method: "authenticate",
            args: vec![json!(db), json!(username), json!(key), json!({})],
        };
        let response = self.send_rpc(JSONRPC, params, None).await?;
        let result = decode_body(response).await?;
        let uid = result.as_i64().filter(|uid| *uid > 0).ok_or_else(|| {
            OdooError::Authentication("server returned no usable user id; check your api key".into())
        })?;
        Ok((Credentials::ApiKey { uid, key }, AuthResponse::ApiKey { uid }))
    }

    /// Log in with username + password; the server issues a session
    /// token via the `set-cookie` response header.
    async fn handshake_credentials(&self) -> Result<(Credentials, AuthResponse)> {
        let db = self.config.database()?;
        let login = self.config.username.as_deref().ok_or_else(|| {
            OdooError::Authentication("username is required for password authentication".into())
        })?;
        let password = self.config.password.as_deref().ok_or_else(|| {
            OdooError::Authentication("password is required for password authentication".into())
        })?;
        let params = LoginParams { db, login, password };
        let response = self.send_rpc(SESSION_AUTHENTICATE, params, None).await?;

        // The token arrives in a header, so keep the headers before
        // consuming the body. Rejected credentials surface as a server
        // fault from the body decode and take precedence.
        let headers = response.headers().clone();
        let result = decode_body(response).await?;

        let cookies: Vec<&str> = headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        if cookies.is_empty() {
            return Err(OdooError::Authentication(
                "no set-cookie header in authentication response; check your credentials".into(),
            ));
        }
        let session_id = cookies
            .iter()
            .copied()
            .find_map(extract_session_id)
            .ok_or_else(|| {
                OdooError::Authentication("session_id not found in response cookies".into())
            })?;

        let info: SessionInfo = serde_json::from_value(result)?;
        Ok((
            Credentials::Session { session_id },
            AuthResponse::Session(info),
        ))
    }

    // ==================== Transport ====================

    /// POST a JSON-RPC envelope, attaching the session token as both a
    /// header and a cookie when one is given. Non-success statuses are
    /// surfaced before the body is touched.
    async fn send_rpc<P: Serialize>(
        &self,
        path: &str,
        params: P,
        session_id: Option<&str>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.config.server_url()?, path);
        let envelope = RpcRequest::call(params);
        let mut request = self.http.post(&url).json(&envelope);
        if let Some(session_id) = session_id {
            request = request
                .header(SESSION_ID_HEADER, session_id)
                .header(header::COOKIE, format!("session_id={session_id}"));
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(OdooError::Rpc(status_text(status)));
        }
        Ok(response)
    }
}

fn build_transport(config: &OdooConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout())
        .build()
        .map_err(|err| OdooError::Configuration(format!("failed to build HTTP transport: {err}")))
}

/// Decode a JSON-RPC body, surfacing protocol faults as errors
async fn decode_body(response: reqwest::Response) -> Result<Value> {
    let body: RpcResponse = response.json().await?;
    body.into_result()
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string())
}

/// Search-style results are sequences; the server reports "nothing" as
/// `null` or `false`, which callers should see as an empty vec.
fn sequence_or_empty<T: DeserializeOwned>(result: Value) -> Result<Vec<T>> {
    match result {
        Value::Null | Value::Bool(false) => Ok(Vec::new()),
        other => Ok(serde_json::from_value(other)?),
    }
}

fn owning_model(model: Option<String>, external_id: &str) -> Result<String> {
    model.ok_or_else(|| {
        OdooError::Rpc(format!(
            "registry row for {external_id} is missing the owning model"
        ))
    })
}

/// `create` returns a bare id for a single record and a list of ids
/// when given a list of value sets.
fn first_record_id(result: &Value) -> Option<i64> {
    match result {
        Value::Array(items) => items.first().and_then(Value::as_i64),
        other => other.as_i64(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let config = OdooConfig::new("http://localhost", 8069, "test").with_session("abc");
        assert!(OdooClient::new(config).is_ok());
    }

    #[test]
    fn first_record_id_handles_both_create_shapes() {
        assert_eq!(first_record_id(&json!(7)), Some(7));
        assert_eq!(first_record_id(&json!([9, 10])), Some(9));
        assert_eq!(first_record_id(&json!([])), None);
        assert_eq!(first_record_id(&json!(true)), None);
    }

    #[test]
    fn status_text_uses_canonical_reason() {
        assert_eq!(status_text(StatusCode::INTERNAL_SERVER_ERROR), "Internal Server Error");
        assert_eq!(status_text(StatusCode::BAD_GATEWAY), "Bad Gateway");
    }

    #[test]
    fn search_read_options_skip_unset_fields() {
        let kwargs = serde_json::to_value(SearchReadOptions {
            limit: Some(5),
            ..SearchReadOptions::default()
        })
        .unwrap();
        assert_eq!(kwargs, json!({"limit": 5}));
    }
}
