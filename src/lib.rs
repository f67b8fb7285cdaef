//! Async JSON-RPC client for Odoo servers.
//!
//! Supports the three authentication modes an Odoo server exposes
//! (reusing an existing session token, a username + API key pair, and
//! interactive username + password login) behind one client type. The
//! mode is classified once from the configuration (session token takes
//! precedence over API key, which takes precedence over a password),
//! and every call is routed through the wire shape matching the active
//! credential: session-mode calls go through `/web/dataset/call_kw`
//! with the token attached as header and cookie, uid/key-mode calls go
//! through `/jsonrpc` as `object.execute_kw`.
//!
//! Operations authenticate on demand: the first data call on an
//! unauthenticated client runs the handshake transparently.
//!
//! # Examples
//!
//! ## API key
//!
//! ```no_run
//! use odoo_jsonrpc::{OdooClient, OdooConfig};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OdooConfig::new("https://erp.example.com", 443, "production")
//!     .with_api_key("admin", "a1b2c3d4");
//! let client = OdooClient::new(config)?;
//!
//! let partner_id = client
//!     .create("res.partner", json!({"name": "Deco Addict"}))
//!     .await?;
//!
//! let partners: Vec<serde_json::Value> = client
//!     .read("res.partner", &[partner_id], &["name", "email"])
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Password login and generic calls
//!
//! ```no_run
//! use odoo_jsonrpc::{OdooClient, OdooConfig, SearchReadOptions};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OdooConfig::new("http://localhost", 8069, "dev")
//!     .with_credentials("admin", "admin");
//! let client = OdooClient::new(config)?;
//!
//! let session = client.connect().await?;
//! println!("authenticated as uid {}", session.uid());
//!
//! let companies: Vec<serde_json::Value> = client
//!     .search_read(
//!         "res.company",
//!         json!([["active", "=", true]]),
//!         &["name"],
//!         Some(SearchReadOptions {
//!             limit: Some(10),
//!             ..Default::default()
//!         }),
//!     )
//!     .await?;
//!
//! client.disconnect().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## External identifiers
//!
//! Stable symbolic names survive internal-id changes across
//! environments; they resolve through the `ir.model.data` registry on
//! every use.
//!
//! ```no_run
//! use odoo_jsonrpc::{OdooClient, OdooConfig};
//! use serde_json::json;
//!
//! # async fn example(client: OdooClient) -> Result<(), Box<dyn std::error::Error>> {
//! let partner_id = client.create("res.partner", json!({"name": "Azure"})).await?;
//! client
//!     .create_external_id("res.partner", partner_id, "partner_azure", None)
//!     .await?;
//!
//! let resolved = client.search_by_external_id("partner_azure").await?;
//! assert_eq!(resolved, partner_id);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod protocol;
mod session;

// Re-export public API
pub use client::{OdooClient, SearchReadOptions};
pub use config::{AuthMethod, OdooConfig};
pub use error::{OdooError, Result};
pub use session::{AuthResponse, SessionInfo, UserContext};
