//! Basic usage example for the Odoo JSON-RPC client
//!
//! This example walks through authentication, generic model calls, and
//! the external-identifier layer against a real server.
//!
//! To run this example:
//! ```bash
//! export ODOO_BASE_URL="http://localhost"
//! export ODOO_PORT="8069"
//! export ODOO_DB="dev"
//! export ODOO_USERNAME="admin"
//! export ODOO_PASSWORD="admin"
//! cargo run --example basic_usage
//! ```

use odoo_jsonrpc::{OdooClient, OdooConfig, SearchReadOptions};
use serde_json::{json, Value};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = OdooConfig::new(
        std::env::var("ODOO_BASE_URL").unwrap_or_else(|_| "http://localhost".to_string()),
        std::env::var("ODOO_PORT")
            .ok()
            .and_then(|port| port.parse().ok())
            .unwrap_or(8069),
        std::env::var("ODOO_DB").unwrap_or_else(|_| "dev".to_string()),
    )
    .with_credentials(
        std::env::var("ODOO_USERNAME").unwrap_or_else(|_| "admin".to_string()),
        std::env::var("ODOO_PASSWORD").expect("ODOO_PASSWORD environment variable must be set"),
    );

    let client = OdooClient::new(config)?;

    println!("=== Example 1: Connect ===\n");

    let session = client.connect().await?;
    println!("Authenticated as uid {}", session.uid());
    if let Some(info) = session.session_info() {
        println!("Server version: {:?}\n", info.server_version);
    }

    println!("=== Example 2: CRUD round trip ===\n");

    let partner_id = client
        .create("res.partner", json!({"name": "Deco Addict", "email": "deco@example.com"}))
        .await?;
    println!("Created res.partner {partner_id}");

    let partners: Vec<Value> = client
        .read("res.partner", &[partner_id], &["name", "email"])
        .await?;
    println!("Read back: {}", serde_json::to_string_pretty(&partners)?);

    client
        .update("res.partner", partner_id, json!({"email": "hello@example.com"}))
        .await?;

    println!("\n=== Example 3: Search with options ===\n");

    let companies: Vec<Value> = client
        .search_read(
            "res.company",
            json!([["active", "=", true]]),
            &["name"],
            Some(SearchReadOptions {
                limit: Some(5),
                order: Some("name asc".to_string()),
                ..Default::default()
            }),
        )
        .await?;
    println!("Companies: {}", serde_json::to_string_pretty(&companies)?);

    println!("\n=== Example 4: External identifiers ===\n");

    client
        .create_external_id("res.partner", partner_id, "partner_deco_demo", None)
        .await?;
    let resolved = client.search_by_external_id("partner_deco_demo").await?;
    println!("partner_deco_demo resolves to {resolved}");

    client.delete_by_external_id("partner_deco_demo").await?;
    client.delete("res.partner", partner_id).await.ok();

    client.disconnect().await?;
    println!("\nDone.");
    Ok(())
}
