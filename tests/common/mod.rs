//! Fixtures shared by the integration tests.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use reddit_broker::{
	Client,
	auth::Credentials,
	config::{ClientConfig, GovernorConfig, ServiceEndpoints},
	store::TokenStore,
};

pub const USER_AGENT: &str = "linux:reddit-broker-tests:v0.1 (by /u/tests)";
/// `Basic base64("id-123:secret-456")`.
pub const BASIC_AUTH: &str = "Basic aWQtMTIzOnNlY3JldC00NTY=";
pub const TOKEN_PATH: &str = "/api/v1/access_token";
pub const FRESH_TOKEN: &str = "fresh-token";
pub const STALE_TOKEN: &str = "stale-token";

pub fn credentials() -> Credentials {
	Credentials::new("id-123", "secret-456", "bot", "hunter2", USER_AGENT)
}

pub fn config(server: &MockServer) -> ClientConfig {
	let endpoints = ServiceEndpoints::parse(&server.base_url(), &server.base_url())
		.expect("Mock server endpoints should be accepted.");

	ClientConfig::default()
		.with_endpoints(endpoints)
		.with_governor(GovernorConfig::default().with_initial_rate(1_000.).with_burst(10))
}

pub async fn connect(server: &MockServer, store: Arc<dyn TokenStore>) -> Client {
	Client::connect(credentials(), store, config(server))
		.await
		.expect("Client should connect against the mock server.")
}

pub fn bearer(token: &str) -> String {
	format!("bearer {token}")
}

pub fn token_body(token: &str) -> String {
	json!({ "access_token": token, "token_type": "bearer", "expires_in": 86400, "scope": "*" })
		.to_string()
}

/// Listing payload for `(name, title, created_utc)` triples, newest first.
pub fn listing_body(items: &[(&str, &str, i64)]) -> String {
	let children: Vec<_> = items
		.iter()
		.map(|(name, title, created)| {
			json!({
				"kind": "t3",
				"data": {
					"name": name,
					"title": title,
					"created_utc": *created as f64,
					"url": format!("https://example.com/{name}/amp")
				}
			})
		})
		.collect();

	json!({
		"kind": "Listing",
		"data": {
			"after": null,
			"before": null,
			"dist": children.len(),
			"modhash": "",
			"geo_filter": "",
			"children": children
		}
	})
	.to_string()
}
