//! Streams newly published posts of one resource from a mock service, then submits a post only
//! when no recent post carries the same title.

// std
use std::{sync::Arc, time::Duration as StdDuration};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use tracing_subscriber::EnvFilter;
// self
use reddit_broker::{
	Client,
	auth::{Credentials, ResourceName},
	config::{ClientConfig, GovernorConfig, PollerConfig, ServiceEndpoints},
	store::{MemoryStore, TokenStore},
	submit::{SubmitOutcome, Submission},
};

fn listing(name: &str, title: &str, created_utc: i64) -> String {
	json!({
		"kind": "Listing",
		"data": {
			"after": null,
			"before": null,
			"dist": 1,
			"modhash": "",
			"geo_filter": "",
			"children": [{
				"kind": "t3",
				"data": {
					"name": name,
					"title": title,
					"created_utc": created_utc,
					"url": format!("https://example.com/{name}/amp/")
				}
			}]
		}
	})
	.to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/access_token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-access\",\"token_type\":\"bearer\"}");
		})
		.await;
	let mut listing_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/r/formula1/new");
			then.status(200)
				.header("x-ratelimit-remaining", "598.0")
				.header("x-ratelimit-reset", "300")
				.header("x-ratelimit-used", "2")
				.body(listing("t3_baseline", "Practice thread", 1_700_000_000));
		})
		.await;
	let submit_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/submit");
			then.status(200).body("{\"json\":{\"errors\":[]}}");
		})
		.await;
	let credentials = Credentials::new(
		"demo-client",
		"super-secret",
		"demo-bot",
		"hunter2",
		"linux:reddit-broker-demo:v0.1 (by /u/demo-bot)",
	);
	let config = ClientConfig::default()
		.with_endpoints(ServiceEndpoints::parse(&server.base_url(), &server.base_url())?)
		.with_governor(GovernorConfig::default().with_initial_rate(10.).with_burst(2))
		.with_poller(
			PollerConfig::default().with_min_poll_interval(time::Duration::milliseconds(50)),
		);
	let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::default());
	let client = Client::connect(credentials, store, config).await?;
	let resource = ResourceName::new("formula1")?;
	let mut stream = client.start_stream(resource.clone());

	tokio::time::sleep(StdDuration::from_millis(200)).await;
	listing_mock.delete_async().await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/r/formula1/new");
			then.status(200)
				.header("x-ratelimit-remaining", "590.0")
				.header("x-ratelimit-reset", "290")
				.header("x-ratelimit-used", "10")
				.body(listing("t3_fresh", "Qualifying thread", 1_700_000_900));
		})
		.await;

	if let Some(item) = tokio::time::timeout(StdDuration::from_secs(5), stream.next()).await? {
		println!("New post {} at {}: {} <{}>.", item.id, item.published_at, item.title, item.url);
	}

	stream.stop();

	for title in ["Qualifying thread", "Race thread"] {
		match client.submit_unique(&Submission::text_post(resource.clone(), title, "")).await? {
			SubmitOutcome::Submitted(_) => println!("Submitted {title:?}."),
			SubmitOutcome::Duplicate => println!("Skipped {title:?}; it was already posted."),
		}
	}

	println!("Governed rate: {:?}.", client.rate_state().await);

	token_mock.assert_async().await;
	submit_mock.assert_async().await;

	Ok(())
}
