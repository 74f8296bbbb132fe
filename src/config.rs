//! Endpoint, governor, and poller configuration.

// self
use crate::{_prelude::*, error::ConfigError, governor::Backoff};

/// Base URLs of the auth and API hosts.
///
/// Both must be origins (scheme + host + optional port); request paths are joined onto them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceEndpoints {
	/// Host serving `/api/v1/access_token`.
	pub auth: Url,
	/// Host serving listings and submissions for bearer-authenticated calls.
	pub api: Url,
}
impl ServiceEndpoints {
	/// Default auth host.
	pub const DEFAULT_AUTH: &'static str = "https://www.reddit.com";
	/// Default API host.
	pub const DEFAULT_API: &'static str = "https://oauth.reddit.com";

	/// Validates and builds endpoints from explicit URLs.
	///
	/// Plain HTTP is accepted only for loopback hosts so tests can target local mock servers.
	pub fn new(auth: Url, api: Url) -> Result<Self, ConfigError> {
		ensure_secure("auth", &auth)?;
		ensure_secure("api", &api)?;

		Ok(Self { auth, api })
	}

	/// Parses both endpoints from strings.
	pub fn parse(auth: &str, api: &str) -> Result<Self, ConfigError> {
		Self::new(Url::parse(auth)?, Url::parse(api)?)
	}

	/// Token endpoint for the password grant.
	pub fn token_url(&self) -> Result<Url, ConfigError> {
		Ok(self.auth.join("/api/v1/access_token")?)
	}

	/// Resolves an API path (e.g. `/r/rust/new`) against the API host.
	pub fn api_url(&self, path: &str) -> Result<Url, ConfigError> {
		Ok(self.api.join(path)?)
	}
}
impl Default for ServiceEndpoints {
	fn default() -> Self {
		Self {
			auth: Url::parse(Self::DEFAULT_AUTH).expect("Default auth endpoint should parse."),
			api: Url::parse(Self::DEFAULT_API).expect("Default API endpoint should parse."),
		}
	}
}

fn ensure_secure(endpoint: &'static str, url: &Url) -> Result<(), ConfigError> {
	let loopback = match url.host() {
		Some(url::Host::Domain(domain)) => domain == "localhost",
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	};

	if url.scheme() == "https" || (url.scheme() == "http" && loopback) {
		Ok(())
	} else {
		Err(ConfigError::InsecureEndpoint { endpoint, url: url.to_string() })
	}
}

/// Limiter settings used until the first quota headers arrive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GovernorConfig {
	/// Requests per second allowed before any quota feedback.
	pub initial_rate: f64,
	/// Bucket capacity.
	pub burst: u32,
	/// Ceiling on a single backoff sleep.
	pub backoff_cap: Duration,
}
impl GovernorConfig {
	/// Overrides the initial rate.
	pub fn with_initial_rate(mut self, per_second: f64) -> Self {
		self.initial_rate = per_second;

		self
	}

	/// Overrides the bucket capacity.
	pub fn with_burst(mut self, burst: u32) -> Self {
		self.burst = burst;

		self
	}

	/// Overrides the backoff ceiling.
	pub fn with_backoff_cap(mut self, cap: Duration) -> Self {
		self.backoff_cap = cap;

		self
	}
}
impl Default for GovernorConfig {
	fn default() -> Self {
		Self { initial_rate: 0.5, burst: 1, backoff_cap: Backoff::DEFAULT_CAP }
	}
}

/// Stream and duplicate-check settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollerConfig {
	/// Number of recent items the duplicate check inspects.
	pub duplicate_window: u32,
	/// Extra pause between stream iterations on top of the governor's pacing.
	pub min_poll_interval: Duration,
}
impl PollerConfig {
	/// Overrides the duplicate-check window.
	pub fn with_duplicate_window(mut self, window: u32) -> Self {
		self.duplicate_window = window.max(1);

		self
	}

	/// Overrides the minimum pause between stream iterations.
	pub fn with_min_poll_interval(mut self, interval: Duration) -> Self {
		self.min_poll_interval = if interval.is_negative() { Duration::ZERO } else { interval };

		self
	}
}
impl Default for PollerConfig {
	fn default() -> Self {
		Self { duplicate_window: 25, min_poll_interval: Duration::ZERO }
	}
}

/// Everything a [`Client`](crate::Client) needs besides credentials and a token store.
#[derive(Clone, Debug, Default)]
pub struct ClientConfig {
	/// Auth and API hosts.
	pub endpoints: ServiceEndpoints,
	/// Limiter settings.
	pub governor: GovernorConfig,
	/// Poller settings.
	pub poller: PollerConfig,
}
impl ClientConfig {
	/// Overrides the endpoints.
	pub fn with_endpoints(mut self, endpoints: ServiceEndpoints) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Overrides the governor settings.
	pub fn with_governor(mut self, governor: GovernorConfig) -> Self {
		self.governor = governor;

		self
	}

	/// Overrides the poller settings.
	pub fn with_poller(mut self, poller: PollerConfig) -> Self {
		self.poller = poller;

		self
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn endpoints_reject_plain_http_outside_loopback() {
		let err = ServiceEndpoints::parse("http://www.reddit.com", ServiceEndpoints::DEFAULT_API)
			.expect_err("Plain HTTP auth endpoint should be rejected.");

		assert!(matches!(err, ConfigError::InsecureEndpoint { endpoint: "auth", .. }));
		assert!(ServiceEndpoints::parse("http://127.0.0.1:8080", "http://localhost:9090").is_ok());
	}

	#[test]
	fn endpoints_join_service_paths() {
		let endpoints = ServiceEndpoints::default();

		assert_eq!(
			endpoints.token_url().expect("Token URL should join.").as_str(),
			"https://www.reddit.com/api/v1/access_token"
		);
		assert_eq!(
			endpoints.api_url("/r/rust/new").expect("API URL should join.").as_str(),
			"https://oauth.reddit.com/r/rust/new"
		);
	}

	#[test]
	fn defaults_follow_the_service_conventions() {
		let config = ClientConfig::default();

		assert_eq!(config.governor.initial_rate, 0.5);
		assert_eq!(config.governor.burst, 1);
		assert_eq!(config.governor.backoff_cap, Duration::minutes(2));
		assert_eq!(config.poller.duplicate_window, 25);
		assert_eq!(PollerConfig::default().with_duplicate_window(0).duplicate_window, 1);
	}
}
