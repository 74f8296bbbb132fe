//! Bearer token lifecycle: load from the store, mint via the password grant, force refresh.
//!
//! The manager never tracks token expiry. A token stays in use until the API rejects it with
//! a 401, at which point the governor calls [`TokenManager::force_refresh`] once and replays
//! the rejected request.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use reqwest::header::USER_AGENT;
// self
use crate::{
	_prelude::*,
	auth::{Credentials, TokenSecret},
	config::ServiceEndpoints,
	http::ReqwestHttpClient,
	obs::{self, CallKind, CallOutcome, CallSpan},
	store::TokenStore,
};

/// Thread-safe counters for password-grant exchanges.
#[derive(Debug, Default)]
pub struct TokenMetrics {
	exchanges: AtomicU64,
	failures: AtomicU64,
	forced_refreshes: AtomicU64,
}
impl TokenMetrics {
	/// Returns the number of password-grant exchanges attempted.
	pub fn exchanges(&self) -> u64 {
		self.exchanges.load(Ordering::Relaxed)
	}

	/// Returns the number of failed exchanges.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	/// Returns the number of refreshes forced by authorization rejections.
	pub fn forced_refreshes(&self) -> u64 {
		self.forced_refreshes.load(Ordering::Relaxed)
	}

	pub(crate) fn record_exchange(&self) {
		self.exchanges.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_forced_refresh(&self) {
		self.forced_refreshes.fetch_add(1, Ordering::Relaxed);
	}
}

#[derive(Deserialize)]
struct TokenEndpointResponse {
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	error: Option<serde_json::Value>,
}

/// Owns the credentials and the single cached bearer token.
pub struct TokenManager {
	credentials: Credentials,
	store: Arc<dyn TokenStore>,
	http: ReqwestHttpClient,
	token_url: Url,
	current: TokenSecret,
	metrics: Arc<TokenMetrics>,
}
impl TokenManager {
	/// Loads the persisted token, or authenticates and persists a new one.
	///
	/// A store that fails to load is treated like an empty one. Failing to mint or persist a
	/// token is fatal: no client can exist without one.
	pub async fn initialize(
		credentials: Credentials,
		store: Arc<dyn TokenStore>,
		http: ReqwestHttpClient,
		endpoints: &ServiceEndpoints,
	) -> Result<Self> {
		let token_url = endpoints.token_url()?;
		let persisted = match store.load().await {
			Ok(token) => token,
			Err(e) => {
				obs::warn_token_load_failure(&e);

				None
			},
		};
		let mut manager = Self {
			credentials,
			store,
			http,
			token_url,
			current: TokenSecret::new(String::new()),
			metrics: Default::default(),
		};

		match persisted {
			Some(token) => manager.current = token,
			None => {
				let token = manager.exchange("initialize").await?;

				manager.persist(token).await?;
			},
		}

		Ok(manager)
	}

	/// Token to attach to the next request.
	pub fn auth_header(&self) -> &TokenSecret {
		&self.current
	}

	/// Mints a new token, overwrites the persisted one, and returns it.
	///
	/// A failed exchange keeps the current token. A failed save still switches to the new token
	/// and reports [`Error::Storage`].
	pub async fn force_refresh(&mut self) -> Result<TokenSecret> {
		self.metrics.record_forced_refresh();

		let token = self.exchange("force_refresh").await?;

		self.persist(token).await?;

		Ok(self.current.clone())
	}

	/// Credentials this manager authenticates with.
	pub fn credentials(&self) -> &Credentials {
		&self.credentials
	}

	/// Shared exchange counters.
	pub fn metrics(&self) -> Arc<TokenMetrics> {
		self.metrics.clone()
	}

	// The new token is adopted before saving so a store failure never leaves the rejected
	// token in use.
	async fn persist(&mut self, token: TokenSecret) -> Result<()> {
		self.current = token.clone();
		self.store.save(token).await?;

		Ok(())
	}

	async fn exchange(&self, stage: &'static str) -> Result<TokenSecret> {
		const KIND: CallKind = CallKind::TokenExchange;

		let span = CallSpan::new(KIND, stage);

		obs::record_call_outcome(KIND, CallOutcome::Attempt);
		self.metrics.record_exchange();

		let result = span.instrument(self.exchange_inner()).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => {
				self.metrics.record_failure();
				obs::record_call_outcome(KIND, CallOutcome::Failure);
			},
		}

		result
	}

	async fn exchange_inner(&self) -> Result<TokenSecret> {
		let credentials = &self.credentials;
		let response = self
			.http
			.post(self.token_url.clone())
			.basic_auth(&credentials.client_id, Some(&credentials.client_secret))
			.header(USER_AGENT, &credentials.user_agent)
			.form(&credentials.password_grant())
			.send()
			.await?;
		let status = response.status();
		let body = response.bytes().await?;

		if !status.is_success() {
			return Err(Error::Authentication {
				reason: format!("token endpoint returned status {}", status.as_u16()),
			});
		}

		let mut de = serde_json::Deserializer::from_slice(&body);
		let parsed: TokenEndpointResponse = serde_path_to_error::deserialize(&mut de)
			.map_err(|e| Error::Authentication { reason: format!("malformed token response: {e}") })?;

		if let Some(error) = parsed.error {
			return Err(Error::Authentication { reason: format!("token endpoint error {error}") });
		}

		parsed
			.access_token
			.filter(|token| !token.is_empty())
			.map(TokenSecret::new)
			.ok_or_else(|| Error::Authentication { reason: "no access_token in response".into() })
	}
}
impl Debug for TokenManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("credentials", &self.credentials)
			.field("token_url", &self.token_url)
			.field("current", &self.current)
			.finish()
	}
}
