//! The governed client: one token manager and one governor behind a single async lock.
//!
//! Every call holds the session lock from admission until its response has been read, so a
//! [`Client`] never has more than one request in flight. Clones share the session; streams
//! spawned from a client interleave their fetches through the same governor.

// self
use crate::{
	_prelude::*,
	auth::{Credentials, ResourceName, TokenManager, TokenMetrics},
	config::ClientConfig,
	error::ApiError,
	governor::{Governor, QuotaSnapshot, RateState},
	http::{ApiRequest, ApiResponse, ReqwestHttpClient},
	listing::Listing,
	obs::{self, CallKind, CallOutcome, CallSpan},
	store::TokenStore,
};

const UNAUTHORIZED: u16 = 401;
/// Dispatches per call: the first attempt plus one replay after a forced refresh.
const MAX_ATTEMPTS: usize = 2;

/// Mutable state shared by every call made through a [`Client`].
#[derive(Debug)]
pub struct Session {
	/// Token lifecycle owner.
	pub tokens: TokenManager,
	/// Admission control.
	pub governor: Governor,
}

struct ClientInner {
	http: ReqwestHttpClient,
	config: ClientConfig,
	token_metrics: Arc<TokenMetrics>,
	session: AsyncMutex<Session>,
}

/// Cheaply cloneable handle to a governed API session.
#[derive(Clone)]
pub struct Client {
	inner: Arc<ClientInner>,
}
impl Client {
	/// Authenticates (or reuses the persisted token) and builds a client with the default
	/// reqwest transport.
	pub async fn connect(
		credentials: Credentials,
		store: Arc<dyn TokenStore>,
		config: ClientConfig,
	) -> Result<Self> {
		Self::with_http_client(credentials, store, config, ReqwestHttpClient::default()).await
	}

	/// Same as [`connect`](Self::connect) with a caller-provided transport.
	pub async fn with_http_client(
		credentials: Credentials,
		store: Arc<dyn TokenStore>,
		config: ClientConfig,
		http: ReqwestHttpClient,
	) -> Result<Self> {
		let tokens =
			TokenManager::initialize(credentials, store, http.clone(), &config.endpoints).await?;
		let token_metrics = tokens.metrics();
		let governor = Governor::new(&config.governor);
		let session = AsyncMutex::new(Session { tokens, governor });

		Ok(Self { inner: Arc::new(ClientInner { http, config, token_metrics, session }) })
	}

	/// Configuration the client was built with.
	pub fn config(&self) -> &ClientConfig {
		&self.inner.config
	}

	/// Password-grant exchange counters.
	pub fn token_metrics(&self) -> Arc<TokenMetrics> {
		self.inner.token_metrics.clone()
	}

	/// Latest quota snapshot observed by the governor.
	pub async fn quota(&self) -> Option<QuotaSnapshot> {
		self.inner.session.lock().await.governor.quota()
	}

	/// Current governed rate and backoff exponent.
	pub async fn rate_state(&self) -> RateState {
		self.inner.session.lock().await.governor.rate_state()
	}

	/// Runs `request` through admission, dispatch, quota feedback, and the single
	/// refresh-and-retry allowed after a 401.
	///
	/// Returns the 2xx response. Non-2xx statuses other than 401 surface as
	/// [`ApiError::UnexpectedStatus`]; a 401 on the replay surfaces as
	/// [`Error::Unauthorized`].
	pub async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
		let kind = request.kind;
		let span = CallSpan::new(kind, "execute");

		obs::record_call_outcome(kind, CallOutcome::Attempt);

		let result = span.instrument(self.execute_governed(request)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(kind, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(kind, CallOutcome::Failure),
		}

		result
	}

	async fn execute_governed(&self, request: &ApiRequest) -> Result<ApiResponse> {
		let url = self.inner.config.endpoints.api_url(&request.path)?;
		let mut session = self.inner.session.lock().await;
		let user_agent = session.tokens.credentials().user_agent.clone();

		for attempt in 1..=MAX_ATTEMPTS {
			session.governor.admit().await;

			let token = session.tokens.auth_header().clone();
			let response =
				self.inner.http.dispatch(url.clone(), request, &token, &user_agent).await?;

			session.governor.observe(response.quota);

			if response.status == UNAUTHORIZED {
				if attempt == MAX_ATTEMPTS {
					break;
				}

				obs::info_forced_refresh(response.status);
				session.tokens.force_refresh().await?;

				continue;
			}
			if !response.is_success() {
				return Err(ApiError::unexpected_status(response.status, &response.body).into());
			}

			return Ok(response);
		}

		Err(Error::Unauthorized)
	}

	/// Fetches the `limit` newest items of `resource`.
	pub async fn fetch_newest(&self, resource: &ResourceName, limit: u32) -> Result<Listing> {
		let request = ApiRequest::get(CallKind::Listing, format!("/r/{resource}/new"))
			.with_query("limit", limit.max(1));

		self.execute(&request).await?.json()
	}
}
impl Debug for Client {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("http", &self.inner.http)
			.field("config", &self.inner.config)
			.finish()
	}
}
