//! Transport primitives for governed API calls.
//!
//! [`ApiRequest`] describes a call independently of the transport so the governor can
//! re-issue it after a token refresh, and [`ApiResponse`] carries the status, the parsed
//! [`QuotaSnapshot`], and the raw body back to the caller.

// std
use std::ops::Deref;
// crates.io
use reqwest::{
	Method,
	header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ApiError, ConfigError},
	governor::QuotaSnapshot,
	obs::CallKind,
};

/// Body attached to an [`ApiRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestBody {
	/// No body.
	Empty,
	/// `application/x-www-form-urlencoded` fields.
	Form(Vec<(String, String)>),
	/// Pre-encoded `application/json` payload.
	Json(Vec<u8>),
}

/// Replayable description of one API call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
	/// HTTP method (only GET and POST are used by the service).
	pub method: Method,
	/// Path relative to the API host, e.g. `/r/rust/new`.
	pub path: String,
	/// Query string pairs.
	pub query: Vec<(String, String)>,
	/// Request body.
	pub body: RequestBody,
	/// Call kind used for spans and metrics.
	pub kind: CallKind,
}
impl ApiRequest {
	/// Builds a GET request.
	pub fn get(kind: CallKind, path: impl Into<String>) -> Self {
		Self { method: Method::GET, path: path.into(), query: Vec::new(), body: RequestBody::Empty, kind }
	}

	/// Builds a form-encoded POST request.
	pub fn post_form<K, V>(
		kind: CallKind,
		path: impl Into<String>,
		fields: impl IntoIterator<Item = (K, V)>,
	) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		let fields = fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect();

		Self {
			method: Method::POST,
			path: path.into(),
			query: Vec::new(),
			body: RequestBody::Form(fields),
			kind,
		}
	}

	/// Builds a JSON-encoded POST request.
	pub fn post_json<T>(kind: CallKind, path: impl Into<String>, payload: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		let bytes = serde_json::to_vec(payload).map_err(ConfigError::from)?;

		Ok(Self {
			method: Method::POST,
			path: path.into(),
			query: Vec::new(),
			body: RequestBody::Json(bytes),
			kind,
		})
	}

	/// Appends a query pair.
	pub fn with_query(mut self, key: impl Into<String>, value: impl Display) -> Self {
		self.query.push((key.into(), value.to_string()));

		self
	}
}

/// Status, quota feedback, and body of a completed call.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Quota headers parsed from the response.
	pub quota: QuotaSnapshot,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Decodes the body as JSON, reporting the failing path on error.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ApiError::ResponseParse { source, status: self.status }.into())
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Sends `request` to `url` with the bearer token and user agent attached.
	pub(crate) async fn dispatch(
		&self,
		url: Url,
		request: &ApiRequest,
		token: &TokenSecret,
		user_agent: &str,
	) -> Result<ApiResponse> {
		let mut builder = self
			.0
			.request(request.method.clone(), url)
			.header(AUTHORIZATION, token.bearer_header())
			.header(USER_AGENT, user_agent);

		if !request.query.is_empty() {
			builder = builder.query(&request.query);
		}

		builder = match &request.body {
			RequestBody::Empty => builder,
			RequestBody::Form(fields) => builder.form(fields),
			RequestBody::Json(bytes) =>
				builder.header(CONTENT_TYPE, "application/json").body(bytes.clone()),
		};

		let response = builder.send().await?;
		let status = response.status().as_u16();
		let quota = QuotaSnapshot::from_headers(response.headers());
		let body = response.bytes().await?.to_vec();

		Ok(ApiResponse { status, quota, body })
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl Debug for ReqwestHttpClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ReqwestHttpClient(..)")
	}
}
