//! Client-level error types shared across the token manager, governor, and poller.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token persistence failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The API answered with something other than a usable 2xx response.
	#[error(transparent)]
	Api(#[from] ApiError),

	/// The password-grant exchange failed or returned no access token.
	#[error("Authentication with the token endpoint failed: {reason}.")]
	Authentication {
		/// Endpoint- or client-supplied reason string.
		reason: String,
	},
	/// The API rejected a freshly minted token.
	#[error("Authorization was rejected again after a forced token refresh.")]
	Unauthorized,
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// An endpoint URL could not be parsed or joined.
	#[error("Endpoint URL is invalid.")]
	InvalidUrl(#[from] url::ParseError),
	/// Endpoints must use HTTPS outside of loopback hosts.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Credentials file could not be read.
	#[error("Failed to read credentials from {path}.")]
	CredentialsRead {
		/// File that was being read.
		path: String,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Credentials file is not valid TOML or misses a field.
	#[error("Failed to parse credentials.")]
	CredentialsParse(#[from] toml::de::Error),
	/// Request body could not be encoded.
	#[error("Failed to encode the request body.")]
	BodyEncode(#[from] serde_json::Error),
}

/// Failures reported by the API itself (non-2xx or unreadable bodies).
#[derive(Debug, ThisError)]
pub enum ApiError {
	/// Any non-2xx, non-401 status. Never retried automatically.
	#[error("API returned an unexpected status code: {status}.")]
	UnexpectedStatus {
		/// HTTP status code.
		status: u16,
		/// Leading part of the response body, if any.
		body_preview: String,
	},
	/// Response body was not the expected JSON shape.
	#[error("API returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code.
		status: u16,
	},
}
impl ApiError {
	const PREVIEW_LEN: usize = 256;

	pub(crate) fn unexpected_status(status: u16, body: &[u8]) -> Self {
		let text = String::from_utf8_lossy(body);
		let body_preview = text.chars().take(Self::PREVIEW_LEN).collect();

		Self::UnexpectedStatus { status, body_preview }
	}

	/// Returns the HTTP status carried by the error.
	pub fn status(&self) -> u16 {
		match self {
			Self::UnexpectedStatus { status, .. } | Self::ResponseParse { status, .. } => *status,
		}
	}
}

/// Transport-level failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
impl From<ReqwestError> for Error {
	fn from(e: ReqwestError) -> Self {
		TransportError::from(e).into()
	}
}
