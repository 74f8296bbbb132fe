//! Optional observability helpers for governed calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (default) to emit structured spans named `reddit_broker.call` with the
//!   `call` (kind) and `stage` (call site) fields, plus warn/debug events for throttling sleeps,
//!   token refreshes, and swallowed polling failures.
//! - Enable `metrics` to increment the `reddit_broker_call_total` counter for every
//!   attempt/success/failure, labeled by `call` + `outcome`, and to publish the governed rate
//!   through the `reddit_broker_governed_rate` gauge.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outbound call kinds observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// Password-grant exchange against the auth host.
	TokenExchange,
	/// Listing fetch (`/r/<resource>/new`).
	Listing,
	/// Content submission (`/api/submit`).
	Submit,
}
impl CallKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::TokenExchange => "token_exchange",
			CallKind::Listing => "listing",
			CallKind::Submit => "submit",
		}
	}
}
impl Display for CallKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to a client helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
