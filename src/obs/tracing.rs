// self
use crate::{_prelude::*, obs::CallKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used by governed calls.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the provided call kind + stage.
	pub fn new(kind: CallKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("reddit_broker.call", call = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a polling failure the stream loop is about to swallow.
pub(crate) fn warn_poll_failure(resource: &str, err: &Error) {
	#[cfg(feature = "tracing")]
	tracing::warn!(resource, error = %err, "listing fetch failed; stream keeps polling");
	#[cfg(not(feature = "tracing"))]
	let _ = (resource, err);
}

/// Logs a stream that ended because its baseline fetch failed.
pub(crate) fn warn_baseline_failure(resource: &str, err: &Error) {
	#[cfg(feature = "tracing")]
	tracing::warn!(resource, error = %err, "baseline fetch failed; stream closed");
	#[cfg(not(feature = "tracing"))]
	let _ = (resource, err);
}

/// Logs a duplicate check that failed closed.
pub(crate) fn warn_duplicate_check_failure(resource: &str, err: &Error) {
	#[cfg(feature = "tracing")]
	tracing::warn!(resource, error = %err, "duplicate check failed; assuming duplicate");
	#[cfg(not(feature = "tracing"))]
	let _ = (resource, err);
}

/// Logs a backoff sleep taken because the bucket was starved.
pub(crate) fn debug_backoff(exponent: u32, delay: Duration) {
	#[cfg(feature = "tracing")]
	tracing::debug!(exponent, delay_ms = delay.whole_milliseconds() as u64, "rate limiter starved");
	#[cfg(not(feature = "tracing"))]
	let _ = (exponent, delay);
}

/// Logs a forced token refresh triggered by an authorization rejection.
pub(crate) fn info_forced_refresh(status: u16) {
	#[cfg(feature = "tracing")]
	tracing::info!(status, "authorization rejected; refreshing bearer token");
	#[cfg(not(feature = "tracing"))]
	let _ = status;
}

/// Logs a persisted token that could not be loaded at startup.
pub(crate) fn warn_token_load_failure(err: &crate::store::StoreError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(error = %err, "persisted token unreadable; authenticating from scratch");
	#[cfg(not(feature = "tracing"))]
	let _ = err;
}
