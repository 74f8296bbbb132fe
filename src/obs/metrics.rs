// self
use crate::obs::{CallKind, CallOutcome};

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(kind: CallKind, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"reddit_broker_call_total",
			"call" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Publishes the rate the governor currently allows, in requests per second.
pub fn record_governed_rate(per_second: f64) {
	#[cfg(feature = "metrics")]
	{
		metrics::gauge!("reddit_broker_governed_rate").set(per_second);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = per_second;
	}
}
