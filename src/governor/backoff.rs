//! Exponential backoff applied while the bucket stays starved.

// self
use crate::_prelude::*;

/// Backoff exponent with a capped sleep of `min(2^exponent, cap)` seconds.
///
/// The exponent only grows on starvation events and stops growing once the delay reaches the
/// cap; [`reset`](Self::reset) returns it to zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Backoff {
	exponent: u32,
	cap: Duration,
}
impl Backoff {
	/// Default ceiling on a single backoff sleep.
	pub const DEFAULT_CAP: Duration = Duration::minutes(2);

	const MAX_EXPONENT: u32 = 62;

	/// Creates a backoff at exponent zero.
	pub fn new(cap: Duration) -> Self {
		Self { exponent: 0, cap: if cap.is_negative() { Duration::ZERO } else { cap } }
	}

	/// Current exponent.
	pub fn exponent(&self) -> u32 {
		self.exponent
	}

	/// Ceiling on a single sleep.
	pub fn cap(&self) -> Duration {
		self.cap
	}

	/// Sleep the next starvation event would take.
	pub fn current_delay(&self) -> Duration {
		Duration::seconds(1_i64 << self.exponent.min(Self::MAX_EXPONENT)).min(self.cap)
	}

	/// Returns the delay for this starvation event and raises the exponent for the next one.
	pub fn advance(&mut self) -> Duration {
		let delay = self.current_delay();

		if delay < self.cap && self.exponent < Self::MAX_EXPONENT {
			self.exponent += 1;
		}

		delay
	}

	/// Returns the exponent to zero after the bucket recovers.
	pub fn reset(&mut self) {
		self.exponent = 0;
	}
}
impl Default for Backoff {
	fn default() -> Self {
		Self::new(Self::DEFAULT_CAP)
	}
}
