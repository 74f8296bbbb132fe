//! Token bucket whose refill rate can be retuned between calls.

// crates.io
use tokio::time::Instant;
// self
use crate::_prelude::*;

/// Result of asking the bucket for a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
	/// A token was taken; the call may proceed.
	Granted,
	/// No whole token is available.
	Starved {
		/// Time until the next whole token accrues at the current rate.
		retry_in: Duration,
	},
}

/// Token bucket with a fixed capacity and an adjustable refill rate.
///
/// Every method takes the observation instant explicitly so the arithmetic can be exercised
/// without sleeping.
#[derive(Clone, Debug)]
pub struct TokenBucket {
	capacity: f64,
	per_second: f64,
	tokens: f64,
	updated_at: Instant,
}
impl TokenBucket {
	/// Creates a full bucket.
	pub fn new(per_second: f64, burst: u32, now: Instant) -> Self {
		let capacity = f64::from(burst.max(1));

		Self { capacity, per_second: sanitize_rate(per_second), tokens: capacity, updated_at: now }
	}

	/// Current refill rate in tokens per second.
	pub fn rate(&self) -> f64 {
		self.per_second
	}

	/// Maximum number of tokens the bucket holds.
	pub fn capacity(&self) -> f64 {
		self.capacity
	}

	/// Tokens available at `now`, including fractional accrual.
	pub fn available_at(&mut self, now: Instant) -> f64 {
		self.refill(now);

		self.tokens
	}

	/// Takes one token if a whole one is available at `now`.
	pub fn try_acquire_at(&mut self, now: Instant) -> Admission {
		self.refill(now);

		if self.tokens >= 1. {
			self.tokens -= 1.;

			return Admission::Granted;
		}

		Admission::Starved { retry_in: self.time_until_token() }
	}

	/// Changes the refill rate, crediting tokens accrued at the old rate up to `now` first.
	pub fn set_rate_at(&mut self, per_second: f64, now: Instant) {
		self.refill(now);
		self.per_second = sanitize_rate(per_second);
	}

	fn refill(&mut self, now: Instant) {
		let elapsed = now.saturating_duration_since(self.updated_at).as_secs_f64();

		self.tokens = (self.tokens + elapsed * self.per_second).min(self.capacity);
		self.updated_at = self.updated_at.max(now);
	}

	fn time_until_token(&self) -> Duration {
		if self.per_second <= 0. {
			return Duration::MAX;
		}

		Duration::saturating_seconds_f64((1. - self.tokens).max(0.) / self.per_second)
	}
}

fn sanitize_rate(per_second: f64) -> f64 {
	if per_second.is_finite() { per_second.max(0.) } else { 0. }
}

#[cfg(test)]
mod tests {
	// std
	use std::time::Duration as StdDuration;
	// self
	use super::*;

	#[test]
	fn full_bucket_grants_burst_then_starves() {
		let start = Instant::now();
		let mut bucket = TokenBucket::new(1., 2, start);

		assert_eq!(bucket.try_acquire_at(start), Admission::Granted);
		assert_eq!(bucket.try_acquire_at(start), Admission::Granted);
		assert_eq!(bucket.try_acquire_at(start), Admission::Starved { retry_in: Duration::SECOND });
	}

	#[test]
	fn tokens_accrue_at_the_configured_rate() {
		let start = Instant::now();
		let mut bucket = TokenBucket::new(2., 1, start);

		assert_eq!(bucket.try_acquire_at(start), Admission::Granted);
		assert!(matches!(
			bucket.try_acquire_at(start + StdDuration::from_millis(250)),
			Admission::Starved { .. }
		));
		assert_eq!(bucket.try_acquire_at(start + StdDuration::from_millis(500)), Admission::Granted);
	}

	#[test]
	fn retuning_credits_time_elapsed_at_the_old_rate() {
		let start = Instant::now();
		let mut bucket = TokenBucket::new(1., 4, start);

		for _ in 0..4 {
			assert_eq!(bucket.try_acquire_at(start), Admission::Granted);
		}

		let later = start + StdDuration::from_secs(2);

		bucket.set_rate_at(100., later);

		assert!((bucket.available_at(later) - 2.).abs() < 1e-9);
		assert_eq!(bucket.rate(), 100.);
	}

	#[test]
	fn capacity_bounds_accrual() {
		let start = Instant::now();
		let mut bucket = TokenBucket::new(10., 3, start);

		assert_eq!(bucket.available_at(start + StdDuration::from_secs(60)), 3.);
		assert_eq!(bucket.capacity(), 3.);
	}

	#[test]
	fn invalid_rates_stop_refilling() {
		let start = Instant::now();
		let mut bucket = TokenBucket::new(f64::NAN, 1, start);

		assert_eq!(bucket.rate(), 0.);
		assert_eq!(bucket.try_acquire_at(start), Admission::Granted);
		assert_eq!(
			bucket.try_acquire_at(start + StdDuration::from_secs(5)),
			Admission::Starved { retry_in: Duration::MAX }
		);
	}
}
