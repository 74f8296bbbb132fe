//! Adaptive admission control for every outbound API call.
//!
//! A [`Governor`] owns a [`TokenBucket`] whose refill rate is retuned from the quota
//! headers of each response, and a [`Backoff`] that spaces out retries while the bucket
//! is starved. Admission is a strict wait: a call never proceeds without taking a token,
//! and every failed attempt to take one sleeps `min(2^exponent, cap)` seconds before
//! trying again.

pub mod backoff;
pub mod bucket;
pub mod quota;

pub use backoff::*;
pub use bucket::*;
pub use quota::*;

// crates.io
use tokio::time::Instant;
// self
use crate::{_prelude::*, config::GovernorConfig, obs};

/// Snapshot of the limiter's tunables.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateState {
	/// Requests per second the bucket currently refills at.
	pub rate: f64,
	/// Current backoff exponent.
	pub backoff_exponent: u32,
	/// Whole requests per second the latest quota allows (`floor(remaining / reset)`), once a
	/// response has been observed. Zero while the bucket trickles one token per reset window.
	pub allowed_rate: Option<u64>,
}

/// Token bucket + backoff pair retuned from server quota feedback.
#[derive(Clone, Debug)]
pub struct Governor {
	bucket: TokenBucket,
	backoff: Backoff,
	quota: Option<QuotaSnapshot>,
}
impl Governor {
	/// Creates a governor with a full bucket.
	pub fn new(config: &GovernorConfig) -> Self {
		Self::new_at(config, Instant::now())
	}

	/// Creates a governor observed at `now`.
	pub fn new_at(config: &GovernorConfig, now: Instant) -> Self {
		Self {
			bucket: TokenBucket::new(config.initial_rate, config.burst, now),
			backoff: Backoff::new(config.backoff_cap),
			quota: None,
		}
	}

	/// Waits until the bucket hands out a token.
	pub async fn admit(&mut self) {
		while let Some(delay) = self.try_admit_at(Instant::now()) {
			tokio::time::sleep(delay.unsigned_abs()).await;
		}
	}

	/// Takes a token if one is available (clearing the backoff), otherwise advances the backoff
	/// and returns the sleep the caller must take before asking again.
	pub fn try_admit_at(&mut self, now: Instant) -> Option<Duration> {
		match self.bucket.try_acquire_at(now) {
			Admission::Granted => {
				// A grant means the bucket held a whole token.
				self.backoff.reset();

				None
			},
			Admission::Starved { .. } => {
				let exponent = self.backoff.exponent();
				let delay = self.backoff.advance();

				obs::debug_backoff(exponent, delay);

				Some(delay)
			},
		}
	}

	/// Applies the quota headers of a response.
	pub fn observe(&mut self, snapshot: QuotaSnapshot) {
		self.observe_at(snapshot, Instant::now());
	}

	/// Retunes the bucket to the snapshot's rate and clears the backoff once a whole token is
	/// available again.
	pub fn observe_at(&mut self, snapshot: QuotaSnapshot, now: Instant) {
		let rate = snapshot.refill_per_second();

		self.bucket.set_rate_at(rate, now);
		self.quota = Some(snapshot);

		obs::record_governed_rate(rate);

		if self.bucket.available_at(now) >= 1. {
			self.backoff.reset();
		}
	}

	/// Latest quota snapshot, if any response has been observed.
	pub fn quota(&self) -> Option<QuotaSnapshot> {
		self.quota
	}

	/// Current rate and backoff exponent.
	pub fn rate_state(&self) -> RateState {
		RateState {
			rate: self.bucket.rate(),
			backoff_exponent: self.backoff.exponent(),
			allowed_rate: self.quota.map(|quota| quota.allowed_rate()),
		}
	}
}
