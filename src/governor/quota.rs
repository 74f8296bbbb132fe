//! Server-reported quota headers and the rate they imply.

// crates.io
use reqwest::header::HeaderMap;
// self
use crate::_prelude::*;

/// Prefix shared by every quota header (`x-ratelimit-used`, `-remaining`, `-reset`).
pub const QUOTA_HEADER_PREFIX: &str = "x-ratelimit-";

/// Latest quota budget observed on a response.
///
/// Each field is parsed independently; a missing or malformed header leaves only that field
/// unset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuotaSnapshot {
	/// Requests used in the current window.
	pub used: Option<u64>,
	/// Requests remaining in the current window.
	pub remaining: Option<f64>,
	/// Seconds until the window resets.
	pub reset: Option<u64>,
}
impl QuotaSnapshot {
	/// Rate used when the server reports no reset window.
	pub const FALLBACK_RATE: u64 = 1;

	/// Parses the quota headers of a response.
	pub fn from_headers(headers: &HeaderMap) -> Self {
		Self {
			used: header_value(headers, "used").and_then(|raw| raw.parse().ok()),
			remaining: header_value(headers, "remaining")
				.and_then(|raw| raw.parse::<f64>().ok())
				.filter(|value| value.is_finite()),
			reset: header_value(headers, "reset").and_then(|raw| raw.parse().ok()),
		}
	}

	/// Whole requests per second the remaining budget allows: `floor(remaining / reset)`.
	///
	/// Returns [`Self::FALLBACK_RATE`] when no positive reset window (or no remaining count) was
	/// reported.
	pub fn allowed_rate(&self) -> u64 {
		match (self.remaining, self.reset) {
			(Some(remaining), Some(reset)) if reset > 0 =>
				(remaining / reset as f64).floor().max(0.) as u64,
			_ => Self::FALLBACK_RATE,
		}
	}

	/// Refill rate (tokens per second) the limiter should run at.
	///
	/// Identical to [`allowed_rate`](Self::allowed_rate) except when the budget rounds down to
	/// zero: the limiter then grants a single request per reset window instead of stalling.
	pub fn refill_per_second(&self) -> f64 {
		match (self.allowed_rate(), self.reset) {
			(0, Some(reset)) if reset > 0 => 1. / reset as f64,
			(rate, _) => rate as f64,
		}
	}

	/// Returns `true` when the server says no requests are left in this window.
	pub fn is_exhausted(&self) -> bool {
		self.remaining.is_some_and(|remaining| remaining < 1.)
	}
}

fn header_value<'a>(headers: &'a HeaderMap, field: &str) -> Option<&'a str> {
	let name = format!("{QUOTA_HEADER_PREFIX}{field}");

	headers.get(name.as_str())?.to_str().ok().map(str::trim)
}

#[cfg(test)]
mod tests {
	// crates.io
	use reqwest::header::HeaderValue;
	// self
	use super::*;

	fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
		let mut map = HeaderMap::new();

		for (name, value) in pairs {
			map.insert(*name, HeaderValue::from_static(value));
		}

		map
	}

	#[test]
	fn parses_all_quota_fields() {
		let snapshot = QuotaSnapshot::from_headers(&headers(&[
			("x-ratelimit-used", "12"),
			("x-ratelimit-remaining", "588.0"),
			("x-ratelimit-reset", "294"),
		]));

		assert_eq!(snapshot.used, Some(12));
		assert_eq!(snapshot.remaining, Some(588.));
		assert_eq!(snapshot.reset, Some(294));
		assert_eq!(snapshot.allowed_rate(), 2);
		assert_eq!(snapshot.refill_per_second(), 2.);
	}

	#[test]
	fn malformed_fields_are_ignored_individually() {
		let snapshot = QuotaSnapshot::from_headers(&headers(&[
			("x-ratelimit-used", "many"),
			("x-ratelimit-remaining", "NaN"),
			("x-ratelimit-reset", "60"),
		]));

		assert_eq!(snapshot.used, None);
		assert_eq!(snapshot.remaining, None);
		assert_eq!(snapshot.reset, Some(60));
	}

	#[test]
	fn zero_or_missing_reset_window_governs_at_one_per_second() {
		let zero = QuotaSnapshot { used: Some(1), remaining: Some(599.), reset: Some(0) };

		assert_eq!(zero.allowed_rate(), 1);
		assert_eq!(zero.refill_per_second(), 1.);
		assert_eq!(QuotaSnapshot::from_headers(&HeaderMap::new()).allowed_rate(), 1);
	}

	#[test]
	fn allowed_rate_floors_and_never_goes_negative() {
		for (remaining, reset, expected) in
			[(599., 600, 0), (600., 600, 1), (1199.9, 600, 1), (1800., 600, 3), (-5., 10, 0)]
		{
			let snapshot = QuotaSnapshot { used: None, remaining: Some(remaining), reset: Some(reset) };

			assert_eq!(snapshot.allowed_rate(), expected, "remaining={remaining} reset={reset}");
		}
	}

	#[test]
	fn exhausted_budget_refills_once_per_window() {
		let snapshot = QuotaSnapshot { used: Some(600), remaining: Some(0.), reset: Some(120) };

		assert!(snapshot.is_exhausted());
		assert_eq!(snapshot.allowed_rate(), 0);
		assert!((snapshot.refill_per_second() - 1. / 120.).abs() < f64::EPSILON);
	}
}
