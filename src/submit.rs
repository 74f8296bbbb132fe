//! Content submission through `/api/submit`, in either form or JSON encoding.

// self
use crate::{
	_prelude::*,
	auth::ResourceName,
	client::Client,
	http::ApiRequest,
	obs::CallKind,
};

const SUBMIT_PATH: &str = "/api/submit";

/// A post to submit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
	/// Post title.
	pub title: String,
	/// Self-post body.
	pub text: String,
	/// Target resource.
	pub sr: ResourceName,
	/// Response format requested from the API.
	pub api_type: String,
	/// Post kind (`self`, `link`, ...).
	pub kind: String,
	/// Response extension.
	pub extension: String,
}
impl Submission {
	/// Builds a self post with JSON responses requested.
	pub fn text_post(sr: ResourceName, title: impl Into<String>, text: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			text: text.into(),
			sr,
			api_type: "json".into(),
			kind: "self".into(),
			extension: "json".into(),
		}
	}

	/// Overrides the post kind.
	pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
		self.kind = kind.into();

		self
	}

	fn form_fields(&self) -> [(&'static str, String); 6] {
		[
			("title", self.title.clone()),
			("text", self.text.clone()),
			("sr", self.sr.to_string()),
			("kind", self.kind.clone()),
			("api_type", self.api_type.clone()),
			("extension", self.extension.clone()),
		]
	}
}

/// Result of [`Client::submit_unique`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
	/// The post was submitted; carries the raw response body.
	Submitted(Vec<u8>),
	/// A recent post already has this title (or the check could not be completed).
	Duplicate,
}

impl Client {
	/// Submits `submission` form-encoded and returns the raw response body.
	pub async fn submit_form(&self, submission: &Submission) -> Result<Vec<u8>> {
		let request = ApiRequest::post_form(CallKind::Submit, SUBMIT_PATH, submission.form_fields());

		Ok(self.execute(&request).await?.body)
	}

	/// Submits `submission` JSON-encoded and returns the raw response body.
	pub async fn submit_json(&self, submission: &Submission) -> Result<Vec<u8>> {
		let request = ApiRequest::post_json(CallKind::Submit, SUBMIT_PATH, submission)?;

		Ok(self.execute(&request).await?.body)
	}

	/// Form-submits `submission` unless the duplicate check matches its title.
	pub async fn submit_unique(&self, submission: &Submission) -> Result<SubmitOutcome> {
		if self.check_duplicate(&submission.sr, &submission.title).await {
			return Ok(SubmitOutcome::Duplicate);
		}

		self.submit_form(submission).await.map(SubmitOutcome::Submitted)
	}
}
