//! Client identity used for the password grant, loadable from a TOML file.

// std
use std::{fs, path::Path};
// self
use crate::{_prelude::*, error::ConfigError};

/// Script-app credentials for the password grant.
///
/// Field names match the TOML keys:
///
/// ```toml
/// client_id = "..."
/// client_secret = "..."
/// username = "..."
/// password = "..."
/// user_agent = "linux:my-bot:v0.1 (by /u/someone)"
/// ```
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: String,
	/// Account username.
	pub username: String,
	/// Account password.
	pub password: String,
	/// `User-Agent` sent with every request.
	pub user_agent: String,
}
impl Credentials {
	/// Creates credentials from explicit values.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		username: impl Into<String>,
		password: impl Into<String>,
		user_agent: impl Into<String>,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			username: username.into(),
			password: password.into(),
			user_agent: user_agent.into(),
		}
	}

	/// Parses credentials from a TOML document.
	pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(raw)?)
	}

	/// Reads and parses a TOML credentials file.
	pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let raw = fs::read_to_string(path).map_err(|source| ConfigError::CredentialsRead {
			path: path.display().to_string(),
			source,
		})?;

		Self::from_toml_str(&raw)
	}

	/// Form fields of the password grant.
	pub(crate) fn password_grant(&self) -> [(&'static str, &str); 3] {
		[
			("grant_type", "password"),
			("username", self.username.as_str()),
			("password", self.password.as_str()),
		]
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.field("user_agent", &self.user_agent)
			.finish()
	}
}
