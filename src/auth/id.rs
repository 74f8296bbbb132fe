//! Strongly typed resource (subreddit) names used to build listing and submit requests.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const RESOURCE_NAME_MAX_LEN: usize = 128;

/// Error returned when resource name validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum ResourceNameError {
	/// The name was empty.
	#[error("Resource name cannot be empty.")]
	Empty,
	/// The name contains whitespace characters.
	#[error("Resource name contains whitespace.")]
	ContainsWhitespace,
	/// The name contains a path separator and would escape the `/r/<name>` route.
	#[error("Resource name contains a path separator.")]
	ContainsSeparator,
	/// The name contains a character outside `[A-Za-z0-9_+]`.
	#[error("Resource name contains the disallowed character {character:?}.")]
	InvalidCharacter {
		/// First offending character.
		character: char,
	},
	/// The name exceeded the allowed character count.
	#[error("Resource name exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Name of a listing resource, e.g. the `rust` in `/r/rust/new`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceName(String);
impl ResourceName {
	/// Creates a new resource name after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, ResourceNameError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for ResourceName {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for ResourceName {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<ResourceName> for String {
	fn from(value: ResourceName) -> Self {
		value.0
	}
}
impl TryFrom<String> for ResourceName {
	type Error = ResourceNameError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl TryFrom<&str> for ResourceName {
	type Error = ResourceNameError;

	fn try_from(value: &str) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl Borrow<str> for ResourceName {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl Debug for ResourceName {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Resource({})", self.0)
	}
}
impl Display for ResourceName {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for ResourceName {
	type Err = ResourceNameError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(view: &str) -> Result<(), ResourceNameError> {
	if view.is_empty() {
		return Err(ResourceNameError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(ResourceNameError::ContainsWhitespace);
	}
	if view.contains('/') {
		return Err(ResourceNameError::ContainsSeparator);
	}
	if let Some(character) = view.chars().find(|c| !is_name_char(*c)) {
		return Err(ResourceNameError::InvalidCharacter { character });
	}
	if view.len() > RESOURCE_NAME_MAX_LEN {
		return Err(ResourceNameError::TooLong { max: RESOURCE_NAME_MAX_LEN });
	}

	Ok(())
}

// `+` joins several resources into one combined listing.
fn is_name_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_' || c == '+'
}
