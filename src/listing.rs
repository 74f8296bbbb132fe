//! Listing payloads returned by `/r/<resource>/new` and the items derived from them.

// self
use crate::_prelude::*;

const AMP_SUFFIXES: [&str; 2] = ["/amp/", "/amp"];

/// Top-level listing envelope.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Listing {
	/// Envelope kind, `Listing` for listing responses.
	#[serde(default)]
	pub kind: String,
	/// Page contents.
	pub data: ListingData,
}
impl Listing {
	/// First (newest) child, if any.
	pub fn first(&self) -> Option<&Thing> {
		self.data.children.first()
	}

	/// Newest item, if any.
	pub fn newest(&self) -> Option<ListingItem> {
		self.first().map(Thing::to_item)
	}

	/// All children as items, newest first.
	pub fn items(&self) -> Vec<ListingItem> {
		self.data.children.iter().map(Thing::to_item).collect()
	}
}

/// Page of children plus pagination cursors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingData {
	/// Cursor for the next (older) page.
	#[serde(default)]
	pub after: Option<String>,
	/// Cursor for the previous (newer) page.
	#[serde(default)]
	pub before: Option<String>,
	/// Number of children returned.
	#[serde(default)]
	pub dist: Option<u32>,
	/// Legacy CSRF token, usually empty.
	#[serde(default)]
	pub modhash: Option<String>,
	/// Geo filter applied by the service.
	#[serde(default)]
	pub geo_filter: Option<String>,
	/// Returned posts, newest first.
	#[serde(default)]
	pub children: Vec<Thing>,
}

/// One child of a listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Thing {
	/// Thing kind, `t3` for posts.
	#[serde(default)]
	pub kind: String,
	/// Post fields.
	pub data: PostData,
}
impl Thing {
	/// Converts the raw child into a comparable item.
	pub fn to_item(&self) -> ListingItem {
		ListingItem {
			id: self.data.name.clone(),
			published_at: self.data.published_at(),
			title: self.data.title.clone(),
			url: canonical_url(&self.data.url),
		}
	}
}

/// Fields of a post used by the poller, with everything else kept verbatim in `extra`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostData {
	/// Fullname, e.g. `t3_abc123`; the item's identity.
	pub name: String,
	/// Post title.
	#[serde(default)]
	pub title: String,
	/// Creation time in Unix seconds.
	pub created_utc: f64,
	/// Link target (or the permalink for self posts).
	#[serde(default)]
	pub url: String,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}
impl PostData {
	/// Publish time truncated to whole seconds.
	pub fn published_at(&self) -> OffsetDateTime {
		OffsetDateTime::from_unix_timestamp(self.created_utc.trunc() as i64)
			.unwrap_or(OffsetDateTime::UNIX_EPOCH)
	}
}

/// Comparable view of a post: identity, publish time, title, and canonical URL.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingItem {
	/// Opaque identity.
	pub id: String,
	/// Publish timestamp.
	pub published_at: OffsetDateTime,
	/// Post title.
	pub title: String,
	/// URL with any AMP suffix removed.
	pub url: String,
}

/// Strips a trailing `/amp` or `/amp/` so AMP and canonical links compare equal.
pub fn canonical_url(raw: &str) -> String {
	let mut url = raw;

	for suffix in AMP_SUFFIXES {
		url = url.strip_suffix(suffix).unwrap_or(url);
	}

	url.to_owned()
}
