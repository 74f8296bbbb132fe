//! Change detection over repeated "newest item" fetches, plus the fail-closed duplicate check.
//!
//! [`start_stream`] spawns one task per resource. The task records a baseline cursor and then
//! polls without any pacing of its own beyond [`PollerConfig::min_poll_interval`]; the
//! governor behind the [`ListingSource`] is what keeps the loop from spinning. An item is
//! emitted only when its identity differs from the cursor *and* it was published strictly
//! later, so emissions from one stream are ordered by publish time. Cancellation is a flag
//! checked once per iteration: it takes effect after the in-flight fetch completes.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// crates.io
use tokio::{sync::mpsc, task::JoinHandle};
// self
use crate::{
	_prelude::*,
	auth::ResourceName,
	client::Client,
	config::PollerConfig,
	listing::{Listing, ListingItem},
	obs,
};

/// Boxed future returned by [`ListingSource::fetch_newest`].
pub type SourceFuture<'a> = Pin<Box<dyn Future<Output = Result<Listing>> + 'a + Send>>;

/// Anything that can fetch the newest items of a resource.
pub trait ListingSource
where
	Self: 'static + Send + Sync,
{
	/// Fetches up to `limit` newest items, newest first.
	fn fetch_newest<'a>(&'a self, resource: &'a ResourceName, limit: u32) -> SourceFuture<'a>;
}
impl ListingSource for Client {
	fn fetch_newest<'a>(&'a self, resource: &'a ResourceName, limit: u32) -> SourceFuture<'a> {
		Box::pin(Client::fetch_newest(self, resource, limit))
	}
}

/// Identity and publish time of the last emitted (or baseline) item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamCursor {
	/// Opaque identity of the item.
	pub id: String,
	/// Publish time of the item.
	pub published_at: OffsetDateTime,
}
impl StreamCursor {
	/// Cursor positioned at `item`.
	pub fn from_item(item: &ListingItem) -> Self {
		Self { id: item.id.clone(), published_at: item.published_at }
	}

	/// Whether `item` is new relative to this cursor.
	pub fn admits(&self, item: &ListingItem) -> bool {
		!item.id.is_empty() && item.id != self.id && item.published_at > self.published_at
	}
}

/// Applies one fetched newest item to the cursor and returns it if it should be emitted.
///
/// Without a cursor (the resource was empty at baseline) any item counts as new. Items without
/// an identity are never emitted.
pub fn advance_cursor(
	cursor: &mut Option<StreamCursor>,
	newest: Option<ListingItem>,
) -> Option<ListingItem> {
	let item = newest.filter(|item| !item.id.is_empty())?;

	if cursor.as_ref().is_some_and(|current| !current.admits(&item)) {
		return None;
	}

	*cursor = Some(StreamCursor::from_item(&item));

	Some(item)
}

/// Receiving end of a running stream.
///
/// Dropping the stream cancels it.
#[derive(Debug)]
pub struct ListingStream {
	resource: ResourceName,
	receiver: mpsc::Receiver<ListingItem>,
	cancel: Arc<AtomicBool>,
	task: JoinHandle<()>,
}
impl ListingStream {
	/// Waits for the next new item; `None` once the stream has ended.
	pub async fn next(&mut self) -> Option<ListingItem> {
		self.receiver.recv().await
	}

	/// Requests cancellation. The task exits at its next iteration boundary.
	pub fn stop(&self) {
		self.cancel.store(true, Ordering::Release);
	}

	/// Whether the polling task has exited.
	pub fn is_finished(&self) -> bool {
		self.task.is_finished()
	}

	/// Resource being watched.
	pub fn resource(&self) -> &ResourceName {
		&self.resource
	}
}
impl Drop for ListingStream {
	fn drop(&mut self) {
		self.stop();
	}
}

/// Spawns a polling task on the current tokio runtime and returns its stream.
pub fn start_stream<S>(source: Arc<S>, resource: ResourceName, config: PollerConfig) -> ListingStream
where
	S: ?Sized + ListingSource,
{
	let (sender, receiver) = mpsc::channel(1);
	let cancel = Arc::new(AtomicBool::new(false));
	let task = tokio::spawn(poll_loop(source, resource.clone(), config, cancel.clone(), sender));

	ListingStream { resource, receiver, cancel, task }
}

async fn poll_loop<S>(
	source: Arc<S>,
	resource: ResourceName,
	config: PollerConfig,
	cancel: Arc<AtomicBool>,
	sender: mpsc::Sender<ListingItem>,
) where
	S: ?Sized + ListingSource,
{
	let mut cursor = match source.fetch_newest(&resource, 1).await {
		Ok(listing) => listing.newest().map(|item| StreamCursor::from_item(&item)),
		Err(e) => {
			obs::warn_baseline_failure(&resource, &e);

			return;
		},
	};

	loop {
		if cancel.load(Ordering::Acquire) || sender.is_closed() {
			break;
		}

		match source.fetch_newest(&resource, 1).await {
			Ok(listing) =>
				if let Some(item) = advance_cursor(&mut cursor, listing.newest())
					&& sender.send(item).await.is_err()
				{
					break;
				},
			Err(e) => obs::warn_poll_failure(&resource, &e),
		}

		if config.min_poll_interval.is_positive() {
			tokio::time::sleep(config.min_poll_interval.unsigned_abs()).await;
		} else {
			tokio::task::yield_now().await;
		}
	}
}

/// Reports whether any of the `window` newest items has the same trimmed title.
///
/// Fails closed: a fetch error counts as a duplicate.
pub async fn check_duplicate<S>(source: &S, resource: &ResourceName, title: &str, window: u32) -> bool
where
	S: ?Sized + ListingSource,
{
	let candidate = title.trim();

	match source.fetch_newest(resource, window).await {
		Ok(listing) => listing.data.children.iter().any(|thing| thing.data.title.trim() == candidate),
		Err(e) => {
			obs::warn_duplicate_check_failure(resource, &e);

			true
		},
	}
}

impl Client {
	/// Starts streaming newly published items of `resource`.
	///
	/// Must be called from within a tokio runtime.
	pub fn start_stream(&self, resource: ResourceName) -> ListingStream {
		start_stream(Arc::new(self.clone()), resource, self.config().poller)
	}

	/// Checks the configured window of recent items for a post with the same trimmed title.
	pub async fn check_duplicate(&self, resource: &ResourceName, title: &str) -> bool {
		check_duplicate(self, resource, title, self.config().poller.duplicate_window).await
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::VecDeque;
	// self
	use super::*;
	use crate::{
		error::ApiError,
		listing::{ListingData, PostData, Thing},
	};

	fn thing(id: &str, title: &str, created: i64) -> Thing {
		Thing {
			kind: "t3".into(),
			data: PostData {
				name: id.into(),
				title: title.into(),
				created_utc: created as f64,
				url: format!("https://example.com/{id}"),
				extra: Default::default(),
			},
		}
	}

	fn listing(things: Vec<Thing>) -> Listing {
		Listing { kind: "Listing".into(), data: ListingData { children: things, ..Default::default() } }
	}

	fn failure() -> Error {
		ApiError::unexpected_status(503, b"unavailable").into()
	}

	fn resource() -> ResourceName {
		ResourceName::new("formula1").expect("Fixture resource name should be valid.")
	}

	/// Replays a script of fetch results, repeating the last one once exhausted.
	struct ScriptedSource {
		script: Mutex<VecDeque<Result<Listing>>>,
		last: Mutex<Option<Listing>>,
		calls: Mutex<Vec<u32>>,
	}
	impl ScriptedSource {
		fn new(script: Vec<Result<Listing>>) -> Self {
			Self {
				script: Mutex::new(script.into()),
				last: Default::default(),
				calls: Default::default(),
			}
		}

		fn next_result(&self, limit: u32) -> Result<Listing> {
			self.calls.lock().push(limit);

			match self.script.lock().pop_front() {
				Some(Ok(listing)) => {
					*self.last.lock() = Some(listing.clone());

					Ok(listing)
				},
				Some(Err(e)) => Err(e),
				None => self.last.lock().clone().ok_or_else(failure),
			}
		}
	}
	impl ListingSource for ScriptedSource {
		fn fetch_newest<'a>(&'a self, _resource: &'a ResourceName, limit: u32) -> SourceFuture<'a> {
			let result = self.next_result(limit);

			Box::pin(async move { result })
		}
	}

	#[test]
	fn cursor_requires_new_identity_and_strictly_later_time() {
		let base = thing("t3_a", "A", 100).to_item();
		let mut cursor = Some(StreamCursor::from_item(&base));

		assert_eq!(advance_cursor(&mut cursor, Some(base.clone())), None);
		assert_eq!(advance_cursor(&mut cursor, Some(thing("t3_b", "B", 100).to_item())), None);
		assert_eq!(advance_cursor(&mut cursor, Some(thing("t3_c", "C", 50).to_item())), None);

		let newer = thing("t3_d", "D", 101).to_item();

		assert_eq!(advance_cursor(&mut cursor, Some(newer.clone())), Some(newer.clone()));
		assert_eq!(cursor, Some(StreamCursor::from_item(&newer)));
		assert_eq!(advance_cursor(&mut cursor, None), None);
	}

	#[test]
	fn items_without_identity_are_skipped() {
		let mut cursor = None;
		let anonymous = thing("", "Untitled", 100).to_item();

		assert_eq!(advance_cursor(&mut cursor, Some(anonymous.clone())), None);
		assert_eq!(cursor, None);

		let base = thing("t3_a", "A", 50).to_item();
		let mut cursor = Some(StreamCursor::from_item(&base));

		assert!(!StreamCursor::from_item(&base).admits(&anonymous));
		assert_eq!(advance_cursor(&mut cursor, Some(anonymous)), None);
		assert_eq!(cursor, Some(StreamCursor::from_item(&base)));
	}

	#[test]
	fn empty_baseline_admits_the_first_item() {
		let mut cursor = None;
		let first = thing("t3_a", "A", 100).to_item();

		assert_eq!(advance_cursor(&mut cursor, Some(first.clone())), Some(first));
		assert!(cursor.is_some());
	}

	#[tokio::test]
	async fn stream_emits_only_forward_changes() {
		let (t0, t1, t2) = (1_000, 2_000, 3_000);
		let source = Arc::new(ScriptedSource::new(vec![
			Ok(listing(vec![thing("t3_a", "A", t1)])),
			Ok(listing(vec![thing("t3_a", "A", t1)])),
			Ok(listing(vec![thing("t3_b", "B", t2)])),
			Ok(listing(vec![thing("t3_b", "B", t2)])),
			Ok(listing(vec![thing("t3_c", "C", t0)])),
		]));
		let mut stream = start_stream(source.clone(), resource(), PollerConfig::default());
		let emitted = stream.next().await.expect("Stream should emit the newer item.");

		assert_eq!(emitted.id, "t3_b");

		while !source.script.lock().is_empty() {
			tokio::task::yield_now().await;
		}

		stream.stop();

		assert_eq!(stream.next().await, None, "Stream must not emit A twice or the older C.");
		assert!(source.calls.lock().iter().all(|limit| *limit == 1));
	}

	#[tokio::test]
	async fn stream_swallows_fetch_failures() {
		let source = Arc::new(ScriptedSource::new(vec![
			Ok(listing(vec![thing("t3_a", "A", 10)])),
			Err(failure()),
			Err(failure()),
			Ok(listing(vec![thing("t3_b", "B", 20)])),
		]));
		let mut stream = start_stream(source, resource(), PollerConfig::default());
		let emitted = stream.next().await.expect("Stream should survive transient failures.");

		assert_eq!(emitted.id, "t3_b");
		assert_eq!(emitted.title, "B");
	}

	#[tokio::test]
	async fn baseline_failure_closes_the_stream() {
		let source = Arc::new(ScriptedSource::new(vec![Err(failure())]));
		let mut stream = start_stream(source, resource(), PollerConfig::default());

		assert_eq!(stream.next().await, None);
	}

	#[tokio::test]
	async fn stop_ends_the_task() {
		let source = Arc::new(ScriptedSource::new(vec![Ok(listing(vec![thing("t3_a", "A", 10)]))]));
		let mut stream = start_stream(source, resource(), PollerConfig::default());

		assert_eq!(stream.resource().to_string(), "formula1");

		stream.stop();

		assert_eq!(stream.next().await, None);

		while !stream.is_finished() {
			tokio::task::yield_now().await;
		}
	}

	#[tokio::test]
	async fn duplicate_check_compares_trimmed_titles() {
		let source = ScriptedSource::new(vec![
			Ok(listing(vec![thing("t3_a", "Other", 1), thing("t3_b", " Foo Bar\n", 2)])),
			Ok(listing(vec![thing("t3_a", "Foo Baz", 1)])),
		]);

		assert!(check_duplicate(&source, &resource(), "  Foo Bar  ", 25).await);
		assert!(!check_duplicate(&source, &resource(), "  Foo Bar  ", 25).await);
		assert_eq!(*source.calls.lock(), vec![25, 25]);
	}

	#[tokio::test]
	async fn duplicate_check_fails_closed() {
		let source = ScriptedSource::new(vec![Err(failure())]);

		assert!(check_duplicate(&source, &resource(), "Anything", 25).await);
	}
}
