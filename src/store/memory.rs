//! In-memory [`TokenStore`] for tests and embedders that manage persistence themselves.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	store::{StoreFuture, TokenStore},
};

/// Thread-safe single-slot store kept in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<Option<TokenSecret>>>);
impl MemoryStore {
	/// Creates a store pre-populated with `token`.
	pub fn with_token(token: impl Into<String>) -> Self {
		Self(Arc::new(RwLock::new(Some(TokenSecret::new(token)))))
	}

	/// Returns the current slot contents without going through the async contract.
	pub fn snapshot(&self) -> Option<TokenSecret> {
		self.0.read().clone()
	}
}
impl TokenStore for MemoryStore {
	fn load(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.read().clone()) })
	}

	fn save(&self, token: TokenSecret) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(token);

			Ok(())
		})
	}
}
