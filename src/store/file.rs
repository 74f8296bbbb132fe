//! File-backed [`TokenStore`] holding the raw token text, for bots and cron jobs.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	store::{StoreError, StoreFuture, TokenStore},
};

/// Persists the token to a single file, replacing it atomically on every save.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	lock: Arc<Mutex<()>>,
}
impl FileStore {
	/// Opens a store at `path`, creating parent directories as needed.
	///
	/// The file itself is created on the first save.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		Ok(Self { path, lock: Default::default() })
	}

	/// Location of the token file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn read_slot(path: &Path) -> Result<Option<TokenSecret>, StoreError> {
		if !path.exists() {
			return Ok(None);
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;
		let text = String::from_utf8(bytes).map_err(|e| StoreError::Serialization {
			message: format!("Token file {} is not UTF-8: {e}", path.display()),
		})?;
		let token = text.trim();

		if token.is_empty() {
			return Ok(None);
		}

		Ok(Some(TokenSecret::new(token)))
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}
		Ok(())
	}

	fn persist(&self, token: &TokenSecret) -> Result<(), StoreError> {
		let _guard = self.lock.lock();

		Self::ensure_parent_exists(&self.path)?;

		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(token.expose().as_bytes()).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl TokenStore for FileStore {
	fn load(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		Box::pin(async move {
			let _guard = self.lock.lock();

			Self::read_slot(&self.path)
		})
	}

	fn save(&self, token: TokenSecret) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.persist(&token) })
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;

	fn temp_path(label: &str) -> PathBuf {
		let unique = format!(
			"reddit_broker_file_store_{label}_{}_{}.txt",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	#[tokio::test]
	async fn save_and_reload_round_trip() {
		let path = temp_path("round_trip");
		let store = FileStore::open(&path).expect("Failed to open file store.");

		store.save(TokenSecret::new("access-token")).await.expect("Failed to save token.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store.");
		let fetched = reopened
			.load()
			.await
			.expect("Failed to load token from file store.")
			.expect("File store lost the token after reopen.");

		assert_eq!(fetched.expose(), "access-token");

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary token file {}: {e}", path.display())
		});
	}

	#[tokio::test]
	async fn missing_or_blank_file_means_no_token() {
		let path = temp_path("blank");
		let store = FileStore::open(&path).expect("Failed to open file store.");

		assert!(store.load().await.expect("Loading a missing file should succeed.").is_none());

		fs::write(&path, "  \n").expect("Failed to write blank token file.");

		assert!(store.load().await.expect("Loading a blank file should succeed.").is_none());

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary token file {}: {e}", path.display())
		});
	}
}
