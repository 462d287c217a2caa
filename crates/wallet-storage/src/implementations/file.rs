//! File-based storage backend.
//!
//! Stores values as binary files on the filesystem, providing simple
//! persistence without external dependencies.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

pub struct FileStorage {
	base_path: PathBuf,
}

impl FileStorage {
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	/// Converts a storage key to a filesystem-safe file path.
	fn file_path(&self, key: &str) -> PathBuf {
		let safe_key = key.replace(['/', ':'], "_");
		self.base_path.join(format!("{}.bin", safe_key))
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.file_path(key);

		match fs::read(&path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	/// TTL is not enforced by this backend.
	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		_ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		let path = self.file_path(key);

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		// Write atomically by writing to temp file then renaming.
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let path = self.file_path(key);

		match fs::remove_file(&path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		Ok(self.file_path(key).exists())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{PersistedSession, SessionStore};
	use wallet_types::{ChainType, NetworkId};

	#[tokio::test]
	async fn test_round_trip_and_key_sanitization() {
		let dir = tempfile::tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		storage
			.set_bytes("session:last", vec![42], None)
			.await
			.unwrap();
		assert!(dir.path().join("session_last.bin").exists());
		assert_eq!(storage.get_bytes("session:last").await.unwrap(), vec![42]);

		storage.delete("session:last").await.unwrap();
		assert!(!storage.exists("session:last").await.unwrap());
		// Deleting a missing key is a no-op.
		storage.delete("session:last").await.unwrap();
	}

	#[tokio::test]
	async fn test_session_store_over_file_backend() {
		let dir = tempfile::tempdir().unwrap();
		let store = SessionStore::new(Box::new(FileStorage::new(dir.path().to_path_buf())));

		let session = PersistedSession::new(
			ChainType::Polkadot,
			NetworkId::Polkadot(wallet_types::POLKADOT_GENESIS.to_string()),
			"5Alice",
		);
		store.save(&session).await.unwrap();
		assert_eq!(store.load().await.unwrap().unwrap().address, "5Alice");
	}
}
