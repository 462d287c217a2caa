//! In-memory storage backend, used in tests and for hosts that keep the
//! selection for the lifetime of the process only.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct Entry {
	value: Vec<u8>,
	expires_at: Option<Instant>,
}

#[derive(Default)]
pub struct MemoryStorage {
	entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let entries = self.entries.read().await;
		match entries.get(key) {
			Some(entry) => {
				if let Some(expires_at) = entry.expires_at {
					if Instant::now() >= expires_at {
						return Err(StorageError::NotFound);
					}
				}
				Ok(entry.value.clone())
			}
			None => Err(StorageError::NotFound),
		}
	}

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		let entry = Entry {
			value,
			expires_at: ttl.map(|ttl| Instant::now() + ttl),
		};
		self.entries.write().await.insert(key.to_string(), entry);
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		self.entries.write().await.remove(key);
		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		Ok(self.get_bytes(key).await.is_ok())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_set_get_delete() {
		let storage = MemoryStorage::new();
		storage
			.set_bytes("k", vec![1, 2, 3], None)
			.await
			.unwrap();
		assert_eq!(storage.get_bytes("k").await.unwrap(), vec![1, 2, 3]);
		assert!(storage.exists("k").await.unwrap());

		storage.delete("k").await.unwrap();
		assert!(matches!(
			storage.get_bytes("k").await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_ttl_expiry() {
		let storage = MemoryStorage::new();
		storage
			.set_bytes("k", vec![1], Some(Duration::ZERO))
			.await
			.unwrap();
		assert!(matches!(
			storage.get_bytes("k").await,
			Err(StorageError::NotFound)
		));
		assert!(!storage.exists("k").await.unwrap());
	}
}
