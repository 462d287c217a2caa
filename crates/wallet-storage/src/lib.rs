//! Persistence for the wallet layer.
//!
//! Only the user's last selection (chain family, network, address) is ever
//! written; accounts are re-derived from providers on every load and no
//! key material or session token passes through this crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use wallet_types::{ChainType, NetworkId};

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

pub use implementations::file::FileStorage;
pub use implementations::memory::MemoryStorage;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("Not found")]
	NotFound,
	#[error("Serialization error: {0}")]
	Serialization(String),
	#[error("Backend error: {0}")]
	Backend(String),
}

/// Low-level interface for storage backends.
///
/// Key-value byte storage with optional TTL; backends that cannot enforce
/// expiry document that they ignore it.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError>;

	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

/// The user's last wallet selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
	pub chain_type: ChainType,
	pub network: NetworkId,
	pub address: String,
	pub saved_at: DateTime<Utc>,
}

impl PersistedSession {
	pub fn new(chain_type: ChainType, network: NetworkId, address: impl Into<String>) -> Self {
		Self {
			chain_type,
			network,
			address: address.into(),
			saved_at: Utc::now(),
		}
	}
}

const SESSION_KEY: &str = "session:last";

/// Typed store for the persisted selection.
pub struct SessionStore {
	backend: Box<dyn StorageInterface>,
}

impl SessionStore {
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	pub async fn save(&self, session: &PersistedSession) -> Result<(), StorageError> {
		let bytes = serde_json::to_vec(session)
			.map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(SESSION_KEY, bytes, None).await
	}

	/// The last persisted selection, or `None` when nothing was saved.
	pub async fn load(&self) -> Result<Option<PersistedSession>, StorageError> {
		match self.backend.get_bytes(SESSION_KEY).await {
			Ok(bytes) => serde_json::from_slice(&bytes)
				.map(Some)
				.map_err(|e| StorageError::Serialization(e.to_string())),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e),
		}
	}

	pub async fn clear(&self) -> Result<(), StorageError> {
		self.backend.delete(SESSION_KEY).await
	}
}
