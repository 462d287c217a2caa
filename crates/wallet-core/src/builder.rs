//! Wires configuration and discovery sources into a coordinator.

use crate::WalletCoordinator;
use std::sync::Arc;
use wallet_config::WalletConfig;
use wallet_discovery::{DiscoveryService, WalletDiscovery};
use wallet_storage::{FileStorage, MemoryStorage, SessionStore, StorageInterface};
use wallet_types::{ChainRegistry, ChainType};

pub struct CoordinatorBuilder {
	config: WalletConfig,
	chains: Arc<ChainRegistry>,
	sources: Vec<Box<dyn WalletDiscovery>>,
}

impl CoordinatorBuilder {
	pub fn new(config: WalletConfig) -> Self {
		let chains = Arc::new(config.chain_registry());
		Self {
			config,
			chains,
			sources: Vec::new(),
		}
	}

	/// The registry (built-ins plus configured networks) for constructing
	/// discovery sources.
	pub fn chain_registry(&self) -> Arc<ChainRegistry> {
		self.chains.clone()
	}

	/// Origin name presented to Substrate extensions.
	pub fn origin(&self) -> &str {
		&self.config.app.origin
	}

	/// Family pre-selected when no session was persisted.
	pub fn default_chain(&self) -> Option<ChainType> {
		self.config.app.default_chain
	}

	pub fn with_source(mut self, source: Box<dyn WalletDiscovery>) -> Self {
		self.sources.push(source);
		self
	}

	pub fn build(self) -> Arc<WalletCoordinator> {
		let backend: Box<dyn StorageInterface> = match self.config.storage.backend.as_str() {
			// Validation guarantees a path for the file backend.
			"file" => Box::new(FileStorage::new(
				self.config.storage.path.clone().unwrap_or_default(),
			)),
			_ => Box::new(MemoryStorage::new()),
		};
		let sessions = Arc::new(SessionStore::new(backend));
		let discovery = Arc::new(DiscoveryService::new(self.sources));
		Arc::new(WalletCoordinator::new(discovery, sessions))
	}
}
