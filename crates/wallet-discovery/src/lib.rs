//! Wallet discovery.
//!
//! Enumerates which concrete wallets are actually present in the host
//! environment for each protocol family. Discovery is an explicit,
//! injectable step: sources receive their provider registries at
//! construction instead of adapters reaching into ambient globals, so the
//! whole layer can be driven with substituted providers.
//!
//! An absent provider is an empty result, never an error. When several
//! wallets of one family are installed, a failure preparing one does not
//! abort the others; each candidate is attempted and reported
//! independently.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use wallet_adapter::WalletAdapter;
use wallet_types::ChainType;

pub mod implementations;

pub use implementations::evm::EvmDiscovery;
pub use implementations::solana::SolanaDiscovery;
pub use implementations::substrate::SubstrateDiscovery;

/// One wallet found in the environment, already wrapped in its adapter.
pub struct DiscoveredWallet {
	pub chain_type: ChainType,
	/// Name of the concrete wallet/extension.
	pub source: String,
	pub adapter: Arc<dyn WalletAdapter>,
}

/// Per-family discovery source.
#[async_trait]
pub trait WalletDiscovery: Send + Sync {
	fn chain_type(&self) -> ChainType;

	/// Wallets currently present for this family. May prompt for families
	/// whose handshake happens at enable time (Substrate).
	async fn discover(&self) -> Vec<DiscoveredWallet>;
}

/// Aggregates the family discovery sources.
pub struct DiscoveryService {
	sources: Vec<Box<dyn WalletDiscovery>>,
}

impl DiscoveryService {
	pub fn new(sources: Vec<Box<dyn WalletDiscovery>>) -> Self {
		Self { sources }
	}

	/// Wallets present for one family.
	pub async fn discover(&self, chain_type: ChainType) -> Vec<DiscoveredWallet> {
		let mut wallets = Vec::new();
		for source in self.sources.iter().filter(|s| s.chain_type() == chain_type) {
			wallets.extend(source.discover().await);
		}
		info!(family = %chain_type, count = wallets.len(), "wallet discovery finished");
		wallets
	}

	/// Wallets present across all families.
	pub async fn discover_all(&self) -> Vec<DiscoveredWallet> {
		let results =
			futures::future::join_all(self.sources.iter().map(|source| source.discover())).await;
		results.into_iter().flatten().collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct EmptySource(ChainType);

	#[async_trait]
	impl WalletDiscovery for EmptySource {
		fn chain_type(&self) -> ChainType {
			self.0
		}

		async fn discover(&self) -> Vec<DiscoveredWallet> {
			Vec::new()
		}
	}

	#[tokio::test]
	async fn test_absent_providers_surface_as_empty_results() {
		let service = DiscoveryService::new(vec![
			Box::new(EmptySource(ChainType::Evm)),
			Box::new(EmptySource(ChainType::Solana)),
		]);

		assert!(service.discover(ChainType::Evm).await.is_empty());
		assert!(service.discover(ChainType::Polkadot).await.is_empty());
		assert!(service.discover_all().await.is_empty());
	}
}
