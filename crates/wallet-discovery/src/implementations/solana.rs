//! Solana provider discovery.
//!
//! Hosts expose at most one injected provider per wallet; discovery holds
//! an optional slot and yields a singleton when the provider is present.

use crate::{DiscoveredWallet, WalletDiscovery};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;
use wallet_adapter::providers::SolanaProvider;
use wallet_adapter::{SolanaAdapter, WalletAdapter};
use wallet_types::{ChainRegistry, ChainType, NetworkId};

pub struct SolanaDiscovery {
	provider: Option<Arc<dyn SolanaProvider>>,
	cluster: NetworkId,
	chains: Arc<ChainRegistry>,
}

impl SolanaDiscovery {
	pub fn new(
		provider: Option<Arc<dyn SolanaProvider>>,
		cluster: NetworkId,
		chains: Arc<ChainRegistry>,
	) -> Self {
		Self {
			provider,
			cluster,
			chains,
		}
	}
}

#[async_trait]
impl WalletDiscovery for SolanaDiscovery {
	fn chain_type(&self) -> ChainType {
		ChainType::Solana
	}

	async fn discover(&self) -> Vec<DiscoveredWallet> {
		let Some(provider) = &self.provider else {
			return Vec::new();
		};

		match SolanaAdapter::new(provider.clone(), self.cluster.clone(), self.chains.clone()) {
			Ok(adapter) => vec![DiscoveredWallet {
				chain_type: ChainType::Solana,
				source: adapter.source().to_string(),
				adapter: Arc::new(adapter),
			}],
			Err(err) => {
				warn!(error = %err, "failed to wrap solana provider");
				Vec::new()
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use wallet_adapter::providers::{ProviderError, SolanaProviderEvent};

	struct StubProvider;

	#[async_trait]
	impl SolanaProvider for StubProvider {
		fn name(&self) -> &str {
			"phantom"
		}

		fn is_connected(&self) -> bool {
			false
		}

		fn public_key(&self) -> Option<String> {
			None
		}

		async fn connect(&self, _only_if_trusted: bool) -> Result<String, ProviderError> {
			Err(ProviderError::new("User rejected the request."))
		}

		async fn disconnect(&self) -> Result<(), ProviderError> {
			Ok(())
		}

		async fn sign_transaction(&self, _message: &[u8]) -> Result<Vec<u8>, ProviderError> {
			Err(ProviderError::new("not connected"))
		}

		async fn sign_message(&self, _message: &[u8]) -> Result<Vec<u8>, ProviderError> {
			Err(ProviderError::new("not connected"))
		}

		async fn subscribe(
			&self,
		) -> Result<tokio::sync::mpsc::UnboundedReceiver<SolanaProviderEvent>, ProviderError> {
			let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
			Ok(rx)
		}
	}

	#[tokio::test]
	async fn test_absent_provider_is_empty() {
		let discovery = SolanaDiscovery::new(
			None,
			NetworkId::Solana("mainnet-beta".to_string()),
			Arc::new(ChainRegistry::well_known()),
		);
		assert!(discovery.discover().await.is_empty());
	}

	#[tokio::test]
	async fn test_present_provider_is_wrapped() {
		let discovery = SolanaDiscovery::new(
			Some(Arc::new(StubProvider)),
			NetworkId::Solana("mainnet-beta".to_string()),
			Arc::new(ChainRegistry::well_known()),
		);

		let wallets = discovery.discover().await;
		assert_eq!(wallets.len(), 1);
		assert_eq!(wallets[0].source, "phantom");
		assert_eq!(wallets[0].adapter.chain_type(), ChainType::Solana);
	}
}
