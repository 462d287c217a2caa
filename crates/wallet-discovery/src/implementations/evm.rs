//! EVM provider discovery.
//!
//! Distinct injected wallets of this family can co-exist in one host;
//! each provider slot is wrapped independently.

use crate::{DiscoveredWallet, WalletDiscovery};
use async_trait::async_trait;
use std::sync::Arc;
use wallet_adapter::providers::EvmProvider;
use wallet_adapter::{EvmAdapter, WalletAdapter};
use wallet_types::{ChainRegistry, ChainType};

pub struct EvmDiscovery {
	providers: Vec<Arc<dyn EvmProvider>>,
	chains: Arc<ChainRegistry>,
}

impl EvmDiscovery {
	pub fn new(providers: Vec<Arc<dyn EvmProvider>>, chains: Arc<ChainRegistry>) -> Self {
		Self { providers, chains }
	}
}

#[async_trait]
impl WalletDiscovery for EvmDiscovery {
	fn chain_type(&self) -> ChainType {
		ChainType::Evm
	}

	async fn discover(&self) -> Vec<DiscoveredWallet> {
		self.providers
			.iter()
			.map(|provider| {
				let adapter = EvmAdapter::new(provider.clone(), self.chains.clone());
				DiscoveredWallet {
					chain_type: ChainType::Evm,
					source: adapter.source().to_string(),
					adapter: Arc::new(adapter),
				}
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use wallet_adapter::providers::{EvmProviderEvent, ProviderError};
	use wallet_types::EvmTransaction;

	struct StubProvider(&'static str);

	#[async_trait]
	impl EvmProvider for StubProvider {
		fn name(&self) -> &str {
			self.0
		}

		async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
			Ok(Vec::new())
		}

		async fn accounts(&self) -> Result<Vec<String>, ProviderError> {
			Ok(Vec::new())
		}

		async fn chain_id(&self) -> Result<u64, ProviderError> {
			Ok(1)
		}

		async fn switch_chain(&self, _chain_id: u64) -> Result<(), ProviderError> {
			Ok(())
		}

		async fn sign_transaction(&self, _tx: &EvmTransaction) -> Result<String, ProviderError> {
			Ok("0x".to_string())
		}

		async fn personal_sign(
			&self,
			_address: &str,
			_data: &str,
		) -> Result<String, ProviderError> {
			Ok("0x".to_string())
		}

		async fn subscribe(
			&self,
		) -> Result<tokio::sync::mpsc::UnboundedReceiver<EvmProviderEvent>, ProviderError> {
			let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
			Ok(rx)
		}
	}

	#[tokio::test]
	async fn test_each_injected_provider_is_wrapped() {
		let discovery = EvmDiscovery::new(
			vec![Arc::new(StubProvider("metamask")), Arc::new(StubProvider("rabby"))],
			Arc::new(ChainRegistry::well_known()),
		);

		let wallets = discovery.discover().await;
		assert_eq!(wallets.len(), 2);
		assert_eq!(wallets[0].source, "metamask");
		assert_eq!(wallets[1].source, "rabby");
	}

	#[tokio::test]
	async fn test_no_providers_is_empty() {
		let discovery = EvmDiscovery::new(Vec::new(), Arc::new(ChainRegistry::well_known()));
		assert!(discovery.discover().await.is_empty());
	}
}
