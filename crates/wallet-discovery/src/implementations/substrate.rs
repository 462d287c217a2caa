//! Substrate extension discovery.
//!
//! Two-step process: the registry of installed extensions is read from the
//! host-provided [`ExtensionRegistry`], then each candidate's `enable` is
//! invoked (which may prompt the user). Only an extension that passes the
//! capability check (both an accounts handle and a signer handle present)
//! is wrapped in an adapter; malformed or partial extensions are rejected.

use crate::{DiscoveredWallet, WalletDiscovery};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};
use wallet_adapter::providers::ExtensionRegistry;
use wallet_adapter::{is_user_rejection, SubstrateAdapter};
use wallet_types::{ChainRegistry, ChainType, NetworkId};

pub struct SubstrateDiscovery {
	registry: Arc<dyn ExtensionRegistry>,
	/// Origin name shown by extensions in their authorization prompt.
	origin: String,
	network: NetworkId,
	chains: Arc<ChainRegistry>,
}

impl SubstrateDiscovery {
	pub fn new(
		registry: Arc<dyn ExtensionRegistry>,
		origin: &str,
		network: NetworkId,
		chains: Arc<ChainRegistry>,
	) -> Self {
		Self {
			registry,
			origin: origin.to_string(),
			network,
			chains,
		}
	}
}

#[async_trait]
impl WalletDiscovery for SubstrateDiscovery {
	fn chain_type(&self) -> ChainType {
		ChainType::Polkadot
	}

	async fn discover(&self) -> Vec<DiscoveredWallet> {
		let mut wallets = Vec::new();

		for name in self.registry.installed() {
			let extension = match self.registry.enable(&name, &self.origin).await {
				Ok(extension) => extension,
				Err(err) if is_user_rejection(&err.0) => {
					debug!(extension = %name, "user declined extension authorization");
					continue;
				}
				Err(err) => {
					warn!(
						family = %ChainType::Polkadot,
						extension = %name,
						error = %err,
						"failed to enable extension"
					);
					continue;
				}
			};

			let (accounts, signer) = match (extension.accounts, extension.signer) {
				(Some(accounts), Some(signer)) => (accounts, signer),
				_ => {
					warn!(
						extension = %name,
						"extension failed the capability check, not wrapping"
					);
					continue;
				}
			};

			match SubstrateAdapter::new(
				accounts,
				signer,
				&name,
				self.network.clone(),
				self.chains.clone(),
			) {
				Ok(adapter) => wallets.push(DiscoveredWallet {
					chain_type: ChainType::Polkadot,
					source: name,
					adapter: Arc::new(adapter),
				}),
				Err(err) => {
					warn!(extension = %name, error = %err, "failed to wrap extension");
				}
			}
		}

		wallets
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use wallet_adapter::providers::{
		ExtensionAccounts, ExtensionSigner, InjectedExtension, ProviderError,
		RawSubstrateAccount,
	};
	use wallet_types::{SubstratePayload, POLKADOT_GENESIS};

	struct StubAccounts;

	#[async_trait]
	impl ExtensionAccounts for StubAccounts {
		async fn get(&self, _any_type: bool) -> Result<Vec<RawSubstrateAccount>, ProviderError> {
			Ok(Vec::new())
		}

		async fn subscribe(
			&self,
		) -> Result<
			tokio::sync::mpsc::UnboundedReceiver<Vec<RawSubstrateAccount>>,
			ProviderError,
		> {
			let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
			Ok(rx)
		}
	}

	struct StubSigner;

	#[async_trait]
	impl ExtensionSigner for StubSigner {
		async fn sign_payload(
			&self,
			_payload: &SubstratePayload,
		) -> Result<String, ProviderError> {
			Ok("0xsig".to_string())
		}

		async fn sign_raw(&self, _address: &str, _data: &str) -> Result<String, ProviderError> {
			Ok("0xsig".to_string())
		}
	}

	/// Registry with one well-formed extension, one missing its signer,
	/// and one whose enable call fails.
	struct MixedRegistry;

	#[async_trait]
	impl ExtensionRegistry for MixedRegistry {
		fn installed(&self) -> Vec<String> {
			vec![
				"talisman".to_string(),
				"partial-wallet".to_string(),
				"broken-wallet".to_string(),
			]
		}

		async fn enable(
			&self,
			name: &str,
			_origin: &str,
		) -> Result<InjectedExtension, ProviderError> {
			match name {
				"talisman" => Ok(InjectedExtension {
					accounts: Some(Arc::new(StubAccounts)),
					signer: Some(Arc::new(StubSigner)),
				}),
				"partial-wallet" => Ok(InjectedExtension {
					accounts: Some(Arc::new(StubAccounts)),
					signer: None,
				}),
				_ => Err(ProviderError::new("extension crashed")),
			}
		}
	}

	#[tokio::test]
	async fn test_capability_check_and_partial_failure_isolation() {
		let discovery = SubstrateDiscovery::new(
			Arc::new(MixedRegistry),
			"charity-portal",
			NetworkId::Polkadot(POLKADOT_GENESIS.to_string()),
			Arc::new(ChainRegistry::well_known()),
		);

		let wallets = discovery.discover().await;
		assert_eq!(wallets.len(), 1);
		assert_eq!(wallets[0].source, "talisman");
		assert_eq!(wallets[0].chain_type, ChainType::Polkadot);
	}

	struct EmptyRegistry;

	#[async_trait]
	impl ExtensionRegistry for EmptyRegistry {
		fn installed(&self) -> Vec<String> {
			Vec::new()
		}

		async fn enable(
			&self,
			_name: &str,
			_origin: &str,
		) -> Result<InjectedExtension, ProviderError> {
			Err(ProviderError::new("unreachable"))
		}
	}

	#[tokio::test]
	async fn test_no_extensions_installed_is_empty() {
		let discovery = SubstrateDiscovery::new(
			Arc::new(EmptyRegistry),
			"charity-portal",
			NetworkId::Polkadot(POLKADOT_GENESIS.to_string()),
			Arc::new(ChainRegistry::well_known()),
		);
		assert!(discovery.discover().await.is_empty());
	}
}
