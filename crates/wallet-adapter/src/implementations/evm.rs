//! EVM-injected-provider family adapter.
//!
//! Unlike the Solana family, these providers support an explicit
//! programmatic network-switch request, and accounts are tied to a numeric
//! chain id. Addresses are normalized to EIP-55 checksum form before they
//! enter the unified model.

use crate::providers::{EvmProvider, EvmProviderEvent};
use crate::{classify_with_context, AccountWatcher, AdapterError, ConnectMode, WalletAdapter};
use async_trait::async_trait;
use sha3::{Digest, Keccak256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;
use wallet_types::{
	ChainRegistry, ChainType, NetworkId, SignableMessage, UnifiedAccount,
	UnifiedTransactionRequest,
};

/// EIP-55 mixed-case checksum encoding of a hex address.
pub fn to_checksum_address(address: &str) -> String {
	let stripped = address.trim_start_matches("0x").to_lowercase();
	let hash = Keccak256::digest(stripped.as_bytes());

	let mut out = String::with_capacity(stripped.len() + 2);
	out.push_str("0x");
	for (i, c) in stripped.chars().enumerate() {
		let nibble = if i % 2 == 0 {
			hash[i / 2] >> 4
		} else {
			hash[i / 2] & 0x0f
		};
		if c.is_ascii_alphabetic() && nibble >= 8 {
			out.push(c.to_ascii_uppercase());
		} else {
			out.push(c);
		}
	}
	out
}

pub struct EvmAdapter {
	provider: Arc<dyn EvmProvider>,
	source: String,
	chains: Arc<ChainRegistry>,
	chain_id: Arc<RwLock<u64>>,
	cache: Arc<RwLock<Vec<UnifiedAccount>>>,
	connected: Arc<AtomicBool>,
}

impl EvmAdapter {
	pub fn new(provider: Arc<dyn EvmProvider>, chains: Arc<ChainRegistry>) -> Self {
		let source = provider.name().to_string();
		Self {
			provider,
			source,
			chains,
			chain_id: Arc::new(RwLock::new(1)),
			cache: Arc::new(RwLock::new(Vec::new())),
			connected: Arc::new(AtomicBool::new(false)),
		}
	}

	fn map_accounts(
		addresses: &[String],
		chain_id: u64,
		source: &str,
		chains: &ChainRegistry,
	) -> Vec<UnifiedAccount> {
		addresses
			.iter()
			.map(|address| {
				UnifiedAccount::new(
					NetworkId::Evm(chain_id),
					to_checksum_address(address),
					source,
					None,
					chains,
				)
			})
			.collect()
	}

	async fn store_accounts(&self, addresses: &[String]) -> Vec<UnifiedAccount> {
		let chain_id = *self.chain_id.read().await;
		let unified = Self::map_accounts(addresses, chain_id, &self.source, &self.chains);
		*self.cache.write().await = unified.clone();
		self.connected.store(!unified.is_empty(), Ordering::SeqCst);
		unified
	}
}

#[async_trait]
impl WalletAdapter for EvmAdapter {
	fn chain_type(&self) -> ChainType {
		ChainType::Evm
	}

	fn source(&self) -> &str {
		&self.source
	}

	async fn connect(&self, mode: ConnectMode) -> Result<Vec<UnifiedAccount>, AdapterError> {
		let addresses = match mode {
			ConnectMode::Prompt => self.provider.request_accounts().await.map_err(|e| {
				classify_with_context(ChainType::Evm, &self.source, "request_accounts", e)
			})?,
			// The silent query resolves to an empty list for an
			// unauthorized origin instead of prompting.
			ConnectMode::TrustedOnly => self.provider.accounts().await.map_err(|e| {
				classify_with_context(ChainType::Evm, &self.source, "accounts", e)
			})?,
		};

		let chain_id = self.provider.chain_id().await.map_err(|e| {
			classify_with_context(ChainType::Evm, &self.source, "chain_id", e)
		})?;
		*self.chain_id.write().await = chain_id;

		let accounts = self.store_accounts(&addresses).await;
		debug!(
			family = %ChainType::Evm,
			source = %self.source,
			chain_id,
			count = accounts.len(),
			"evm connect"
		);
		Ok(accounts)
	}

	async fn disconnect(&self) -> Result<(), AdapterError> {
		self.connected.store(false, Ordering::SeqCst);
		self.cache.write().await.clear();
		Ok(())
	}

	async fn get_accounts(&self) -> Result<Vec<UnifiedAccount>, AdapterError> {
		if !self.connected.load(Ordering::SeqCst) {
			return Ok(Vec::new());
		}
		let addresses = self.provider.accounts().await.map_err(|e| {
			classify_with_context(ChainType::Evm, &self.source, "accounts", e)
		})?;
		Ok(self.store_accounts(&addresses).await)
	}

	async fn is_connected(&self) -> bool {
		self.connected.load(Ordering::SeqCst) && !self.cache.read().await.is_empty()
	}

	async fn network(&self) -> NetworkId {
		NetworkId::Evm(*self.chain_id.read().await)
	}

	/// Asks the provider to switch, then relabels cached accounts under
	/// the new chain id.
	async fn switch_network(&self, network: &NetworkId) -> Result<(), AdapterError> {
		let chain_id = match network {
			NetworkId::Evm(id) => *id,
			other => {
				return Err(AdapterError::NetworkMismatch {
					handled: ChainType::Evm,
					network: other.clone(),
				})
			}
		};
		self.provider.switch_chain(chain_id).await.map_err(|e| {
			classify_with_context(ChainType::Evm, &self.source, "switch_chain", e)
		})?;
		*self.chain_id.write().await = chain_id;

		let addresses: Vec<String> = {
			let cache = self.cache.read().await;
			cache.iter().map(|a| a.address.clone()).collect()
		};
		self.store_accounts(&addresses).await;
		Ok(())
	}

	async fn sign_transaction(
		&self,
		request: &UnifiedTransactionRequest,
	) -> Result<String, AdapterError> {
		let tx = match request {
			UnifiedTransactionRequest::Evm(tx) => tx,
			other => {
				return Err(AdapterError::ChainTypeMismatch {
					handled: ChainType::Evm,
					requested: other.chain_type(),
				})
			}
		};
		if !self.connected.load(Ordering::SeqCst) {
			return Err(AdapterError::NotConnected(self.source.clone()));
		}
		self.provider.sign_transaction(tx).await.map_err(|e| {
			classify_with_context(ChainType::Evm, &self.source, "sign_transaction", e)
		})
	}

	async fn sign_message(
		&self,
		message: SignableMessage,
		address: Option<&str>,
	) -> Result<String, AdapterError> {
		let cache = self.cache.read().await;
		let address = match address {
			Some(requested) => cache
				.iter()
				.find(|a| a.address.eq_ignore_ascii_case(requested))
				.map(|a| a.address.clone())
				.ok_or_else(|| AdapterError::UnknownAccount(requested.to_string()))?,
			None => cache
				.first()
				.map(|a| a.address.clone())
				.ok_or(AdapterError::NoAccounts)?,
		};
		drop(cache);

		let data = message.to_hex_payload();
		self.provider.personal_sign(&address, &data).await.map_err(|e| {
			classify_with_context(ChainType::Evm, &self.source, "personal_sign", e)
		})
	}

	async fn subscribe_accounts(&self) -> Result<AccountWatcher, AdapterError> {
		let mut provider_rx = self.provider.subscribe().await.map_err(|e| {
			classify_with_context(ChainType::Evm, &self.source, "subscribe", e)
		})?;

		let (tx, rx) = mpsc::unbounded_channel();
		let chain_id = self.chain_id.clone();
		let cache = self.cache.clone();
		let connected = self.connected.clone();
		let source = self.source.clone();
		let chains = self.chains.clone();

		let task = tokio::spawn(async move {
			while let Some(event) = provider_rx.recv().await {
				let update = match event {
					EvmProviderEvent::AccountsChanged(addresses) => {
						let id = *chain_id.read().await;
						Some(EvmAdapter::map_accounts(&addresses, id, &source, &chains))
					}
					EvmProviderEvent::ChainChanged(id) => {
						*chain_id.write().await = id;
						let addresses: Vec<String> = cache
							.read()
							.await
							.iter()
							.map(|a| a.address.clone())
							.collect();
						Some(EvmAdapter::map_accounts(&addresses, id, &source, &chains))
					}
					EvmProviderEvent::Disconnect => None,
				};
				match &update {
					Some(accounts) => {
						*cache.write().await = accounts.clone();
						connected.store(!accounts.is_empty(), Ordering::SeqCst);
					}
					None => {
						cache.write().await.clear();
						connected.store(false, Ordering::SeqCst);
					}
				}
				if tx.send(update).is_err() {
					break;
				}
			}
		});

		Ok(AccountWatcher::new(rx, task))
	}
}
