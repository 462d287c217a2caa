//! Solana-injected-provider family adapter.
//!
//! These providers expose exactly one account at a time, so the unified
//! account list is always a singleton (or empty). Cluster switching is
//! local bookkeeping only: the provider offers no programmatic switch, and
//! the wallet itself must be re-pointed manually by the user.

use crate::providers::{SolanaProvider, SolanaProviderEvent};
use crate::{
	classify_with_context, is_user_rejection, AccountWatcher, AdapterError, ConnectMode,
	WalletAdapter,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use wallet_types::{
	ChainRegistry, ChainType, NetworkId, SignableMessage, UnifiedAccount,
	UnifiedTransactionRequest,
};

pub struct SolanaAdapter {
	provider: Arc<dyn SolanaProvider>,
	source: String,
	chains: Arc<ChainRegistry>,
	cluster: Arc<RwLock<NetworkId>>,
	cache: Arc<RwLock<Vec<UnifiedAccount>>>,
}

impl SolanaAdapter {
	pub fn new(
		provider: Arc<dyn SolanaProvider>,
		cluster: NetworkId,
		chains: Arc<ChainRegistry>,
	) -> Result<Self, AdapterError> {
		if cluster.chain_type() != ChainType::Solana {
			return Err(AdapterError::NetworkMismatch {
				handled: ChainType::Solana,
				network: cluster,
			});
		}
		let source = provider.name().to_string();
		Ok(Self {
			provider,
			source,
			chains,
			cluster: Arc::new(RwLock::new(cluster)),
			cache: Arc::new(RwLock::new(Vec::new())),
		})
	}

	fn singleton(
		public_key: &str,
		cluster: &NetworkId,
		source: &str,
		chains: &ChainRegistry,
	) -> Vec<UnifiedAccount> {
		vec![UnifiedAccount::new(
			cluster.clone(),
			public_key,
			source,
			Some("Primary Account".to_string()),
			chains,
		)]
	}

	async fn current_accounts(&self) -> Vec<UnifiedAccount> {
		if !self.is_connected().await {
			return Vec::new();
		}
		match self.provider.public_key() {
			Some(key) => {
				let cluster = self.cluster.read().await.clone();
				Self::singleton(&key, &cluster, &self.source, &self.chains)
			}
			None => Vec::new(),
		}
	}
}

#[async_trait]
impl WalletAdapter for SolanaAdapter {
	fn chain_type(&self) -> ChainType {
		ChainType::Solana
	}

	fn source(&self) -> &str {
		&self.source
	}

	async fn connect(&self, mode: ConnectMode) -> Result<Vec<UnifiedAccount>, AdapterError> {
		let only_if_trusted = mode == ConnectMode::TrustedOnly;
		match self.provider.connect(only_if_trusted).await {
			Ok(public_key) => {
				let cluster = self.cluster.read().await.clone();
				let accounts =
					Self::singleton(&public_key, &cluster, &self.source, &self.chains);
				*self.cache.write().await = accounts.clone();
				debug!(family = %ChainType::Solana, source = %self.source, "solana connect");
				Ok(accounts)
			}
			// The silent probe exists so a page load can attempt reconnect
			// without popping a prompt: an untrusted provider rejects, and
			// that rejection resolves to an empty account list.
			Err(err) if only_if_trusted && is_user_rejection(&err.0) => Ok(Vec::new()),
			Err(err) => Err(classify_with_context(
				ChainType::Solana,
				&self.source,
				"connect",
				err,
			)),
		}
	}

	async fn disconnect(&self) -> Result<(), AdapterError> {
		if self.provider.is_connected() {
			if let Err(err) = self.provider.disconnect().await {
				warn!(source = %self.source, error = %err, "provider disconnect failed");
			}
		}
		self.cache.write().await.clear();
		Ok(())
	}

	async fn get_accounts(&self) -> Result<Vec<UnifiedAccount>, AdapterError> {
		let accounts = self.current_accounts().await;
		*self.cache.write().await = accounts.clone();
		Ok(accounts)
	}

	/// The provider's own flag alone is insufficient: some providers
	/// report connected transiently before a public key is available.
	async fn is_connected(&self) -> bool {
		self.provider.is_connected() && self.provider.public_key().is_some()
	}

	async fn network(&self) -> NetworkId {
		self.cluster.read().await.clone()
	}

	/// Non-authoritative: records which cluster later calls should assume
	/// and relabels cached accounts. The wallet itself stays on whatever
	/// cluster the user selected in its own UI.
	async fn switch_network(&self, network: &NetworkId) -> Result<(), AdapterError> {
		if network.chain_type() != ChainType::Solana {
			return Err(AdapterError::NetworkMismatch {
				handled: ChainType::Solana,
				network: network.clone(),
			});
		}
		*self.cluster.write().await = network.clone();

		let mut cache = self.cache.write().await;
		let relabeled: Vec<UnifiedAccount> = cache
			.iter()
			.map(|account| {
				UnifiedAccount::new(
					network.clone(),
					account.address.clone(),
					&self.source,
					account.name.clone(),
					&self.chains,
				)
			})
			.collect();
		*cache = relabeled;
		Ok(())
	}

	async fn sign_transaction(
		&self,
		request: &UnifiedTransactionRequest,
	) -> Result<String, AdapterError> {
		let tx = match request {
			UnifiedTransactionRequest::Solana(tx) => tx,
			other => {
				return Err(AdapterError::ChainTypeMismatch {
					handled: ChainType::Solana,
					requested: other.chain_type(),
				})
			}
		};
		if !self.is_connected().await {
			return Err(AdapterError::NotConnected(self.source.clone()));
		}
		let signature = self.provider.sign_transaction(&tx.message).await.map_err(|e| {
			classify_with_context(ChainType::Solana, &self.source, "sign_transaction", e)
		})?;
		// The provider hands back raw bytes; the base58 encoding is owned
		// here, not assumed of the underlying object.
		Ok(bs58::encode(signature).into_string())
	}

	async fn sign_message(
		&self,
		message: SignableMessage,
		address: Option<&str>,
	) -> Result<String, AdapterError> {
		let public_key = self.provider.public_key().ok_or(AdapterError::NoAccounts)?;
		if let Some(requested) = address {
			if requested != public_key {
				return Err(AdapterError::UnknownAccount(requested.to_string()));
			}
		}
		let signature = self.provider.sign_message(message.as_bytes()).await.map_err(|e| {
			classify_with_context(ChainType::Solana, &self.source, "sign_message", e)
		})?;
		Ok(bs58::encode(signature).into_string())
	}

	async fn subscribe_accounts(&self) -> Result<AccountWatcher, AdapterError> {
		let mut provider_rx = self.provider.subscribe().await.map_err(|e| {
			classify_with_context(ChainType::Solana, &self.source, "subscribe", e)
		})?;

		let (tx, rx) = mpsc::unbounded_channel();
		let cluster = self.cluster.clone();
		let cache = self.cache.clone();
		let source = self.source.clone();
		let chains = self.chains.clone();

		let task = tokio::spawn(async move {
			while let Some(event) = provider_rx.recv().await {
				let update = match event {
					SolanaProviderEvent::Connect { public_key }
					| SolanaProviderEvent::AccountChanged {
						public_key: Some(public_key),
					} => {
						let cluster = cluster.read().await.clone();
						Some(SolanaAdapter::singleton(
							&public_key,
							&cluster,
							&source,
							&chains,
						))
					}
					SolanaProviderEvent::Disconnect
					| SolanaProviderEvent::AccountChanged { public_key: None } => None,
				};
				match &update {
					Some(accounts) => *cache.write().await = accounts.clone(),
					None => cache.write().await.clear(),
				}
				if tx.send(update).is_err() {
					break;
				}
			}
		});

		Ok(AccountWatcher::new(rx, task))
	}
}
