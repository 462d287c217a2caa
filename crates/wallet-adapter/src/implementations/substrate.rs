//! Substrate-extension family adapter.
//!
//! A single enabled extension exposes accounts across multiple networks
//! simultaneously; the extension itself is not scoped to one chain.
//! Switching networks therefore only changes which network's metadata
//! labels the accounts; nothing is re-authorized with the extension.

use crate::providers::{ExtensionAccounts, ExtensionSigner, RawSubstrateAccount};
use crate::{classify_with_context, AccountWatcher, AdapterError, ConnectMode, WalletAdapter};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use wallet_types::{
	ChainRegistry, ChainType, NetworkId, SignableMessage, UnifiedAccount,
	UnifiedTransactionRequest,
};

pub struct SubstrateAdapter {
	accounts_api: Arc<dyn ExtensionAccounts>,
	signer: Arc<dyn ExtensionSigner>,
	source: String,
	chains: Arc<ChainRegistry>,
	network: Arc<RwLock<NetworkId>>,
	cache: Arc<RwLock<Vec<UnifiedAccount>>>,
	connected: Arc<AtomicBool>,
}

impl SubstrateAdapter {
	pub fn new(
		accounts_api: Arc<dyn ExtensionAccounts>,
		signer: Arc<dyn ExtensionSigner>,
		source: &str,
		network: NetworkId,
		chains: Arc<ChainRegistry>,
	) -> Result<Self, AdapterError> {
		if network.chain_type() != ChainType::Polkadot {
			return Err(AdapterError::NetworkMismatch {
				handled: ChainType::Polkadot,
				network,
			});
		}
		Ok(Self {
			accounts_api,
			signer,
			source: source.to_string(),
			chains,
			network: Arc::new(RwLock::new(network)),
			cache: Arc::new(RwLock::new(Vec::new())),
			connected: Arc::new(AtomicBool::new(false)),
		})
	}

	fn map_accounts(
		raw: &[RawSubstrateAccount],
		network: &NetworkId,
		source: &str,
		chains: &ChainRegistry,
	) -> Vec<UnifiedAccount> {
		raw.iter()
			.map(|account| {
				UnifiedAccount::new(
					network.clone(),
					account.address.clone(),
					source,
					account.name.clone(),
					chains,
				)
			})
			.collect()
	}

	async fn refresh_from_provider(&self) -> Result<Vec<UnifiedAccount>, AdapterError> {
		let raw = self.accounts_api.get(true).await.map_err(|e| {
			classify_with_context(ChainType::Polkadot, &self.source, "accounts.get", e)
		})?;
		let network = self.network.read().await.clone();
		let unified = Self::map_accounts(&raw, &network, &self.source, &self.chains);
		*self.cache.write().await = unified.clone();
		self.connected.store(!unified.is_empty(), Ordering::SeqCst);
		Ok(unified)
	}
}

#[async_trait]
impl WalletAdapter for SubstrateAdapter {
	fn chain_type(&self) -> ChainType {
		ChainType::Polkadot
	}

	fn source(&self) -> &str {
		&self.source
	}

	/// Authorization happens at discovery time via the extension's
	/// `enable`; reading accounts never prompts, so both connect modes
	/// take the same path here. "Installed but no accounts yet" is a
	/// valid state and resolves to `[]`.
	async fn connect(&self, _mode: ConnectMode) -> Result<Vec<UnifiedAccount>, AdapterError> {
		let accounts = self.refresh_from_provider().await?;
		debug!(
			family = %ChainType::Polkadot,
			source = %self.source,
			count = accounts.len(),
			"substrate connect"
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
		self.refresh_from_provider().await
	}

	async fn is_connected(&self) -> bool {
		self.connected.load(Ordering::SeqCst) && !self.cache.read().await.is_empty()
	}

	async fn network(&self) -> NetworkId {
		self.network.read().await.clone()
	}

	/// Local bookkeeping only: relabels cached accounts against the new
	/// network's registry metadata. No provider round-trip.
	async fn switch_network(&self, network: &NetworkId) -> Result<(), AdapterError> {
		if network.chain_type() != ChainType::Polkadot {
			return Err(AdapterError::NetworkMismatch {
				handled: ChainType::Polkadot,
				network: network.clone(),
			});
		}
		*self.network.write().await = network.clone();

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
		let payload = match request {
			UnifiedTransactionRequest::Polkadot(payload) => payload,
			other => {
				return Err(AdapterError::ChainTypeMismatch {
					handled: ChainType::Polkadot,
					requested: other.chain_type(),
				})
			}
		};
		self.signer.sign_payload(payload).await.map_err(|e| {
			classify_with_context(ChainType::Polkadot, &self.source, "signer.sign_payload", e)
		})
	}

	/// The extension signer only accepts `0x`-prefixed hex strings, so the
	/// message is hex-encoded before it is sent; a text message and its
	/// UTF-8 byte equivalent therefore sign identically.
	async fn sign_message(
		&self,
		message: SignableMessage,
		address: Option<&str>,
	) -> Result<String, AdapterError> {
		let cache = self.cache.read().await;
		let address = match address {
			Some(requested) => cache
				.iter()
				.find(|a| a.address == requested)
				.map(|a| a.address.clone())
				.ok_or_else(|| AdapterError::UnknownAccount(requested.to_string()))?,
			None => cache
				.first()
				.map(|a| a.address.clone())
				.ok_or(AdapterError::NoAccounts)?,
		};
		drop(cache);

		let data = message.to_hex_payload();
		self.signer.sign_raw(&address, &data).await.map_err(|e| {
			classify_with_context(ChainType::Polkadot, &self.source, "signer.sign_raw", e)
		})
	}

	async fn subscribe_accounts(&self) -> Result<AccountWatcher, AdapterError> {
		let mut provider_rx = self.accounts_api.subscribe().await.map_err(|e| {
			classify_with_context(ChainType::Polkadot, &self.source, "accounts.subscribe", e)
		})?;

		let (tx, rx) = mpsc::unbounded_channel();
		let network = self.network.clone();
		let cache = self.cache.clone();
		let connected = self.connected.clone();
		let source = self.source.clone();
		let chains = self.chains.clone();

		let task = tokio::spawn(async move {
			while let Some(raw) = provider_rx.recv().await {
				let network = network.read().await.clone();
				let unified = SubstrateAdapter::map_accounts(&raw, &network, &source, &chains);
				*cache.write().await = unified.clone();
				connected.store(!unified.is_empty(), Ordering::SeqCst);
				if tx.send(Some(unified)).is_err() {
					break;
				}
			}
			warn!(source = %source, "substrate account subscription ended");
		});

		Ok(AccountWatcher::new(rx, task))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::providers::ProviderError;
	use std::sync::atomic::AtomicUsize;
	use std::sync::Mutex as StdMutex;
	use wallet_types::{SubstratePayload, POLKADOT_GENESIS};

	#[derive(Default)]
	struct MockExtension {
		accounts: StdMutex<Vec<RawSubstrateAccount>>,
		get_calls: AtomicUsize,
		subscribers: StdMutex<Vec<mpsc::UnboundedSender<Vec<RawSubstrateAccount>>>>,
		reject_sign: bool,
	}

	impl MockExtension {
		fn with_accounts(addresses: &[&str]) -> Self {
			let accounts = addresses
				.iter()
				.map(|a| RawSubstrateAccount {
					address: a.to_string(),
					name: None,
				})
				.collect();
			Self {
				accounts: StdMutex::new(accounts),
				..Default::default()
			}
		}

		fn push_accounts(&self, addresses: &[&str]) {
			let accounts: Vec<RawSubstrateAccount> = addresses
				.iter()
				.map(|a| RawSubstrateAccount {
					address: a.to_string(),
					name: None,
				})
				.collect();
			*self.accounts.lock().unwrap() = accounts.clone();
			for sub in self.subscribers.lock().unwrap().iter() {
				sub.send(accounts.clone()).unwrap();
			}
		}
	}

	#[async_trait]
	impl ExtensionAccounts for MockExtension {
		async fn get(&self, _any_type: bool) -> Result<Vec<RawSubstrateAccount>, ProviderError> {
			self.get_calls.fetch_add(1, Ordering::SeqCst);
			Ok(self.accounts.lock().unwrap().clone())
		}

		async fn subscribe(
			&self,
		) -> Result<mpsc::UnboundedReceiver<Vec<RawSubstrateAccount>>, ProviderError> {
			let (tx, rx) = mpsc::unbounded_channel();
			self.subscribers.lock().unwrap().push(tx);
			Ok(rx)
		}
	}

	#[async_trait]
	impl ExtensionSigner for MockExtension {
		async fn sign_payload(
			&self,
			payload: &SubstratePayload,
		) -> Result<String, ProviderError> {
			if self.reject_sign {
				return Err(ProviderError::new("Rejected by user"));
			}
			Ok(format!("0xsigned:{}", payload.method))
		}

		async fn sign_raw(&self, address: &str, data: &str) -> Result<String, ProviderError> {
			if self.reject_sign {
				return Err(ProviderError::new("Rejected by user"));
			}
			Ok(format!("0xraw:{}:{}", address, data))
		}
	}

	fn adapter_with(extension: Arc<MockExtension>) -> SubstrateAdapter {
		SubstrateAdapter::new(
			extension.clone(),
			extension,
			"talisman",
			NetworkId::Polkadot(POLKADOT_GENESIS.to_string()),
			Arc::new(ChainRegistry::well_known()),
		)
		.unwrap()
	}

	#[tokio::test]
	async fn test_connect_is_deterministic() {
		let extension = Arc::new(MockExtension::with_accounts(&["5Alice", "5Bob"]));
		let adapter = adapter_with(extension);

		let first = adapter.connect(ConnectMode::Prompt).await.unwrap();
		let second = adapter.connect(ConnectMode::Prompt).await.unwrap();
		assert_eq!(first, second);
		assert_eq!(first.len(), 2);
		assert_eq!(first[0].chain_type, ChainType::Polkadot);
		assert_eq!(first[0].source, "talisman");
	}

	#[tokio::test]
	async fn test_connect_with_zero_accounts_is_not_an_error() {
		let extension = Arc::new(MockExtension::with_accounts(&[]));
		let adapter = adapter_with(extension);

		let accounts = adapter.connect(ConnectMode::Prompt).await.unwrap();
		assert!(accounts.is_empty());
		assert!(!adapter.is_connected().await);
	}

	#[tokio::test]
	async fn test_disconnect_clears_accounts() {
		let extension = Arc::new(MockExtension::with_accounts(&["5Alice"]));
		let adapter = adapter_with(extension);

		adapter.connect(ConnectMode::Prompt).await.unwrap();
		assert!(adapter.is_connected().await);

		adapter.disconnect().await.unwrap();
		assert!(!adapter.is_connected().await);
		assert!(adapter.get_accounts().await.unwrap().is_empty());

		// Idempotent.
		adapter.disconnect().await.unwrap();
	}

	#[tokio::test]
	async fn test_switch_network_relabels_without_provider_round_trip() {
		let extension = Arc::new(MockExtension::with_accounts(&["5Alice"]));
		let adapter = adapter_with(extension.clone());

		adapter.connect(ConnectMode::Prompt).await.unwrap();
		let calls_before = extension.get_calls.load(Ordering::SeqCst);

		adapter
			.switch_network(&NetworkId::Polkadot(
				wallet_types::KUSAMA_GENESIS.to_string(),
			))
			.await
			.unwrap();

		assert_eq!(extension.get_calls.load(Ordering::SeqCst), calls_before);
		let cached = adapter.cache.read().await.clone();
		assert_eq!(cached[0].chain_name, "Kusama");
	}

	#[tokio::test]
	async fn test_switch_network_rejects_foreign_family() {
		let extension = Arc::new(MockExtension::with_accounts(&["5Alice"]));
		let adapter = adapter_with(extension);

		let err = adapter.switch_network(&NetworkId::Evm(1)).await.unwrap_err();
		assert!(matches!(err, AdapterError::NetworkMismatch { .. }));
	}

	#[tokio::test]
	async fn test_sign_message_string_and_byte_paths_match() {
		let extension = Arc::new(MockExtension::with_accounts(&["5Alice"]));
		let adapter = adapter_with(extension);
		adapter.connect(ConnectMode::Prompt).await.unwrap();

		let from_text = adapter
			.sign_message(SignableMessage::Text("hello".to_string()), None)
			.await
			.unwrap();
		let from_bytes = adapter
			.sign_message(SignableMessage::Bytes(b"hello".to_vec()), None)
			.await
			.unwrap();
		assert_eq!(from_text, from_bytes);
	}

	#[tokio::test]
	async fn test_sign_transaction_rejects_foreign_tag() {
		let extension = Arc::new(MockExtension::with_accounts(&["5Alice"]));
		let adapter = adapter_with(extension);
		adapter.connect(ConnectMode::Prompt).await.unwrap();

		let request = UnifiedTransactionRequest::Solana(wallet_types::SolanaTransaction {
			message: vec![1, 2, 3],
		});
		let err = adapter.sign_transaction(&request).await.unwrap_err();
		assert!(matches!(
			err,
			AdapterError::ChainTypeMismatch {
				handled: ChainType::Polkadot,
				requested: ChainType::Solana,
			}
		));
	}

	#[tokio::test]
	async fn test_sign_rejection_is_classified() {
		let extension = Arc::new(MockExtension {
			accounts: StdMutex::new(vec![RawSubstrateAccount {
				address: "5Alice".to_string(),
				name: None,
			}]),
			reject_sign: true,
			..Default::default()
		});
		let adapter = adapter_with(extension);
		adapter.connect(ConnectMode::Prompt).await.unwrap();

		let err = adapter
			.sign_message(SignableMessage::Text("hello".to_string()), None)
			.await
			.unwrap_err();
		assert!(matches!(err, AdapterError::UserRejected));
	}

	#[tokio::test]
	async fn test_subscription_replaces_cache_wholesale() {
		let extension = Arc::new(MockExtension::with_accounts(&["5Alice", "5Bob"]));
		let adapter = adapter_with(extension.clone());
		adapter.connect(ConnectMode::Prompt).await.unwrap();

		let mut watcher = adapter.subscribe_accounts().await.unwrap();
		extension.push_accounts(&["5Carol"]);

		let update = watcher.recv().await.unwrap().unwrap();
		assert_eq!(update.len(), 1);
		assert_eq!(update[0].address, "5Carol");
		assert_eq!(adapter.cache.read().await.len(), 1);
	}

	#[tokio::test]
	async fn test_dropping_watcher_stops_translation() {
		let extension = Arc::new(MockExtension::with_accounts(&["5Alice"]));
		let adapter = adapter_with(extension.clone());
		adapter.connect(ConnectMode::Prompt).await.unwrap();

		let watcher = adapter.subscribe_accounts().await.unwrap();
		let sender = extension.subscribers.lock().unwrap()[0].clone();
		drop(watcher);

		// Abort takes effect at the next scheduling point; once it does,
		// the provider-side channel is closed.
		let mut closed = false;
		for _ in 0..50 {
			if sender.send(Vec::new()).is_err() {
				closed = true;
				break;
			}
			tokio::time::sleep(std::time::Duration::from_millis(10)).await;
		}
		assert!(closed);
	}

	#[tokio::test]
	async fn test_sign_message_unknown_address() {
		let extension = Arc::new(MockExtension::with_accounts(&["5Alice"]));
		let adapter = adapter_with(extension);
		adapter.connect(ConnectMode::Prompt).await.unwrap();

		let err = adapter
			.sign_message(SignableMessage::Text("hi".to_string()), Some("5Mallory"))
			.await
			.unwrap_err();
		assert!(matches!(err, AdapterError::UnknownAccount(_)));
	}
}
