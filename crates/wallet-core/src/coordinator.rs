//! Coordinates connected wallet adapters across chain families.
//!
//! At most one adapter is held per (family, wallet source). Exactly one
//! account is "active" at any time; family-specific shapes never cross
//! this boundary. Only the user's selection (family, network, address) is
//! persisted; accounts are re-derived from providers on every load.

use arc_swap::ArcSwapOption;
use dashmap::DashSet;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use wallet_adapter::{AdapterError, ConnectMode, WalletAdapter};
use wallet_discovery::DiscoveryService;
use wallet_storage::{PersistedSession, SessionStore, StorageError};
use wallet_types::{
	AccountEvent, ChainType, EventBus, NetworkId, SessionEvent, SignableMessage, UnifiedAccount,
	UnifiedTransactionRequest, WalletEvent,
};

#[derive(Debug, Error)]
pub enum CoordinatorError {
	#[error("no {0} wallet found in this environment")]
	NoWalletFound(ChainType),

	#[error("no connected {0} wallet")]
	NotConnected(ChainType),

	#[error("no active wallet session")]
	NoActiveSession,

	/// Concurrent connects for the same wallet are rejected, not queued,
	/// to avoid duplicate approval prompts.
	#[error("a connect for {chain_type}/{wallet_source} is already in flight")]
	ConnectInFlight {
		chain_type: ChainType,
		wallet_source: String,
	},

	#[error(transparent)]
	Adapter(#[from] AdapterError),

	#[error(transparent)]
	Storage(#[from] StorageError),
}

type AdapterKey = (ChainType, String);

struct ConnectedWallet {
	adapter: Arc<dyn WalletAdapter>,
	accounts: Vec<UnifiedAccount>,
	forwarder: Option<JoinHandle<()>>,
}

/// Removes the in-flight marker when a connect attempt finishes.
struct InFlightGuard<'a> {
	set: &'a DashSet<AdapterKey>,
	key: AdapterKey,
}

impl Drop for InFlightGuard<'_> {
	fn drop(&mut self) {
		self.set.remove(&self.key);
	}
}

pub struct WalletCoordinator {
	discovery: Arc<DiscoveryService>,
	sessions: Arc<SessionStore>,
	connected: RwLock<HashMap<AdapterKey, ConnectedWallet>>,
	connecting: DashSet<AdapterKey>,
	active: ArcSwapOption<UnifiedAccount>,
	events: EventBus,
}

impl WalletCoordinator {
	pub fn new(discovery: Arc<DiscoveryService>, sessions: Arc<SessionStore>) -> Self {
		Self {
			discovery,
			sessions,
			connected: RwLock::new(HashMap::new()),
			connecting: DashSet::new(),
			active: ArcSwapOption::empty(),
			events: EventBus::new(256),
		}
	}

	pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<WalletEvent> {
		self.events.subscribe()
	}

	pub fn active_account(&self) -> Option<UnifiedAccount> {
		self.active.load_full().map(|a| (*a).clone())
	}

	/// All cached accounts across connected wallets.
	pub async fn accounts(&self) -> Vec<UnifiedAccount> {
		self.connected
			.read()
			.await
			.values()
			.flat_map(|entry| entry.accounts.clone())
			.collect()
	}

	pub async fn accounts_for(&self, chain_type: ChainType) -> Vec<UnifiedAccount> {
		self.connected
			.read()
			.await
			.iter()
			.filter(|((family, _), _)| *family == chain_type)
			.flat_map(|(_, entry)| entry.accounts.clone())
			.collect()
	}

	/// Connects a wallet of the given family.
	///
	/// A wallet of that family that is already connected is re-activated
	/// without a new handshake. Otherwise discovery runs, the matching
	/// adapter performs its handshake (which may suspend for a
	/// user-controlled duration), and the returned accounts are cached.
	/// Zero accounts is a valid outcome: nothing is stored and the
	/// coordinator stays idle for this wallet.
	pub async fn connect(
		self: &Arc<Self>,
		chain_type: ChainType,
		source: Option<&str>,
		mode: ConnectMode,
	) -> Result<Vec<UnifiedAccount>, CoordinatorError> {
		// Re-activate an existing connection instead of re-prompting.
		let existing = {
			let connected = self.connected.read().await;
			match source {
				Some(source) => connected
					.get(&(chain_type, source.to_string()))
					.map(|entry| entry.accounts.clone()),
				None => connected
					.iter()
					.find(|((family, _), _)| *family == chain_type)
					.map(|(_, entry)| entry.accounts.clone()),
			}
		};
		if let Some(accounts) = existing {
			if !accounts.is_empty() {
				let preferred = self.select_preferred(&accounts).await;
				self.set_active(Some(preferred.clone()));
				self.persist_selection(&preferred).await;
				return Ok(accounts);
			}
		}

		let mut wallets = self.discovery.discover(chain_type).await;
		let wallet = match source {
			Some(source) => {
				let index = wallets.iter().position(|w| w.source == source);
				index.map(|i| wallets.swap_remove(i))
			}
			None => {
				if wallets.is_empty() {
					None
				} else {
					Some(wallets.swap_remove(0))
				}
			}
		}
		.ok_or(CoordinatorError::NoWalletFound(chain_type))?;

		let key: AdapterKey = (chain_type, wallet.source.clone());
		if !self.connecting.insert(key.clone()) {
			return Err(CoordinatorError::ConnectInFlight {
				chain_type,
				wallet_source: wallet.source,
			});
		}
		let _guard = InFlightGuard {
			set: &self.connecting,
			key: key.clone(),
		};

		let accounts = wallet.adapter.connect(mode).await?;
		if accounts.is_empty() {
			debug!(family = %chain_type, source = %key.1, "connect yielded no accounts");
			return Ok(accounts);
		}

		let forwarder = self.spawn_forwarder(&wallet.adapter, &key).await;
		self.connected.write().await.insert(
			key.clone(),
			ConnectedWallet {
				adapter: wallet.adapter,
				accounts: accounts.clone(),
				forwarder,
			},
		);

		let preferred = self.select_preferred(&accounts).await;
		self.set_active(Some(preferred.clone()));
		self.persist_selection(&preferred).await;

		self.events
			.publish(WalletEvent::Accounts(AccountEvent::Changed {
				chain_type,
				source: key.1.clone(),
				accounts: accounts.clone(),
			}))
			.ok();

		info!(
			family = %chain_type,
			source = %key.1,
			count = accounts.len(),
			"wallet connected"
		);
		Ok(accounts)
	}

	/// Makes another family the active one. A family that is already
	/// connected is re-activated without prompting; the previous family's
	/// adapter stays connected.
	pub async fn switch_chain_type(
		self: &Arc<Self>,
		chain_type: ChainType,
	) -> Result<Vec<UnifiedAccount>, CoordinatorError> {
		self.connect(chain_type, None, ConnectMode::Prompt).await
	}

	/// Changes the active network within a connected family and refreshes
	/// that family's account labels.
	pub async fn switch_network(&self, network: NetworkId) -> Result<(), CoordinatorError> {
		let chain_type = network.chain_type();
		let (key, adapter) = self
			.adapter_for(chain_type)
			.await
			.ok_or(CoordinatorError::NotConnected(chain_type))?;

		adapter.switch_network(&network).await?;
		let accounts = adapter.get_accounts().await?;

		{
			let mut connected = self.connected.write().await;
			if let Some(entry) = connected.get_mut(&key) {
				entry.accounts = accounts.clone();
			}
		}

		self.events
			.publish(WalletEvent::Session(SessionEvent::NetworkSwitched {
				chain_type,
				network: network.clone(),
			}))
			.ok();
		self.events
			.publish(WalletEvent::Accounts(AccountEvent::Changed {
				chain_type,
				source: key.1.clone(),
				accounts: accounts.clone(),
			}))
			.ok();

		// Network relabeling changes account ids; carry the active account
		// over by address.
		if let Some(active) = self.active.load_full() {
			if active.chain_type == chain_type && active.source == key.1 {
				let updated = accounts
					.iter()
					.find(|a| a.address == active.address)
					.cloned()
					.or_else(|| accounts.first().cloned());
				self.set_active(updated.clone());
				if let Some(account) = updated {
					self.persist_selection(&account).await;
				}
			}
		}

		Ok(())
	}

	/// Disconnects wallets of a family (all of them, or one source).
	/// Idempotent: disconnecting a family that is not connected is a
	/// no-op.
	pub async fn disconnect(
		&self,
		chain_type: ChainType,
		source: Option<&str>,
	) -> Result<(), CoordinatorError> {
		let removed: Vec<(AdapterKey, ConnectedWallet)> = {
			let mut connected = self.connected.write().await;
			let keys: Vec<AdapterKey> = connected
				.keys()
				.filter(|(family, src)| {
					*family == chain_type && source.map(|s| src.as_str() == s).unwrap_or(true)
				})
				.cloned()
				.collect();
			keys.into_iter()
				.filter_map(|key| connected.remove(&key).map(|entry| (key, entry)))
				.collect()
		};

		let mut active_lost = false;
		let active = self.active.load_full();
		for (key, entry) in removed {
			if let Some(forwarder) = entry.forwarder {
				forwarder.abort();
			}
			if let Err(err) = entry.adapter.disconnect().await {
				warn!(family = %key.0, source = %key.1, error = %err, "adapter disconnect failed");
			}
			self.events
				.publish(WalletEvent::Accounts(AccountEvent::Disconnected {
					chain_type: key.0,
					source: key.1.clone(),
				}))
				.ok();
			if let Some(active) = active.as_ref() {
				if active.chain_type == key.0 && active.source == key.1 {
					active_lost = true;
				}
			}
		}

		if active_lost {
			// A restored session must not resurrect a wallet the user
			// explicitly disconnected.
			if let Err(err) = self.sessions.clear().await {
				warn!(error = %err, "failed to clear persisted session");
			}
			self.fallback_active().await;
		}

		Ok(())
	}

	/// Restores the persisted selection with a silent probe. A wallet that
	/// still trusts this origin reconnects without prompting; otherwise
	/// the coordinator stays idle and no error surfaces.
	pub async fn restore(self: &Arc<Self>) -> Result<Option<UnifiedAccount>, CoordinatorError> {
		let Some(session) = self.sessions.load().await? else {
			return Ok(None);
		};
		debug!(family = %session.chain_type, "restoring persisted wallet selection");

		let accounts = self
			.connect(session.chain_type, None, ConnectMode::TrustedOnly)
			.await?;
		if accounts.is_empty() {
			return Ok(None);
		}
		Ok(self.active_account())
	}

	/// Signs a family-tagged request through the connected adapter of that
	/// family, preferring the active account's wallet.
	pub async fn sign_transaction(
		&self,
		request: &UnifiedTransactionRequest,
	) -> Result<String, CoordinatorError> {
		let chain_type = request.chain_type();
		let (_, adapter) = self
			.adapter_for(chain_type)
			.await
			.ok_or(CoordinatorError::NotConnected(chain_type))?;
		Ok(adapter.sign_transaction(request).await?)
	}

	/// Signs a message with the active account (or an explicit address
	/// known to the active account's wallet).
	pub async fn sign_message(
		&self,
		message: SignableMessage,
		address: Option<&str>,
	) -> Result<String, CoordinatorError> {
		let active = self
			.active
			.load_full()
			.ok_or(CoordinatorError::NoActiveSession)?;
		let adapter = {
			let connected = self.connected.read().await;
			connected
				.get(&(active.chain_type, active.source.clone()))
				.map(|entry| entry.adapter.clone())
		}
		.ok_or(CoordinatorError::NotConnected(active.chain_type))?;

		let address = address.unwrap_or(active.address.as_str());
		Ok(adapter.sign_message(message, Some(address)).await?)
	}

	async fn adapter_for(
		&self,
		chain_type: ChainType,
	) -> Option<(AdapterKey, Arc<dyn WalletAdapter>)> {
		let connected = self.connected.read().await;

		if let Some(active) = self.active.load_full() {
			if active.chain_type == chain_type {
				let key = (chain_type, active.source.clone());
				if let Some(entry) = connected.get(&key) {
					return Some((key, entry.adapter.clone()));
				}
			}
		}
		connected
			.iter()
			.find(|((family, _), _)| *family == chain_type)
			.map(|(key, entry)| (key.clone(), entry.adapter.clone()))
	}

	/// Prefers the account matching the persisted selection, falling back
	/// to the first returned account.
	async fn select_preferred(&self, accounts: &[UnifiedAccount]) -> UnifiedAccount {
		if let Ok(Some(session)) = self.sessions.load().await {
			if let Some(account) = accounts
				.iter()
				.find(|a| a.chain_type == session.chain_type && a.address == session.address)
			{
				return account.clone();
			}
		}
		accounts[0].clone()
	}

	async fn persist_selection(&self, account: &UnifiedAccount) {
		let session = PersistedSession::new(
			account.chain_type,
			account.network.clone(),
			account.address.clone(),
		);
		if let Err(err) = self.sessions.save(&session).await {
			warn!(error = %err, "failed to persist wallet selection");
		}
	}

	fn set_active(&self, account: Option<UnifiedAccount>) {
		let changed = {
			let current = self.active.load();
			match (current.as_ref(), account.as_ref()) {
				(Some(a), Some(b)) => a.id != b.id,
				(None, None) => false,
				_ => true,
			}
		};
		self.active.store(account.clone().map(Arc::new));
		if changed {
			self.events
				.publish(WalletEvent::Session(SessionEvent::ActiveChanged { account }))
				.ok();
		}
	}

	async fn fallback_active(&self) {
		let next = {
			let connected = self.connected.read().await;
			connected
				.values()
				.filter_map(|entry| entry.accounts.first())
				.next()
				.cloned()
		};
		self.set_active(next);
	}

	async fn spawn_forwarder(
		self: &Arc<Self>,
		adapter: &Arc<dyn WalletAdapter>,
		key: &AdapterKey,
	) -> Option<JoinHandle<()>> {
		let mut watcher = match adapter.subscribe_accounts().await {
			Ok(watcher) => watcher,
			Err(err) => {
				warn!(
					family = %key.0,
					source = %key.1,
					error = %err,
					"account subscription unavailable"
				);
				return None;
			}
		};

		let weak = Arc::downgrade(self);
		let key = key.clone();
		Some(tokio::spawn(async move {
			while let Some(update) = watcher.recv().await {
				let Some(coordinator) = weak.upgrade() else {
					break;
				};
				let ended = update.as_ref().map(|a| a.is_empty()).unwrap_or(true);
				coordinator.handle_account_update(&key, update).await;
				if ended {
					break;
				}
			}
		}))
	}

	/// Applies one adapter-reported account update: the cached list is
	/// replaced wholesale, the active account re-evaluated.
	async fn handle_account_update(
		self: &Arc<Self>,
		key: &AdapterKey,
		update: Option<Vec<UnifiedAccount>>,
	) {
		match update {
			Some(accounts) if !accounts.is_empty() => {
				{
					let mut connected = self.connected.write().await;
					match connected.get_mut(key) {
						Some(entry) => entry.accounts = accounts.clone(),
						None => return,
					}
				}
				self.events
					.publish(WalletEvent::Accounts(AccountEvent::Changed {
						chain_type: key.0,
						source: key.1.clone(),
						accounts: accounts.clone(),
					}))
					.ok();

				if let Some(active) = self.active.load_full() {
					if active.chain_type == key.0 && active.source == key.1 {
						match accounts.iter().find(|a| a.id == active.id) {
							Some(still_present) => self.set_active(Some(still_present.clone())),
							None => self.set_active(Some(accounts[0].clone())),
						}
					}
				}
			}
			// Zero accounts or an explicit disconnect: this wallet goes
			// back to idle.
			_ => {
				let removed = self.connected.write().await.remove(key);
				if removed.is_none() {
					return;
				}
				self.events
					.publish(WalletEvent::Accounts(AccountEvent::Disconnected {
						chain_type: key.0,
						source: key.1.clone(),
					}))
					.ok();

				let active_lost = self
					.active
					.load_full()
					.map(|active| active.chain_type == key.0 && active.source == key.1)
					.unwrap_or(false);
				if active_lost {
					self.fallback_active().await;
				}
			}
		}
	}
}
