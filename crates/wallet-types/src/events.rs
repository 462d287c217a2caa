//! Wallet events and the broadcast bus that fans them out.
//!
//! Adapters translate their provider's native callbacks into these shapes
//! before anything leaves the wallet layer; subscribers never see a
//! family-specific event object.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::{ChainType, NetworkId, UnifiedAccount};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WalletEvent {
	Accounts(AccountEvent),
	Session(SessionEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AccountEvent {
	/// The account list of one connected wallet was replaced.
	Changed {
		chain_type: ChainType,
		source: String,
		accounts: Vec<UnifiedAccount>,
	},
	/// A connected wallet reported a disconnect.
	Disconnected {
		chain_type: ChainType,
		source: String,
	},
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
	/// The coordinator's active account changed (None when none remains).
	ActiveChanged { account: Option<UnifiedAccount> },
	/// The active network within a family changed.
	NetworkSwitched {
		chain_type: ChainType,
		network: NetworkId,
	},
}

/// Broadcast bus for wallet events.
///
/// Each subscriber receives its own copy of every event published after
/// the subscription was created.
pub struct EventBus {
	sender: broadcast::Sender<WalletEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event to all current subscribers.
	///
	/// Returns an error when no subscriber is listening; callers that do
	/// not care may ignore it.
	pub fn publish(
		&self,
		event: WalletEvent,
	) -> Result<(), broadcast::error::SendError<WalletEvent>> {
		self.sender.send(event)?;
		Ok(())
	}
}

impl Clone for EventBus {
	fn clone(&self) -> Self {
		Self {
			sender: self.sender.clone(),
		}
	}
}
