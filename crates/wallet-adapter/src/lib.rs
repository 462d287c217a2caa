//! Adapter capability contract for wallet-protocol families.
//!
//! Every family adapter implements [`WalletAdapter`] over a structurally
//! different underlying provider object. Callers depend only on this
//! contract, never on a concrete adapter type; family-specific shapes stop
//! at the adapter boundary.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use wallet_types::{
	ChainType, NetworkId, SignableMessage, UnifiedAccount, UnifiedTransactionRequest,
};

pub mod implementations;
pub mod providers;

pub use implementations::{EvmAdapter, SolanaAdapter, SubstrateAdapter};
pub use providers::ProviderError;

#[derive(Debug, Error)]
pub enum AdapterError {
	/// The user explicitly declined inside the wallet's own UI. An
	/// expected outcome, not a fault; callers must not escalate it.
	#[error("user rejected the request")]
	UserRejected,
	#[error("wallet {0} is not connected")]
	NotConnected(String),
	#[error("no account available for signing")]
	NoAccounts,
	#[error("account {0} is not exposed by this wallet")]
	UnknownAccount(String),
	#[error("request is tagged {requested} but this adapter handles {handled}")]
	ChainTypeMismatch {
		handled: ChainType,
		requested: ChainType,
	},
	#[error("network {network} does not belong to the {handled} family")]
	NetworkMismatch {
		handled: ChainType,
		network: NetworkId,
	},
	#[error("provider error: {0}")]
	Provider(String),
}

/// How a connect call is allowed to interact with the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectMode {
	/// Request authorization; the wallet may prompt.
	Prompt,
	/// Silent probe: resolve to an empty account list when the wallet has
	/// not previously authorized this origin, never by prompting.
	TrustedOnly,
}

/// One account-list update from a provider: the full new list, or `None`
/// when the provider reported a disconnect.
pub type AccountUpdate = Option<Vec<UnifiedAccount>>;

/// Handle on a running provider-event translation.
///
/// Dropping the watcher stops the translation task; this is the cleanup
/// counterpart of the provider's native unsubscribe.
pub struct AccountWatcher {
	receiver: mpsc::UnboundedReceiver<AccountUpdate>,
	task: JoinHandle<()>,
}

impl AccountWatcher {
	pub fn new(receiver: mpsc::UnboundedReceiver<AccountUpdate>, task: JoinHandle<()>) -> Self {
		Self { receiver, task }
	}

	/// Next account update, or `None` once the provider stream ended.
	pub async fn recv(&mut self) -> Option<AccountUpdate> {
		self.receiver.recv().await
	}
}

impl Drop for AccountWatcher {
	fn drop(&mut self) {
		self.task.abort();
	}
}

/// The capability contract every family adapter satisfies.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
	fn chain_type(&self) -> ChainType;

	/// Name of the concrete wallet this adapter wraps.
	fn source(&self) -> &str;

	/// Performs the family handshake. May suspend for an unbounded,
	/// user-controlled duration while the wallet's own approval UI is
	/// open. Resolves to `[]` when the signer has no accounts; that is a
	/// valid state, not a failure.
	async fn connect(&self, mode: ConnectMode) -> Result<Vec<UnifiedAccount>, AdapterError>;

	/// Releases subscriptions and clears cached accounts. Idempotent.
	async fn disconnect(&self) -> Result<(), AdapterError>;

	/// Re-reads current accounts without re-prompting. Yields `[]` while
	/// disconnected.
	async fn get_accounts(&self) -> Result<Vec<UnifiedAccount>, AdapterError>;

	async fn is_connected(&self) -> bool;

	/// The network currently used to label this adapter's accounts.
	async fn network(&self) -> NetworkId;

	/// Changes the active network within this adapter's family. Semantics
	/// are family-specific; see each implementation.
	async fn switch_network(&self, network: &NetworkId) -> Result<(), AdapterError>;

	/// Signs a family-tagged request. A request whose tag does not match
	/// this adapter's family is a contract violation and is rejected
	/// before any family-specific field is read.
	async fn sign_transaction(
		&self,
		request: &UnifiedTransactionRequest,
	) -> Result<String, AdapterError>;

	/// Signs an arbitrary message with the account at `address`, or the
	/// first known account when omitted.
	async fn sign_message(
		&self,
		message: SignableMessage,
		address: Option<&str>,
	) -> Result<String, AdapterError>;

	/// Starts translating the provider's native account/connection events
	/// into [`AccountUpdate`]s.
	async fn subscribe_accounts(&self) -> Result<AccountWatcher, AdapterError>;
}

/// Rejection phrasings observed across injected providers.
const REJECTION_PHRASES: &[&str] = &[
	"user rejected",
	"rejected by user",
	"rejected the request",
	"user denied",
	"denied by user",
	"user cancelled",
	"user canceled",
	"cancelled by user",
	"canceled by user",
	"approval was rejected",
];

/// Whether a provider error message reports an explicit user decline.
pub fn is_user_rejection(message: &str) -> bool {
	let message = message.to_lowercase();
	REJECTION_PHRASES.iter().any(|p| message.contains(p))
}

/// Maps a raw provider error into the adapter taxonomy.
pub fn classify_provider_error(err: ProviderError) -> AdapterError {
	if is_user_rejection(&err.0) {
		AdapterError::UserRejected
	} else {
		AdapterError::Provider(err.0)
	}
}

/// Classifies a provider error, logging everything except user
/// cancellation with context. A cancellation is an expected outcome and is
/// not escalated.
pub fn classify_with_context(
	family: ChainType,
	source: &str,
	operation: &str,
	err: ProviderError,
) -> AdapterError {
	let classified = classify_provider_error(err);
	if !matches!(classified, AdapterError::UserRejected) {
		tracing::warn!(
			family = %family,
			source,
			operation,
			error = %classified,
			"provider call failed"
		);
	}
	classified
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_rejection_classifier_known_phrasings() {
		for msg in [
			"User rejected the request.",
			"Error: Cancelled by user",
			"signing was user denied",
			"Transaction approval was rejected",
		] {
			assert!(is_user_rejection(msg), "should classify: {}", msg);
		}
	}

	#[test]
	fn test_rejection_classifier_unrelated_messages() {
		for msg in [
			"network unreachable",
			"internal provider failure",
			"invalid payload",
		] {
			assert!(!is_user_rejection(msg), "should not classify: {}", msg);
		}
	}

	#[test]
	fn test_classify_provider_error() {
		assert!(matches!(
			classify_provider_error(ProviderError::new("User rejected the request")),
			AdapterError::UserRejected
		));
		assert!(matches!(
			classify_provider_error(ProviderError::new("timeout")),
			AdapterError::Provider(_)
		));
	}
}
