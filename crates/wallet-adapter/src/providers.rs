//! Provider boundary traits.
//!
//! Injected wallets are environment-provided objects; each family's
//! surface is expressed here as a trait implemented by the embedding host,
//! so the adapter layer never reaches into ambient globals and can be
//! driven with substituted providers under test.
//!
//! Provider errors carry only a message string. Classification (user
//! rejection versus real failure) happens in the adapter layer by matching
//! known phrasings, mirroring how the underlying wallets report declines.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use wallet_types::{EvmTransaction, SubstratePayload};

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ProviderError(pub String);

impl ProviderError {
	pub fn new(message: impl Into<String>) -> Self {
		Self(message.into())
	}
}

/// Account shape returned by a Substrate extension.
#[derive(Debug, Clone)]
pub struct RawSubstrateAccount {
	/// SS58-encoded address.
	pub address: String,
	/// User-assigned label inside the extension.
	pub name: Option<String>,
}

/// `accounts` capability of an enabled Substrate extension.
#[async_trait]
pub trait ExtensionAccounts: Send + Sync {
	/// Current accounts; `any_type` requests all accounts, including those
	/// not previously auto-granted. Never prompts.
	async fn get(&self, any_type: bool) -> Result<Vec<RawSubstrateAccount>, ProviderError>;

	/// Account-change notifications as full replacement lists. Dropping
	/// the receiver is the unsubscribe.
	async fn subscribe(
		&self,
	) -> Result<mpsc::UnboundedReceiver<Vec<RawSubstrateAccount>>, ProviderError>;
}

/// `signer` capability of an enabled Substrate extension.
#[async_trait]
pub trait ExtensionSigner: Send + Sync {
	async fn sign_payload(&self, payload: &SubstratePayload) -> Result<String, ProviderError>;

	/// Signs raw data. `data` must be a `0x`-prefixed hex string; the
	/// extension contract does not accept typed binary.
	async fn sign_raw(&self, address: &str, data: &str) -> Result<String, ProviderError>;
}

/// Capability handles exposed by one enabled extension.
///
/// Either handle may be absent on a malformed or partial extension;
/// discovery rejects such candidates instead of wrapping them.
pub struct InjectedExtension {
	pub accounts: Option<Arc<dyn ExtensionAccounts>>,
	pub signer: Option<Arc<dyn ExtensionSigner>>,
}

/// The well-known registry of installed Substrate extensions.
#[async_trait]
pub trait ExtensionRegistry: Send + Sync {
	/// Names of installed extensions.
	fn installed(&self) -> Vec<String>;

	/// Authorizes `origin` with one extension. May prompt inside the
	/// extension's own UI.
	async fn enable(&self, name: &str, origin: &str) -> Result<InjectedExtension, ProviderError>;
}

/// Events emitted by a Solana-style provider.
#[derive(Debug, Clone)]
pub enum SolanaProviderEvent {
	Connect { public_key: String },
	Disconnect,
	AccountChanged { public_key: Option<String> },
}

/// Injected Solana-style provider surface.
#[async_trait]
pub trait SolanaProvider: Send + Sync {
	fn name(&self) -> &str;

	/// The provider's own connection flag. Some providers report `true`
	/// transiently before a public key is available.
	fn is_connected(&self) -> bool;

	/// Base58 public key of the sole exposed account, when available.
	fn public_key(&self) -> Option<String>;

	/// Connects and resolves to the base58 public key. With
	/// `only_if_trusted`, a provider that has not previously trusted this
	/// origin rejects instead of prompting.
	async fn connect(&self, only_if_trusted: bool) -> Result<String, ProviderError>;

	async fn disconnect(&self) -> Result<(), ProviderError>;

	/// Signs a serialized transaction message, returning raw signature
	/// bytes.
	async fn sign_transaction(&self, message: &[u8]) -> Result<Vec<u8>, ProviderError>;

	/// Signs an arbitrary byte message, returning raw signature bytes.
	async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, ProviderError>;

	/// Connect/disconnect/account-changed notifications.
	async fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<SolanaProviderEvent>, ProviderError>;
}

/// Events emitted by an EVM-style provider.
#[derive(Debug, Clone)]
pub enum EvmProviderEvent {
	AccountsChanged(Vec<String>),
	ChainChanged(u64),
	Disconnect,
}

/// Injected EVM-style provider surface.
#[async_trait]
pub trait EvmProvider: Send + Sync {
	fn name(&self) -> &str;

	/// Authorizing account request; may prompt.
	async fn request_accounts(&self) -> Result<Vec<String>, ProviderError>;

	/// Silent account query; empty when this origin is not authorized.
	async fn accounts(&self) -> Result<Vec<String>, ProviderError>;

	async fn chain_id(&self) -> Result<u64, ProviderError>;

	/// Programmatic network switch; may prompt.
	async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError>;

	/// Signs a transaction, returning the provider's hex-encoded result.
	async fn sign_transaction(&self, tx: &EvmTransaction) -> Result<String, ProviderError>;

	/// Signs a `0x`-prefixed hex payload with the given account.
	async fn personal_sign(&self, address: &str, data: &str) -> Result<String, ProviderError>;

	/// accountsChanged/chainChanged/disconnect notifications.
	async fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<EvmProviderEvent>, ProviderError>;
}
