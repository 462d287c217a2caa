//! Account types shared by all chain-family adapters.
//!
//! A [`UnifiedAccount`] is the canonical representation of one signer,
//! regardless of which family's wallet produced it. Identity is carried by
//! the `id` field alone: the same address string can be exposed by more
//! than one installed wallet, so the id encodes family, network, address
//! and wallet source together.

use crate::chains::{ChainRegistry, ChainType, NetworkId};
use serde::{Deserialize, Serialize};

/// Canonical, family-agnostic signer representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedAccount {
	/// Stable identifier: `{family}-{network key}-{address}-{source}`.
	pub id: String,
	/// Network-native address string; opaque outside the owning adapter.
	pub address: String,
	pub chain_type: ChainType,
	pub network: NetworkId,
	/// Display label resolved from the chain registry.
	pub chain_name: String,
	/// Name of the concrete wallet that produced this account.
	pub source: String,
	/// Optional user-assigned label from the wallet itself.
	pub name: Option<String>,
}

impl UnifiedAccount {
	pub fn new(
		network: NetworkId,
		address: impl Into<String>,
		source: &str,
		name: Option<String>,
		chains: &ChainRegistry,
	) -> Self {
		let address = address.into();
		let chain_type = network.chain_type();
		Self {
			id: format!("{}-{}-{}-{}", chain_type, network.key(), address, source),
			chain_name: chains.chain_name(&network),
			address,
			chain_type,
			network,
			source: source.to_string(),
			name,
		}
	}

	/// Two accounts are the same signer iff their ids match.
	pub fn same_signer(&self, other: &UnifiedAccount) -> bool {
		self.id == other.id
	}
}

/// Message input accepted by `sign_message`.
///
/// Substrate extension signers only accept `0x`-prefixed hex strings, so
/// both variants normalize to the same hex payload; a text message and its
/// UTF-8 byte equivalent sign identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignableMessage {
	Text(String),
	Bytes(Vec<u8>),
}

impl SignableMessage {
	pub fn as_bytes(&self) -> &[u8] {
		match self {
			SignableMessage::Text(s) => s.as_bytes(),
			SignableMessage::Bytes(b) => b,
		}
	}

	/// `0x`-prefixed hex encoding of the message bytes.
	pub fn to_hex_payload(&self) -> String {
		format!("0x{}", hex::encode(self.as_bytes()))
	}
}

impl From<&str> for SignableMessage {
	fn from(s: &str) -> Self {
		SignableMessage::Text(s.to_string())
	}
}

impl From<Vec<u8>> for SignableMessage {
	fn from(bytes: Vec<u8>) -> Self {
		SignableMessage::Bytes(bytes)
	}
}
