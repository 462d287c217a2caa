//! Transaction-request types.
//!
//! [`UnifiedTransactionRequest`] is a tagged union keyed by chain family;
//! each variant carries exactly the payload its family's signer
//! understands. Dispatch always switches on the tag first: an adapter
//! handed a request for another family rejects it before touching any
//! family-specific field.

use crate::chains::ChainType;
use serde::{Deserialize, Serialize};

/// EVM transaction fields in the shape an injected provider signs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvmTransaction {
	/// Sender address (None lets the provider use its active account).
	pub from: Option<String>,
	/// Recipient address (None for contract creation).
	pub to: Option<String>,
	/// Value to transfer in wei.
	pub value: u128,
	/// Calldata.
	pub data: Vec<u8>,
	/// Chain id for replay protection.
	pub chain_id: u64,
	pub nonce: Option<u64>,
	pub gas_limit: Option<u64>,
	pub gas_price: Option<u128>,
	pub max_fee_per_gas: Option<u128>,
	pub max_priority_fee_per_gas: Option<u128>,
}

/// Substrate signer payload, mirroring the extension signer contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubstratePayload {
	/// SS58 address of the signing account.
	pub address: String,
	pub genesis_hash: String,
	/// Hex-encoded call data.
	pub method: String,
	pub nonce: u64,
	pub spec_version: u32,
	pub transaction_version: u32,
	/// Hex-encoded mortality era; None for immortal transactions.
	pub era: Option<String>,
	pub block_hash: String,
}

/// Serialized Solana transaction message as the provider expects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolanaTransaction {
	pub message: Vec<u8>,
}

/// Family-tagged transaction request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "chain_type", rename_all = "lowercase")]
pub enum UnifiedTransactionRequest {
	Evm(EvmTransaction),
	Polkadot(SubstratePayload),
	Solana(SolanaTransaction),
}

impl UnifiedTransactionRequest {
	pub fn chain_type(&self) -> ChainType {
		match self {
			UnifiedTransactionRequest::Evm(_) => ChainType::Evm,
			UnifiedTransactionRequest::Polkadot(_) => ChainType::Polkadot,
			UnifiedTransactionRequest::Solana(_) => ChainType::Solana,
		}
	}
}
