//! Chain-family and network types.
//!
//! Every tagged union in the wallet layer is discriminated by [`ChainType`];
//! [`NetworkId`] selects a concrete network within a family. The
//! [`ChainRegistry`] maps network identifiers to display metadata and is
//! built once at startup, read-only afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Wallet-protocol family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
	Evm,
	Polkadot,
	Solana,
}

impl fmt::Display for ChainType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			ChainType::Evm => "evm",
			ChainType::Polkadot => "polkadot",
			ChainType::Solana => "solana",
		};
		write!(f, "{}", name)
	}
}

#[derive(Debug, Error)]
#[error("unknown chain type: {0}")]
pub struct UnknownChainType(String);

impl FromStr for ChainType {
	type Err = UnknownChainType;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"evm" => Ok(ChainType::Evm),
			"polkadot" => Ok(ChainType::Polkadot),
			"solana" => Ok(ChainType::Solana),
			other => Err(UnknownChainType(other.to_string())),
		}
	}
}

/// Well-known Substrate genesis hashes, used as network keys.
pub const POLKADOT_GENESIS: &str =
	"0x91b171bb158e2d3848fa23a9f1c25182fb8e20313b2c1eb49219da7a70ce90c3";
pub const KUSAMA_GENESIS: &str =
	"0xb0a8d493285c2df73290dfb7e61f870f17b41801197a149ca93654499ea3dafe";
pub const WESTEND_GENESIS: &str =
	"0xe143f23803ac50e8f6f8e62695d1ce9e4e1d68aa36c1cd2cfd15340213f3423e";

/// Family-specific network selector.
///
/// EVM networks use numeric chain ids, Substrate networks a
/// genesis-hash-derived key, Solana networks a cluster id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "chain_type", content = "id", rename_all = "lowercase")]
pub enum NetworkId {
	Evm(u64),
	Polkadot(String),
	Solana(String),
}

impl NetworkId {
	pub fn chain_type(&self) -> ChainType {
		match self {
			NetworkId::Evm(_) => ChainType::Evm,
			NetworkId::Polkadot(_) => ChainType::Polkadot,
			NetworkId::Solana(_) => ChainType::Solana,
		}
	}

	/// Compact key used inside account ids and storage keys.
	pub fn key(&self) -> String {
		match self {
			NetworkId::Evm(id) => id.to_string(),
			NetworkId::Polkadot(genesis) => genesis.clone(),
			NetworkId::Solana(cluster) => cluster.clone(),
		}
	}
}

impl fmt::Display for NetworkId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.key())
	}
}

/// Static registry entry for one network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
	pub network: NetworkId,
	pub name: String,
	/// Native currency decimals (EVM and Substrate families).
	pub decimals: Option<u8>,
	/// Native currency symbol (EVM and Substrate families).
	pub currency: Option<String>,
}

impl ChainConfig {
	pub fn new(network: NetworkId, name: &str) -> Self {
		Self {
			network,
			name: name.to_string(),
			decimals: None,
			currency: None,
		}
	}

	pub fn with_currency(mut self, symbol: &str, decimals: u8) -> Self {
		self.currency = Some(symbol.to_string());
		self.decimals = Some(decimals);
		self
	}
}

/// Read-only lookup from network identifier to display metadata.
#[derive(Debug, Clone)]
pub struct ChainRegistry {
	configs: HashMap<NetworkId, ChainConfig>,
}

impl ChainRegistry {
	/// Registry pre-populated with the well-known networks of each family.
	pub fn well_known() -> Self {
		let entries = vec![
			ChainConfig::new(NetworkId::Evm(1), "Ethereum").with_currency("ETH", 18),
			ChainConfig::new(NetworkId::Evm(10), "Optimism").with_currency("ETH", 18),
			ChainConfig::new(NetworkId::Evm(137), "Polygon").with_currency("POL", 18),
			ChainConfig::new(NetworkId::Evm(8453), "Base").with_currency("ETH", 18),
			ChainConfig::new(NetworkId::Evm(42161), "Arbitrum One").with_currency("ETH", 18),
			ChainConfig::new(NetworkId::Polkadot(POLKADOT_GENESIS.to_string()), "Polkadot")
				.with_currency("DOT", 10),
			ChainConfig::new(NetworkId::Polkadot(KUSAMA_GENESIS.to_string()), "Kusama")
				.with_currency("KSM", 12),
			ChainConfig::new(NetworkId::Polkadot(WESTEND_GENESIS.to_string()), "Westend")
				.with_currency("WND", 12),
			ChainConfig::new(NetworkId::Solana("mainnet-beta".to_string()), "Solana Mainnet Beta"),
			ChainConfig::new(NetworkId::Solana("devnet".to_string()), "Solana Devnet"),
			ChainConfig::new(NetworkId::Solana("testnet".to_string()), "Solana Testnet"),
		];

		let mut configs = HashMap::new();
		for entry in entries {
			configs.insert(entry.network.clone(), entry);
		}
		Self { configs }
	}

	/// Extends the registry with additional entries at construction time.
	///
	/// Later entries replace earlier ones with the same network id.
	pub fn with_networks(mut self, extra: Vec<ChainConfig>) -> Self {
		for entry in extra {
			self.configs.insert(entry.network.clone(), entry);
		}
		self
	}

	pub fn get(&self, network: &NetworkId) -> Option<&ChainConfig> {
		self.configs.get(network)
	}

	/// Human-readable label for a network, falling back to its key when the
	/// network is not registered.
	pub fn chain_name(&self, network: &NetworkId) -> String {
		self.configs
			.get(network)
			.map(|c| c.name.clone())
			.unwrap_or_else(|| network.key())
	}

	/// The default network used when a family adapter starts without an
	/// explicit selection.
	pub fn default_network(&self, chain_type: ChainType) -> NetworkId {
		match chain_type {
			ChainType::Evm => NetworkId::Evm(1),
			ChainType::Polkadot => NetworkId::Polkadot(POLKADOT_GENESIS.to_string()),
			ChainType::Solana => NetworkId::Solana("mainnet-beta".to_string()),
		}
	}
}

impl Default for ChainRegistry {
	fn default() -> Self {
		Self::well_known()
	}
}
