//! Configuration for the wallet layer.
//!
//! TOML files with `${VAR}` environment substitution and `WALLET_`-prefixed
//! overrides. The network tables extend the built-in chain registry; they
//! are folded in once at startup and read-only afterwards.

use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use wallet_types::{ChainConfig, ChainRegistry, ChainType, NetworkId};

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_backend() -> String {
	"memory".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
	/// Origin name presented to Substrate extensions on `enable`.
	pub origin: String,
	/// Family pre-selected when no session was persisted.
	pub default_chain: Option<ChainType>,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
	#[serde(default = "default_backend")]
	pub backend: String,
	pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			backend: default_backend(),
			path: None,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvmNetworkConfig {
	pub chain_id: u64,
	pub name: String,
	pub decimals: Option<u8>,
	pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolkadotNetworkConfig {
	pub genesis_hash: String,
	pub name: String,
	pub decimals: Option<u8>,
	pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolanaNetworkConfig {
	pub cluster: String,
	pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkOverrides {
	#[serde(default)]
	pub evm: Vec<EvmNetworkConfig>,
	#[serde(default)]
	pub polkadot: Vec<PolkadotNetworkConfig>,
	#[serde(default)]
	pub solana: Vec<SolanaNetworkConfig>,
}

impl NetworkOverrides {
	/// Registry entries for every configured network.
	pub fn chain_configs(&self) -> Vec<ChainConfig> {
		let mut configs = Vec::new();
		for net in &self.evm {
			let mut config = ChainConfig::new(NetworkId::Evm(net.chain_id), &net.name);
			config.decimals = net.decimals;
			config.currency = net.currency.clone();
			configs.push(config);
		}
		for net in &self.polkadot {
			let mut config =
				ChainConfig::new(NetworkId::Polkadot(net.genesis_hash.clone()), &net.name);
			config.decimals = net.decimals;
			config.currency = net.currency.clone();
			configs.push(config);
		}
		for net in &self.solana {
			configs.push(ChainConfig::new(
				NetworkId::Solana(net.cluster.clone()),
				&net.name,
			));
		}
		configs
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
	pub app: AppConfig,
	#[serde(default)]
	pub storage: StorageConfig,
	#[serde(default)]
	pub networks: NetworkOverrides,
}

impl WalletConfig {
	/// The built-in registry extended with configured networks.
	pub fn chain_registry(&self) -> ChainRegistry {
		ChainRegistry::well_known().with_networks(self.networks.chain_configs())
	}
}

/// Configuration loader with environment variable substitution.
#[derive(Default)]
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "WALLET_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<WalletConfig, ConfigError> {
		let mut config = if let Some(file_path) = &self.file_path {
			self.load_from_file(file_path).await?
		} else {
			return Err(ConfigError::FileNotFound(
				"No configuration file specified".to_string(),
			));
		};

		self.apply_env_overrides(&mut config)?;
		self.validate_config(&config)?;

		Ok(config)
	}

	async fn load_from_file(&self, file_path: &str) -> Result<WalletConfig, ConfigError> {
		let content = tokio::fs::read_to_string(file_path).await?;
		let substituted_content = self.substitute_env_vars(&content)?;

		let config: WalletConfig = toml::from_str(&substituted_content)
			.map_err(|e| ConfigError::ParseError(e.to_string()))?;

		debug!(path = file_path, "wallet configuration loaded");
		Ok(config)
	}

	fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
		let mut result = content.to_string();

		// Find and replace ${VAR_NAME} patterns.
		let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();
		for cap in re.captures_iter(content) {
			let full_match = &cap[0];
			let var_name = &cap[1];

			let env_value = env::var(var_name)
				.map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
			result = result.replace(full_match, &env_value);
		}

		Ok(result)
	}

	fn apply_env_overrides(&self, config: &mut WalletConfig) -> Result<(), ConfigError> {
		if let Ok(log_level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			config.app.log_level = log_level;
		}

		if let Ok(path) = env::var(format!("{}STORAGE_PATH", self.env_prefix)) {
			config.storage.path = Some(PathBuf::from(path));
		}

		if let Ok(chain) = env::var(format!("{}DEFAULT_CHAIN", self.env_prefix)) {
			let parsed = chain.parse().map_err(|_| {
				ConfigError::ValidationError(format!("Invalid default chain: {}", chain))
			})?;
			config.app.default_chain = Some(parsed);
		}

		Ok(())
	}

	fn validate_config(&self, config: &WalletConfig) -> Result<(), ConfigError> {
		if config.app.origin.trim().is_empty() {
			return Err(ConfigError::ValidationError(
				"app.origin must not be empty".to_string(),
			));
		}

		match config.storage.backend.as_str() {
			"memory" => {}
			"file" => {
				if config.storage.path.is_none() {
					return Err(ConfigError::ValidationError(
						"file storage backend requires storage.path".to_string(),
					));
				}
			}
			other => {
				return Err(ConfigError::ValidationError(format!(
					"Unknown storage backend: {}",
					other
				)))
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	fn write_config(content: &str) -> tempfile::NamedTempFile {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(content.as_bytes()).unwrap();
		file
	}

	#[tokio::test]
	async fn test_load_minimal_config() {
		let file = write_config(
			r#"
[app]
origin = "charity-portal"
"#,
		);
		let config = ConfigLoader::new()
			.with_file(file.path())
			.load()
			.await
			.unwrap();

		assert_eq!(config.app.origin, "charity-portal");
		assert_eq!(config.app.log_level, "info");
		assert_eq!(config.storage.backend, "memory");
	}

	#[tokio::test]
	async fn test_env_substitution() {
		env::set_var("TEST_WALLET_ORIGIN", "substituted-origin");
		let file = write_config(
			r#"
[app]
origin = "${TEST_WALLET_ORIGIN}"
"#,
		);
		let config = ConfigLoader::new()
			.with_file(file.path())
			.load()
			.await
			.unwrap();
		assert_eq!(config.app.origin, "substituted-origin");
	}

	#[tokio::test]
	async fn test_missing_env_var_is_an_error() {
		let file = write_config(
			r#"
[app]
origin = "${TEST_WALLET_UNSET_VAR}"
"#,
		);
		let err = ConfigLoader::new()
			.with_file(file.path())
			.load()
			.await
			.unwrap_err();
		assert!(matches!(err, ConfigError::EnvVarNotFound(_)));
	}

	#[tokio::test]
	async fn test_env_override_applies() {
		env::set_var("TESTPFX_LOG_LEVEL", "debug");
		let file = write_config(
			r#"
[app]
origin = "charity-portal"
"#,
		);
		let config = ConfigLoader::new()
			.with_file(file.path())
			.with_env_prefix("TESTPFX_")
			.load()
			.await
			.unwrap();
		assert_eq!(config.app.log_level, "debug");
	}

	#[tokio::test]
	async fn test_invalid_storage_backend_rejected() {
		let file = write_config(
			r#"
[app]
origin = "charity-portal"

[storage]
backend = "redis"
"#,
		);
		let err = ConfigLoader::new()
			.with_file(file.path())
			.load()
			.await
			.unwrap_err();
		assert!(matches!(err, ConfigError::ValidationError(_)));
	}

	#[tokio::test]
	async fn test_network_overrides_extend_registry() {
		let file = write_config(
			r#"
[app]
origin = "charity-portal"

[[networks.evm]]
chain_id = 59144
name = "Linea"
decimals = 18
currency = "ETH"

[[networks.solana]]
cluster = "localnet"
name = "Solana Localnet"
"#,
		);
		let config = ConfigLoader::new()
			.with_file(file.path())
			.load()
			.await
			.unwrap();

		let registry = config.chain_registry();
		assert_eq!(registry.chain_name(&NetworkId::Evm(59144)), "Linea");
		assert_eq!(
			registry.chain_name(&NetworkId::Solana("localnet".to_string())),
			"Solana Localnet"
		);
		// Built-ins survive the extension.
		assert_eq!(registry.chain_name(&NetworkId::Evm(1)), "Ethereum");
	}
}
