pub mod evm;
pub mod solana;
pub mod substrate;

pub use evm::EvmAdapter;
pub use solana::SolanaAdapter;
pub use substrate::SubstrateAdapter;
