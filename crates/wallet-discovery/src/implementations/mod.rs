pub mod evm;
pub mod solana;
pub mod substrate;
