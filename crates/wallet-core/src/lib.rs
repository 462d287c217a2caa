//! # Wallet Core
//!
//! The multi-chain coordinator: owns the set of connected adapters, tracks
//! the single active account across families, persists the user's last
//! selection, and fans adapter events out to the rest of the application.

pub mod builder;
pub mod coordinator;

pub use builder::CoordinatorBuilder;
pub use coordinator::{CoordinatorError, WalletCoordinator};
