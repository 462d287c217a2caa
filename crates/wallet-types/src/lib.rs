pub mod account;
pub mod chains;
pub mod events;
pub mod transaction;

pub use account::*;
pub use chains::*;
pub use events::*;
pub use transaction::*;
