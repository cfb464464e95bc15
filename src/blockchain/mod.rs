pub mod block;
pub mod model;

pub use block::Block;
pub use model::{Blockchain, ChainError};

/// Maximum number of transactions a single block accepts.
pub const MAX_TRANSACTIONS: usize = 100;

/// Difficulty used when none is configured. Stored, never enforced.
pub const DEFAULT_DIFFICULTY: u32 = 4;
