//! Hash-linked ledger: blocks chained by SHA-256 digests, with chain
//! validation and binary persistence.

pub mod blockchain;
pub mod config;
pub mod crypto;
pub mod error;
pub mod storage;
pub mod transaction;

pub use blockchain::{Block, Blockchain, ChainError, MAX_TRANSACTIONS};
pub use config::LedgerConfig;
pub use crypto::{Digest, Sha256, sha256};
pub use error::{LedgerError, Result};
pub use storage::{load_blockchain, save_blockchain};
pub use transaction::Transaction;
