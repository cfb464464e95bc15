//! Binary persistence of a ledger.
//!
//! Layout (all integers and floats little-endian, no version field):
//!
//! ```text
//! difficulty: u32
//! repeated until end of stream:
//!   index: u32
//!   timestamp: i64
//!   transaction_count: u32
//!   transaction_count x { sender: [u8; 64], receiver: [u8; 64], amount: f64, timestamp: i64 }
//!   previous_hash: [u8; 32]
//!   hash: [u8; 32]
//! ```

pub mod codec;
pub mod file;

pub use codec::{read_chain, write_chain};
pub use file::{load_blockchain, save_blockchain};
