use std::fmt;

use log::{debug, warn};
use serde::Serialize;

use super::Block;
use crate::error::{LedgerError, Result};

/// Hash-linked ledger rooted at a genesis block.
///
/// Blocks live in a vector in chain order; the tail is always the last
/// element, so appends are O(1) and the chain from genesis reaches the tail
/// in `latest().index + 1` steps as long as blocks are only added through
/// [`Blockchain::add_block`].
#[derive(Debug, Clone, PartialEq)]
pub struct Blockchain {
    chain: Vec<Block>,
    difficulty: u32,
}

/// Why a chain failed validation, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("hash mismatch at block {index}: stored hash differs from content")]
    HashMismatch { index: usize },

    #[error("broken link after block {index}: successor's previous_hash does not match")]
    BrokenLink { index: usize },
}

#[derive(Serialize)]
struct ChainSnapshot<'a> {
    length: usize,
    difficulty: u32,
    chain: &'a [Block],
}

impl Blockchain {
    /// Initialize a new ledger with a genesis block.
    pub fn new(difficulty: u32) -> Self {
        Self {
            chain: vec![Block::genesis()],
            difficulty,
        }
    }

    /// Rebuild a ledger from already-linked blocks. An empty list yields a
    /// fresh genesis block.
    pub fn from_blocks(difficulty: u32, blocks: Vec<Block>) -> Self {
        if blocks.is_empty() {
            return Self::new(difficulty);
        }
        Self {
            chain: blocks,
            difficulty,
        }
    }

    pub fn genesis(&self) -> &Block {
        &self.chain[0]
    }

    pub fn genesis_mut(&mut self) -> &mut Block {
        &mut self.chain[0]
    }

    /// Return the last block in the chain.
    pub fn latest(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    pub fn latest_mut(&mut self) -> &mut Block {
        self.chain
            .last_mut()
            .expect("Blockchain should always have at least the genesis block")
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.chain.get(index)
    }

    pub fn block_mut(&mut self, index: usize) -> Option<&mut Block> {
        self.chain.get_mut(index)
    }

    /// Blocks from genesis to tail.
    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Append a transaction to the block at `index`. The block's hash is not
    /// refreshed; call [`Blockchain::calculate_block_hash`] when done.
    pub fn add_transaction(
        &mut self,
        index: usize,
        sender: &str,
        receiver: &str,
        amount: f64,
    ) -> Result<()> {
        self.chain
            .get_mut(index)
            .ok_or(LedgerError::BlockNotFound(index))?
            .add_transaction(sender, receiver, amount)
    }

    /// Recompute the stored hash of the block at `index`.
    pub fn calculate_block_hash(&mut self, index: usize) -> Result<()> {
        self.chain
            .get_mut(index)
            .ok_or(LedgerError::BlockNotFound(index))?
            .calculate_hash();
        Ok(())
    }

    /// Append an empty block linked to the current tail and return it.
    ///
    /// The new block snapshots the tail's hash as it is right now; later
    /// recomputes of the tail do not propagate. Fails if the tail's index is
    /// already `u32::MAX`.
    pub fn add_block(&mut self) -> Result<&mut Block> {
        let prev = self.latest();
        let index = prev
            .index
            .checked_add(1)
            .ok_or(LedgerError::IndexOverflow(prev.index))?;
        let block = Block::new(index, prev.hash);
        debug!(
            "appended block #{} (previous_hash={})",
            block.index, block.previous_hash
        );
        self.chain.push(block);
        Ok(self.latest_mut())
    }

    /// Walk the chain and report the first inconsistency.
    ///
    /// Each block's stored hash must match its content, and each block's
    /// hash must equal its successor's `previous_hash`.
    pub fn verify_chain(&self) -> std::result::Result<(), ChainError> {
        for (i, block) in self.chain.iter().enumerate() {
            if !block.has_valid_hash() {
                return Err(ChainError::HashMismatch { index: i });
            }
            if let Some(next) = self.chain.get(i + 1) {
                if next.previous_hash != block.hash {
                    return Err(ChainError::BrokenLink { index: i });
                }
            }
        }
        Ok(())
    }

    /// Validate the entire chain: content hashes and linkage.
    pub fn is_valid_chain(&self) -> bool {
        match self.verify_chain() {
            Ok(()) => true,
            Err(e) => {
                warn!("chain validation failed: {e}");
                false
            }
        }
    }

    /// JSON listing of the whole chain: `{ length, difficulty, chain }`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&ChainSnapshot {
            length: self.len(),
            difficulty: self.difficulty,
            chain: &self.chain,
        })
    }
}

impl fmt::Display for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.chain {
            writeln!(f)?;
            write!(f, "{block}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Digest;

    fn three_block_chain() -> Blockchain {
        let mut bc = Blockchain::new(4);
        bc.add_transaction(0, "King", "Jack", 10.5).unwrap();
        bc.add_transaction(0, "Jack", "Kraed", 5.0).unwrap();
        bc.calculate_block_hash(0).unwrap();

        let b1 = bc.add_block().unwrap();
        b1.add_transaction("Kraed", "King", 7.5).unwrap();
        b1.add_transaction("Jack", "King", 3.0).unwrap();
        b1.calculate_hash();

        let b2 = bc.add_block().unwrap();
        b2.add_transaction("King", "Kraed", 2.5).unwrap();
        b2.calculate_hash();
        bc
    }

    #[test]
    fn new_chain_has_genesis() {
        let bc = Blockchain::new(2);
        assert_eq!(bc.len(), 1);
        assert_eq!(bc.difficulty(), 2);
        assert_eq!(bc.genesis().index, 0);
        assert!(bc.genesis().previous_hash.is_zero());
        assert_eq!(bc.genesis(), bc.latest());
        assert!(bc.is_valid_chain());
    }

    #[test]
    fn add_block_links_to_tail() {
        let mut bc = Blockchain::new(1);
        let genesis_hash = bc.genesis().hash;
        bc.add_block().unwrap();
        assert_eq!(bc.len(), 2);
        assert_eq!(bc.latest().index, 1);
        assert_eq!(bc.latest().previous_hash, genesis_hash);
        assert!(bc.latest().has_valid_hash());
        assert_eq!(bc.len(), bc.latest().index as usize + 1);
    }

    #[test]
    fn add_block_rejects_index_overflow() {
        let mut bc = Blockchain::new(1);
        bc.genesis_mut().index = u32::MAX;
        bc.calculate_block_hash(0).unwrap();

        let err = bc.add_block().unwrap_err();
        assert!(matches!(err, LedgerError::IndexOverflow(u32::MAX)));
        assert_eq!(bc.len(), 1);
        assert!(bc.is_valid_chain());
    }

    #[test]
    fn valid_chain_passes() {
        let bc = three_block_chain();
        assert!(bc.is_valid_chain());
        assert_eq!(bc.verify_chain(), Ok(()));
    }

    #[test]
    fn tampered_amount_is_detected() {
        let mut bc = three_block_chain();
        bc.block_mut(1).unwrap().transactions[0].amount = 700.0;
        assert!(!bc.is_valid_chain());
        assert_eq!(bc.verify_chain(), Err(ChainError::HashMismatch { index: 1 }));
    }

    #[test]
    fn tampered_genesis_is_detected() {
        let mut bc = three_block_chain();
        bc.genesis_mut().transactions[1].amount = 0.01;
        assert_eq!(bc.verify_chain(), Err(ChainError::HashMismatch { index: 0 }));
    }

    #[test]
    fn replaced_previous_hash_breaks_link() {
        let mut bc = three_block_chain();
        let middle = bc.block_mut(1).unwrap();
        middle.previous_hash = Digest([0x5a; 32]);
        middle.calculate_hash();
        assert!(bc.block(1).unwrap().has_valid_hash());
        assert!(!bc.is_valid_chain());
        assert_eq!(bc.verify_chain(), Err(ChainError::BrokenLink { index: 0 }));
    }

    #[test]
    fn recomputing_a_non_tail_block_breaks_successor_link() {
        let mut bc = three_block_chain();
        bc.add_transaction(0, "Kraed", "Jack", 1.0).unwrap();
        bc.calculate_block_hash(0).unwrap();
        assert_eq!(bc.verify_chain(), Err(ChainError::BrokenLink { index: 0 }));
    }

    #[test]
    fn missed_recompute_is_detected() {
        let mut bc = three_block_chain();
        bc.add_transaction(2, "Jack", "Kraed", 4.0).unwrap();
        assert_eq!(bc.verify_chain(), Err(ChainError::HashMismatch { index: 2 }));
        bc.calculate_block_hash(2).unwrap();
        assert!(bc.is_valid_chain());
    }

    #[test]
    fn unknown_block_index_is_rejected() {
        let mut bc = Blockchain::new(1);
        assert!(matches!(
            bc.add_transaction(5, "a", "b", 1.0),
            Err(LedgerError::BlockNotFound(5))
        ));
        assert!(matches!(
            bc.calculate_block_hash(5),
            Err(LedgerError::BlockNotFound(5))
        ));
    }

    #[test]
    fn from_blocks_empty_creates_genesis() {
        let bc = Blockchain::from_blocks(9, Vec::new());
        assert_eq!(bc.len(), 1);
        assert_eq!(bc.difficulty(), 9);
    }

    #[test]
    fn display_renders_every_block() {
        let bc = three_block_chain();
        let out = bc.to_string();
        assert!(out.contains("Block #0"));
        assert!(out.contains("Block #2"));
        assert!(out.contains("1. King -> Jack: 10.50"));
    }

    #[test]
    fn json_snapshot_has_length_and_hex_hashes() {
        let bc = three_block_chain();
        let v: serde_json::Value = serde_json::from_str(&bc.to_json().unwrap()).unwrap();
        assert_eq!(v["length"], 3);
        assert_eq!(v["difficulty"], 4);
        assert_eq!(v["chain"][1]["hash"], bc.block(1).unwrap().hash.to_hex());
        assert_eq!(v["chain"][0]["transactions"][0]["sender"], "King");
    }
}
