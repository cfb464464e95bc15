use std::fmt;

use chrono::Utc;
use log::{debug, warn};
use serde::Serialize;

use super::MAX_TRANSACTIONS;
use crate::crypto::{Digest, Sha256};
use crate::error::{LedgerError, Result};
use crate::transaction::Transaction;

/// A single block in the ledger holding an ordered list of transactions.
///
/// `hash` is a cached value: it is only correct after [`Block::calculate_hash`]
/// has run following the last mutation. Appending transactions or changing
/// `previous_hash` does not refresh it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub index: u32,
    pub timestamp: i64, // Unix timestamp (UTC)
    pub transactions: Vec<Transaction>,
    pub previous_hash: Digest,
    pub hash: Digest,
}

impl Block {
    /// Create the genesis block (first block in the chain).
    pub fn genesis() -> Self {
        Self::new(0, Digest::ZERO)
    }

    /// Create an empty block linked to `previous_hash`, with its hash computed.
    pub fn new(index: u32, previous_hash: Digest) -> Self {
        let mut block = Self {
            index,
            timestamp: Utc::now().timestamp(),
            transactions: Vec::new(),
            previous_hash,
            hash: Digest::ZERO,
        };
        block.calculate_hash();
        block
    }

    /// Rebuild a block from stored fields. The stored `hash` is kept as-is.
    pub fn from_parts(
        index: u32,
        timestamp: i64,
        transactions: Vec<Transaction>,
        previous_hash: Digest,
        hash: Digest,
    ) -> Self {
        Self {
            index,
            timestamp,
            transactions,
            previous_hash,
            hash,
        }
    }

    /// Compute the SHA-256 of the canonical hash input, without storing it.
    ///
    /// Fields are fed in a fixed order: index, timestamp, each transaction in
    /// append order, then the 32 bytes of `previous_hash`.
    pub fn compute_hash(&self) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(&self.index.to_le_bytes());
        hasher.update(&self.timestamp.to_le_bytes());
        for tx in &self.transactions {
            tx.feed_hash_input(&mut hasher);
        }
        hasher.update(self.previous_hash.as_bytes());
        hasher.finalize()
    }

    /// Recompute and overwrite `hash`.
    pub fn calculate_hash(&mut self) {
        self.hash = self.compute_hash();
        debug!("block #{} hash recomputed: {}", self.index, self.hash);
    }

    /// Whether the cached `hash` matches the block's current content.
    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Append a transaction stamped with the current time.
    ///
    /// Fails without touching the block when it already holds
    /// [`MAX_TRANSACTIONS`] or the transaction itself is rejected. The caller
    /// must run [`Block::calculate_hash`] afterwards.
    pub fn add_transaction(&mut self, sender: &str, receiver: &str, amount: f64) -> Result<()> {
        if self.is_full() {
            warn!(
                "block #{} rejected transaction: full ({} txs)",
                self.index, MAX_TRANSACTIONS
            );
            return Err(LedgerError::CapacityExceeded {
                capacity: MAX_TRANSACTIONS,
            });
        }

        let tx = Transaction::new(sender, receiver, amount).inspect_err(|e| {
            warn!("block #{} rejected transaction: {}", self.index, e);
        })?;
        self.transactions.push(tx);
        Ok(())
    }

    pub fn is_full(&self) -> bool {
        self.transactions.len() >= MAX_TRANSACTIONS
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block #{}", self.index)?;
        writeln!(f, "Timestamp: {}", self.timestamp)?;
        writeln!(f, "Previous Hash: {}", self.previous_hash)?;
        writeln!(f, "Hash: {}", self.hash)?;
        writeln!(f, "Transactions:")?;
        for (i, tx) in self.transactions.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, tx)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_has_valid_hash() {
        let b = Block::genesis();
        assert_eq!(b.index, 0);
        assert!(b.previous_hash.is_zero());
        assert!(b.transactions.is_empty());
        assert_eq!(b.hash, b.compute_hash());
    }

    #[test]
    fn hash_is_deterministic() {
        let mut b = Block::new(3, Digest([9; 32]));
        b.add_transaction("King", "Jack", 1.25).unwrap();
        b.calculate_hash();
        let first = b.hash;
        b.calculate_hash();
        assert_eq!(first, b.hash);
        assert_eq!(b.compute_hash(), b.compute_hash());
    }

    #[test]
    fn hash_matches_manual_input() {
        let mut b = Block::from_parts(
            7,
            1_700_000_000,
            vec![Transaction::from_parts("ab".into(), "cd".into(), 2.5, 42)],
            Digest([1; 32]),
            Digest::ZERO,
        );
        b.calculate_hash();

        let mut input = Vec::new();
        input.extend_from_slice(&7u32.to_le_bytes());
        input.extend_from_slice(&1_700_000_000i64.to_le_bytes());
        input.extend_from_slice(b"abcd");
        input.extend_from_slice(&2.5f64.to_le_bytes());
        input.extend_from_slice(&42i64.to_le_bytes());
        input.extend_from_slice(&[1; 32]);
        assert_eq!(b.hash, crate::crypto::sha256(&input));
    }

    #[test]
    fn add_transaction_does_not_refresh_hash() {
        let mut b = Block::genesis();
        let before = b.hash;
        b.add_transaction("King", "Jack", 10.5).unwrap();
        assert_eq!(b.hash, before);
        assert!(!b.has_valid_hash());

        b.calculate_hash();
        assert!(b.has_valid_hash());
        assert_ne!(b.hash, before);
    }

    #[test]
    fn transaction_order_changes_hash() {
        let a = Transaction::from_parts("King".into(), "Jack".into(), 1.0, 10);
        let c = Transaction::from_parts("Jack".into(), "Kraed".into(), 2.0, 10);
        let first = Block::from_parts(1, 5, vec![a.clone(), c.clone()], Digest::ZERO, Digest::ZERO);
        let second = Block::from_parts(1, 5, vec![c, a], Digest::ZERO, Digest::ZERO);
        assert_ne!(first.compute_hash(), second.compute_hash());
    }

    #[test]
    fn capacity_boundary() {
        let mut b = Block::genesis();
        for i in 0..MAX_TRANSACTIONS {
            b.add_transaction("King", "Jack", (i + 1) as f64).unwrap();
        }
        assert!(b.is_full());
        let err = b.add_transaction("King", "Jack", 1.0).unwrap_err();
        assert!(matches!(err, LedgerError::CapacityExceeded { capacity: 100 }));
        assert_eq!(b.transactions.len(), MAX_TRANSACTIONS);
    }

    #[test]
    fn rejected_amount_leaves_block_untouched() {
        let mut b = Block::genesis();
        assert!(b.add_transaction("King", "Jack", 0.0).is_err());
        assert!(b.add_transaction("King", "Jack", -3.0).is_err());
        assert!(b.transactions.is_empty());
    }

    #[test]
    fn display_lists_transactions() {
        let mut b = Block::from_parts(2, 100, Vec::new(), Digest::ZERO, Digest::ZERO);
        b.transactions
            .push(Transaction::from_parts("Kraed".into(), "King".into(), 7.5, 0));
        let out = b.to_string();
        assert!(out.starts_with("Block #2\n"));
        assert!(out.contains("Timestamp: 100"));
        assert!(out.contains("  1. Kraed -> King: 7.50"));
    }
}
