use std::fmt;

use chrono::Utc;
use serde::Serialize;

use crate::crypto::Sha256;
use crate::error::{LedgerError, Result};

/// Width of a persisted party name, terminator included.
pub const NAME_FIELD_SIZE: usize = 64;

/// Longest party name kept, in bytes. Longer names are truncated.
pub const MAX_NAME_LEN: usize = NAME_FIELD_SIZE - 1;

/// A transfer recorded inside a block. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub sender: String,
    pub receiver: String,
    pub amount: f64,
    pub timestamp: i64, // Unix timestamp (UTC)
}

impl Transaction {
    /// Build a transaction stamped with the current time.
    ///
    /// Names are truncated to [`MAX_NAME_LEN`] bytes first; a name that is
    /// empty afterwards is rejected, as is any amount that is not a finite,
    /// strictly positive number.
    pub fn new(sender: &str, receiver: &str, amount: f64) -> Result<Self> {
        let sender = truncate_name(sender);
        let receiver = truncate_name(receiver);

        if sender.is_empty() {
            return Err(LedgerError::EmptyParty("sender"));
        }
        if receiver.is_empty() {
            return Err(LedgerError::EmptyParty("receiver"));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        Ok(Self {
            sender,
            receiver,
            amount,
            timestamp: Utc::now().timestamp(),
        })
    }

    /// Reassemble a transaction from stored fields without validation.
    pub fn from_parts(sender: String, receiver: String, amount: f64, timestamp: i64) -> Self {
        Self {
            sender,
            receiver,
            amount,
            timestamp,
        }
    }

    /// Feed this record's canonical bytes: sender, receiver, amount, timestamp.
    pub fn feed_hash_input(&self, hasher: &mut Sha256) {
        hasher.update(self.sender.as_bytes());
        hasher.update(self.receiver.as_bytes());
        hasher.update(&self.amount.to_le_bytes());
        hasher.update(&self.timestamp.to_le_bytes());
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {:.2}", self.sender, self.receiver, self.amount)
    }
}

/// Cut at the first NUL, then to at most `MAX_NAME_LEN` bytes on a char boundary.
pub fn truncate_name(name: &str) -> String {
    let name = name.split('\0').next().unwrap_or_default();
    if name.len() <= MAX_NAME_LEN {
        return name.to_owned();
    }
    let mut end = MAX_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_owned()
}
