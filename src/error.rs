use thiserror::Error;

/// Errors surfaced by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("block is full ({capacity} transactions)")]
    CapacityExceeded { capacity: usize },

    #[error("amount must be > 0, got {0}")]
    InvalidAmount(f64),

    #[error("{0} must not be empty")]
    EmptyParty(&'static str),

    #[error("block index overflow: tail is already at index {0}")]
    IndexOverflow(u32),

    #[error("block not found: index {0}")]
    BlockNotFound(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("truncated block record at position {block}")]
    Truncated { block: usize },

    #[error("corrupt ledger data: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
