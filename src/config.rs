use std::env;
use std::path::PathBuf;

use crate::blockchain::DEFAULT_DIFFICULTY;

/// Default file the driver persists the ledger to.
pub const DEFAULT_DATA_FILE: &str = "blockchain.dat";

/// Driver settings, read from the environment (and `.env` if present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub difficulty: u32,
    pub data_file: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
        }
    }
}

impl LedgerConfig {
    /// `LEDGER_DIFFICULTY` and `LEDGER_FILE`; unset or unparsable values
    /// fall back to the defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_vars(
            env::var("LEDGER_DIFFICULTY").ok(),
            env::var("LEDGER_FILE").ok(),
        )
    }

    fn from_vars(difficulty: Option<String>, data_file: Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            difficulty: difficulty
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.difficulty),
            data_file: data_file
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_file),
        }
    }
}
