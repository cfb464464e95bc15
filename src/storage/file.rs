use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::{info, warn};

use super::codec::{read_chain, write_chain};
use crate::blockchain::Blockchain;
use crate::error::Result;

/// Write `chain` to `path`, replacing any existing file.
///
/// On error the file may hold a partial ledger.
pub fn save_blockchain(chain: &Blockchain, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_chain(&mut writer, chain).inspect_err(|e| {
        warn!("saving ledger to {} failed: {}", path.display(), e);
    })?;
    writer.flush()?;
    info!(
        "saved ledger to {} ({} blocks, difficulty {})",
        path.display(),
        chain.len(),
        chain.difficulty()
    );
    Ok(())
}

/// Read a ledger previously written by [`save_blockchain`].
pub fn load_blockchain(path: impl AsRef<Path>) -> Result<Blockchain> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    let chain = read_chain(&mut reader).inspect_err(|e| {
        warn!("loading ledger from {} failed: {}", path.display(), e);
    })?;
    info!(
        "loaded ledger from {} ({} blocks, difficulty {})",
        path.display(),
        chain.len(),
        chain.difficulty()
    );
    Ok(chain)
}
