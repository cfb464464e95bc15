use std::io::{self, ErrorKind, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::warn;

use crate::blockchain::{Block, Blockchain, MAX_TRANSACTIONS};
use crate::crypto::{DIGEST_SIZE, Digest};
use crate::error::{LedgerError, Result};
use crate::transaction::{MAX_NAME_LEN, NAME_FIELD_SIZE, Transaction};

/// Serialize `chain` from genesis to tail.
pub fn write_chain<W: Write>(w: &mut W, chain: &Blockchain) -> Result<()> {
    w.write_u32::<LittleEndian>(chain.difficulty())?;
    for block in chain.blocks() {
        write_block(w, block)?;
    }
    Ok(())
}

fn write_block<W: Write>(w: &mut W, block: &Block) -> Result<()> {
    w.write_u32::<LittleEndian>(block.index)?;
    w.write_i64::<LittleEndian>(block.timestamp)?;
    let count = block.transactions.len();
    if count > MAX_TRANSACTIONS {
        return Err(LedgerError::CapacityExceeded {
            capacity: MAX_TRANSACTIONS,
        });
    }
    w.write_u32::<LittleEndian>(count as u32)?;
    for tx in &block.transactions {
        w.write_all(&encode_name(&tx.sender, "sender")?)?;
        w.write_all(&encode_name(&tx.receiver, "receiver")?)?;
        w.write_f64::<LittleEndian>(tx.amount)?;
        w.write_i64::<LittleEndian>(tx.timestamp)?;
    }
    w.write_all(block.previous_hash.as_bytes())?;
    w.write_all(block.hash.as_bytes())?;
    Ok(())
}

/// Deserialize a ledger written by [`write_chain`].
///
/// A stream that ends exactly between two block records is complete; one
/// that ends inside a record fails with [`LedgerError::Truncated`] and no
/// partial block is kept. Each record's index must equal its position in the
/// stream. Stored hashes are taken verbatim, not recomputed.
pub fn read_chain<R: Read>(r: &mut R) -> Result<Blockchain> {
    let difficulty = r.read_u32::<LittleEndian>().map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => LedgerError::Corrupt("missing difficulty header".into()),
        _ => LedgerError::Io(e),
    })?;

    let mut blocks = Vec::new();
    while let Some(block) = read_block(r, blocks.len())? {
        blocks.push(block);
    }

    Ok(Blockchain::from_blocks(difficulty, blocks))
}

fn read_block<R: Read>(r: &mut R, position: usize) -> Result<Option<Block>> {
    let truncated = |e: io::Error| match e.kind() {
        ErrorKind::UnexpectedEof => {
            warn!("block record {position} is truncated");
            LedgerError::Truncated { block: position }
        }
        _ => LedgerError::Io(e),
    };

    let mut index_bytes = [0u8; 4];
    if !fill_or_eof(r, &mut index_bytes).map_err(truncated)? {
        return Ok(None);
    }
    let index = u32::from_le_bytes(index_bytes);
    if index as usize != position {
        return Err(LedgerError::Corrupt(format!(
            "block record {position} carries index {index}"
        )));
    }
    let timestamp = r.read_i64::<LittleEndian>().map_err(truncated)?;

    let count = r.read_u32::<LittleEndian>().map_err(truncated)? as usize;
    if count > MAX_TRANSACTIONS {
        return Err(LedgerError::Corrupt(format!(
            "block record {position} claims {count} transactions (max {MAX_TRANSACTIONS})"
        )));
    }

    let mut transactions = Vec::with_capacity(count);
    for _ in 0..count {
        let mut sender = [0u8; NAME_FIELD_SIZE];
        let mut receiver = [0u8; NAME_FIELD_SIZE];
        r.read_exact(&mut sender).map_err(truncated)?;
        r.read_exact(&mut receiver).map_err(truncated)?;
        let amount = r.read_f64::<LittleEndian>().map_err(truncated)?;
        let tx_timestamp = r.read_i64::<LittleEndian>().map_err(truncated)?;
        transactions.push(Transaction::from_parts(
            decode_name(&sender)?,
            decode_name(&receiver)?,
            amount,
            tx_timestamp,
        ));
    }

    let mut previous_hash = [0u8; DIGEST_SIZE];
    let mut hash = [0u8; DIGEST_SIZE];
    r.read_exact(&mut previous_hash).map_err(truncated)?;
    r.read_exact(&mut hash).map_err(truncated)?;

    Ok(Some(Block::from_parts(
        index,
        timestamp,
        transactions,
        Digest(previous_hash),
        Digest(hash),
    )))
}

/// Fill `buf` completely. `Ok(false)` if the stream was already at its end,
/// `UnexpectedEof` if it ended part-way.
fn fill_or_eof<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    match filled {
        0 => Ok(false),
        n if n == buf.len() => Ok(true),
        _ => Err(ErrorKind::UnexpectedEof.into()),
    }
}

fn encode_name(name: &str, field: &str) -> Result<[u8; NAME_FIELD_SIZE]> {
    let bytes = name.as_bytes();
    if bytes.len() > MAX_NAME_LEN || bytes.contains(&0) {
        return Err(LedgerError::Corrupt(format!(
            "{field} {name:?} does not fit a {NAME_FIELD_SIZE}-byte field"
        )));
    }
    let mut field_bytes = [0u8; NAME_FIELD_SIZE];
    field_bytes[..bytes.len()].copy_from_slice(bytes);
    Ok(field_bytes)
}

fn decode_name(field: &[u8; NAME_FIELD_SIZE]) -> Result<String> {
    let end = field
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| LedgerError::Corrupt("party name is not NUL-terminated".into()))?;
    String::from_utf8(field[..end].to_vec())
        .map_err(|_| LedgerError::Corrupt("party name is not valid UTF-8".into()))
}
