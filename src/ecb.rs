// Byte-at-a-time ECB decryption of a secret the oracle appends to our input.
//
// With ECB, equal plaintext blocks give equal ciphertext blocks. Sending
// enough filler that the next unknown secret byte is the last byte of a
// block, that block is
//
//   filler | known secret bytes | ?
//
// and we can build the same block ourselves for each candidate byte until
// the ciphertexts match.
use crate::{Error, Result};

use tracing::{debug, info, instrument};

pub const DEFAULT_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789{}_";

/// Recovers the secret suffix, starting from the bytes in `known`. Stops at
/// the first byte not in `charset`.
#[instrument(skip_all, fields(block_size = block_size))]
pub fn ecb_chosen_plaintext_attack<F>(
    mut oracle: F,
    charset: &[u8],
    known: &[u8],
    block_size: usize,
) -> Result<Vec<u8>>
where
    F: FnMut(&[u8]) -> Vec<u8>,
{
    if block_size == 0 {
        return Err(Error::InvalidBlockSize(block_size));
    }

    let mut known = known.to_vec();
    loop {
        let filler_len = block_size - 1 - known.len() % block_size;
        let block_end = filler_len + known.len() + 1;
        let mut payload = vec![0u8; filler_len];

        let reference = oracle(&payload);
        let target = block_ending_at(&reference, block_end, block_size)?.to_vec();

        payload.extend_from_slice(&known);
        payload.push(0);
        let last = payload.len() - 1;
        let mut found = None;
        for &c in charset {
            payload[last] = c;
            let encrypted = oracle(&payload);
            if block_ending_at(&encrypted, block_end, block_size)? == target {
                found = Some(c);
                break;
            }
        }

        match found {
            Some(c) => {
                known.push(c);
                debug!(recovered = %String::from_utf8_lossy(&known), "recovered byte");
            }
            None => break,
        }
    }

    info!(recovered = %String::from_utf8_lossy(&known), "secret recovered");
    Ok(known)
}

fn block_ending_at(bytes: &[u8], end: usize, block_size: usize) -> Result<&[u8]> {
    bytes.get(end - block_size..end).ok_or(Error::ShortOracleOutput {
        needed: end,
        got: bytes.len(),
    })
}
