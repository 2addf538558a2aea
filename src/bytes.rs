// Byte buffer helpers shared by the block-cipher attacks.
use crate::{Error, Result};

use num_bigint::{BigInt, Sign};

pub fn xor_bytes(buf_a: &[u8], buf_b: &[u8]) -> Result<Vec<u8>> {
    if buf_a.len() != buf_b.len() {
        return Err(Error::UnequalLength(buf_a.len(), buf_b.len()));
    }
    Ok(xor_zip(buf_a, buf_b))
}

/// XOR two buffers up to the length of the shorter one.
pub fn xor_zip(buf_a: &[u8], buf_b: &[u8]) -> Vec<u8> {
    buf_a.iter().zip(buf_b.iter()).map(|(a, b)| a ^ b).collect()
}

/// Big-endian magnitude of `x`, with no leading zero bytes. Zero encodes as
/// an empty buffer.
pub fn int_to_bytes(x: &BigInt) -> Vec<u8> {
    if x.sign() == Sign::NoSign {
        return Vec::new();
    }
    x.magnitude().to_bytes_be()
}

pub fn bytes_to_int(bytes: &[u8]) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, bytes)
}

/// Parses a decimal integer, or hex with a `0x` prefix. Either may be
/// negative.
pub fn parse_int(s: &str) -> Result<BigInt> {
    let s = s.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let parsed = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex_digits) => BigInt::parse_bytes(hex_digits.as_bytes(), 16),
        None => BigInt::parse_bytes(digits.as_bytes(), 10),
    };
    match parsed {
        Some(x) if !digits.starts_with(['+', '-']) => Ok(if negative { -x } else { x }),
        _ => Err(Error::InvalidInteger(s.to_string())),
    }
}

pub fn to_blocks(bytes: &[u8], block_size: usize) -> Result<Vec<&[u8]>> {
    if block_size == 0 || bytes.len() % block_size != 0 {
        return Err(Error::BlockAlignment {
            len: bytes.len(),
            block_size,
        });
    }
    Ok(bytes.chunks(block_size).collect())
}
