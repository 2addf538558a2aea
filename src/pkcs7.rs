// PKCS#7 padding and validation.
use crate::{Error, Result};

pub fn pkcs7_pad(bytes: &[u8], block_size: u8) -> Result<Vec<u8>> {
    if block_size == 0 {
        return Err(Error::InvalidBlockSize(0));
    }
    let n_pad = block_size - (bytes.len() % block_size as usize) as u8;
    let mut out = Vec::with_capacity(bytes.len() + n_pad as usize);
    out.extend_from_slice(bytes);
    out.resize(bytes.len() + n_pad as usize, n_pad);
    Ok(out)
}

pub fn pkcs7_unpad(bytes: &mut Vec<u8>) -> Result<()> {
    let n_pad = is_pkcs7_padded(bytes).ok_or(Error::InvalidPadding)?;
    bytes.truncate(bytes.len() - n_pad as usize);
    Ok(())
}

/// Returns the padding length if `bytes` ends in valid padding.
pub fn is_pkcs7_padded(bytes: &[u8]) -> Option<u8> {
    let n_pad = *bytes.last()?;
    if n_pad == 0 || n_pad as usize > bytes.len() {
        return None;
    }
    let padded = &bytes[(bytes.len() - n_pad as usize)..];
    padded.iter().all(|&el| el == n_pad).then_some(n_pad)
}
