mod bytes;
mod classical;
mod ecb;
mod error;
mod flag;
mod lcg;
mod pkcs7;
#[cfg(test)]
mod testing;

pub mod numtheory;
pub mod padding_oracle;
pub mod rsa;
pub mod tube;

pub use bytes::{bytes_to_int, int_to_bytes, parse_int, to_blocks, xor_bytes, xor_zip};
pub use classical::{rot_bytes, rot_text, vigenere_decrypt, vigenere_encrypt, xor_text};
pub use ecb::{ecb_chosen_plaintext_attack, DEFAULT_CHARSET};
pub use error::{Error, Result};
pub use flag::{extract_flags_bytes, extract_flags_text, DEFAULT_HEAD, DEFAULT_TAIL};
pub use lcg::{crack_lcg, crack_lcg_with_modulus, Lcg};
pub use padding_oracle::{
    Checkpoint, FileCheckpoint, NoCheckpoint, PaddingOracle, PaddingOracleAttack,
    PaddingOracleConfig, ResumeData,
};
pub use pkcs7::{is_pkcs7_padded, pkcs7_pad, pkcs7_unpad};
pub use tube::{Remote, RemotePaddingOracle, Tube};
