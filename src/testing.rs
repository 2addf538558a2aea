// AES-128 reference oracles the attack tests run against.
use crate::bytes::xor_zip;
use crate::pkcs7::{is_pkcs7_padded, pkcs7_pad};

use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;

pub const BLOCK_SIZE: usize = 16;

pub struct Aes128Oracle {
    cipher: Aes128,
}

impl Aes128Oracle {
    pub fn new(key: [u8; BLOCK_SIZE]) -> Self {
        Self {
            cipher: Aes128::new(GenericArray::from_slice(&key)),
        }
    }

    /// PKCS7 pads `plaintext` and returns `iv || ciphertext`.
    pub fn encrypt_cbc(&self, plaintext: &[u8], iv: &[u8; BLOCK_SIZE]) -> Vec<u8> {
        let mut out = iv.to_vec();
        let mut prev = iv.to_vec();
        for block in pkcs7_pad(plaintext, BLOCK_SIZE as u8).unwrap().chunks(BLOCK_SIZE) {
            let mut block = xor_zip(block, &prev);
            self.cipher
                .encrypt_block(GenericArray::from_mut_slice(&mut block));
            out.extend_from_slice(&block);
            prev = block;
        }
        out
    }

    /// Decrypts `iv || ciphertext` without removing the padding.
    pub fn decrypt_cbc(&self, ciphertext: &[u8]) -> Vec<u8> {
        ciphertext
            .chunks(BLOCK_SIZE)
            .collect::<Vec<_>>()
            .windows(2)
            .flat_map(|pair| {
                let mut block = pair[1].to_vec();
                self.cipher
                    .decrypt_block(GenericArray::from_mut_slice(&mut block));
                xor_zip(&block, pair[0])
            })
            .collect()
    }

    pub fn padding_valid(&self, ciphertext: &[u8]) -> bool {
        ciphertext.len() >= 2 * BLOCK_SIZE
            && ciphertext.len() % BLOCK_SIZE == 0
            && is_pkcs7_padded(&self.decrypt_cbc(ciphertext)).is_some()
    }

    pub fn encrypt_ecb(&self, plaintext: &[u8]) -> Vec<u8> {
        let mut out = pkcs7_pad(plaintext, BLOCK_SIZE as u8).unwrap();
        for block in out.chunks_mut(BLOCK_SIZE) {
            self.cipher.encrypt_block(GenericArray::from_mut_slice(block));
        }
        out
    }
}
