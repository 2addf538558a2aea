// CBC padding oracle attack, decryption and forgery, resumable at byte
// granularity.
//
// CBC decryption is
//
//                 P_i = D(C_i) ⊕ C_{i-1}.
//
// Sending X | C_i for an attack block X that we control, the oracle decrypts
// the single block D(C_i) ⊕ X and tells us if it ends in valid padding. For
// the last byte we vary X[15] until the padding is valid, which means
//
//                 D(C_i)[15] ⊕ X[15] = \x01
//
// and gives D(C_i)[15] without the key. Setting the tail of X so that the
// known bytes decrypt to \x02\x02 we go on with X[14], and so on for the
// whole block. XORing D(C_i) with the real C_{i-1} gives the plaintext.
//
// Knowing D(C) also means choosing the plaintext: the block before C must be
// D(C) ⊕ P. Forgery walks back from the last ciphertext block, each forged
// block becoming the target of the next step, the last one being the IV.
//
// The first hit for the last byte can come from a longer padding such as
// \x02\x02 when the plaintext happens to end in \x02. Flipping the byte before
// it and asking again tells the two apart.
mod resume;

pub use resume::{Checkpoint, FileCheckpoint, NoCheckpoint, ResumeData};

use crate::bytes::xor_bytes;
use crate::{Error, Result};

use tracing::{debug, info, instrument, trace, warn};

/// Anything that says whether a ciphertext decrypts to valid padding.
pub trait PaddingOracle {
    fn query(&mut self, msg: &[u8]) -> Result<bool>;
}

impl<F> PaddingOracle for F
where
    F: FnMut(&[u8]) -> bool,
{
    fn query(&mut self, msg: &[u8]) -> Result<bool> {
        Ok(self(msg))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaddingOracleConfig {
    pub block_size: usize,
    /// Upper bound on oracle queries for the lifetime of the attack.
    pub max_queries: Option<u64>,
    /// Confirm every hit on the last byte of a block with a second query.
    pub verify_last_byte: bool,
}

impl Default for PaddingOracleConfig {
    fn default() -> Self {
        Self {
            block_size: 16,
            max_queries: None,
            verify_last_byte: true,
        }
    }
}

pub struct PaddingOracleAttack<O, C = NoCheckpoint> {
    oracle: O,
    config: PaddingOracleConfig,
    state: ResumeData,
    checkpoint: C,
    queries: u64,
}

impl<O: PaddingOracle> PaddingOracleAttack<O> {
    pub fn new(oracle: O) -> Self {
        Self::with_config(oracle, PaddingOracleConfig::default())
    }

    pub fn with_config(oracle: O, config: PaddingOracleConfig) -> Self {
        Self {
            oracle,
            state: ResumeData::new(config.block_size),
            config,
            checkpoint: NoCheckpoint,
            queries: 0,
        }
    }
}

impl<O: PaddingOracle, C: Checkpoint> PaddingOracleAttack<O, C> {
    pub fn with_checkpoint<C2: Checkpoint>(self, checkpoint: C2) -> PaddingOracleAttack<O, C2> {
        PaddingOracleAttack {
            oracle: self.oracle,
            config: self.config,
            state: self.state,
            checkpoint,
            queries: self.queries,
        }
    }

    /// Continues from a saved state instead of the start of the ciphertext.
    pub fn resume_from(mut self, state: ResumeData) -> Result<Self> {
        state.validate(self.config.block_size)?;
        info!(
            block_index = state.block_index,
            inblock_index = state.inblock_index,
            "resuming padding oracle attack"
        );
        self.state = state;
        Ok(self)
    }

    pub fn state(&self) -> &ResumeData {
        &self.state
    }

    pub fn config(&self) -> &PaddingOracleConfig {
        &self.config
    }

    /// Oracle queries made so far.
    pub fn queries(&self) -> u64 {
        self.queries
    }

    pub fn into_oracle(self) -> O {
        self.oracle
    }

    /// Recovers the raw, still padded, plaintext of `ciphertext`, which
    /// starts with the IV block.
    ///
    /// When resuming, blocks before the saved block index are skipped and
    /// the plaintext recovered before the interruption is included.
    #[instrument(skip_all, fields(len = ciphertext.len()))]
    pub fn decryption_attack(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let block_size = self.block_size()?;
        if ciphertext.len() % block_size != 0 {
            return Err(Error::BlockAlignment {
                len: ciphertext.len(),
                block_size,
            });
        }
        let blocks: Vec<&[u8]> = ciphertext.chunks(block_size).collect();
        if blocks.len() < 2 {
            return Err(Error::TooFewBlocks {
                needed: 2,
                got: blocks.len(),
            });
        }
        let n_targets = blocks.len() - 1;
        if self.state.block_index > n_targets {
            return Err(Error::InvalidResumeState(format!(
                "block index {} past the last of {n_targets} blocks",
                self.state.block_index
            )));
        }

        for (block_index, pair) in blocks.windows(2).enumerate().skip(self.state.block_index) {
            info!(block_index, n_targets, "decrypting block");
            let decrypted = self.solve_decrypted_block(pair[1], true)?;
            let plaintext_block = xor_bytes(&decrypted, pair[0])?;
            info!(
                block_index,
                plaintext = %String::from_utf8_lossy(&plaintext_block),
                "recovered block"
            );

            self.state.plaintext.extend_from_slice(&plaintext_block);
            self.state.block_index = block_index + 1;
            self.checkpoint.save(&self.state)?;
        }

        // The checkpoint sink keeps the finished state, the attack starts
        // over for the next ciphertext.
        let finished = std::mem::replace(&mut self.state, ResumeData::new(block_size));
        Ok(finished.plaintext)
    }

    /// Forges a ciphertext decrypting to `plaintext`, which must already be
    /// padded to a whole number of blocks. The last block of `ciphertext`
    /// is kept as the last forged block. Returns `(ciphertext, iv)`.
    #[instrument(skip_all, fields(len = plaintext.len()))]
    pub fn encryption_attack(
        &mut self,
        plaintext: &[u8],
        ciphertext: &[u8],
    ) -> Result<(Vec<u8>, Vec<u8>)> {
        let block_size = self.block_size()?;
        if plaintext.is_empty() || plaintext.len() % block_size != 0 {
            return Err(Error::BlockAlignment {
                len: plaintext.len(),
                block_size,
            });
        }
        if ciphertext.len() < block_size {
            return Err(Error::TooFewBlocks {
                needed: 1,
                got: ciphertext.len() / block_size,
            });
        }

        // Forging does not touch a paused decryption.
        let paused = std::mem::replace(&mut self.state, ResumeData::new(block_size));
        let forged = self.forge_blocks(plaintext, ciphertext, block_size);
        self.state = paused;
        forged
    }

    fn forge_blocks(
        &mut self,
        plaintext: &[u8],
        ciphertext: &[u8],
        block_size: usize,
    ) -> Result<(Vec<u8>, Vec<u8>)> {
        let n_blocks = plaintext.len() / block_size;
        let mut forged: Vec<Vec<u8>> = Vec::with_capacity(n_blocks + 1);
        forged.push(ciphertext[ciphertext.len() - block_size..].to_vec());
        for (i, plaintext_block) in plaintext.chunks(block_size).rev().enumerate() {
            info!(block = n_blocks - i, n_blocks, "forging block");
            let target = &forged[forged.len() - 1];
            self.state.start_block(block_size);
            let decrypted = self.solve_block(target, false)?;
            forged.push(xor_bytes(&decrypted, plaintext_block)?);
        }

        forged.reverse();
        let iv = forged.remove(0);
        Ok((forged.concat(), iv))
    }

    /// Recovers `D(ct_target)`, the block cipher output before the CBC XOR.
    ///
    /// With `resume` the search continues from the saved in-block position,
    /// otherwise it starts over from the last byte.
    pub fn solve_decrypted_block(&mut self, ct_target: &[u8], resume: bool) -> Result<Vec<u8>> {
        if !resume {
            let block_size = self.block_size()?;
            self.state.start_block(block_size);
        }
        self.solve_block(ct_target, true)
    }

    /// Byte search over the working buffers in `state`. Leaves the state
    /// at the start of the next block once `ct_target` is solved.
    fn solve_block(&mut self, ct_target: &[u8], save_progress: bool) -> Result<Vec<u8>> {
        let block_size = self.block_size()?;
        if ct_target.len() != block_size {
            return Err(Error::BlockAlignment {
                len: ct_target.len(),
                block_size,
            });
        }
        let block_index = self.state.block_index;

        let mut decrypted = self.state.decrypted_ct_target.clone();
        let mut attack_block = self.state.ct.clone();
        let mut msg = vec![0u8; 2 * block_size];
        msg[block_size..].copy_from_slice(ct_target);

        for i in (0..self.state.inblock_index).rev() {
            let pad = (block_size - i) as u8;
            let c = self
                .find_padding_byte(&mut attack_block, &mut msg, i)?
                .ok_or(Error::PaddingOracleExhausted {
                    block_index,
                    byte_index: i,
                })?;
            decrypted[i] = c ^ pad;
            debug!(block_index, byte_index = i, value = decrypted[i], "recovered byte");
            if i == 0 {
                break;
            }

            for j in i..block_size {
                attack_block[j] = decrypted[j] ^ (pad + 1);
            }
            self.state.inblock_index = i;
            self.state.decrypted_ct_target.copy_from_slice(&decrypted);
            self.state.ct.copy_from_slice(&attack_block);
            if save_progress {
                self.checkpoint.save(&self.state)?;
            }
        }

        self.state.start_block(block_size);
        Ok(decrypted)
    }

    /// Tries every value of byte `i` of the attack block, in order.
    fn find_padding_byte(
        &mut self,
        attack_block: &mut [u8],
        msg: &mut [u8],
        i: usize,
    ) -> Result<Option<u8>> {
        let block_size = attack_block.len();
        let verify = self.config.verify_last_byte && i == block_size - 1 && i > 0;
        for c in 0..=255u8 {
            attack_block[i] = c;
            msg[..block_size].copy_from_slice(attack_block);
            if !self.query(msg)? {
                continue;
            }
            if verify {
                msg[i - 1] ^= 0xff;
                if !self.query(msg)? {
                    warn!(candidate = c, "rejected longer padding on last byte");
                    continue;
                }
            }
            return Ok(Some(c));
        }
        Ok(None)
    }

    fn query(&mut self, msg: &[u8]) -> Result<bool> {
        if let Some(max_queries) = self.config.max_queries {
            if self.queries >= max_queries {
                return Err(Error::QueryBudgetExhausted(max_queries));
            }
        }
        self.queries += 1;
        let valid = self.oracle.query(msg)?;
        trace!(query = self.queries, valid, "oracle query");
        Ok(valid)
    }

    fn block_size(&self) -> Result<usize> {
        match self.config.block_size {
            size @ 1..=255 => Ok(size),
            size => Err(Error::InvalidBlockSize(size)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::pkcs7::{pkcs7_pad, pkcs7_unpad};
    use crate::testing::{Aes128Oracle, BLOCK_SIZE};

    use rand::{rngs::StdRng, Rng, SeedableRng};
    use rstest::rstest;

    const SECRET: &[u8] = b"000005I go crazy when I hear a cymbal";

    fn setup(seed: u8) -> (Aes128Oracle, Vec<u8>) {
        let mut rng = StdRng::from_seed([seed; 32]);
        let oracle = Aes128Oracle::new(rng.gen());
        let ciphertext = oracle.encrypt_cbc(SECRET, &rng.gen());
        (oracle, ciphertext)
    }

    #[rstest]
    #[case(101)]
    #[case(7)]
    #[case(42)]
    fn decryption_attack_recovers_plaintext(#[case] seed: u8) {
        let (aes, ciphertext) = setup(seed);
        let mut attack = PaddingOracleAttack::new(|msg: &[u8]| aes.padding_valid(msg));

        let mut plaintext = attack.decryption_attack(&ciphertext).unwrap();
        pkcs7_unpad(&mut plaintext).unwrap();

        assert_eq!(plaintext, SECRET);
        assert_eq!(attack.state(), &ResumeData::new(BLOCK_SIZE));
    }

    // With this IV the first block decrypts to D(C)[14] = \x02, so the
    // attack block ending in 00 28 already gives valid \x02\x02 padding
    // before 00 2b gives \x01.
    const TWO_PADDING_IV: [u8; BLOCK_SIZE] = [9; BLOCK_SIZE];
    const TWO_PADDING_PLAINTEXT: &[u8] = b"fourteen bytes\x0b#";

    fn attack_plaintext_ending_in_two(verify_last_byte: bool) -> Result<Vec<u8>> {
        let (aes, _) = setup(3);
        let ciphertext = aes.encrypt_cbc(TWO_PADDING_PLAINTEXT, &TWO_PADDING_IV);
        let mut attack = PaddingOracleAttack::with_config(
            |msg: &[u8]| aes.padding_valid(msg),
            PaddingOracleConfig {
                verify_last_byte,
                ..Default::default()
            },
        );
        attack.decryption_attack(&ciphertext)
    }

    #[test]
    fn decryption_attack_rejects_longer_padding_on_last_byte() {
        let mut recovered = attack_plaintext_ending_in_two(true).unwrap();
        pkcs7_unpad(&mut recovered).unwrap();

        assert_eq!(recovered, TWO_PADDING_PLAINTEXT);
    }

    #[test]
    fn unverified_last_byte_takes_longer_padding() {
        let result = attack_plaintext_ending_in_two(false);

        let expected = pkcs7_pad(TWO_PADDING_PLAINTEXT, BLOCK_SIZE as u8).unwrap();
        assert!(!matches!(result, Ok(recovered) if recovered == expected));
    }

    #[test]
    fn encryption_attack_forges_chosen_plaintext() {
        let (aes, ciphertext) = setup(11);
        let wanted = b"{\"admin\": true, \"user\": \"mallory\"}";
        let mut attack = PaddingOracleAttack::new(|msg: &[u8]| aes.padding_valid(msg));

        let (forged, iv) = attack
            .encryption_attack(&pkcs7_pad(wanted, BLOCK_SIZE as u8).unwrap(), &ciphertext)
            .unwrap();

        let mut decrypted = aes.decrypt_cbc(&[iv.as_slice(), &forged].concat());
        pkcs7_unpad(&mut decrypted).unwrap();
        assert_eq!(decrypted, wanted);
        assert_eq!(&forged[forged.len() - BLOCK_SIZE..], &ciphertext[ciphertext.len() - BLOCK_SIZE..]);
    }

    #[test]
    fn attack_is_reusable_after_forging_and_decrypting() {
        let (aes, ciphertext) = setup(13);
        let other = aes.encrypt_cbc(b"a second, different message", &[5; BLOCK_SIZE]);
        let mut checkpoints: Vec<ResumeData> = Vec::new();
        let mut attack = PaddingOracleAttack::new(|msg: &[u8]| aes.padding_valid(msg))
            .with_checkpoint(&mut checkpoints);

        attack
            .encryption_attack(&pkcs7_pad(b"forged", BLOCK_SIZE as u8).unwrap(), &ciphertext)
            .unwrap();
        assert_eq!(attack.state(), &ResumeData::new(BLOCK_SIZE));
        let mut first = attack.decryption_attack(&ciphertext).unwrap();
        let mut second = attack.decryption_attack(&other).unwrap();
        drop(attack);

        pkcs7_unpad(&mut first).unwrap();
        pkcs7_unpad(&mut second).unwrap();
        assert_eq!(first, SECRET);
        assert_eq!(second, b"a second, different message");
        // Only the two decryptions are checkpointed.
        let n_blocks = (ciphertext.len() + other.len()) / BLOCK_SIZE - 2;
        assert_eq!(checkpoints.len(), n_blocks * BLOCK_SIZE);
    }

    #[test]
    fn forging_keeps_paused_decryption() {
        let (aes, ciphertext) = setup(17);
        let mut attack = PaddingOracleAttack::with_config(
            |msg: &[u8]| aes.padding_valid(msg),
            PaddingOracleConfig {
                max_queries: Some(2000),
                ..Default::default()
            },
        );
        assert!(attack.decryption_attack(&ciphertext).is_err());
        let paused = attack.state().clone();

        let forged = attack.encryption_attack(&[b'A'; BLOCK_SIZE], &ciphertext);

        assert!(matches!(forged, Err(Error::QueryBudgetExhausted(2000))));
        assert_eq!(attack.state(), &paused);
    }

    #[test]
    fn resuming_replays_tail_of_query_sequence() {
        let (aes, ciphertext) = setup(23);
        let mut full_log: Vec<Vec<u8>> = Vec::new();
        let mut checkpoints: Vec<ResumeData> = Vec::new();
        let full_plaintext = {
            let mut attack = PaddingOracleAttack::new(|msg: &[u8]| {
                full_log.push(msg.to_vec());
                aes.padding_valid(msg)
            })
            .with_checkpoint(&mut checkpoints);
            attack.decryption_attack(&ciphertext).unwrap()
        };

        let n_blocks = ciphertext.len() / BLOCK_SIZE - 1;
        assert_eq!(checkpoints.len(), n_blocks * BLOCK_SIZE);

        for checkpoint in checkpoints.iter().step_by(5) {
            let mut resumed_log: Vec<Vec<u8>> = Vec::new();
            let resumed_plaintext = {
                let mut attack = PaddingOracleAttack::new(|msg: &[u8]| {
                    resumed_log.push(msg.to_vec());
                    aes.padding_valid(msg)
                })
                .resume_from(checkpoint.clone())
                .unwrap();
                attack.decryption_attack(&ciphertext).unwrap()
            };

            assert_eq!(resumed_plaintext, full_plaintext);
            assert!(full_log.ends_with(&resumed_log));
        }
    }

    #[test]
    fn file_checkpoint_resumes_interrupted_attack() {
        let (aes, ciphertext) = setup(29);
        let path = std::env::temp_dir().join(format!("ctfkit-po-{}.json", std::process::id()));
        let budget = 3000;

        let mut attack = PaddingOracleAttack::with_config(
            |msg: &[u8]| aes.padding_valid(msg),
            PaddingOracleConfig {
                max_queries: Some(budget),
                ..Default::default()
            },
        )
        .with_checkpoint(FileCheckpoint::new(&path));
        let interrupted = attack.decryption_attack(&ciphertext);
        assert!(matches!(interrupted, Err(Error::QueryBudgetExhausted(3000))));

        let saved = ResumeData::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        let mut resumed = PaddingOracleAttack::new(|msg: &[u8]| aes.padding_valid(msg))
            .resume_from(saved)
            .unwrap();
        let mut plaintext = resumed.decryption_attack(&ciphertext).unwrap();
        pkcs7_unpad(&mut plaintext).unwrap();

        assert_eq!(plaintext, SECRET);
    }

    #[test]
    fn solve_decrypted_block_reports_exhaustion() {
        let mut attack = PaddingOracleAttack::new(|_: &[u8]| false);

        let result = attack.solve_decrypted_block(&[0; 16], false);

        assert!(matches!(
            result,
            Err(Error::PaddingOracleExhausted {
                block_index: 0,
                byte_index: 15
            })
        ));
        assert_eq!(attack.queries(), 256);
    }

    #[test]
    fn oracle_errors_propagate() {
        struct Broken;
        impl PaddingOracle for Broken {
            fn query(&mut self, _msg: &[u8]) -> Result<bool> {
                Err(Error::Io(std::io::ErrorKind::ConnectionReset.into()))
            }
        }
        let mut attack = PaddingOracleAttack::new(Broken);

        let result = attack.decryption_attack(&[0; 32]);

        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[rstest]
    #[case(&[0; 16], Error::TooFewBlocks { needed: 2, got: 1 })]
    #[case(&[0; 40], Error::BlockAlignment { len: 40, block_size: 16 })]
    fn decryption_attack_rejects_malformed_ciphertext(#[case] ciphertext: &[u8], #[case] expected: Error) {
        let mut attack = PaddingOracleAttack::new(|_: &[u8]| true);

        let result = attack.decryption_attack(ciphertext);

        assert_eq!(result.unwrap_err().to_string(), expected.to_string());
        assert_eq!(attack.queries(), 0);
    }

    #[test]
    fn resume_from_rejects_state_for_other_block_size() {
        let attack = PaddingOracleAttack::new(|_: &[u8]| true);

        let result = attack.resume_from(ResumeData::new(8));

        assert!(matches!(result, Err(Error::InvalidResumeState(_))));
    }

    #[test]
    fn custom_block_size() {
        // Toy 8 byte block cipher: xor with a fixed key.
        let key = [0x5au8; 8];
        let oracle = |msg: &[u8]| {
            let decrypted: Vec<u8> = msg[8..]
                .iter()
                .zip(key)
                .zip(&msg[..8])
                .map(|((c, k), prev)| c ^ k ^ prev)
                .collect();
            crate::pkcs7::is_pkcs7_padded(&decrypted).is_some()
        };
        let plaintext = pkcs7_pad(b"toy", 8).unwrap();
        let iv = [1u8; 8];
        let block: Vec<u8> = plaintext.iter().zip(iv).zip(key).map(|((p, v), k)| p ^ v ^ k).collect();
        let ciphertext = [iv.as_slice(), &block].concat();
        let mut attack = PaddingOracleAttack::with_config(
            oracle,
            PaddingOracleConfig {
                block_size: 8,
                ..Default::default()
            },
        );

        let recovered = attack.decryption_attack(&ciphertext).unwrap();

        assert_eq!(recovered, plaintext);
    }
}
