// Resume state of a padding oracle attack and where it gets checkpointed.
use crate::{Error, Result};

use serde::{Deserialize, Serialize};
use tracing::info;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Position of a decryption attack, precise to the last recovered byte.
///
/// `block_index` counts ciphertext blocks after the IV that are fully
/// decrypted, so `plaintext` holds exactly `block_index` blocks.
/// `inblock_index` is the lowest byte of the current block recovered so far,
/// `block_size` meaning none yet. `decrypted_ct_target` holds the
/// intermediate bytes found so far and `ct` the attack block that makes them
/// decrypt to the next padding value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeData {
    pub block_index: usize,
    pub inblock_index: usize,
    #[serde(with = "hex")]
    pub plaintext: Vec<u8>,
    #[serde(with = "hex")]
    pub decrypted_ct_target: Vec<u8>,
    #[serde(with = "hex")]
    pub ct: Vec<u8>,
}

impl ResumeData {
    pub fn new(block_size: usize) -> Self {
        Self {
            block_index: 0,
            inblock_index: block_size,
            plaintext: Vec::new(),
            decrypted_ct_target: vec![0; block_size],
            ct: vec![0; block_size],
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn validate(&self, block_size: usize) -> Result<()> {
        if self.decrypted_ct_target.len() != block_size || self.ct.len() != block_size {
            return Err(Error::InvalidResumeState(format!(
                "working buffers must be {block_size} bytes, got {} and {}",
                self.decrypted_ct_target.len(),
                self.ct.len()
            )));
        }
        if self.inblock_index == 0 || self.inblock_index > block_size {
            return Err(Error::InvalidResumeState(format!(
                "byte index {} outside 1..={block_size}",
                self.inblock_index
            )));
        }
        if self.plaintext.len() != self.block_index * block_size {
            return Err(Error::InvalidResumeState(format!(
                "{} plaintext bytes do not make {} blocks",
                self.plaintext.len(),
                self.block_index
            )));
        }
        Ok(())
    }

    pub(super) fn start_block(&mut self, block_size: usize) {
        self.inblock_index = block_size;
        self.decrypted_ct_target = vec![0; block_size];
        self.ct = vec![0; block_size];
    }
}

/// Receives the attack state after every recovered byte and block.
pub trait Checkpoint {
    fn save(&mut self, state: &ResumeData) -> Result<()>;
}

/// Discards checkpoints.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCheckpoint;

impl Checkpoint for NoCheckpoint {
    fn save(&mut self, _state: &ResumeData) -> Result<()> {
        Ok(())
    }
}

/// Overwrites a JSON file with the latest state.
#[derive(Clone, Debug)]
pub struct FileCheckpoint {
    path: PathBuf,
}

impl FileCheckpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Checkpoint for FileCheckpoint {
    fn save(&mut self, state: &ResumeData) -> Result<()> {
        state.save(&self.path)?;
        info!(
            path = %self.path.display(),
            block_index = state.block_index,
            inblock_index = state.inblock_index,
            "saved checkpoint"
        );
        Ok(())
    }
}

impl Checkpoint for Vec<ResumeData> {
    fn save(&mut self, state: &ResumeData) -> Result<()> {
        self.push(state.clone());
        Ok(())
    }
}

impl<C: Checkpoint + ?Sized> Checkpoint for &mut C {
    fn save(&mut self, state: &ResumeData) -> Result<()> {
        (**self).save(state)
    }
}
