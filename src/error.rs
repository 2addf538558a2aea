use num_bigint::BigInt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{a} has no inverse modulo {n}")]
    NoInverse { a: BigInt, n: BigInt },
    #[error("{a} and {b} are not coprime")]
    NotCoprime { a: BigInt, b: BigInt },
    #[error("modulus must be positive, got {0}")]
    NonPositiveModulus(BigInt),
    #[error("got {residues} residues but {moduli} moduli")]
    LengthMismatch { residues: usize, moduli: usize },
    #[error("x = {a1} (mod {m1}) contradicts x = {a2} (mod {m2})")]
    InconsistentCongruence {
        a1: BigInt,
        m1: BigInt,
        a2: BigInt,
        m2: BigInt,
    },
    #[error("factor {0} is not a valid prime factor")]
    InvalidFactor(BigInt),
    #[error("product of factors {product} does not divide the group order {order}")]
    FactorsDoNotDivideOrder { product: BigInt, order: BigInt },
    #[error("no discrete log exists in the subgroup of order {modulus}")]
    DiscreteLogNotFound { modulus: BigInt },
    #[error("exponent must be positive, got {0}")]
    NonPositiveExponent(BigInt),
    #[error("recovered value is not an exact {e}-th power")]
    InexactRoot { e: u32 },
    #[error("no nontrivial factor found after trying {bases_tried} bases")]
    Factorization { bases_tried: usize },
    #[error("padding oracle rejected every candidate for byte {byte_index} of block {block_index}")]
    PaddingOracleExhausted {
        block_index: usize,
        byte_index: usize,
    },
    #[error("oracle query budget of {0} exhausted")]
    QueryBudgetExhausted(u64),
    #[error("length {len} is not a multiple of the block size {block_size}")]
    BlockAlignment { len: usize, block_size: usize },
    #[error("block size must be in 1..=255, got {0}")]
    InvalidBlockSize(usize),
    #[error("need at least {needed} blocks, got {got}")]
    TooFewBlocks { needed: usize, got: usize },
    #[error("invalid resume state: {0}")]
    InvalidResumeState(String),
    #[error("invalid pkcs7 padding")]
    InvalidPadding,
    #[error("oracle returned {got} bytes, expected at least {needed}")]
    ShortOracleOutput { needed: usize, got: usize },
    #[error("need at least {needed} samples, got {got}")]
    NotEnoughSamples { needed: usize, got: usize },
    #[error("samples are not generated by x' = {a} * x + {b} (mod {m})")]
    LcgMismatch { a: BigInt, b: BigInt, m: BigInt },
    #[error("not an integer: {0:?}")]
    InvalidInteger(String),
    #[error("buffers differ in length: {0} and {1}")]
    UnequalLength(usize, usize),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

pub type Result<T> = std::result::Result<T, Error>;
