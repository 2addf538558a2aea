// Textbook RSA and structural attacks against it.

mod broadcast;
mod common_modulus;
mod factor;
mod lsb_oracle;
mod wiener;

pub use broadcast::hastad_broadcast_attack;
pub use common_modulus::common_modulus_attack;
pub use factor::{factorize_from_exponents, factorize_from_kphi, MAX_FACTOR_BASES};
pub use lsb_oracle::lsb_oracle_attack;
pub use wiener::wieners_attack;

use crate::bytes::{bytes_to_int, int_to_bytes};
use crate::numtheory::{generate_prime, modular_inverse};

use num_bigint::BigInt;
use rand::Rng;

pub const DEFAULT_PUBLIC_EXPONENT: u32 = 0x10001;

#[derive(Clone, Debug)]
pub struct RsaKeyPair {
    pub public: BigInt,
    pub private: BigInt,
    pub n: BigInt,
    pub p: BigInt,
    pub q: BigInt,
}

impl RsaKeyPair {
    pub fn phi(&self) -> BigInt {
        (&self.p - 1u32) * (&self.q - 1u32)
    }
}

pub fn generate_rsa_key_pair<R: Rng + ?Sized>(n_bits: u64, e: &BigInt, rng: &mut R) -> RsaKeyPair {
    // Loop until we find primes such that gcd(e, totient) = 1.
    loop {
        // Key size refers to the size of n, so each prime gets half the bits.
        let p = generate_prime(n_bits / 2, rng);
        let q = generate_prime(n_bits / 2, rng);
        if p == q {
            continue;
        }

        let totient = (&p - 1u32) * (&q - 1u32);
        if let Ok(d) = modular_inverse(e, &totient) {
            return RsaKeyPair {
                public: e.clone(),
                private: d,
                n: &p * &q,
                p,
                q,
            };
        }
    }
}

pub fn rsa_apply(key: &BigInt, n: &BigInt, msg: &[u8]) -> Vec<u8> {
    int_to_bytes(&bytes_to_int(msg).modpow(key, n))
}
