// RSA parity (least significant bit) oracle attack.
//
// Multiplying the ciphertext by 2^e doubles the plaintext. If 2m mod n is
// odd the doubling wrapped past n (n is odd), so m > n/2, otherwise m < n/2.
// Repeating with 4m, 8m, ... halves the interval [lower, upper] holding m on
// every query.
//
// The bounds are kept as exact fractions lower/2^i and upper/2^i so that no
// precision is lost on the last bits.
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};
use tracing::{debug, info, instrument};

/// Decrypts `c` with an oracle returning the parity of the plaintext of its
/// argument. Makes `bits(n)` oracle queries.
#[instrument(skip_all, fields(bits = n.bits()))]
pub fn lsb_oracle_attack<F>(n: &BigInt, e: &BigInt, c: &BigInt, mut oracle: F) -> BigInt
where
    F: FnMut(&BigInt) -> bool,
{
    let doubler = BigInt::from(2u32).modpow(e, n);
    let mut c = c.mod_floor(n);
    let mut lower = BigInt::zero();
    let mut upper = n.clone();
    let mut denominator = BigInt::one();

    let mut queries = 0u64;
    while &upper - &lower > denominator {
        c = c * &doubler % n;
        // Midpoint expressed over the doubled denominator.
        let mid = &lower + &upper;
        lower *= 2u32;
        upper *= 2u32;
        denominator *= 2u32;
        if oracle(&c) {
            lower = mid;
        } else {
            upper = mid;
        }

        queries += 1;
        debug!(queries, "narrowed plaintext interval");
        if queries % 128 == 0 {
            info!(queries, total = n.bits(), "lsb oracle progress");
        }
    }

    lower.div_ceil(&denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::rsa::{generate_rsa_key_pair, DEFAULT_PUBLIC_EXPONENT};

    use num_bigint::RandBigInt;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn lsb_oracle_attack_decrypts_ciphertext() {
        let mut rng = StdRng::from_seed([61; 32]);
        let keys = generate_rsa_key_pair(512, &BigInt::from(DEFAULT_PUBLIC_EXPONENT), &mut rng);
        for _ in 0..3 {
            let m = rng.gen_bigint_range(&BigInt::zero(), &keys.n);
            let c = m.modpow(&keys.public, &keys.n);
            let mut n_queries = 0;

            let recovered = lsb_oracle_attack(&keys.n, &keys.public, &c, |c| {
                n_queries += 1;
                c.modpow(&keys.private, &keys.n).is_odd()
            });

            assert_eq!(recovered, m);
            assert_eq!(n_queries, keys.n.bits());
        }
    }

    #[test]
    fn lsb_oracle_attack_recovers_message_bytes() {
        let mut rng = StdRng::from_seed([62; 32]);
        let keys = generate_rsa_key_pair(256, &BigInt::from(DEFAULT_PUBLIC_EXPONENT), &mut rng);
        let m = crate::bytes::bytes_to_int(b"flag{parity}");
        let c = m.modpow(&keys.public, &keys.n);

        let recovered = lsb_oracle_attack(&keys.n, &keys.public, &c, |c| {
            c.modpow(&keys.private, &keys.n).is_odd()
        });

        assert_eq!(crate::bytes::int_to_bytes(&recovered), b"flag{parity}");
    }
}
