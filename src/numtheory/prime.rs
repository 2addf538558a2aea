// Functions related to identification and generation of prime numbers.

use super::prime_tables::SMALL_ODD_PRIMES;

use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};
use rand::Rng;

use std::collections::HashSet;

pub const DEFAULT_MILLER_RABIN_ROUNDS: usize = 10;

/// Primality test: trial division by the small prime table, then
/// Miller-Rabin with `rounds` distinct random witnesses.
///
/// Exact below the square of the largest table prime. Above it a composite
/// passes with probability at most `4^-rounds`.
pub fn is_prime(candidate: &BigInt, rounds: usize) -> bool {
    is_prime_with_rng(candidate, rounds, &mut rand::thread_rng())
}

pub fn is_prime_with_rng<R: Rng + ?Sized>(candidate: &BigInt, rounds: usize, rng: &mut R) -> bool {
    let two = BigInt::from(2u32);
    if candidate < &two {
        return false;
    }
    if candidate == &two {
        return true;
    }
    if candidate.is_even() {
        return false;
    }

    for small_prime in SMALL_ODD_PRIMES {
        let x = BigInt::from(small_prime);
        if candidate == &x {
            return true;
        }
        if (candidate % &x).is_zero() {
            return false;
        }
    }
    let largest = BigInt::from(SMALL_ODD_PRIMES[SMALL_ODD_PRIMES.len() - 1]);
    if candidate < &(&largest * &largest) {
        return true;
    }

    miller_rabin(candidate, rounds, rng)
}

fn miller_rabin<R: Rng + ?Sized>(candidate: &BigInt, n_rounds: usize, rng: &mut R) -> bool {
    let two = BigInt::from(2u32);
    let n_minus_one: BigInt = candidate - 1;
    let r = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> r;

    // There are only n - 2 witnesses in [2, n-1].
    let n_rounds = (candidate - 2u32)
        .to_usize()
        .map_or(n_rounds, |available| available.min(n_rounds));
    let mut witnesses: HashSet<BigInt> = HashSet::with_capacity(n_rounds);
    while witnesses.len() < n_rounds {
        let a = rng.gen_bigint_range(&two, candidate);
        if !witnesses.insert(a.clone()) {
            continue;
        }

        let mut x = a.modpow(&d, candidate);
        if x.is_one() || x == n_minus_one {
            continue;
        }
        let mut is_composite = true;
        for _ in 1..r {
            x = &x * &x % candidate;
            if x == n_minus_one {
                is_composite = false;
                break;
            }
            if x.is_one() {
                return false;
            }
        }
        if is_composite {
            return false;
        }
    }

    true
}

/// Smallest prime strictly greater than `x`.
pub fn next_prime(x: &BigInt) -> BigInt {
    if x <= &BigInt::one() {
        return BigInt::from(2u32);
    }
    let mut candidate = if x.is_even() { x + 1u32 } else { x + 2u32 };
    while !is_prime(&candidate, DEFAULT_MILLER_RABIN_ROUNDS) {
        candidate += 2u32;
    }
    candidate
}

/// Random prime of exactly `n_bits` bits (at least two).
pub fn generate_prime<R: Rng + ?Sized>(n_bits: u64, rng: &mut R) -> BigInt {
    let n_bits = n_bits.max(2);
    let top_bit = BigUint::one() << (n_bits - 1);
    loop {
        let candidate = rng.gen_biguint(n_bits - 1) | &top_bit | BigUint::one();
        let candidate = BigInt::from(candidate);
        if is_prime_with_rng(&candidate, DEFAULT_MILLER_RABIN_ROUNDS, rng) {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use num_traits::Num;
    use rand::{rngs::StdRng, SeedableRng};
    use rstest::rstest;

    #[rstest]
    #[case(BigInt::from(2u64))]
    #[case(BigInt::from(37u64))]
    #[case(BigInt::from(997u64))]
    #[case(BigInt::from(994_013u64))]
    #[case((BigInt::one() << 127u32) - 1u32)]
    #[case(BigInt::from_str_radix(
        "122918091607895345462109112013423411099284103879272281586\
        0819946412949055199827238447096054805339148543003066133719\
        9085275880150614723662649630584506204331", 10).unwrap())
    ]
    #[case(BigInt::from_str_radix(
            "ffffffffffffffffc90fdaa22168c234c4c6628b80dc1cd129024\
            e088a67cc74020bbea63b139b22514a08798e3404ddef9519b3cd\
            3a431b302b0a6df25f14374fe1356d6d51c245e485b576625e7ec\
            6f44c42e9a637ed6b0bff5cb6f406b7edee386bfb5a899fa5ae9f\
            24117c4b1fe649286651ece45b3dc2007cb8a163bf0598da48361\
            c55d39a69163fa8fd24cf5f83655d23dca3ad961c62f356208552\
            bb9ed529077096966d670c354e4abc9804f1746c08ca237327fff\
            fffffffffffff", 16).unwrap())]
    fn is_prime_identifies_primes(#[case] prime: BigInt) {
        let mut rng = StdRng::from_seed([101; 32]);

        assert!(is_prime_with_rng(&prime, DEFAULT_MILLER_RABIN_ROUNDS, &mut rng));
    }

    #[rstest]
    #[case(BigInt::from(-7))]
    #[case(BigInt::from(0u64))]
    #[case(BigInt::from(1u64))]
    #[case(BigInt::from(4u64))]
    #[case(BigInt::from(561u64))]
    #[case(BigInt::from(1024u64))]
    #[case(BigInt::from(1025u64))]
    #[case(BigInt::from(994_009u64))]
    // Composites with no factor in the trial division table.
    #[case(BigInt::from(1_022_117u64))]
    // Carmichael number 1171 * 2341 * 3511.
    #[case(BigInt::from(9_624_742_921u64))]
    // 2^128 + 1 = 59649589127497217 * 5704689200685129054721
    #[case((BigInt::one() << 128u32) + 1u32)]
    fn is_prime_identifies_non_primes(#[case] non_prime: BigInt) {
        let mut rng = StdRng::from_seed([101; 32]);

        assert!(!is_prime_with_rng(&non_prime, DEFAULT_MILLER_RABIN_ROUNDS, &mut rng));
    }

    #[rstest]
    #[case(-5, 2)]
    #[case(0, 2)]
    #[case(1, 2)]
    #[case(2, 3)]
    #[case(3, 5)]
    #[case(13, 17)]
    #[case(996, 997)]
    #[case(997, 1009)]
    fn next_prime_finds_following_prime(#[case] x: i64, #[case] expected: i64) {
        assert_eq!(next_prime(&BigInt::from(x)), BigInt::from(expected));
    }

    #[test]
    fn next_prime_after_two_to_the_64() {
        let x = BigInt::one() << 64u32;

        assert_eq!(next_prime(&x), x + 13u32);
    }

    #[test]
    fn generate_prime_has_requested_bit_length() {
        let mut rng = StdRng::from_seed([12; 32]);

        for bits in [2, 16, 64, 128] {
            let p = generate_prime(bits, &mut rng);

            assert_eq!(p.bits(), bits);
            assert!(is_prime(&p, DEFAULT_MILLER_RABIN_ROUNDS));
        }
    }
}
