// Factor n = p*q given any multiple of phi(n), typically e*d - 1.
//
// Write k = 2^r * s with s odd. For a random base g, the sequence
//
//   g^s, g^(2s), g^(4s), ..., g^(2^(r-1) s)  (mod n)
//
// ends in 1 and, for at least half the bases, passes through a nontrivial
// square root of 1. Such a root x has gcd(x - 1, n) in {p, q}.
use crate::numtheory::next_prime;
use crate::{Error, Result};

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use tracing::debug;

/// Number of bases tried before giving up.
pub const MAX_FACTOR_BASES: usize = 100;

/// Factors `n` from a key pair `(e, d)`. Returns `(p, q)` with `p < q`.
pub fn factorize_from_exponents(n: &BigInt, d: &BigInt, e: &BigInt) -> Result<(BigInt, BigInt)> {
    factorize_from_kphi(n, &(e * d - 1u32))
}

/// Factors `n` from any nonzero multiple of `phi(n)`. Returns `(p, q)` with
/// `p < q`.
pub fn factorize_from_kphi(n: &BigInt, kphi: &BigInt) -> Result<(BigInt, BigInt)> {
    if !n.is_positive() {
        return Err(Error::NonPositiveModulus(n.clone()));
    }
    if !kphi.is_positive() {
        return Err(Error::NonPositiveExponent(kphi.clone()));
    }
    let r = kphi.trailing_zeros().unwrap_or(0);
    let s = kphi >> r;

    let mut base = BigInt::one();
    for _ in 0..MAX_FACTOR_BASES {
        base = next_prime(&base);
        let mut x = base.modpow(&s, n);
        for _ in 0..r {
            let p = (&x - 1u32).gcd(n);
            if !p.is_one() && !p.is_zero() && &p != n {
                debug!(%base, "found nontrivial square root of one");
                let q = n / &p;
                return Ok(if p < q { (p, q) } else { (q, p) });
            }
            x = &x * &x % n;
        }
    }

    Err(Error::Factorization {
        bases_tried: MAX_FACTOR_BASES,
    })
}
