// Common modulus attack: one message encrypted under (e1, n) and (e2, n).
//
// If gcd(e1, e2) = 1 there are Bezout coefficients with s1*e1 + s2*e2 = 1, so
//
//   c1^s1 * c2^s2 = m^(s1*e1 + s2*e2) = m  (mod n)
//
// One of the coefficients is negative, which means raising the inverse of
// that ciphertext instead.
use crate::numtheory::{extended_gcd, modular_inverse};
use crate::{Error, Result};

use num_bigint::BigInt;
use num_traits::{One, Signed};

pub fn common_modulus_attack(
    e1: &BigInt,
    e2: &BigInt,
    c1: &BigInt,
    c2: &BigInt,
    n: &BigInt,
) -> Result<BigInt> {
    let (s1, s2, g) = extended_gcd(e1, e2);
    if !g.is_one() {
        return Err(Error::NotCoprime {
            a: e1.clone(),
            b: e2.clone(),
        });
    }
    Ok(signed_modpow(c1, &s1, n)? * signed_modpow(c2, &s2, n)? % n)
}

fn signed_modpow(base: &BigInt, exponent: &BigInt, n: &BigInt) -> Result<BigInt> {
    if exponent.is_negative() {
        Ok(modular_inverse(base, n)?.modpow(&-exponent, n))
    } else {
        Ok(base.modpow(exponent, n))
    }
}
