// Chinese Remainder Theorem for moduli that need not be coprime.
//
// Congruences are merged pairwise (Garner). To merge
//
//   x = a1 (mod m1)  and  x = a2 (mod m2)
//
// let g = gcd(m1, m2). A solution exists iff a1 = a2 (mod g). Taking Bezout
// coefficients p, q with p * (m1/g) + q * (m2/g) = 1,
//
//   x = a1 * (m2/g) * q + a2 * (m1/g) * p  (mod lcm(m1, m2))
//
// satisfies both, since x - a1 = m1 * p * (a2 - a1) / g.
use super::extended_gcd;
use crate::{Error, Result};

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use tracing::trace;

/// Returns `(x, m)` where `m` is the lcm of `moduli` and `x` in `[0, m)`
/// satisfies every congruence `x = residues[i] (mod moduli[i])`.
pub fn chinese_remainder(residues: &[BigInt], moduli: &[BigInt]) -> Result<(BigInt, BigInt)> {
    if residues.len() != moduli.len() {
        return Err(Error::LengthMismatch {
            residues: residues.len(),
            moduli: moduli.len(),
        });
    }
    if let Some(m) = moduli.iter().find(|m| !m.is_positive()) {
        return Err(Error::NonPositiveModulus(m.clone()));
    }

    let mut a1 = BigInt::zero();
    let mut m1 = BigInt::one();
    for (a2, m2) in residues.iter().zip(moduli) {
        let g = m1.gcd(m2);
        if a1.mod_floor(&g) != a2.mod_floor(&g) {
            return Err(Error::InconsistentCongruence {
                a1,
                m1,
                a2: a2.clone(),
                m2: m2.clone(),
            });
        }
        let m1_g = &m1 / &g;
        let m2_g = m2 / &g;
        let (p, q, _) = extended_gcd(&m1_g, &m2_g);
        let lcm = &m1 * &m2_g;
        a1 = (&a1 * &m2_g * q + a2 * &m1_g * p).mod_floor(&lcm);
        m1 = lcm;
        trace!(residue = %a1, modulus = %m1, "merged congruence");
    }

    Ok((a1, m1))
}
