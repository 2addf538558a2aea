// Hastad's broadcast attack: the same message encrypted with a small public
// exponent e under e different moduli.
//
// Each ciphertext is c_i = m^e mod n_i. The CRT gives m^e modulo
//
//   N = n_1 * n_2 * ... * n_e
//
// and since m < n_i for every i, m^e < N, so there is no modular wrap and an
// integer e-th root recovers m.
use crate::numtheory::chinese_remainder;
use crate::{Error, Result};

use num_bigint::BigInt;

pub fn hastad_broadcast_attack(e: u32, ciphertexts: &[BigInt], moduli: &[BigInt]) -> Result<BigInt> {
    if e == 0 {
        return Err(Error::NonPositiveExponent(BigInt::from(e)));
    }
    let needed = e as usize;
    if ciphertexts.len() < needed {
        return Err(Error::NotEnoughSamples {
            needed,
            got: ciphertexts.len(),
        });
    }

    let (m_pow_e, _) = chinese_remainder(ciphertexts, moduli)?;
    let m = m_pow_e.nth_root(e);
    if m.pow(e) != m_pow_e {
        return Err(Error::InexactRoot { e });
    }
    Ok(m)
}
