// Discrete logarithms: baby-step/giant-step and Pohlig-Hellman.
//
// Pohlig-Hellman reduces a log in a group of smooth order N = q1^e1 * ... *
// qk^ek to one small problem per prime power. For q^e the log is recovered
// one base-q digit at a time: with gamma = g^(N/q), which has order q,
//
//   x_k = (g^-x * y)^(N / q^(k+1)) = gamma^(digit k)
//
// so each digit is a BSGS search of size q. The per-prime results are then
// glued together with the CRT.
use super::{chinese_remainder, modular_inverse};
use crate::{Error, Result};

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};
use rayon::prelude::*;
use tracing::{debug, instrument};

use std::collections::{BTreeMap, HashMap};

/// Largest baby-step table `baby_step_giant_step` builds.
pub const MAX_BABY_STEPS: usize = 1 << 26;

/// Finds `x` in `[0, order)` with `g^x = y (mod p)`. The order defaults to
/// `p` when the order of `g` is unknown.
///
/// `None` means there is no log in range, usually a sign of a wrong order or
/// generator, or that the table would exceed `MAX_BABY_STEPS`.
pub fn baby_step_giant_step(
    g: &BigInt,
    y: &BigInt,
    p: &BigInt,
    order: Option<&BigInt>,
) -> Option<BigInt> {
    let order = order.unwrap_or(p);
    if !p.is_positive() || !order.is_positive() {
        return None;
    }
    let mut m = order.sqrt();
    if &(&m * &m) < order {
        m += 1;
    }
    let n_steps = m.to_usize().filter(|&n| n <= MAX_BABY_STEPS)?;

    let g = g.mod_floor(p);
    let mut baby_steps: HashMap<BigInt, usize> = HashMap::with_capacity(n_steps);
    let mut baby = BigInt::one() % p;
    for j in 0..n_steps {
        baby_steps.entry(baby.clone()).or_insert(j);
        baby = baby * &g % p;
    }

    let giant = modular_inverse(&g.modpow(&m, p), p).ok()?;
    let mut gamma = y.mod_floor(p);
    for i in 0..n_steps {
        if let Some(&j) = baby_steps.get(&gamma) {
            let x = BigInt::from(i) * &m + j;
            // The first hit is the smallest log.
            return (&x < order).then_some(x);
        }
        gamma = gamma * &giant % p;
    }
    None
}

/// Pohlig-Hellman in the multiplicative group mod `p = product + 1`.
///
/// Returns `(x, product)`. `prime_factors` must be the complete
/// factorisation of `p - 1` since `p` is derived from it.
pub fn pohlig_hellman(
    g: &BigInt,
    y: &BigInt,
    prime_factors: &[BigInt],
) -> Result<(BigInt, BigInt)> {
    let p = prime_factors.iter().product::<BigInt>() + 1u32;
    pohlig_hellman_mod(g, y, &p, prime_factors)
}

/// Pohlig-Hellman modulo an explicit prime `p`.
///
/// The product of `prime_factors` must divide `p - 1`. Repeated factors
/// are treated as prime powers. A partial factorisation gives the log
/// modulo the product of the supplied factors only.
#[instrument(skip_all, fields(p = %p, n_factors = prime_factors.len()))]
pub fn pohlig_hellman_mod(
    g: &BigInt,
    y: &BigInt,
    p: &BigInt,
    prime_factors: &[BigInt],
) -> Result<(BigInt, BigInt)> {
    let order: BigInt = p - 1u32;
    if !order.is_positive() {
        return Err(Error::NonPositiveModulus(order));
    }
    if let Some(f) = prime_factors.iter().find(|f| f < &&BigInt::from(2)) {
        return Err(Error::InvalidFactor(f.clone()));
    }
    let product: BigInt = prime_factors.iter().product();
    if !(&order % &product).is_zero() {
        return Err(Error::FactorsDoNotDivideOrder { product, order });
    }

    let mut prime_powers: BTreeMap<&BigInt, u32> = BTreeMap::new();
    for q in prime_factors {
        *prime_powers.entry(q).or_default() += 1;
    }

    let sub_logs = prime_powers
        .into_par_iter()
        .map(|(q, e)| solve_prime_power(g, y, p, &order, q, e))
        .collect::<Result<Vec<_>>>()?;
    let (residues, moduli): (Vec<BigInt>, Vec<BigInt>) = sub_logs.into_iter().unzip();

    chinese_remainder(&residues, &moduli)
}

fn solve_prime_power(
    g: &BigInt,
    y: &BigInt,
    p: &BigInt,
    order: &BigInt,
    q: &BigInt,
    e: u32,
) -> Result<(BigInt, BigInt)> {
    let gamma = g.modpow(&(order / q), p);
    let g_inv = modular_inverse(g, p)?;

    let mut x = BigInt::zero();
    let mut q_k = BigInt::one();
    for _ in 0..e {
        let exponent = order / (&q_k * q);
        let h = (g_inv.modpow(&x, p) * y).mod_floor(p).modpow(&exponent, p);
        let digit = baby_step_giant_step(&gamma, &h, p, Some(q))
            .ok_or_else(|| Error::DiscreteLogNotFound { modulus: q.clone() })?;
        x += digit * &q_k;
        q_k *= q;
    }
    debug!(log = %x, modulus = %q_k, "solved prime power sub-instance");
    Ok((x, q_k))
}
