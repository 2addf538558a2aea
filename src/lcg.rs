// Recover the parameters of a linear congruential generator
//
//   x' = a*x + b (mod m)
//
// from consecutive outputs. With t_i = x_{i+1} - x_i we have
// t_{i+1} = a * t_i (mod m), so
//
//   t_{i+2} * t_i - t_{i+1}^2 = 0 (mod m)
//
// and the gcd of a few of those is m with high probability. Knowing m, a
// follows from any invertible difference and b from a single step.
use crate::numtheory::modular_inverse;
use crate::{Error, Result};

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};
use tracing::debug;

/// A linear congruential generator, yielding successive states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lcg {
    pub a: BigInt,
    pub b: BigInt,
    pub m: BigInt,
    pub state: BigInt,
}

impl Lcg {
    pub fn new(a: BigInt, b: BigInt, m: BigInt, seed: BigInt) -> Self {
        Self { a, b, m, state: seed }
    }
}

impl Iterator for Lcg {
    type Item = BigInt;

    fn next(&mut self) -> Option<BigInt> {
        self.state = (&self.a * &self.state + &self.b).mod_floor(&self.m);
        Some(self.state.clone())
    }
}

/// Returns `(a, b, m)` from at least five consecutive outputs.
pub fn crack_lcg(samples: &[BigInt]) -> Result<(BigInt, BigInt, BigInt)> {
    if samples.len() < 5 {
        return Err(Error::NotEnoughSamples {
            needed: 5,
            got: samples.len(),
        });
    }

    let diffs = differences(samples);
    let m = diffs
        .windows(3)
        .map(|t| &t[2] * &t[0] - &t[1] * &t[1])
        .fold(BigInt::zero(), |acc, u| acc.gcd(&u));
    debug!(%m, "recovered modulus");

    crack_lcg_with_modulus(samples, &m)
}

/// Returns `(a, b, m)` from at least three consecutive outputs and a known
/// modulus.
pub fn crack_lcg_with_modulus(samples: &[BigInt], m: &BigInt) -> Result<(BigInt, BigInt, BigInt)> {
    if samples.len() < 3 {
        return Err(Error::NotEnoughSamples {
            needed: 3,
            got: samples.len(),
        });
    }
    if !m.is_positive() {
        return Err(Error::NonPositiveModulus(m.clone()));
    }

    let diffs = differences(samples);
    let a = diffs
        .windows(2)
        .find_map(|t| {
            modular_inverse(&t[0], m)
                .ok()
                .map(|inv| (&t[1] * inv).mod_floor(m))
        })
        .ok_or_else(|| Error::NoInverse {
            a: diffs[0].clone(),
            n: m.clone(),
        })?;
    let b = (&samples[1] - &a * &samples[0]).mod_floor(m);

    let consistent = samples
        .windows(2)
        .all(|x| (&a * &x[0] + &b).mod_floor(m) == x[1].mod_floor(m));
    if !consistent {
        return Err(Error::LcgMismatch { a, b, m: m.clone() });
    }
    Ok((a, b, m.clone()))
}

fn differences(samples: &[BigInt]) -> Vec<BigInt> {
    samples.windows(2).map(|x| &x[1] - &x[0]).collect()
}
