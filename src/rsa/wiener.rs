// Wiener's attack on a small private exponent.
//
// With ed = 1 + k*phi(n) and d < n^(1/4) / 3, k/d is a convergent of the
// continued fraction of e/n. For each convergent k/d the candidate
//
//   phi = (e*d - 1) / k
//
// is checked by solving x^2 - (n - phi + 1)x + n = 0, whose roots are p and q
// when phi is right. That only happens when the discriminant is a perfect
// square with the right parity.
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use tracing::debug;

/// Returns the private exponent `d`, or `None` when no convergent of `e/n`
/// yields a factorisation of `n`.
pub fn wieners_attack(e: &BigInt, n: &BigInt) -> Option<BigInt> {
    let four_n = n * 4u32;
    for (k, d) in Convergents::new(e.clone(), n.clone()) {
        if k.is_zero() {
            continue;
        }
        let ed_minus_one = e * &d - 1u32;
        if !ed_minus_one.is_multiple_of(&k) {
            continue;
        }
        let phi = &ed_minus_one / &k;
        let s = n - &phi + 1u32;
        let discriminant = &s * &s - &four_n;
        if discriminant.is_negative() {
            continue;
        }
        let root = discriminant.sqrt();
        if &root * &root == discriminant && (&s + &root).is_even() {
            debug!(%k, %d, "convergent factors the modulus");
            return Some(d);
        }
    }
    None
}

/// Convergents `h/k` of the continued fraction of `num/den`, yielded as
/// `(h, k)`.
struct Convergents {
    num: BigInt,
    den: BigInt,
    h: (BigInt, BigInt),
    k: (BigInt, BigInt),
}

impl Convergents {
    fn new(num: BigInt, den: BigInt) -> Self {
        Self {
            num,
            den,
            h: (BigInt::zero(), BigInt::one()),
            k: (BigInt::one(), BigInt::zero()),
        }
    }
}

impl Iterator for Convergents {
    type Item = (BigInt, BigInt);

    fn next(&mut self) -> Option<Self::Item> {
        if self.den.is_zero() {
            return None;
        }
        let (quotient, remainder) = self.num.div_mod_floor(&self.den);
        self.num = std::mem::replace(&mut self.den, remainder);

        let h = &quotient * &self.h.1 + &self.h.0;
        let k = &quotient * &self.k.1 + &self.k.0;
        self.h = (std::mem::take(&mut self.h.1), h.clone());
        self.k = (std::mem::take(&mut self.k.1), k.clone());
        Some((h, k))
    }
}
