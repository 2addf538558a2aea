// Modular arithmetic primitives: Bezout coefficients, inverses and square
// roots modulo a prime.
use crate::{Error, Result};

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

/// Returns `(x, y, g)` such that `a*x + b*y == g` and `g = gcd(a, b) >= 0`.
pub fn extended_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_x, mut x) = (BigInt::one(), BigInt::zero());
    let (mut old_y, mut y) = (BigInt::zero(), BigInt::one());
    while !r.is_zero() {
        let q = &old_r / &r;
        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_x = &old_x - &q * &x;
        old_x = std::mem::replace(&mut x, next_x);
        let next_y = &old_y - &q * &y;
        old_y = std::mem::replace(&mut y, next_y);
    }
    if old_r.is_negative() {
        (-old_x, -old_y, -old_r)
    } else {
        (old_x, old_y, old_r)
    }
}

/// Returns `a^-1 mod n` in `[0, n)`.
pub fn modular_inverse(a: &BigInt, n: &BigInt) -> Result<BigInt> {
    if !n.is_positive() {
        return Err(Error::NonPositiveModulus(n.clone()));
    }
    let (x, _, g) = extended_gcd(&a.mod_floor(n), n);
    if !g.is_one() {
        return Err(Error::NoInverse {
            a: a.clone(),
            n: n.clone(),
        });
    }
    Ok(x.mod_floor(n))
}

/// Euler's criterion. `p` is assumed to be an odd prime.
pub fn legendre_symbol(a: &BigInt, p: &BigInt) -> i8 {
    let p_minus_one = p - 1u32;
    let r = a.modpow(&(&p_minus_one >> 1u32), p);
    if r == p_minus_one {
        -1
    } else if r.is_zero() {
        0
    } else if r.is_one() {
        1
    } else {
        // Only reachable for composite p.
        -1
    }
}

/// Tonelli-Shanks. Returns one square root of `a` modulo the prime `p`, or
/// zero when `a` is zero or a non-residue. The other root is `p - x`.
pub fn modular_sqrt(a: &BigInt, p: &BigInt) -> BigInt {
    let zero = BigInt::zero();
    if p < &BigInt::from(2) {
        return zero;
    }
    let a = a.mod_floor(p);
    if p == &BigInt::from(2) {
        return a;
    }
    if a.is_zero() || legendre_symbol(&a, p) != 1 {
        return zero;
    }
    if (p % 4u32) == BigInt::from(3) {
        return a.modpow(&((p + 1u32) >> 2u32), p);
    }

    let p_minus_one = p - 1u32;
    let e = p_minus_one.trailing_zeros().unwrap_or(0);
    let s = &p_minus_one >> e;

    let mut n = BigInt::from(2);
    while legendre_symbol(&n, p) != -1 {
        n += 1u32;
    }

    let mut x = a.modpow(&((&s + 1u32) >> 1u32), p);
    let mut b = a.modpow(&s, p);
    let mut g = n.modpow(&s, p);
    let mut r = e;
    loop {
        // Least m with b^(2^m) == 1.
        let mut t = b.clone();
        let mut m = 0u64;
        while !t.is_one() {
            t = &t * &t % p;
            m += 1;
            if m == r {
                return zero;
            }
        }
        if m == 0 {
            return x;
        }

        let gs = g.modpow(&(BigInt::one() << (r - m - 1)), p);
        g = &gs * &gs % p;
        x = x * &gs % p;
        b = b * &g % p;
        r = m;
    }
}

pub fn is_square(n: &BigInt) -> bool {
    if n.is_negative() {
        return false;
    }
    let root = n.sqrt();
    &root * &root == *n
}
