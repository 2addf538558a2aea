mod arith;
mod crt;
mod dlog;
mod prime;
mod prime_tables;

pub use arith::{extended_gcd, is_square, legendre_symbol, modular_inverse, modular_sqrt};
pub use crt::chinese_remainder;
pub use dlog::{baby_step_giant_step, pohlig_hellman, pohlig_hellman_mod, MAX_BABY_STEPS};
pub use prime::{
    generate_prime, is_prime, is_prime_with_rng, next_prime, DEFAULT_MILLER_RABIN_ROUNDS,
};
