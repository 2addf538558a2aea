use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use ctfkit::numtheory::{
    chinese_remainder, modular_inverse, modular_sqrt, next_prime, pohlig_hellman,
    pohlig_hellman_mod,
};
use ctfkit::rsa::{factorize_from_exponents, wieners_attack, DEFAULT_PUBLIC_EXPONENT};
use ctfkit::{extract_flags_bytes, parse_int, rot_text, ResumeData, DEFAULT_HEAD, DEFAULT_TAIL};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::Zero;
use tracing_subscriber::EnvFilter;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// more logging, repeat for more (-v info, -vv debug, -vvv trace)
    ///
    /// RUST_LOG takes precedence when set
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// solve x = a (mod m) for congruences given as a:m
    Crt {
        #[arg(required = true, value_parser = parse_congruence)]
        congruences: Vec<(BigInt, BigInt)>,
    },
    /// discrete log of y to the base g with Pohlig-Hellman
    Dlog {
        #[arg(long, value_parser = parse_big)]
        g: BigInt,
        #[arg(long, value_parser = parse_big)]
        y: BigInt,
        /// the prime modulus, defaults to the product of the factors plus one
        #[arg(long, value_parser = parse_big)]
        p: Option<BigInt>,
        /// prime factors of p - 1, repeated for prime powers
        #[arg(long, required = true, num_args = 1.., value_parser = parse_big)]
        factors: Vec<BigInt>,
    },
    /// square root of a modulo the prime p
    Sqrt {
        #[arg(value_parser = parse_big)]
        a: BigInt,
        #[arg(value_parser = parse_big)]
        p: BigInt,
    },
    /// inverse of a modulo n
    Inverse {
        #[arg(value_parser = parse_big)]
        a: BigInt,
        #[arg(value_parser = parse_big)]
        n: BigInt,
    },
    /// recover a small RSA private exponent
    Wiener {
        #[arg(value_parser = parse_big)]
        e: BigInt,
        #[arg(value_parser = parse_big)]
        n: BigInt,
    },
    /// factor an RSA modulus given the private exponent
    Factor {
        #[arg(value_parser = parse_big)]
        n: BigInt,
        #[arg(value_parser = parse_big)]
        d: BigInt,
        #[arg(long, value_parser = parse_big, default_value_t = BigInt::from(DEFAULT_PUBLIC_EXPONENT))]
        e: BigInt,
    },
    /// smallest prime greater than x
    NextPrime {
        #[arg(value_parser = parse_big)]
        x: BigInt,
    },
    /// summarise a padding oracle checkpoint file
    Resume { file: PathBuf },
    /// extract flags from a file, or stdin when no file is given
    Flags {
        file: Option<PathBuf>,
        #[arg(long, default_value_t = String::from(DEFAULT_HEAD))]
        head: String,
        #[arg(long, default_value_t = String::from(DEFAULT_TAIL))]
        tail: String,
    },
    /// rotate letters, ROT13 by default
    Rot {
        text: String,
        #[arg(short, long, default_value_t = 13, allow_negative_numbers = true)]
        shift: i64,
    },
}

fn parse_big(s: &str) -> Result<BigInt, String> {
    parse_int(s).map_err(|e| e.to_string())
}

fn parse_congruence(s: &str) -> Result<(BigInt, BigInt), String> {
    let (a, m) = s
        .split_once(':')
        .ok_or_else(|| format!("expected a:m, got {s:?}"))?;
    Ok((parse_big(a)?, parse_big(m)?))
}

/// Both square roots of `a` modulo the prime `p`.
fn square_roots(a: &BigInt, p: &BigInt) -> Result<(BigInt, BigInt)> {
    if p < &BigInt::from(2) {
        bail!("modulus must be a prime, got {p}");
    }
    let x = modular_sqrt(a, p);
    if x.is_zero() && !a.mod_floor(p).is_zero() {
        bail!("{a} is not a quadratic residue modulo {p}");
    }
    let y = (p - &x).mod_floor(p);
    Ok((x, y))
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Crt { congruences } => {
            let (residues, moduli): (Vec<BigInt>, Vec<BigInt>) = congruences.into_iter().unzip();
            let (x, m) = chinese_remainder(&residues, &moduli).context("solving congruences")?;
            println!("x = {x} (mod {m})");
        }
        Command::Dlog { g, y, p, factors } => {
            let (x, m) = match p {
                Some(p) => pohlig_hellman_mod(&g, &y, &p, &factors),
                None => pohlig_hellman(&g, &y, &factors),
            }
            .context("computing discrete log")?;
            println!("x = {x} (mod {m})");
        }
        Command::Sqrt { a, p } => {
            let (x, y) = square_roots(&a, &p)?;
            println!("{x}\n{y}");
        }
        Command::Inverse { a, n } => {
            println!("{}", modular_inverse(&a, &n)?);
        }
        Command::Wiener { e, n } => match wieners_attack(&e, &n) {
            Some(d) => println!("d = {d}"),
            None => bail!("Wiener's attack does not apply to this key"),
        },
        Command::Factor { n, d, e } => {
            let (p, q) = factorize_from_exponents(&n, &d, &e).context("factoring modulus")?;
            println!("p = {p}\nq = {q}");
        }
        Command::NextPrime { x } => {
            println!("{}", next_prime(&x));
        }
        Command::Resume { file } => {
            let state = ResumeData::load(&file)
                .with_context(|| format!("Loading checkpoint from {file:?}"))?;
            println!("blocks decrypted: {}", state.block_index);
            println!("next byte: {}", state.inblock_index);
            println!("plaintext: {:?}", String::from_utf8_lossy(&state.plaintext));
        }
        Command::Flags { file, head, tail } => {
            let data = match file {
                Some(ref path) => {
                    fs::read(path).with_context(|| format!("Reading flags from {path:?}"))?
                }
                None => {
                    let mut data = vec![];
                    io::stdin().read_to_end(&mut data)?;
                    data
                }
            };
            for flag in extract_flags_bytes(&data, head.as_bytes(), tail.as_bytes()) {
                println!("{}", String::from_utf8_lossy(&flag));
            }
        }
        Command::Rot { text, shift } => {
            println!("{}", rot_text(&text, shift));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(-7)]
    fn square_roots_rejects_small_modulus(#[case] p: i64) {
        assert!(square_roots(&BigInt::from(4), &BigInt::from(p)).is_err());
    }

    #[test]
    fn square_roots_returns_both_roots() {
        let (x, y) = square_roots(&BigInt::from(10), &BigInt::from(13)).unwrap();

        let mut roots = [x, y];
        roots.sort();
        assert_eq!(roots, [BigInt::from(6), BigInt::from(7)]);
    }

    #[test]
    fn square_roots_rejects_non_residue() {
        assert!(square_roots(&BigInt::from(5), &BigInt::from(13)).is_err());
    }
}
