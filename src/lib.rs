//! # sol_vanity
//!
//! High-performance Solana vanity keypair generator.
//!
//! ## Architecture
//!
//! - `crypto`: Ed25519 key generation and base58 public-key encoding
//! - `matcher`: compiled prefix/suffix patterns over base58 addresses
//! - `worker`: parallel search workers and the generator facade
//! - `sink`: keypair persistence in the Solana JSON file format
//! - `config`: runtime configuration for the CLI

pub mod config;
pub mod crypto;
pub mod matcher;
pub mod sink;
pub mod worker;

pub use config::Config;
pub use crypto::{Keypair, OsRngFactory, Pubkey, RngFactory, SecureRng};
pub use matcher::{Anchor, PatternError, Subsequence};
pub use sink::KeyStore;
pub use worker::{GeneratorError, GeneratorOptions, VanityGenerator, VanityResult};
