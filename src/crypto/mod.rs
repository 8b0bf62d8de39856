//! Cryptographic operations for Solana key generation.
//!
//! This module provides:
//! - Secure random Ed25519 keypair generation with an optional self-check
//! - Base58 public-key encoding and the arithmetic behind partial matching
//! - Pluggable per-worker randomness sources

pub mod base58;
mod keypair;
mod pubkey;

pub use keypair::{Keypair, OsRngFactory, RngFactory, SecureRng};
pub use pubkey::{Pubkey, PubkeyError};
