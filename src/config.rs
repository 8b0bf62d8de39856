//! Runtime configuration for the vanity keypair generator.

use std::path::PathBuf;

use clap::Parser;

use crate::matcher::{Anchor, PatternError, Subsequence, MAX_PATTERN_LEN};

/// Solana Vanity Keypair Generator
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Base58 pattern the public key must start with
    #[arg(short = 'b', long)]
    pub begins_with: Option<String>,

    /// Base58 pattern the public key must end with
    #[arg(short = 'e', long)]
    pub ends_with: Option<String>,

    /// Case sensitive matching
    #[arg(short = 'c', long, default_value = "false")]
    pub case_sensitive: bool,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Stop after finding N keypairs
    #[arg(short = 'n', long, default_value = "1")]
    pub count: u32,

    /// Directory matched keypairs are written to
    #[arg(short = 'k', long, default_value = "keys")]
    pub key_path: PathBuf,

    /// Sign and verify a probe message with every matched keypair
    #[arg(long, default_value = "false")]
    pub sig_verify: bool,

    /// Progress report interval in seconds
    #[arg(short = 'r', long, default_value = "5")]
    pub report_interval: u64,
}

impl Config {
    /// Returns the number of workers, defaulting to CPU count
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.begins_with.is_none() && self.ends_with.is_none() {
            return Err(ConfigError::Invalid(
                "at least one of --begins-with or --ends-with is required".into(),
            ));
        }

        let begins = self.compiled_begins_with()?;
        let ends = self.compiled_ends_with()?;
        let combined =
            begins.map_or(0, |p| p.len()) + ends.map_or(0, |p| p.len());
        if combined > MAX_PATTERN_LEN {
            return Err(ConfigError::Invalid(format!(
                "combined pattern length {combined} exceeds the {MAX_PATTERN_LEN}-character maximum encoding"
            )));
        }

        if self.count == 0 || self.count > i32::MAX as u32 {
            return Err(ConfigError::Invalid(format!(
                "count must be between 1 and {}",
                i32::MAX
            )));
        }
        if self.workers == Some(0) {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }

        Ok(())
    }

    /// Compiles the prefix pattern, if one was given
    pub fn compiled_begins_with(&self) -> Result<Option<Subsequence>, PatternError> {
        self.begins_with
            .as_deref()
            .map(|raw| Subsequence::compile(raw, Anchor::Prefix, self.case_sensitive))
            .transpose()
    }

    /// Compiles the suffix pattern, if one was given
    pub fn compiled_ends_with(&self) -> Result<Option<Subsequence>, PatternError> {
        self.ends_with
            .as_deref()
            .map(|raw| Subsequence::compile(raw, Anchor::Suffix, self.case_sensitive))
            .transpose()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] PatternError),
    #[error("{0}")]
    Invalid(String),
}
