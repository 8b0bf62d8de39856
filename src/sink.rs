//! Keypair persistence in the Solana JSON file format.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Writes matched keypairs to a directory, one file per key.
///
/// A key is stored at `<dir>/<base58-public-key>.json` as the JSON array of
/// its 64 secret-key bytes (seed followed by public key), newline
/// terminated — the format `solana-keygen` and wallet tooling read.
/// Overwriting an existing file is permitted; distinct keys never collide
/// because the file name is the public key itself.
#[derive(Debug, Clone)]
pub struct KeyStore {
    dir: PathBuf,
}

impl KeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the target directory if it does not exist yet.
    pub fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir)
    }

    /// Path a key with the given base58 public key is stored at.
    pub fn path_for(&self, base58_pubkey: &str) -> PathBuf {
        self.dir.join(format!("{base58_pubkey}.json"))
    }

    /// Persists one secret key, returning the file path.
    pub fn store(&self, base58_pubkey: &str, secret_key: &[u8; 64]) -> io::Result<PathBuf> {
        let path = self.path_for(base58_pubkey);
        let mut json = serde_json::to_string(secret_key.as_slice())?;
        json.push('\n');
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Reads a stored secret key back.
    pub fn load(&self, base58_pubkey: &str) -> io::Result<[u8; 64]> {
        let contents = fs::read_to_string(self.path_for(base58_pubkey))?;
        let bytes: Vec<u8> = serde_json::from_str(&contents)?;
        bytes
            .try_into()
            .map_err(|v: Vec<u8>| io::Error::other(format!("expected 64 bytes, found {}", v.len())))
    }
}
