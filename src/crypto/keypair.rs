//! Ed25519 keypair generation and the pluggable randomness source.

use std::io;

use ed25519_dalek::{Signer, SignatureError, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;

use super::Pubkey;

/// Fixed message signed and verified when probing a freshly generated
/// candidate. Catches a corrupted randomness source or a broken Ed25519
/// backend before a key ever leaves the process.
const PROBE_MESSAGE: &[u8; 32] = b"sol-vanity keypair probe message";

/// A cryptographically strong source of random bytes.
pub trait SecureRng: Send {
    fn fill_bytes(&mut self, dest: &mut [u8]);
}

/// Produces a fresh [`SecureRng`] per worker. Workers never share one
/// generator instance.
pub trait RngFactory: Send + Sync {
    fn create_rng(&self) -> io::Result<Box<dyn SecureRng>>;
}

impl SecureRng for OsRng {
    #[inline]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        RngCore::fill_bytes(self, dest)
    }
}

/// Default factory wrapping the operating system CSPRNG.
pub struct OsRngFactory;

impl RngFactory for OsRngFactory {
    fn create_rng(&self) -> io::Result<Box<dyn SecureRng>> {
        let mut rng = OsRng;
        // Probe once so an unavailable OS CSPRNG fails construction
        // instead of the search loop.
        let mut probe = [0u8; 1];
        rng.try_fill_bytes(&mut probe).map_err(io::Error::other)?;
        Ok(Box::new(rng))
    }
}

/// An Ed25519 keypair (32-byte seed plus derived public key).
#[derive(Clone)]
pub struct Keypair {
    signing: SigningKey,
    public: VerifyingKey,
}

impl Keypair {
    /// Draws a 32-byte seed from `rng` and derives the keypair.
    #[inline]
    pub fn generate(rng: &mut dyn SecureRng) -> Self {
        let mut seed = [0u8; 32];
        rng.fill_bytes(&mut seed);
        Self::from_seed(seed)
    }

    /// Derives the keypair for an existing seed.
    #[inline]
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing = SigningKey::from_bytes(&seed);
        let public = signing.verifying_key();
        Self { signing, public }
    }

    #[inline]
    pub fn pubkey(&self) -> Pubkey {
        Pubkey::from_bytes(self.public.to_bytes())
    }

    /// The 64-byte expanded secret key, seed ‖ public — the layout Solana
    /// keypair files use.
    pub fn secret_key_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.signing.to_bytes());
        out[32..].copy_from_slice(self.public.as_bytes());
        out
    }

    /// Signs the probe message with the secret key and verifies the
    /// signature with the public key.
    pub fn verify_probe(&self) -> Result<(), SignatureError> {
        let signature = self.signing.sign(PROBE_MESSAGE);
        self.public.verify_strict(PROBE_MESSAGE, &signature)
    }

    #[cfg(test)]
    pub(crate) fn from_parts(signing: SigningKey, public: VerifyingKey) -> Self {
        Self { signing, public }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRng(u8);

    impl SecureRng for FixedRng {
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(self.0);
        }
    }

    #[test]
    fn deterministic_from_seed() {
        let a = Keypair::from_seed([7u8; 32]);
        let b = Keypair::from_seed([7u8; 32]);
        assert_eq!(a.pubkey(), b.pubkey());

        let c = Keypair::from_seed([8u8; 32]);
        assert_ne!(a.pubkey(), c.pubkey());
    }

    #[test]
    fn generate_draws_seed_from_rng() {
        let mut rng = FixedRng(7);
        let generated = Keypair::generate(&mut rng);
        assert_eq!(generated.pubkey(), Keypair::from_seed([7u8; 32]).pubkey());
    }

    #[test]
    fn secret_key_is_seed_then_public() {
        let keypair = Keypair::from_seed([42u8; 32]);
        let secret = keypair.secret_key_bytes();
        assert_eq!(&secret[..32], &[42u8; 32]);
        assert_eq!(&secret[32..], keypair.pubkey().as_bytes());
    }

    #[test]
    fn probe_verifies_for_honest_keypair() {
        let mut rng = FixedRng(3);
        assert!(Keypair::generate(&mut rng).verify_probe().is_ok());
    }

    #[test]
    fn probe_rejects_mismatched_halves() {
        let a = Keypair::from_seed([1u8; 32]);
        let b = Keypair::from_seed([2u8; 32]);
        let corrupt = Keypair::from_parts(a.signing.clone(), b.public);
        assert!(corrupt.verify_probe().is_err());
    }

    #[test]
    fn os_factory_produces_distinct_output() {
        let factory = OsRngFactory;
        let mut rng = factory.create_rng().unwrap();
        let mut buf = [0u8; 32];
        rng.fill_bytes(&mut buf);
        // 32 zero bytes from the OS CSPRNG is astronomically unlikely.
        assert_ne!(buf, [0u8; 32]);
    }
}
