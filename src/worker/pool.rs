//! The concurrent generator: worker management and the consumer surface.

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver};
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::info;

use crate::crypto::{OsRngFactory, Pubkey, RngFactory};
use crate::matcher::{Anchor, PatternError, Subsequence, MAX_PATTERN_LEN};
use crate::sink::KeyStore;

use super::cpu::{CpuWorker, SearchCounters};

/// Default number of misses a worker accumulates locally before flushing
/// into the shared `searched` counter and checking for termination.
pub const DEFAULT_CHECK_EVERY: u64 = 262_144;

/// Result of a successful vanity keypair search.
#[derive(Debug, Clone, Serialize)]
pub struct VanityResult {
    /// The matching public key (32 bytes)
    pub pubkey: Pubkey,
    /// The expanded secret key: seed followed by public key
    #[serde(serialize_with = "serialize_secret_key")]
    pub secret_key: [u8; 64],
    /// Canonical base58 encoding of the public key
    pub base58_pubkey: String,
    /// Snapshot of the shared searched counter at emission (approximate)
    pub attempts: u64,
    /// Monotonic time since the generator started
    pub elapsed: Duration,
    /// Both attempts to write the key file failed; the key exists only here
    pub io_fault: bool,
    /// The ID of the worker that found this result
    pub worker_id: usize,
}

fn serialize_secret_key<S: Serializer>(bytes: &[u8; 64], serializer: S) -> Result<S::Ok, S::Error> {
    bytes.as_slice().serialize(serializer)
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid pattern: {0}")]
    Pattern(#[from] PatternError),
    #[error("randomness source unavailable: {0}")]
    Rng(#[source] io::Error),
    #[error("key directory: {0}")]
    Io(#[from] io::Error),
}

/// Construction parameters for a [`VanityGenerator`].
#[derive(Clone)]
pub struct GeneratorOptions {
    /// Directory matched keypairs are written to
    pub key_path: PathBuf,
    /// Sign and verify a probe message with every matched candidate
    pub sig_verify: bool,
    /// Number of worker threads
    pub num_workers: usize,
    /// Pattern the encoded public key must start with
    pub begins_with: Option<Subsequence>,
    /// Pattern the encoded public key must end with
    pub ends_with: Option<Subsequence>,
    /// Stop after this many matches
    pub find_keys: u32,
    /// Miss-flush and termination-check period per worker
    pub check_every: u64,
}

impl GeneratorOptions {
    pub fn new(key_path: impl Into<PathBuf>) -> Self {
        Self {
            key_path: key_path.into(),
            sig_verify: false,
            num_workers: num_cpus::get().max(1),
            begins_with: None,
            ends_with: None,
            find_keys: 1,
            check_every: DEFAULT_CHECK_EVERY,
        }
    }

    /// Compiles `raw` as the prefix pattern.
    pub fn compile_begins_with(
        &mut self,
        raw: &str,
        case_sensitive: bool,
    ) -> Result<(), GeneratorError> {
        self.begins_with = Some(Subsequence::compile(raw, Anchor::Prefix, case_sensitive)?);
        Ok(())
    }

    /// Compiles `raw` as the suffix pattern.
    pub fn compile_ends_with(
        &mut self,
        raw: &str,
        case_sensitive: bool,
    ) -> Result<(), GeneratorError> {
        self.ends_with = Some(Subsequence::compile(raw, Anchor::Suffix, case_sensitive)?);
        Ok(())
    }
}

/// Manages a pool of search workers and delivers their results.
///
/// Results arrive through a bounded queue sized `check_every × num_workers`
/// so every worker can land a full flush batch without blocking; a slower
/// consumer throttles producers instead of growing memory.
#[derive(Debug)]
pub struct VanityGenerator {
    target: u32,
    counters: Arc<SearchCounters>,
    break_flag: Arc<AtomicBool>,
    result_rx: Receiver<Box<VanityResult>>,
    handles: Option<Vec<JoinHandle<()>>>,
    start: Instant,
    num_workers: usize,
}

impl VanityGenerator {
    /// Creates a generator using the operating system CSPRNG.
    pub fn new(options: GeneratorOptions) -> Result<Self, GeneratorError> {
        Self::with_rng_factory(options, Arc::new(OsRngFactory))
    }

    /// Creates a generator drawing one fresh randomness source per worker
    /// from `rng_factory`.
    pub fn with_rng_factory(
        options: GeneratorOptions,
        rng_factory: Arc<dyn RngFactory>,
    ) -> Result<Self, GeneratorError> {
        Self::validate(&options)?;

        let key_store = KeyStore::new(&options.key_path);
        key_store.ensure_dir()?;

        // Every randomness source is created before any thread spawns, so
        // an unavailable CSPRNG fails construction with no workers started.
        let mut rngs = Vec::with_capacity(options.num_workers);
        for _ in 0..options.num_workers {
            rngs.push(rng_factory.create_rng().map_err(GeneratorError::Rng)?);
        }

        let capacity = (options.check_every as usize).saturating_mul(options.num_workers);
        let (result_tx, result_rx) = bounded(capacity);
        let counters = Arc::new(SearchCounters::new());
        let break_flag = Arc::new(AtomicBool::new(false));
        let start = Instant::now();

        let handles = rngs
            .into_iter()
            .enumerate()
            .map(|(id, rng)| {
                let worker = CpuWorker {
                    id,
                    rng,
                    sig_verify: options.sig_verify,
                    begins_with: options.begins_with.clone(),
                    ends_with: options.ends_with.clone(),
                    key_store: key_store.clone(),
                    counters: counters.clone(),
                    break_flag: break_flag.clone(),
                    result_tx: result_tx.clone(),
                    target: options.find_keys,
                    check_every: options.check_every,
                    start,
                };
                thread::Builder::new()
                    .name(format!("vanity-worker-{id}"))
                    .spawn(move || worker.run())
                    .expect("Failed to spawn worker thread")
            })
            .collect();

        // Drop the extra sender so the channel disconnects once every
        // worker has exited.
        drop(result_tx);

        info!(
            workers = options.num_workers,
            target = options.find_keys,
            sig_verify = options.sig_verify,
            key_path = %options.key_path.display(),
            "vanity search started"
        );

        Ok(Self {
            target: options.find_keys,
            counters,
            break_flag,
            result_rx,
            handles: Some(handles),
            start,
            num_workers: options.num_workers,
        })
    }

    fn validate(options: &GeneratorOptions) -> Result<(), GeneratorError> {
        let invalid = |msg: String| Err(GeneratorError::InvalidArgument(msg));
        if options.find_keys == 0 || options.find_keys > i32::MAX as u32 {
            return invalid(format!(
                "find_keys must be between 1 and {}, got {}",
                i32::MAX,
                options.find_keys
            ));
        }
        if options.num_workers == 0 {
            return invalid("num_workers must be at least 1".into());
        }
        if options.check_every == 0 {
            return invalid("check_every must be at least 1".into());
        }
        let (begins, ends) = (&options.begins_with, &options.ends_with);
        if begins.is_none() && ends.is_none() {
            return invalid("at least one of begins_with and ends_with is required".into());
        }
        if let Some(p) = begins {
            if p.anchor() != Anchor::Prefix {
                return invalid("begins_with must be compiled with Anchor::Prefix".into());
            }
        }
        if let Some(s) = ends {
            if s.anchor() != Anchor::Suffix {
                return invalid("ends_with must be compiled with Anchor::Suffix".into());
            }
        }
        let combined = begins.as_ref().map_or(0, Subsequence::len)
            + ends.as_ref().map_or(0, Subsequence::len);
        if combined > MAX_PATTERN_LEN {
            return invalid(format!(
                "combined pattern length {combined} exceeds the {MAX_PATTERN_LEN}-character maximum encoding"
            ));
        }
        Ok(())
    }

    /// Number of matches found so far. Monotonic, never exceeds the target.
    pub fn num_found(&self) -> u32 {
        self.counters.found.load(Ordering::Acquire).min(self.target)
    }

    /// Number of candidates examined so far. Workers flush in batches, so
    /// this may lag the true count by up to `check_every × num_workers − 1`.
    pub fn num_searched(&self) -> u64 {
        self.counters.searched.load(Ordering::Relaxed)
    }

    /// Blocks until a result is available. Returns `None` once every worker
    /// has exited and the queue is drained.
    pub fn take(&self) -> Option<VanityResult> {
        self.result_rx.recv().ok().map(|boxed| *boxed)
    }

    /// Like [`take`](Self::take), but gives up after `timeout`.
    pub fn poll(&self, timeout: Duration) -> Option<VanityResult> {
        self.result_rx.recv_timeout(timeout).ok().map(|boxed| *boxed)
    }

    /// Attempts to receive a result without blocking.
    pub fn try_recv(&self) -> Option<VanityResult> {
        self.result_rx.try_recv().ok().map(|boxed| *boxed)
    }

    /// Signals all workers to exit at their next periodic check. Idempotent;
    /// already-queued results remain available for draining.
    pub fn break_out(&self) {
        self.break_flag.store(true, Ordering::Relaxed);
    }

    /// Returns true once [`break_out`](Self::break_out) has been called.
    pub fn is_stopped(&self) -> bool {
        self.break_flag.load(Ordering::Relaxed)
    }

    /// Returns a clone of the break flag for external use (e.g. signal
    /// handlers).
    pub fn break_flag_clone(&self) -> Arc<AtomicBool> {
        self.break_flag.clone()
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Elapsed time since the generator was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Current search rate in keys per second.
    pub fn keys_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.num_searched() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Signals workers to exit and waits for them.
    pub fn join(mut self) {
        self.break_out();
        if let Some(handles) = self.handles.take() {
            for handle in handles {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for VanityGenerator {
    fn drop(&mut self) {
        self.break_out();
        if let Some(handles) = self.handles.take() {
            for handle in handles {
                let _ = handle.join();
            }
        }
    }
}
