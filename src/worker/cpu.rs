//! CPU worker: the vanity search hot loop.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{SendTimeoutError, Sender};
use tracing::{debug, warn};

use crate::crypto::{Keypair, SecureRng};
use crate::matcher::Subsequence;
use crate::sink::KeyStore;

use super::VanityResult;

/// How often a blocked enqueue re-checks the break flag.
const SEND_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Counters shared by every worker of one generator.
#[derive(Debug, Default)]
pub(crate) struct SearchCounters {
    /// Matches claimed so far. May briefly exceed the target when several
    /// workers race for the last slot; claims past the target are dropped.
    pub(crate) found: AtomicU32,
    /// Candidates examined, flushed in `check_every` batches.
    pub(crate) searched: AtomicU64,
}

impl SearchCounters {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

/// A worker that generates keypairs and tests them against the patterns.
pub(crate) struct CpuWorker {
    pub(crate) id: usize,
    pub(crate) rng: Box<dyn SecureRng>,
    pub(crate) sig_verify: bool,
    pub(crate) begins_with: Option<Subsequence>,
    pub(crate) ends_with: Option<Subsequence>,
    pub(crate) key_store: KeyStore,
    pub(crate) counters: Arc<SearchCounters>,
    pub(crate) break_flag: Arc<AtomicBool>,
    pub(crate) result_tx: Sender<Box<VanityResult>>,
    pub(crate) target: u32,
    pub(crate) check_every: u64,
    pub(crate) start: Instant,
}

impl CpuWorker {
    /// Runs the worker loop until the target is reached, the break flag is
    /// raised, or the consumer side of the queue is gone.
    ///
    /// Misses accumulate in a thread-local counter and flush into the shared
    /// `searched` count every `check_every` candidates; the flush boundary
    /// doubles as the termination check, so the shared count may lag true
    /// attempts by up to `check_every - 1` per worker.
    pub(crate) fn run(mut self) {
        let mut misses: u64 = 0;
        loop {
            let keypair = Keypair::generate(&mut *self.rng);
            if self.accept(&keypair) {
                self.counters.searched.fetch_add(misses + 1, Ordering::Relaxed);
                misses = 0;
                if !self.emit(&keypair) {
                    break;
                }
                if self.should_stop() {
                    break;
                }
            } else {
                misses += 1;
                if misses == self.check_every {
                    self.counters.searched.fetch_add(misses, Ordering::Relaxed);
                    misses = 0;
                    if self.should_stop() {
                        break;
                    }
                }
            }
        }
    }

    /// Pattern check, then the optional sign/verify self-check for
    /// candidates that matched.
    fn accept(&self, keypair: &Keypair) -> bool {
        let pubkey = keypair.pubkey();
        if let Some(prefix) = &self.begins_with {
            if !prefix.matches(&pubkey) {
                return false;
            }
        }
        if let Some(suffix) = &self.ends_with {
            if !suffix.matches(&pubkey) {
                return false;
            }
        }
        if self.sig_verify {
            if let Err(error) = keypair.verify_probe() {
                debug!(worker = self.id, %error, "candidate failed sign/verify self-check, discarding");
                return false;
            }
        }
        true
    }

    /// Persists a match, claims a result slot and enqueues the result.
    ///
    /// The key file is written before the `found` counter moves, so any
    /// observer of the counter can rely on the files being on disk. Returns
    /// `false` once this worker should exit.
    fn emit(&mut self, keypair: &Keypair) -> bool {
        let encoded = keypair.pubkey().to_base58();
        let secret = keypair.secret_key_bytes();

        let mut io_fault = false;
        if let Err(error) = self.key_store.store(&encoded, &secret) {
            warn!(worker = self.id, key = %encoded, %error, "key file write failed, retrying");
            if let Err(error) = self.key_store.store(&encoded, &secret) {
                warn!(worker = self.id, key = %encoded, %error, "key file write failed twice, key survives in the result queue only");
                io_fault = true;
            }
        }

        // Claim a result slot. A claim at or past the target loses the race
        // and is dropped, so delivered results never exceed the target.
        let prior = self.counters.found.fetch_add(1, Ordering::AcqRel);
        if prior >= self.target {
            return false;
        }

        let result = Box::new(VanityResult {
            pubkey: keypair.pubkey(),
            secret_key: secret,
            base58_pubkey: encoded,
            attempts: self.counters.searched.load(Ordering::Relaxed),
            elapsed: self.start.elapsed(),
            io_fault,
            worker_id: self.id,
        });
        if !self.send_result(result) {
            return false;
        }
        prior + 1 < self.target
    }

    /// Blocking enqueue with bounded waits: a full queue is backpressure by
    /// design, but the wait re-checks the break flag so a departed consumer
    /// cannot strand the worker, and a disconnected queue means the
    /// generator itself is gone.
    fn send_result(&self, result: Box<VanityResult>) -> bool {
        let mut pending = result;
        loop {
            match self.result_tx.send_timeout(pending, SEND_POLL_INTERVAL) {
                Ok(()) => return true,
                Err(SendTimeoutError::Timeout(back)) => {
                    if self.break_flag.load(Ordering::Relaxed) {
                        return false;
                    }
                    pending = back;
                }
                Err(SendTimeoutError::Disconnected(_)) => return false,
            }
        }
    }

    fn should_stop(&self) -> bool {
        self.break_flag.load(Ordering::Relaxed)
            || self.counters.found.load(Ordering::Acquire) >= self.target
    }
}
