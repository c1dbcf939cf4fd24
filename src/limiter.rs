//! Bound on simultaneous key derivations.
//!
//! Each Argon2id call holds `mem_cost_kib` of working memory, so unbounded
//! concurrent logins translate directly into unbounded memory use.

use parking_lot::{Condvar, Mutex};

use crate::crypto::KdfParams;

/// Counting semaphore guarding derivations.
#[derive(Debug)]
pub struct DerivationLimiter {
    max: usize,
    in_use: Mutex<usize>,
    released: Condvar,
}

impl DerivationLimiter {
    /// At most `max` derivations at once; zero is treated as one.
    pub fn new(max: usize) -> Self {
        Self {
            max: max.max(1),
            in_use: Mutex::new(0),
            released: Condvar::new(),
        }
    }

    /// Size the limiter so that `available_kib` covers every permit.
    pub fn for_memory_budget(available_kib: u64, params: KdfParams) -> Self {
        Self::new(params.max_concurrent_derivations(available_kib))
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn in_use(&self) -> usize {
        *self.in_use.lock()
    }

    /// Block until a slot is free.
    pub fn acquire(&self) -> Permit<'_> {
        let mut in_use = self.in_use.lock();
        while *in_use >= self.max {
            self.released.wait(&mut in_use);
        }
        *in_use += 1;
        Permit { limiter: self }
    }

    /// Take a slot only if one is free right now.
    pub fn try_acquire(&self) -> Option<Permit<'_>> {
        let mut in_use = self.in_use.lock();
        if *in_use >= self.max {
            return None;
        }
        *in_use += 1;
        Some(Permit { limiter: self })
    }

    fn release(&self) {
        let mut in_use = self.in_use.lock();
        *in_use -= 1;
        self.released.notify_one();
    }
}

impl Default for DerivationLimiter {
    fn default() -> Self {
        let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
        Self::new(cores)
    }
}

/// Held for the duration of one derivation; frees its slot on drop.
#[must_use = "the slot is released as soon as the permit is dropped"]
#[derive(Debug)]
pub struct Permit<'a> {
    limiter: &'a DerivationLimiter,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.limiter.release();
    }
}
