//! Randomness provider for reviewer selection.
//!
//! The pull request service never owns a generator; it asks a shared
//! [`RandomSource`]. Production uses the thread-local OS-seeded generator so
//! concurrent requests never observe the same sequence. Tests inject
//! [`SeededRandom`] to make assignments reproducible.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Source of uniform randomness for reviewer selection.
pub trait RandomSource: Send + Sync {
    /// Shuffle `items` into a uniformly random permutation.
    fn shuffle(&self, items: &mut [String]);

    /// Pick an index uniformly from `0..len`. `len` must be non-zero.
    fn pick_index(&self, len: usize) -> usize;
}

/// Backed by `rand::thread_rng()`, a CSPRNG seeded per thread from the OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn shuffle(&self, items: &mut [String]) {
        items.shuffle(&mut rand::thread_rng());
    }

    fn pick_index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Deterministic generator for tests and reproducible runs.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // A panic while holding the lock cannot leave the generator invalid.
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut *rng)
    }
}

impl RandomSource for SeededRandom {
    fn shuffle(&self, items: &mut [String]) {
        self.with_rng(|rng| items.shuffle(rng));
    }

    fn pick_index(&self, len: usize) -> usize {
        self.with_rng(|rng| rng.gen_range(0..len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("u{}", i)).collect()
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let (a, b) = (SeededRandom::new(42), SeededRandom::new(42));
        let (mut x, mut y) = (ids(10), ids(10));
        a.shuffle(&mut x);
        b.shuffle(&mut y);
        assert_eq!(x, y);
        assert_eq!(a.pick_index(7), b.pick_index(7));
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let source = ThreadRandom;
        let mut items = ids(20);
        source.shuffle(&mut items);
        items.sort();
        let mut expected = ids(20);
        expected.sort();
        assert_eq!(items, expected);
    }

    #[test]
    fn test_pick_index_in_range() {
        let source = ThreadRandom;
        for len in 1..20 {
            assert!(source.pick_index(len) < len);
        }
        assert_eq!(SeededRandom::new(1).pick_index(1), 0);
    }
}
