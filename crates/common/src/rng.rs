//! Seeded selection for reproducible booking runs
//!
//! Every "random" choice a journey makes (destination, departure date,
//! child age) is drawn from a [`SeededRandom`]. Replaying a run with the same
//! seed replays the same choices, which is what makes a flaky failure
//! debuggable after the fact.
//!
//! The generator is a 32-bit xorshift. It is NOT suitable for cryptography
//! or statistics; modulo bias in [`SeededRandom::int_in_range`] is accepted.

use tracing::warn;

use crate::{Error, Result};

/// Replacement state used when a run is seeded with zero.
///
/// Xorshift maps a zero state to zero forever, so a zero seed is swapped for
/// this constant at construction.
pub const ZERO_SEED_SUBSTITUTE: u32 = 0x9E37_79B9;

/// Deterministic 32-bit xorshift generator.
///
/// One instance belongs to one logical run. Not `Clone`: two scenarios must
/// never advance the same sequence.
#[derive(Debug)]
pub struct SeededRandom {
    state: u32,
}

impl SeededRandom {
    /// Create a generator from a 32-bit seed.
    pub fn new(seed: u32) -> Self {
        let state = if seed == 0 {
            warn!(
                "Seed 0 is degenerate for xorshift; substituting {:#010x}",
                ZERO_SEED_SUBSTITUTE
            );
            ZERO_SEED_SUBSTITUTE
        } else {
            seed
        };

        Self { state }
    }

    /// Create a generator from any integer, truncated to its low 32 bits.
    ///
    /// `-1` becomes `0xFFFF_FFFF`, `2^32 + 7` becomes `7`.
    pub fn from_raw(seed: i64) -> Self {
        Self::new(seed as u32)
    }

    /// Advance the state and return it.
    pub fn next(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Draw an integer in `[min, max]` (both inclusive).
    ///
    /// Fails with [`Error::InvalidArgument`] when `max < min`; no draw is
    /// consumed in that case.
    pub fn int_in_range(&mut self, min: i64, max: i64) -> Result<i64> {
        if max < min {
            return Err(Error::InvalidArgument(format!(
                "empty range: max {} is below min {}",
                max, min
            )));
        }

        let range = (max as i128) - (min as i128) + 1;
        let reduced = (self.next() as i128) % range;
        Ok((min as i128 + reduced) as i64)
    }

    /// Pick an index into a list of `length` candidates.
    ///
    /// An empty list is a usage error and does not advance the generator.
    pub fn pick_index(&mut self, length: usize) -> Result<usize> {
        if length == 0 {
            return Err(Error::InvalidArgument(
                "cannot pick an index from an empty list".to_string(),
            ));
        }

        let max = i64::try_from(length - 1).map_err(|_| {
            Error::InvalidArgument(format!("list length {} is too large", length))
        })?;
        let index = self.int_in_range(0, max)?;
        Ok(index as usize)
    }

    /// Pick one element of a slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Result<&'a T> {
        let index = self.pick_index(items.len())?;
        Ok(&items[index])
    }

    #[cfg(test)]
    fn state(&self) -> u32 {
        self.state
    }
}
