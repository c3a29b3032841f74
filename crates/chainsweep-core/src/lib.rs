#![deny(missing_docs)]
#![doc = "Core data model and error types shared by the chainsweep crates."]

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

pub mod errors;
mod record;

pub use errors::{ErrorInfo, SweepError};
pub use record::{ChainData, RawResult};

/// Inclusive range of symmetric-group orders driven by a sweep.
///
/// A range with `start > end` is empty and drives no invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SweepRange {
    /// Lower bound (inclusive).
    pub start: u32,
    /// Upper bound (inclusive).
    pub end: u32,
}

impl SweepRange {
    /// Creates a new inclusive range.
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Returns `true` when the range drives no invocations.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Number of parameter values in the range.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start) as usize + 1
        }
    }

    /// Iterates every parameter value in ascending order.
    pub fn values(&self) -> RangeInclusive<u32> {
        self.start..=self.end
    }

    /// Returns `true` when `n` lies inside the range.
    pub fn contains(&self, n: u32) -> bool {
        self.values().contains(&n)
    }
}
