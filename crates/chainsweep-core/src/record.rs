use serde::{Deserialize, Serialize};

/// Parsed result document written by the engine for one parameter value.
///
/// Unknown keys are ignored; only the nested `chain_data` record is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResult {
    /// Chain statistics reported by the engine.
    pub chain_data: ChainData,
}

/// Chain statistics nested under the `chain_data` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainData {
    /// Number of elements in the discovered chain.
    pub length_chain: u64,
    /// Number of steps where the next element was not uniquely determined.
    pub length_non_unique: u64,
}

impl RawResult {
    /// Convenience constructor used by tests and fixtures.
    pub const fn new(length_chain: u64, length_non_unique: u64) -> Self {
        Self {
            chain_data: ChainData {
                length_chain,
                length_non_unique,
            },
        }
    }
}
