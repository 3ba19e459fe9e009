//! tdigest_oxide: a streaming approximate-quantile sketch library
//!
//! This crate implements the t-digest algorithm (Dunning & Ertl,
//! "Computing Extremely Accurate Quantiles Using t-Digests", 2019), a
//! mergeable data structure for estimating quantiles and CDF values over
//! an unbounded stream of weighted real-valued samples with high relative
//! accuracy at the tails.
//!
//! See [`quantiles::TDigest`] for the primary entry point.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod common;
pub mod quantiles;

// Re-export core types for convenience
pub use common::{Mergeable, Result, Sketch, SketchError};

/// Error types and result aliases for sketch operations
pub mod error {
    pub use crate::common::{Result, SketchError};
}

pub use quantiles::{Scaler, TDigest};

#[cfg(test)]
mod tests {
    #[test]
    fn test_library_compiles() {
        // This test ensures the library compiles successfully
    }
}
