//! Quantile estimation algorithms
//!
//! This module provides a streaming approximate-quantile sketch based on the
//! t-digest algorithm (Dunning & Ertl, "Computing Extremely Accurate Quantiles
//! Using t-Digests", 2019).
//!
//! # T-Digest
//!
//! T-Digest maintains a bounded set of weighted centroids whose sizes shrink
//! toward the tails, giving high relative accuracy at extreme percentiles
//! (p99, p99.9) while staying compact in the middle of the distribution.
//! Used in production by Netflix, Elasticsearch, and Prometheus.
//!
//! **Characteristics:**
//! - Relative accuracy at the tails, controlled by a single compression
//!   parameter (typically 50-1000)
//! - Mergeable: independently-built digests combine into one over the union
//! - Pluggable scale function (9 variants, see [`tdigest::Scaler`])
//! - Optional exponential temporal decay for favoring recent data
//!
//! # Example
//!
//! ```
//! use tdigest_oxide::quantiles::TDigest;
//!
//! let mut td = TDigest::new();
//!
//! for i in 0..10_000 {
//!     td.update(i as f64);
//! }
//!
//! let median = td.quantile(0.5);
//! let p99 = td.quantile(0.99);
//! println!("median: {}, p99: {}", median, p99);
//! ```

pub mod tdigest;

pub use tdigest::{Scaler, TDigest};
