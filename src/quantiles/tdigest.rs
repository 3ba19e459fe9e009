//! T-Digest: Quantile estimation with tail accuracy (Dunning & Ertl 2019)
//!
//! T-Digest is a streaming quantile algorithm that provides high accuracy
//! at the distribution tails (extreme percentiles like p99, p99.9).
//! Used by Netflix, Microsoft, Elasticsearch, and Prometheus.
//!
//! # Algorithm Overview
//!
//! T-Digest maintains a sorted set of "centroids" where each centroid
//! has a mean and weight. New samples land in an unordered buffer and are
//! only sorted and merged into the centroid list when the buffer fills up
//! or a query forces it. Centroids are merged under a **scale function**
//! that keeps clusters small near the tails (for accuracy) and large near
//! the median (for compactness) - the compression parameter controls the
//! accuracy/memory tradeoff:
//! - Higher compression = more centroids = better accuracy
//! - Lower compression = fewer centroids = less memory
//!
//! # Scale Functions
//!
//! Nine interchangeable scale-function strategies are available via
//! [`Scaler`], differing in which part of the quantile range gets the
//! smallest clusters and in whether they use exact trig or a fast
//! polynomial approximation of `asin`.
//!
//! # Time Complexity
//!
//! - Update: O(1) amortized, O(n log n) on the batch compress that runs
//!   every `max_unprocessed` updates
//! - Quantile / CDF: O(n) in the number of centroids (bounded by compression)
//! - Merge: O(n log n) where n is the combined number of centroids
//!
//! # Space Complexity
//!
//! O(compression) centroids, typically 100-500
//!
//! # References
//!
//! - Dunning & Ertl, "Computing Extremely Accurate Quantiles Using t-Digests" (2019)
//! - <https://github.com/tdunning/t-digest>
//!
//! # Examples
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
//! println!("Median: {}, P99: {}", median, p99);
//! ```

use crate::common::validation::{
    validate_byte_size, validate_compression, validate_min_size, validate_positive_count,
    validate_unit_interval_half_open,
};
use crate::common::{Mergeable, Result, Sketch, SketchError};
use std::cmp::Ordering;
use std::f64::consts::PI;

/// Magic bytes identifying the serialized format, read back as a
/// little-endian `u16` of `0x0C80`.
const MAGIC_BYTES: [u8; 2] = [0x80, 0x0C];
const ENCODING_VERSION: i32 = 1;
const MAX_CENTROID_COUNT: i32 = 1 << 20;

/// Points near 0 or 1 where K2/K3-family scale functions are clamped to
/// avoid diverging to infinity.
const CLAMP_EPS: f64 = 1e-15;

/// Fast polynomial approximation of `asin`, used by the `*Fast` scale
/// function variants to avoid the cost of the libm trig call on the hot
/// compression path.
///
/// The polynomial is a truncated Maclaurin series below the 0.9 threshold
/// and a 10-term square-root asymptotic expansion of `arccos(1 - t)` above
/// it; the two branches agree with libm `asin` to within double-precision
/// rounding noise across `[-1, 1]`.
fn fast_asin(x: f64) -> f64 {
    if x.abs() > 1.0 {
        return f64::NAN;
    }
    if x == 1.0 {
        return std::f64::consts::FRAC_PI_2;
    }
    if x == -1.0 {
        return -std::f64::consts::FRAC_PI_2;
    }

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let ax = x.abs();

    if ax >= 0.9 {
        let t = 1.0 - ax;
        let poly = 1.0
            + t * (1.0 / 12.0
                + t * (3.0 / 160.0
                    + t * (5.0 / 896.0
                        + t * (35.0 / 18432.0
                            + t * (63.0 / 90112.0
                                + t * (231.0 / 851968.0
                                    + t * (143.0 / 1310720.0
                                        + t * (6435.0 / 142606336.0
                                            + t * 12155.0 / 637534208.0))))))));
        sign * (std::f64::consts::FRAC_PI_2 - (2.0 * t).sqrt() * poly)
    } else {
        let x2 = x * x;
        let mut term = x;
        let mut coeff = 1.0_f64;
        let mut sum = x;
        for n in 1..18 {
            let nf = n as f64;
            coeff *= (2.0 * nf - 1.0) / (2.0 * nf);
            term *= x2;
            sum += coeff * term / (2.0 * nf + 1.0);
        }
        sum
    }
}

fn clamp_q(q: f64) -> (f64, bool) {
    if q <= CLAMP_EPS {
        (CLAMP_EPS, true)
    } else if q >= 1.0 - CLAMP_EPS {
        (1.0 - CLAMP_EPS, true)
    } else {
        (q, false)
    }
}

fn z24(compression: f64, n: f64) -> f64 {
    (4.0 * (n / compression).ln() + 24.0).max(1.0)
}

fn z21(compression: f64, n: f64) -> f64 {
    (4.0 * (n / compression).ln() + 21.0).max(1.0)
}

fn k1_k(q: f64, n: f64) -> f64 {
    n * (2.0 * q - 1.0).asin()
}
fn k1_q(k: f64, n: f64) -> f64 {
    ((k / n).sin() + 1.0) / 2.0
}
fn k1_fast_k(q: f64, n: f64) -> f64 {
    n * fast_asin(2.0 * q - 1.0)
}

fn k1_spliced_k(q: f64, n: f64) -> f64 {
    if q <= 0.5 {
        n * (2.0 * q - 1.0)
    } else {
        n * (2.0 * q - 1.0).asin()
    }
}
fn k1_spliced_q(k: f64, n: f64) -> f64 {
    if k <= 0.0 {
        0.5 + k / (2.0 * n)
    } else {
        ((k / n).sin() + 1.0) / 2.0
    }
}
fn k1_spliced_fast_k(q: f64, n: f64) -> f64 {
    if q <= 0.5 {
        n * (2.0 * q - 1.0)
    } else {
        n * fast_asin(2.0 * q - 1.0)
    }
}

fn k2_k(q: f64, n: f64) -> f64 {
    let (qc, clamped) = clamp_q(q);
    let raw = n * (qc / (1.0 - qc)).ln();
    if clamped {
        2.0 * raw
    } else {
        raw
    }
}
fn k2_q(k: f64, n: f64) -> f64 {
    let e = (k / n).exp();
    e / (1.0 + e)
}

fn k2_spliced_k(q: f64, n: f64) -> f64 {
    let (qc, clamped) = clamp_q(q);
    let raw = if qc <= 0.5 {
        4.0 * n * (qc - 0.5)
    } else {
        n * (qc / (1.0 - qc)).ln()
    };
    if clamped {
        2.0 * raw
    } else {
        raw
    }
}
fn k2_spliced_q(k: f64, n: f64) -> f64 {
    if k <= 0.0 {
        0.5 + k / (4.0 * n)
    } else {
        let e = (k / n).exp();
        e / (1.0 + e)
    }
}

fn k3_k(q: f64, n: f64) -> f64 {
    let (qc, clamped) = clamp_q(q);
    let raw = if qc <= 0.5 {
        n * (2.0 * qc).ln()
    } else {
        -n * (2.0 * (1.0 - qc)).ln()
    };
    if clamped {
        10.0 * raw
    } else {
        raw
    }
}
fn k3_q(k: f64, n: f64) -> f64 {
    if k <= 0.0 {
        (k / n).exp() / 2.0
    } else {
        1.0 - (-k / n).exp() / 2.0
    }
}

fn k3_spliced_k(q: f64, n: f64) -> f64 {
    let (qc, clamped) = clamp_q(q);
    let raw = if qc <= 0.5 {
        2.0 * n * (qc - 0.5)
    } else {
        -n * (2.0 * (1.0 - qc)).ln()
    };
    if clamped {
        10.0 * raw
    } else {
        raw
    }
}
fn k3_spliced_q(k: f64, n: f64) -> f64 {
    if k <= 0.0 {
        0.5 + k / (2.0 * n)
    } else {
        1.0 - (-k / n).exp() / 2.0
    }
}

fn kq_k(q: f64, n: f64) -> f64 {
    n * (q * q + 2.0 * q) / 3.0
}
fn kq_q(k: f64, n: f64) -> f64 {
    (n * (n + 3.0 * k)).sqrt() / n - 1.0
}

/// Contract shared by every scale-function strategy: a rank-to-index
/// mapping `k`, its inverse `q`, and a normalizer derived from the
/// compression parameter and the total observed weight.
trait ScaleFunction {
    fn k(&self, q: f64, norm: f64) -> f64;
    fn q(&self, k: f64, norm: f64) -> f64;
    fn normalizer(&self, compression: f64, n: f64) -> f64;
}

/// Selects which scale function a [`TDigest`] uses to bound cluster sizes.
///
/// All nine variants implement the same `k`/`q`/`normalizer` contract;
/// they differ in which part of the quantile range shrinks clusters the
/// most and in whether they use exact trig or a fast polynomial
/// approximation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scaler {
    /// `sqrt(q(1-q))`-shaped cluster sizes using exact `asin`.
    K1,
    /// As [`Scaler::K1`], but using [`fast_asin`] on the hot path.
    K1Fast,
    /// [`Scaler::K1`] with a linear segment spliced in around the median.
    K1Spliced,
    /// [`Scaler::K1Fast`] with the same splice.
    K1SplicedFast,
    /// `q(1-q)`-shaped cluster sizes using a logistic transform.
    K2,
    /// [`Scaler::K2`] with a linear segment spliced in around the median.
    K2Spliced,
    /// `min(q, 1-q)`-shaped cluster sizes, most aggressive at the tails.
    K3,
    /// [`Scaler::K3`] with a linear segment spliced in around the median.
    K3Spliced,
    /// Quadratic scale function with no trig at all.
    KQuadratic,
}

impl Default for Scaler {
    /// K2 is the default: its `q(1-q)` cluster-size shape is the one the
    /// original ad hoc compression heuristic in this library already
    /// approximated before scale functions were made pluggable.
    fn default() -> Self {
        Scaler::K2
    }
}

impl ScaleFunction for Scaler {
    fn k(&self, q: f64, norm: f64) -> f64 {
        match self {
            Scaler::K1 => k1_k(q, norm),
            Scaler::K1Fast => k1_fast_k(q, norm),
            Scaler::K1Spliced => k1_spliced_k(q, norm),
            Scaler::K1SplicedFast => k1_spliced_fast_k(q, norm),
            Scaler::K2 => k2_k(q, norm),
            Scaler::K2Spliced => k2_spliced_k(q, norm),
            Scaler::K3 => k3_k(q, norm),
            Scaler::K3Spliced => k3_spliced_k(q, norm),
            Scaler::KQuadratic => kq_k(q, norm),
        }
    }

    fn q(&self, k: f64, norm: f64) -> f64 {
        match self {
            Scaler::K1 | Scaler::K1Fast => k1_q(k, norm),
            Scaler::K1Spliced | Scaler::K1SplicedFast => k1_spliced_q(k, norm),
            Scaler::K2 => k2_q(k, norm),
            Scaler::K2Spliced => k2_spliced_q(k, norm),
            Scaler::K3 => k3_q(k, norm),
            Scaler::K3Spliced => k3_spliced_q(k, norm),
            Scaler::KQuadratic => kq_q(k, norm),
        }
    }

    fn normalizer(&self, compression: f64, n: f64) -> f64 {
        match self {
            Scaler::K1 | Scaler::K1Fast | Scaler::K1Spliced | Scaler::K1SplicedFast => {
                compression / (2.0 * PI)
            }
            Scaler::K2 | Scaler::K2Spliced => compression / z24(compression, n),
            Scaler::K3 | Scaler::K3Spliced => compression / z21(compression, n),
            Scaler::KQuadratic => compression / 2.0,
        }
    }
}

/// A cluster of values with a mean and weight (count of values represented).
#[derive(Clone, Debug, PartialEq)]
struct Centroid {
    mean: f64,
    weight: f64,
}

/// T-Digest sketch for streaming approximate-quantile estimation.
///
/// Provides high relative accuracy at the distribution tails with bounded
/// memory. See the module documentation for the algorithm overview.
///
/// # Examples
///
/// ```
/// use tdigest_oxide::quantiles::TDigest;
///
/// let mut td = TDigest::new();
/// for i in 0..1000 {
///     td.update(i as f64);
/// }
/// let median = td.quantile(0.5);
/// assert!((median - 500.0).abs() < 50.0);
/// ```
#[derive(Clone, Debug)]
pub struct TDigest {
    compression: f64,
    scaler: Scaler,
    processed: Vec<Centroid>,
    unprocessed: Vec<Centroid>,
    cumulative: Vec<f64>,
    cumulative_valid: bool,
    processed_weight: f64,
    unprocessed_weight: f64,
    min: f64,
    max: f64,
    max_processed: usize,
    max_unprocessed: usize,
    decay_value: Option<f64>,
    decay_every: Option<u64>,
    add_count: u64,
}

impl PartialEq for TDigest {
    fn eq(&self, other: &Self) -> bool {
        self.compression == other.compression
            && self.scaler == other.scaler
            && self.processed == other.processed
            && self.unprocessed == other.unprocessed
            && self.processed_weight == other.processed_weight
            && self.unprocessed_weight == other.unprocessed_weight
            && self.min == other.min
            && self.max == other.max
            && self.decay_value == other.decay_value
            && self.decay_every == other.decay_every
    }
}

impl TDigest {
    /// Default compression parameter.
    pub const DEFAULT_COMPRESSION: f64 = 100.0;

    /// Creates a new T-Digest with the default compression (100) and the
    /// default scale function ([`Scaler::K2`]), with decay disabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use tdigest_oxide::quantiles::TDigest;
    ///
    /// let td = TDigest::new();
    /// assert!(td.compression() == TDigest::DEFAULT_COMPRESSION);
    /// ```
    pub fn new() -> Self {
        Self::with_scaler(Self::DEFAULT_COMPRESSION, Scaler::default())
            .expect("default compression is always valid")
    }

    /// Creates a T-Digest with an explicit compression parameter.
    ///
    /// # Errors
    ///
    /// Returns `SketchError::InvalidParameter` if `compression` is not
    /// finite and strictly positive.
    pub fn with_compression(compression: f64) -> Result<Self> {
        Self::with_scaler(compression, Scaler::default())
    }

    /// Creates a T-Digest with an explicit compression and scale function.
    ///
    /// # Errors
    ///
    /// Returns `SketchError::InvalidParameter` if `compression` is not
    /// finite and strictly positive.
    pub fn with_scaler(compression: f64, scaler: Scaler) -> Result<Self> {
        validate_compression(compression)?;

        let max_processed = (2.0 * PI * compression).ceil() as usize;
        let max_unprocessed = max_processed.saturating_mul(8).max(1);

        Ok(TDigest {
            compression,
            scaler,
            processed: Vec::new(),
            unprocessed: Vec::new(),
            cumulative: Vec::new(),
            cumulative_valid: false,
            processed_weight: 0.0,
            unprocessed_weight: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            max_processed,
            max_unprocessed,
            decay_value: None,
            decay_every: None,
            add_count: 0,
        })
    }

    /// Creates a T-Digest that exponentially decays centroid weights over
    /// time, favoring recently added samples.
    ///
    /// Every `decay_every` calls to [`TDigest::update`] or
    /// [`TDigest::update_weighted`], every centroid's weight (and the
    /// running weight totals) is multiplied by `decay_value`.
    ///
    /// # Errors
    ///
    /// Returns `SketchError::InvalidParameter` if `compression` is not
    /// positive and finite, `decay_value` is not in `(0.0, 1.0]`, or
    /// `decay_every` is zero.
    pub fn with_decay(compression: f64, decay_value: f64, decay_every: u64) -> Result<Self> {
        validate_compression(compression)?;
        validate_unit_interval_half_open(decay_value, "decay_value")?;
        validate_positive_count(decay_every, "decay_every")?;

        let mut td = Self::with_scaler(compression, Scaler::default())?;
        td.decay_value = Some(decay_value);
        td.decay_every = Some(decay_every);
        Ok(td)
    }

    /// Returns the compression parameter.
    pub fn compression(&self) -> f64 {
        self.compression
    }

    /// Returns the configured scale function.
    pub fn scaler(&self) -> Scaler {
        self.scaler
    }

    /// Sets the scale function used for subsequent compressions.
    ///
    /// Changing this mid-stream is legal; it only affects compressions
    /// that happen afterward.
    pub fn set_scaler(&mut self, scaler: Scaler) {
        self.scaler = scaler;
    }

    /// Returns the number of centroids currently held, forcing any
    /// buffered samples to be compressed first.
    pub fn centroid_count(&mut self) -> usize {
        self.force_process();
        self.processed.len()
    }

    /// Returns the total weight (number of samples added, counting
    /// weighted samples by their weight).
    pub fn count(&self) -> f64 {
        self.processed_weight + self.unprocessed_weight
    }

    /// Returns the minimum sample mean ever observed.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Returns the maximum sample mean ever observed.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Returns the (mean, weight) pairs of every centroid, forcing any
    /// buffered samples to be compressed first.
    pub fn centroids(&mut self) -> Vec<(f64, f64)> {
        self.force_process();
        self.processed.iter().map(|c| (c.mean, c.weight)).collect()
    }

    /// Adds a single unit-weight sample.
    ///
    /// Non-finite values are silently ignored: this is a programmer error,
    /// not something a streaming sketch should panic on.
    ///
    /// # Examples
    ///
    /// ```
    /// use tdigest_oxide::quantiles::TDigest;
    ///
    /// let mut td = TDigest::new();
    /// td.update(42.0);
    /// td.update(100.0);
    /// ```
    pub fn update(&mut self, x: f64) {
        self.update_weighted(x, 1.0);
    }

    /// Adds a sample with an explicit weight.
    ///
    /// Non-finite `x` or non-positive `w` is silently ignored.
    pub fn update_weighted(&mut self, x: f64, w: f64) {
        if !x.is_finite() || !(w > 0.0) {
            return;
        }

        if self.unprocessed.len() >= self.max_unprocessed {
            self.process();
        }

        self.unprocessed.push(Centroid { mean: x, weight: w });
        self.unprocessed_weight += w;

        if x < self.min {
            self.min = x;
        }
        if x > self.max {
            self.max = x;
        }

        if let (Some(decay_value), Some(decay_every)) = (self.decay_value, self.decay_every) {
            self.add_count += 1;
            if self.add_count % decay_every == 0 {
                self.apply_decay(decay_value);
            }
        }
    }

    fn apply_decay(&mut self, decay_value: f64) {
        for c in &mut self.processed {
            c.weight *= decay_value;
        }
        for c in &mut self.unprocessed {
            c.weight *= decay_value;
        }
        self.processed_weight *= decay_value;
        self.unprocessed_weight *= decay_value;
        self.cumulative_valid = false;
    }

    /// Appends every centroid of `list` (mean, weight pairs) into the
    /// unprocessed buffer, triggering compression whenever the buffer
    /// bound is hit.
    pub fn add_centroid_list(&mut self, list: &[(f64, f64)]) {
        for &(mean, weight) in list {
            if !mean.is_finite() || !(weight > 0.0) {
                continue;
            }

            if self.unprocessed.len() >= self.max_unprocessed {
                self.process();
            }

            self.unprocessed.push(Centroid { mean, weight });
            self.unprocessed_weight += weight;

            if mean < self.min {
                self.min = mean;
            }
            if mean > self.max {
                self.max = mean;
            }
        }
    }

    fn force_process(&mut self) {
        if !self.unprocessed.is_empty() {
            self.process();
        }
    }

    /// Force-merges the unprocessed buffer into the processed centroid
    /// list under the scale function's size bound.
    fn process(&mut self) {
        if self.unprocessed.is_empty() {
            return;
        }

        let mut merged = Vec::with_capacity(self.processed.len() + self.unprocessed.len());
        merged.append(&mut self.processed);
        merged.append(&mut self.unprocessed);
        merged.sort_by(|a, b| a.mean.partial_cmp(&b.mean).unwrap_or(Ordering::Equal));

        let total_weight = self.processed_weight + self.unprocessed_weight;
        self.unprocessed_weight = 0.0;

        if merged.is_empty() {
            self.processed = merged;
            self.processed_weight = 0.0;
            self.cumulative_valid = false;
            return;
        }

        let norm = self.scaler.normalizer(self.compression, total_weight);

        let mut output: Vec<Centroid> = Vec::with_capacity(merged.len());
        let mut iter = merged.into_iter();
        let mut current = iter.next().expect("merged is non-empty");
        let mut so_far = 0.0_f64;

        for c in iter {
            let candidate_weight = current.weight + c.weight;
            let q_before = so_far / total_weight;
            let q_after = (so_far + candidate_weight) / total_weight;
            let span = self.scaler.k(q_after, norm) - self.scaler.k(q_before, norm);

            if span <= 1.0 {
                current.mean += (c.mean - current.mean) * (c.weight / candidate_weight);
                current.weight = candidate_weight;
            } else {
                so_far += current.weight;
                output.push(current);
                current = c;
            }
        }
        output.push(current);

        self.processed = output;
        self.processed_weight = total_weight;
        self.cumulative_valid = false;
    }

    fn ensure_cumulative(&mut self) {
        if self.cumulative_valid {
            return;
        }

        let mut cum = Vec::with_capacity(self.processed.len() + 1);
        let mut running = 0.0_f64;
        for c in &self.processed {
            cum.push(running + c.weight / 2.0);
            running += c.weight;
        }
        cum.push(self.processed_weight);

        self.cumulative = cum;
        self.cumulative_valid = true;
    }

    /// Resets the sketch to empty, keeping its compression, scale function,
    /// and decay configuration.
    pub fn clear(&mut self) {
        self.processed.clear();
        self.unprocessed.clear();
        self.cumulative.clear();
        self.cumulative_valid = false;
        self.processed_weight = 0.0;
        self.unprocessed_weight = 0.0;
        self.min = f64::INFINITY;
        self.max = f64::NEG_INFINITY;
        self.add_count = 0;
    }

    /// Returns the estimated value at rank `q` (0.0 to 1.0).
    ///
    /// `q` is clamped into `[0.0, 1.0]`. Returns `NaN` if the sketch is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use tdigest_oxide::quantiles::TDigest;
    ///
    /// let mut td = TDigest::new();
    /// for i in 0..1000 {
    ///     td.update(i as f64);
    /// }
    ///
    /// let p50 = td.quantile(0.5);
    /// let p99 = td.quantile(0.99);
    /// assert!(p50 < p99);
    /// ```
    pub fn quantile(&mut self, q: f64) -> f64 {
        self.force_process();

        if self.processed.is_empty() {
            return f64::NAN;
        }

        let q = q.clamp(0.0, 1.0);

        if self.processed.len() == 1 {
            return self.processed[0].mean;
        }

        self.ensure_cumulative();

        let w = self.processed_weight;
        let target = q * w;
        let n = self.processed.len();

        let first = &self.processed[0];
        let half_first = first.weight / 2.0;
        if target <= half_first {
            return if half_first > 0.0 {
                self.min + (target / half_first) * (first.mean - self.min)
            } else {
                self.min
            };
        }

        let last = &self.processed[n - 1];
        let half_last = last.weight / 2.0;
        if target >= w - half_last {
            let remaining = w - target;
            return if half_last > 0.0 {
                self.max - (remaining / half_last) * (self.max - last.mean)
            } else {
                self.max
            };
        }

        let mut i = 0usize;
        for j in 0..(n - 1) {
            i = j;
            if target <= self.cumulative[j + 1] {
                break;
            }
        }

        let lo = self.cumulative[i];
        let hi = self.cumulative[i + 1];
        let frac = if hi > lo { (target - lo) / (hi - lo) } else { 0.0 };
        self.processed[i].mean + (self.processed[i + 1].mean - self.processed[i].mean) * frac
    }

    /// Returns the estimated fraction of samples `<= x`.
    ///
    /// Returns `NaN` if the sketch is empty.
    pub fn cdf(&mut self, x: f64) -> f64 {
        self.force_process();

        if self.processed.is_empty() {
            return f64::NAN;
        }
        if x < self.min {
            return 0.0;
        }
        if x > self.max {
            return 1.0;
        }

        let n = self.processed.len();
        if n == 1 {
            let mean = self.processed[0].mean;
            return match x.partial_cmp(&mean) {
                Some(Ordering::Less) => 0.0,
                Some(Ordering::Greater) => 1.0,
                _ => 0.5,
            };
        }

        let w = self.processed_weight;
        let first_mean = self.processed[0].mean;
        if x <= first_mean {
            let span = first_mean - self.min;
            let frac = if span > 0.0 { (x - self.min) / span } else { 1.0 };
            return frac * (self.processed[0].weight / 2.0) / w;
        }

        let last_mean = self.processed[n - 1].mean;
        if x >= last_mean {
            let last_weight = self.processed[n - 1].weight;
            let span = self.max - last_mean;
            let frac = if span > 0.0 { (x - last_mean) / span } else { 0.0 };
            let base = w - last_weight / 2.0;
            return (base + frac * (last_weight / 2.0)) / w;
        }

        self.ensure_cumulative();

        let mut i = 0usize;
        for j in 0..(n - 1) {
            i = j;
            if x <= self.processed[j + 1].mean {
                break;
            }
        }

        let m0 = self.processed[i].mean;
        let m1 = self.processed[i + 1].mean;
        let c0 = self.cumulative[i];
        let c1 = self.cumulative[i + 1];
        let frac = if m1 > m0 { (x - m0) / (m1 - m0) } else { 0.0 };
        (c0 + frac * (c1 - c0)) / w
    }

    /// Returns the weighted mean of every centroid whose mean lies in
    /// `[quantile(low), quantile(high)]`.
    ///
    /// Falls back to the midpoint of the two quantile bounds if no
    /// centroid falls in range.
    pub fn trimmed_mean(&mut self, low: f64, high: f64) -> f64 {
        let low_val = self.quantile(low);
        let high_val = self.quantile(high);

        self.force_process();

        if self.processed.is_empty() {
            return f64::NAN;
        }

        let mut sum = 0.0;
        let mut weight = 0.0;
        for c in &self.processed {
            if c.mean >= low_val && c.mean <= high_val {
                sum += c.mean * c.weight;
                weight += c.weight;
            }
        }

        if weight > 0.0 {
            sum / weight
        } else {
            (low_val + high_val) / 2.0
        }
    }

    /// Serializes this sketch to its binary wire format, forcing any
    /// buffered samples to be compressed first.
    pub fn to_bytes(&mut self) -> Vec<u8> {
        self.force_process();

        let mut out = Vec::with_capacity(2 + 4 + 8 + 4 + self.processed.len() * 16);
        out.extend_from_slice(&MAGIC_BYTES);
        out.extend_from_slice(&ENCODING_VERSION.to_le_bytes());
        out.extend_from_slice(&self.compression.to_le_bytes());
        out.extend_from_slice(&(self.processed.len() as i32).to_le_bytes());

        for c in &self.processed {
            out.extend_from_slice(&c.weight.to_le_bytes());
            out.extend_from_slice(&c.mean.to_le_bytes());
        }

        out
    }

    /// Deserializes a sketch from its binary wire format.
    ///
    /// The decoded sketch has an empty unprocessed buffer and reconstructs
    /// `min`/`max` from the first and last centroid's mean (the wire format
    /// has no dedicated fields for them).
    ///
    /// # Errors
    ///
    /// Returns `SketchError::DeserializationError` for a bad magic value,
    /// unsupported version, negative or oversized centroid count, or
    /// non-finite/unordered centroid means. Returns
    /// `SketchError::UnexpectedEof` if the input is truncated.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut offset = 0usize;

        validate_min_size(bytes.len(), offset + 2)?;
        let magic = u16::from_le_bytes([bytes[offset], bytes[offset + 1]]);
        offset += 2;
        if magic != u16::from_le_bytes(MAGIC_BYTES) {
            return Err(SketchError::DeserializationError(format!(
                "invalid header magic value 0x{:04X}",
                magic
            )));
        }

        validate_min_size(bytes.len(), offset + 4)?;
        let version = i32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap());
        offset += 4;
        if version != ENCODING_VERSION {
            return Err(SketchError::DeserializationError(format!(
                "invalid encoding version {}",
                version
            )));
        }

        validate_min_size(bytes.len(), offset + 8)?;
        let compression = f64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap());
        offset += 8;

        validate_min_size(bytes.len(), offset + 4)?;
        let count = i32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap());
        offset += 4;

        if count < 0 {
            return Err(SketchError::DeserializationError(format!(
                "number of centroids cannot be negative, have {}",
                count
            )));
        }
        if count > MAX_CENTROID_COUNT {
            return Err(SketchError::DeserializationError(format!(
                "invalid n, cannot be greater than 2^20: {}",
                count
            )));
        }
        let count = count as usize;

        validate_byte_size(offset + count * 16)?;

        let mut processed = Vec::with_capacity(count);
        let mut prev_mean: Option<f64> = None;
        for i in 0..count {
            validate_min_size(bytes.len(), offset + 16)?;
            let weight = f64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap());
            let mean = f64::from_le_bytes(bytes[offset + 8..offset + 16].try_into().unwrap());
            offset += 16;

            if mean.is_nan() {
                return Err(SketchError::DeserializationError(
                    "NaN mean not permitted".to_string(),
                ));
            }
            if mean.is_infinite() {
                return Err(SketchError::DeserializationError(
                    "Inf mean not permitted".to_string(),
                ));
            }
            if let Some(prev) = prev_mean {
                if mean < prev {
                    return Err(SketchError::DeserializationError(format!(
                        "centroid {} has lower mean ({}) than preceding centroid {} ({})",
                        i,
                        mean,
                        i - 1,
                        prev
                    )));
                }
            }
            prev_mean = Some(mean);
            processed.push(Centroid { mean, weight });
        }

        let processed_weight: f64 = processed.iter().map(|c| c.weight).sum();
        let (min, max) = if processed.is_empty() {
            (f64::INFINITY, f64::NEG_INFINITY)
        } else {
            (processed[0].mean, processed[processed.len() - 1].mean)
        };

        let mut td = Self::with_compression(compression)?;
        td.processed = processed;
        td.processed_weight = processed_weight;
        td.min = min;
        td.max = max;
        Ok(td)
    }
}

impl Default for TDigest {
    fn default() -> Self {
        Self::new()
    }
}

impl Sketch for TDigest {
    type Item = f64;

    fn update(&mut self, item: &Self::Item) {
        self.update(*item);
    }

    /// Returns the median as the primary point estimate.
    fn estimate(&self) -> f64 {
        let mut td = self.clone();
        td.quantile(0.5)
    }

    fn is_empty(&self) -> bool {
        self.processed.is_empty() && self.unprocessed.is_empty()
    }

    fn serialize(&self) -> Vec<u8> {
        let mut td = self.clone();
        td.to_bytes()
    }

    fn deserialize(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}

impl Mergeable for TDigest {
    /// Merges another T-Digest's centroids into this one.
    ///
    /// A difference in compression or scale function between the two
    /// sketches is not an error: the combined centroids are simply
    /// re-compressed under this sketch's own configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use tdigest_oxide::quantiles::TDigest;
    /// use tdigest_oxide::common::Mergeable;
    ///
    /// let mut td1 = TDigest::new();
    /// let mut td2 = TDigest::new();
    ///
    /// for i in 0..500 {
    ///     td1.update(i as f64);
    /// }
    /// for i in 500..1000 {
    ///     td2.update(i as f64);
    /// }
    ///
    /// td1.merge(&td2).unwrap();
    /// ```
    fn merge(&mut self, other: &Self) -> Result<()> {
        let mut other_clone = other.clone();
        other_clone.force_process();

        let pairs: Vec<(f64, f64)> = other_clone
            .processed
            .iter()
            .map(|c| (c.mean, c.weight))
            .collect();
        self.add_centroid_list(&pairs);

        self.min = self.min.min(other_clone.min);
        self.max = self.max.max(other_clone.max);

        Ok(())
    }
}
