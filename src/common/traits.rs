//! Core traits for all sketch implementations

use super::error::SketchError;

/// Core trait that all sketches must implement
///
/// This trait defines the fundamental operations that any data sketch must support:
/// updating with new data, estimating results, checking emptiness, and serialization.
///
/// # SOLID Principles
/// - **Single Responsibility**: This trait focuses solely on core sketch operations
/// - **Interface Segregation**: Minimal interface - only essential operations
/// - **Liskov Substitution**: All implementations must maintain the contract
pub trait Sketch {
    /// The type of items this sketch can process
    type Item;

    /// Update the sketch with a new item
    ///
    /// # Arguments
    /// * `item` - The item to add to the sketch
    fn update(&mut self, item: &Self::Item);

    /// Get the estimated result from the sketch
    ///
    /// The meaning of this value depends on the sketch type:
    /// - Cardinality sketches: estimated number of unique items
    /// - Quantile sketches: varies by query
    /// - Frequency sketches: varies by query
    ///
    /// # Returns
    /// The estimated value as a float
    fn estimate(&self) -> f64;

    /// Check if the sketch is empty (no items added)
    ///
    /// # Returns
    /// `true` if the sketch has not processed any items
    fn is_empty(&self) -> bool;

    /// Serialize the sketch to bytes
    ///
    /// # Returns
    /// A byte vector containing the serialized sketch
    fn serialize(&self) -> Vec<u8>;

    /// Deserialize a sketch from bytes
    ///
    /// # Arguments
    /// * `bytes` - The byte slice containing serialized sketch data
    ///
    /// # Returns
    /// Result containing the deserialized sketch or an error
    ///
    /// # Errors
    /// Returns `SketchError::DeserializationError` if bytes are invalid
    fn deserialize(bytes: &[u8]) -> Result<Self, SketchError>
    where
        Self: Sized;
}

/// Trait for sketches that support merging
///
/// This trait extends `Sketch` with the ability to merge two sketches together.
/// Merging is essential for distributed computing scenarios where sketches
/// are computed independently and then combined.
///
/// # SOLID Principles
/// - **Interface Segregation**: Separate trait for mergeable sketches
///   (not all sketches can be merged, e.g., immutable Binary Fuse Filters)
pub trait Mergeable: Sketch {
    /// Merge another sketch into this one
    ///
    /// After merging, this sketch should represent the union of both sketches.
    ///
    /// # Arguments
    /// * `other` - The sketch to merge into this one
    ///
    /// # Returns
    /// `Ok(())` if merge was successful, or an error if sketches are incompatible
    ///
    /// # Errors
    /// Returns `SketchError::IncompatibleSketches` if sketches are of
    /// incompatible types. A difference in compression or scaler between two
    /// t-digest sketches is not an error: `TDigest::merge` re-compresses the
    /// combined centroids under `self`'s own configuration.
    fn merge(&mut self, other: &Self) -> Result<(), SketchError>;
}
