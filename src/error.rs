//! Error type shared by both dictionary implementations.

use thiserror::Error;

/// Failures surfaced by dictionary construction and keyed operations.
///
/// A missing key is never an error: lookups and removals report it as
/// `None`. Every error is raised before the structure is touched.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum DictError {
    /// Load factor was zero, negative or NaN.
    #[error("illegal load factor: {0}")]
    InvalidLoadFactor(f32),
    /// The key has no total order against itself or a stored key
    /// (for example a NaN float used as a tree key).
    #[error("key cannot be ordered against the keys in this tree")]
    IncomparableKey,
}
