//! Construction parameters for [`ChainedHashTable`](crate::ChainedHashTable).

use crate::error::DictError;

/// Capacity used when none is requested.
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// Bucket arrays never grow past this many slots.
pub const MAXIMUM_CAPACITY: usize = 1 << 30;

pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// Sizing knobs for a chained hash table.
///
/// `initial_capacity` is a request: it is clamped to [`MAXIMUM_CAPACITY`]
/// and rounded up to a power of two when the table is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    pub initial_capacity: usize,
    pub load_factor: f32,
}

impl TableConfig {
    pub fn with_capacity(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            ..Self::default()
        }
    }

    pub fn load_factor(self, load_factor: f32) -> Self {
        Self {
            load_factor,
            ..self
        }
    }

    /// Reject load factors that are zero, negative or NaN.
    pub fn validate(&self) -> Result<(), DictError> {
        if self.load_factor.is_nan() || self.load_factor <= 0.0 {
            return Err(DictError::InvalidLoadFactor(self.load_factor));
        }
        Ok(())
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}
