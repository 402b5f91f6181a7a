//! Product rating attached to an ordered product.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error building a [`Rating`] from a raw value.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rating must be between {min} and {max}, got {got}")]
pub struct RatingError {
    /// Lowest accepted value.
    pub min: u8,
    /// Highest accepted value.
    pub max: u8,
    /// The rejected input.
    pub got: u8,
}

/// A 1-5 star rating a client leaves on a product they ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    /// Lowest accepted rating.
    pub const MIN: u8 = 1;
    /// Highest accepted rating.
    pub const MAX: u8 = 5;

    /// Build a rating, rejecting values outside 1-5.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError`] when `value` is out of range.
    pub const fn new(value: u8) -> Result<Self, RatingError> {
        if value >= Self::MIN && value <= Self::MAX {
            Ok(Self(value))
        } else {
            Err(RatingError {
                min: Self::MIN,
                max: Self::MAX,
                got: value,
            })
        }
    }

    /// The underlying star count.
    #[must_use]
    pub const fn stars(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/5", self.0)
    }
}
