//! Chunk size limits.
//!
//! Every strategy works with three numbers:
//!
//! - `min`: chunks smaller than this are fragments and get merged away.
//! - `target`: the size the optimizer steers toward.
//! - `max`: the hard ceiling. Never exceeded.
//!
//! ```text
//! min=200        target=800                 max=1200
//!  |---- Less ----|======= Equal ==============|---- Greater ---->
//! ```
//!
//! Sizes are measured in bytes of trimmed text, so a chunk that ends in a
//! run of whitespace is not penalized for it.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Minimum, target and maximum chunk sizes.
///
/// # Examples
///
/// ```rust
/// use strata::SizeLimits;
/// use std::cmp::Ordering;
///
/// let limits = SizeLimits::new(200, 800, 1200).unwrap();
/// assert_eq!(limits.fits(100), Ordering::Less);
/// assert_eq!(limits.fits(900), Ordering::Equal);
/// assert_eq!(limits.fits(1300), Ordering::Greater);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeLimits {
    min: usize,
    target: usize,
    max: usize,
}

impl SizeLimits {
    /// Create limits, checking `0 < min <= target <= max`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when the ordering does not hold.
    pub fn new(min: usize, target: usize, max: usize) -> Result<Self> {
        if min == 0 {
            return Err(Error::invalid_config("min size must be > 0"));
        }
        if min > target {
            return Err(Error::invalid_config(format!(
                "min size ({min}) cannot exceed target size ({target})"
            )));
        }
        if target > max {
            return Err(Error::invalid_config(format!(
                "target size ({target}) cannot exceed max size ({max})"
            )));
        }
        Ok(Self { min, target, max })
    }

    /// Limits for built-in strategy tables. Callers must uphold the ordering.
    pub(crate) const fn fixed(min: usize, target: usize, max: usize) -> Self {
        Self { min, target, max }
    }

    /// Smallest acceptable chunk.
    #[must_use]
    pub const fn min(&self) -> usize {
        self.min
    }

    /// Preferred chunk size.
    #[must_use]
    pub const fn target(&self) -> usize {
        self.target
    }

    /// Largest acceptable chunk.
    #[must_use]
    pub const fn max(&self) -> usize {
        self.max
    }

    /// Classify a size against the limits.
    ///
    /// - `Ordering::Less`: below `min`, must be merged
    /// - `Ordering::Equal`: acceptable (`min..=max`)
    /// - `Ordering::Greater`: above `max`, must be split
    #[must_use]
    pub fn fits(&self, size: usize) -> Ordering {
        if size < self.min {
            Ordering::Less
        } else if size > self.max {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    /// Absolute distance of `size` from the target.
    #[must_use]
    pub fn deviation(&self, size: usize) -> usize {
        size.abs_diff(self.target)
    }

    /// Override individual values, keeping the others.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when the result is inconsistent.
    pub fn with_overrides(
        self,
        min: Option<usize>,
        target: Option<usize>,
        max: Option<usize>,
    ) -> Result<Self> {
        Self::new(
            min.unwrap_or(self.min),
            target.unwrap_or(self.target),
            max.unwrap_or(self.max),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits() {
        let limits = SizeLimits::new(100, 300, 500).unwrap();
        assert_eq!(limits.fits(99), Ordering::Less);
        assert_eq!(limits.fits(100), Ordering::Equal);
        assert_eq!(limits.fits(500), Ordering::Equal);
        assert_eq!(limits.fits(501), Ordering::Greater);
    }

    #[test]
    fn test_invalid_ordering() {
        assert!(SizeLimits::new(0, 10, 20).is_err());
        assert!(SizeLimits::new(30, 10, 20).is_err());
        assert!(SizeLimits::new(5, 30, 20).is_err());
    }

    #[test]
    fn test_overrides_are_validated() {
        let limits = SizeLimits::new(100, 300, 500).unwrap();
        let widened = limits.with_overrides(None, None, Some(900)).unwrap();
        assert_eq!(widened.max(), 900);
        assert_eq!(widened.target(), 300);
        assert!(limits.with_overrides(Some(400), None, None).is_err());
    }
}
