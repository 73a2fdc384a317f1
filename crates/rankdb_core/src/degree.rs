//! Membership degrees.

use std::cmp::Ordering;
use std::fmt;

use rankdb_error::{ErrorKind, RankError, Result};
use serde::{Deserialize, Serialize};

/// A graded truth value in [0, 1].
///
/// Generalizes boolean tuple membership; every record carries one. Construction
/// rejects NaN and out-of-range values, so a `Degree` held anywhere in the
/// engine is always valid and totally ordered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Degree(f64);

impl Degree {
    pub const ZERO: Degree = Degree(0.0);
    pub const ONE: Degree = Degree(1.0);

    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || !(0.0..=1.0).contains(&value) {
            return Err(
                RankError::new(ErrorKind::InvalidDegree, "degree must be in [0, 1]")
                    .with_field("value", value),
            );
        }
        Ok(Degree(value))
    }

    /// Clamp an arbitrary float into [0, 1], mapping NaN to 0.
    ///
    /// Used where a degree is computed from caller-supplied arithmetic
    /// (similarity functions, Łukasiewicz sums) and the result should saturate
    /// rather than fail.
    pub fn saturating(value: f64) -> Self {
        if value.is_nan() {
            return Degree::ZERO;
        }
        Degree(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

impl PartialEq for Degree {
    fn eq(&self, other: &Self) -> bool {
        f64::total_cmp(&self.0, &other.0).is_eq()
    }
}

impl Eq for Degree {}

impl PartialOrd for Degree {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(f64::total_cmp(&self.0, &other.0))
    }
}

impl Ord for Degree {
    fn cmp(&self, other: &Self) -> Ordering {
        f64::total_cmp(&self.0, &other.0)
    }
}

impl fmt::Display for Degree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_out_of_range() {
        assert!(Degree::new(-0.1).is_err());
        assert!(Degree::new(1.1).is_err());
        assert!(Degree::new(f64::NAN).is_err());
        assert!(Degree::new(0.0).is_ok());
        assert!(Degree::new(1.0).is_ok());
    }

    #[test]
    fn saturating_clamps() {
        assert_eq!(Degree::ONE, Degree::saturating(1.5));
        assert_eq!(Degree::ZERO, Degree::saturating(-2.0));
        assert_eq!(Degree::ZERO, Degree::saturating(f64::NAN));
        assert_eq!(Degree::new(0.25).unwrap(), Degree::saturating(0.25));
    }

    #[test]
    fn total_order() {
        let mut degrees = vec![
            Degree::new(0.7).unwrap(),
            Degree::ZERO,
            Degree::ONE,
            Degree::new(0.3).unwrap(),
        ];
        degrees.sort();
        let values: Vec<_> = degrees.iter().map(|d| d.value()).collect();
        assert_eq!(vec![0.0, 0.3, 0.7, 1.0], values);
    }
}
