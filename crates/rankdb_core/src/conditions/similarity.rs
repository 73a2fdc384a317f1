use std::fmt;
use std::sync::Arc;

use crate::degree::Degree;
use crate::values::ScalarValue;

/// A user-supplied graded comparison between two scalar values.
///
/// Similarity functions must be pure: no mutation of shared state, and safe
/// to call repeatedly with the same inputs. The engine re-evaluates them
/// freely (lazy operators re-run conditions on restart, the fixpoint engine
/// on every iteration).
///
/// A function handed values outside the domain it understands should return
/// [`Degree::ZERO`] rather than panic; all builtins do.
#[derive(Clone)]
pub struct Similarity {
    name: &'static str,
    func: Arc<dyn Fn(&ScalarValue, &ScalarValue) -> Degree + Send + Sync>,
}

impl Similarity {
    pub fn new(
        name: &'static str,
        func: impl Fn(&ScalarValue, &ScalarValue) -> Degree + Send + Sync + 'static,
    ) -> Self {
        Similarity {
            name,
            func: Arc::new(func),
        }
    }

    pub fn eval(&self, a: &ScalarValue, b: &ScalarValue) -> Degree {
        (self.func)(a, b)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 1 on equality, 0 otherwise. The crisp degenerate case.
    pub fn indicator() -> Self {
        Similarity::new("indicator", |a, b| {
            if a == b { Degree::ONE } else { Degree::ZERO }
        })
    }

    /// `max(0, 1 - |a - b| / scale)` over numeric domains; 0 when either
    /// side is non-numeric. `scale` must be positive.
    pub fn linear(scale: f64) -> Self {
        Similarity::new("linear", move |a, b| {
            match (a.numeric_value(), b.numeric_value()) {
                (Some(a), Some(b)) => Degree::saturating(1.0 - (a - b).abs() / scale),
                _ => Degree::ZERO,
            }
        })
    }

    /// Normalized Levenshtein similarity over UTF8 values; 0 when either
    /// side is not a string.
    pub fn text() -> Self {
        Similarity::new("text", |a, b| match (a, b) {
            (ScalarValue::Utf8(a), ScalarValue::Utf8(b)) => {
                Degree::saturating(strsim::normalized_levenshtein(a, b))
            }
            _ => Degree::ZERO,
        })
    }

    /// Exponential decay on the day distance between two dates: a pair
    /// `half_life_days` apart scores 0.5. 0 when either side is not a date.
    pub fn date_decay(half_life_days: f64) -> Self {
        Similarity::new("date_decay", move |a, b| match (a, b) {
            (ScalarValue::Date(a), ScalarValue::Date(b)) => {
                let days = a.signed_duration_since(*b).num_days().abs() as f64;
                Degree::saturating(f64::exp2(-days / half_life_days))
            }
            _ => Degree::ZERO,
        })
    }
}

impl fmt::Debug for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Similarity")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
