//! Stateless arithmetic evaluator.

use tracing::debug;

use crate::config::NegativeRootPolicy;
use crate::errors::{CalculatorError, CalculatorResult};

/// Performs integer addition and division and real square roots.
///
/// The only state is the negative-radicand policy, fixed at construction, so
/// a `Calculator` can be copied freely and shared across threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calculator {
    negative_root: NegativeRootPolicy,
}

impl Calculator {
    /// Creates a calculator that rejects negative square roots
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(negative_root: NegativeRootPolicy) -> Self {
        Self { negative_root }
    }

    pub fn negative_root_policy(&self) -> NegativeRootPolicy {
        self.negative_root
    }

    /// Sum of `a` and `b`. Overflow wraps.
    pub fn add(&self, a: i64, b: i64) -> i64 {
        debug!(a, b, "performing addition");
        a.wrapping_add(b)
    }

    /// Quotient of `a` and `b`, truncated toward zero.
    ///
    /// Fails with [`CalculatorError::DivisionByZero`] when `b == 0`.
    /// `i64::MIN / -1` wraps to `i64::MIN`.
    pub fn divide(&self, a: i64, b: i64) -> CalculatorResult<i64> {
        debug!(a, b, "performing division");
        if b == 0 {
            return Err(CalculatorError::DivisionByZero);
        }
        Ok(a.wrapping_div(b))
    }

    /// Non-negative square root of `a`.
    ///
    /// NaN input is always rejected. Negative input follows the configured
    /// [`NegativeRootPolicy`].
    pub fn square_root(&self, a: f64) -> CalculatorResult<f64> {
        debug!(a, "performing square root");
        if a.is_nan() {
            return Err(CalculatorError::InvalidArgument {
                message: "square root of NaN".to_string(),
            });
        }
        if a < 0.0 {
            return match self.negative_root {
                NegativeRootPolicy::Error => Err(CalculatorError::InvalidArgument {
                    message: format!("square root of negative number: {}", a),
                }),
                NegativeRootPolicy::NaN => Ok(f64::NAN),
            };
        }
        // -0.0 compares equal to 0.0 and its sqrt keeps the sign
        if a == 0.0 {
            return Ok(0.0);
        }
        Ok(a.sqrt())
    }
}
