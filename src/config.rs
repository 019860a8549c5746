//! Toolkit configuration.

use crate::error::{MarginalError, Result};
use crate::interp::Interpolation;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What [`MarginalToolkit::density_at`](crate::MarginalToolkit::density_at) does outside the support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SupportPolicy {
    /// Return a density of zero.
    #[default]
    ZeroFill,
    /// Fail with [`MarginalError::OutOfSupport`].
    Strict,
}

/// Numerical settings shared by every toolkit operation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ToolkitConfig {
    /// Size of the grid used for integration, quantiles and HPD search, and of the output
    /// of a non-monotone `transform`. Grids over a marginal always include its knots, so
    /// they grow past this size for marginals with more knots.
    pub grid_points: usize,
    pub interpolation: Interpolation,
    pub support_policy: SupportPolicy,
    /// Relative step for finite-difference derivatives in `transform`.
    pub derivative_step: f64,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            grid_points: 2048,
            interpolation: Interpolation::MonotoneCubic,
            support_policy: SupportPolicy::ZeroFill,
            derivative_step: f64::EPSILON.cbrt(),
        }
    }
}

impl ToolkitConfig {
    /// # Errors
    ///
    /// Returns `InvalidInput` if the grid has fewer than 3 points or the derivative step
    /// is not a small positive number.
    pub fn validate(&self) -> Result<()> {
        if self.grid_points < 3 {
            return Err(MarginalError::invalid(format!(
                "grid_points must be at least 3, got {}",
                self.grid_points
            )));
        }
        if !(self.derivative_step > 0.0 && self.derivative_step < 1.0) {
            return Err(MarginalError::invalid(format!(
                "derivative_step must lie in (0, 1), got {}",
                self.derivative_step
            )));
        }
        Ok(())
    }
}
