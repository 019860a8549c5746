//! Highest posterior density regions.
//!
//! The region for probability `p` is `{x : density(x) >= t}` where the threshold `t` is
//! the largest level whose super-level set still holds mass `p`. It is the narrowest set
//! with that mass, and unlike equal-tailed quantiles it follows the skew of the density.
//! `t` is found greedily: grid cells are visited by decreasing density and their
//! trapezoid mass accumulated until `p` is reached.

use crate::MarginalToolkit;
use crate::error::{MarginalError, Result};
use crate::marginal::Marginal;
use crate::toolkit::DensityGrid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single credible interval `[lower, upper]` for a target probability.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CredibleInterval {
    pub lower: f64,
    pub upper: f64,
    pub probability: f64,
}

impl CredibleInterval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, x: f64) -> bool {
        self.lower <= x && x <= self.upper
    }
}

/// Union of the disjoint intervals above the HPD threshold.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HpdRegion {
    /// Disjoint, ordered by value.
    pub intervals: Vec<CredibleInterval>,
    /// Density level (unit-mass scale) bounding the region.
    pub threshold: f64,
    pub probability: f64,
    /// Mass actually enclosed by `intervals`.
    pub mass: f64,
}

impl HpdRegion {
    /// Convex hull of the region as a single interval, `None` for an empty region.
    pub fn hull(&self) -> Option<CredibleInterval> {
        let (first, last) = (self.intervals.first()?, self.intervals.last()?);
        Some(CredibleInterval {
            lower: first.lower,
            upper: last.upper,
            probability: self.probability,
        })
    }

    pub fn is_contiguous(&self) -> bool {
        self.intervals.len() == 1
    }
}

impl MarginalToolkit {
    /// Narrowest single interval holding `probability` of the posterior mass.
    ///
    /// For multi-modal marginals the HPD set may be disconnected; this returns its convex
    /// hull (smallest lower bound, largest upper bound), which then holds at least
    /// `probability`. Use [`hpd_region`](Self::hpd_region) to get the pieces.
    ///
    /// # Errors
    /// Returns `InvalidInput` unless `0 < probability < 1`.
    pub fn hpd_interval(&self, marginal: &Marginal, probability: f64) -> Result<CredibleInterval> {
        self.hpd_region(marginal, probability)?
            .hull()
            .ok_or_else(|| MarginalError::invalid("HPD region has no mass above its threshold"))
    }

    /// HPD set for `probability` as a union of disjoint intervals.
    ///
    /// # Errors
    /// Returns `InvalidInput` unless `0 < probability < 1`.
    pub fn hpd_region(&self, marginal: &Marginal, probability: f64) -> Result<HpdRegion> {
        if !(probability > 0.0 && probability < 1.0) {
            return Err(MarginalError::invalid(format!(
                "HPD probability must lie in (0, 1), got {probability}"
            )));
        }
        let grid = self.grid(marginal)?;
        let accepted = greedy_cells(&grid, probability);
        let threshold = accepted
            .iter()
            .zip(&grid.ds)
            .filter(|(keep, _)| **keep)
            .map(|(_, d)| *d)
            .fold(f64::INFINITY, f64::min);

        let intervals: Vec<CredibleInterval> = runs(&accepted)
            .into_iter()
            .map(|(a, b)| CredibleInterval {
                lower: run_lower(&grid, a, threshold),
                upper: run_upper(&grid, b, threshold),
                probability,
            })
            .collect();
        let mass = intervals
            .iter()
            .map(|iv| grid.cdf(iv.upper) - grid.cdf(iv.lower))
            .sum();

        tracing::debug!(
            probability,
            threshold,
            pieces = intervals.len(),
            mass,
            "hpd region"
        );
        Ok(HpdRegion {
            intervals,
            threshold,
            probability,
            mass,
        })
    }
}

/// Mark grid points by decreasing density until their trapezoid weight reaches `probability`.
fn greedy_cells(grid: &DensityGrid, probability: f64) -> Vec<bool> {
    let n = grid.xs.len();
    let mut order: Vec<usize> = (0..n).collect();
    // Stable: ties resolve towards lower values.
    order.sort_by(|&i, &j| grid.ds[j].total_cmp(&grid.ds[i]));

    let mut accepted = vec![false; n];
    let mut mass = 0.0;
    for i in order {
        accepted[i] = true;
        let left = if i == 0 { grid.xs[0] } else { grid.xs[i - 1] };
        let right = if i == n - 1 { grid.xs[n - 1] } else { grid.xs[i + 1] };
        mass += grid.ds[i] * 0.5 * (right - left);
        if mass >= probability {
            break;
        }
    }
    accepted
}

/// Maximal runs `(first, last)` of accepted indices.
fn runs(accepted: &[bool]) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, &keep) in accepted.iter().enumerate() {
        match (keep, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                out.push((s, i - 1));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push((s, accepted.len() - 1));
    }
    out
}

/// Threshold crossing on the cell left of run start `a`.
fn run_lower(grid: &DensityGrid, a: usize, threshold: f64) -> f64 {
    if a == 0 {
        return grid.xs[0];
    }
    let (d_out, d_in) = (grid.ds[a - 1], grid.ds[a]);
    if d_in <= d_out {
        return grid.xs[a];
    }
    let frac = ((threshold - d_out) / (d_in - d_out)).clamp(0.0, 1.0);
    grid.xs[a - 1] + frac * (grid.xs[a] - grid.xs[a - 1])
}

/// Threshold crossing on the cell right of run end `b`.
fn run_upper(grid: &DensityGrid, b: usize, threshold: f64) -> f64 {
    let n = grid.xs.len();
    if b == n - 1 {
        return grid.xs[n - 1];
    }
    let (d_in, d_out) = (grid.ds[b], grid.ds[b + 1]);
    if d_in <= d_out {
        return grid.xs[b];
    }
    let frac = ((d_in - threshold) / (d_in - d_out)).clamp(0.0, 1.0);
    grid.xs[b] + frac * (grid.xs[b + 1] - grid.xs[b])
}
