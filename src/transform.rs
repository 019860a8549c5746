//! Change of variables for marginals.
//!
//! For `Y = f(X)` with `f` monotone, `p_Y(f(v)) = p_X(v) / |f'(v)|`. A typical use is
//! turning the marginal of a precision `τ` into one for the standard deviation
//! `σ = 1 / sqrt(τ)`.
//!
//! Non-monotone functions are handled approximately. The source density is tabulated on
//! the toolkit's integration grid, and the mass of every grid cell is spread evenly over
//! the cell's image on an equally spaced output grid, so the branches of `f` add up
//! wherever they overlap. The output densities are bin averages. They stay finite next to
//! a turning point, where the exact density is unbounded. The total mass equals the
//! source's trapezoid mass.

use crate::MarginalToolkit;
use crate::error::{MarginalError, Result};
use crate::marginal::{Marginal, linspace};
use crate::toolkit::DensityGrid;

impl MarginalToolkit {
    /// Marginal of `f(X)`, with `|f'|` estimated by central finite differences.
    ///
    /// # Example
    /// ```rust
    /// use posterior_marginals::{Marginal, MarginalToolkit};
    /// use statrs::distribution::Gamma;
    ///
    /// let toolkit = MarginalToolkit::default();
    /// let precision = Gamma::new(20.0, 20.0).unwrap();
    /// let tau = Marginal::from_continuous(&precision, 0.3, 2.5, 100).unwrap();
    /// let sigma = toolkit.transform(&tau, |t| (1.0 / t).sqrt()).unwrap();
    /// let (lo, hi) = sigma.support();
    /// assert!(lo < 1.0 && 1.0 < hi);
    /// ```
    ///
    /// # Errors
    /// Returns `InvalidInput` if `f` is not finite at some knot (or, for a non-monotone
    /// `f`, at some grid point), or if the derivative of a monotone `f` vanishes or cannot
    /// be estimated at some knot.
    pub fn transform<F>(&self, marginal: &Marginal, f: F) -> Result<Marginal>
    where
        F: Fn(f64) -> f64,
    {
        let rel_step = self.config().derivative_step;
        self.transform_with_derivative(marginal, &f, |v| finite_difference(&f, v, rel_step))
    }

    /// Marginal of `f(X)` using the analytic derivative `df`.
    ///
    /// `df` is only consulted when `f` is monotone over the knots.
    ///
    /// # Errors
    /// Same conditions as [`transform`](Self::transform).
    pub fn transform_with_derivative<F, D>(
        &self,
        marginal: &Marginal,
        f: F,
        df: D,
    ) -> Result<Marginal>
    where
        F: Fn(f64) -> f64,
        D: Fn(f64) -> f64,
    {
        let mut mapped = Vec::with_capacity(marginal.knot_count());
        for (v, d) in marginal.knots() {
            let y = f(v);
            if !y.is_finite() {
                return Err(MarginalError::invalid(format!(
                    "transform is undefined at {v} (gives {y})"
                )));
            }
            mapped.push(MappedKnot {
                source: v,
                value: y,
                density: d,
                jacobian: df(v).abs(),
            });
        }

        let increasing = mapped.windows(2).all(|w| w[1].value > w[0].value);
        let decreasing = mapped.windows(2).all(|w| w[1].value < w[0].value);
        if increasing || decreasing {
            return monotone(mapped, decreasing);
        }

        let n = self.config().grid_points;
        tracing::debug!(knots = mapped.len(), grid = n, "non-monotone transform");
        push_forward(&self.grid(marginal)?, &f, marginal.mass(), n)
    }
}

#[derive(Debug, Clone, Copy)]
struct MappedKnot {
    source: f64,
    value: f64,
    density: f64,
    jacobian: f64,
}

impl MappedKnot {
    fn has_jacobian(&self) -> bool {
        self.jacobian.is_finite() && self.jacobian > 0.0
    }
}

fn monotone(mut mapped: Vec<MappedKnot>, reverse: bool) -> Result<Marginal> {
    if let Some(bad) = mapped.iter().find(|k| !k.has_jacobian()) {
        return Err(MarginalError::invalid(format!(
            "transform derivative is {} at {}",
            bad.jacobian, bad.source
        )));
    }
    if reverse {
        mapped.reverse();
    }
    Marginal::from_pairs(mapped.iter().map(|k| (k.value, k.density / k.jacobian)))
}

/// Spread each grid cell's share of `mass` uniformly over its image under `f`, on `n`
/// equally spaced values spanning the image of the grid.
fn push_forward<F>(grid: &DensityGrid, f: &F, mass: f64, n: usize) -> Result<Marginal>
where
    F: Fn(f64) -> f64,
{
    let images: Vec<f64> = grid.xs.iter().map(|&x| f(x)).collect();
    if let Some(i) = images.iter().position(|y| !y.is_finite()) {
        return Err(MarginalError::invalid(format!(
            "transform is undefined at {} (gives {})",
            grid.xs[i], images[i]
        )));
    }
    let lower = images.iter().copied().fold(f64::INFINITY, f64::min);
    let upper = images.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(lower < upper) {
        return Err(MarginalError::invalid("transform maps onto a single point"));
    }

    let bins = n - 1;
    let width = (upper - lower) / bins as f64;
    let bin_of = |y: f64| (((y - lower) / width) as usize).min(bins - 1);
    let mut binned = vec![0.0; bins];
    let mut overlaps = Vec::new();
    for k in 0..grid.xs.len() - 1 {
        let cell = (grid.cum[k + 1] - grid.cum[k]) * mass;
        if cell <= 0.0 {
            continue;
        }
        let (a, b) = if images[k] <= images[k + 1] {
            (images[k], images[k + 1])
        } else {
            (images[k + 1], images[k])
        };
        let (first, last) = (bin_of(a), bin_of(b));
        if first == last {
            binned[first] += cell;
            continue;
        }
        overlaps.clear();
        overlaps.extend((first..=last).map(|j| {
            let lo = (lower + j as f64 * width).max(a);
            let hi = (lower + (j + 1) as f64 * width).min(b);
            (hi - lo).max(0.0)
        }));
        let covered: f64 = overlaps.iter().sum();
        if covered > 0.0 {
            for (j, overlap) in (first..=last).zip(&overlaps) {
                binned[j] += cell * overlap / covered;
            }
        } else {
            binned[first] += cell;
        }
    }

    // Averaging neighbouring bins keeps the trapezoid mass equal to the binned mass.
    let averages: Vec<f64> = binned.iter().map(|m| m / width).collect();
    let mut densities = Vec::with_capacity(n);
    densities.push(averages[0]);
    densities.extend(averages.windows(2).map(|w| 0.5 * (w[0] + w[1])));
    densities.push(averages[bins - 1]);
    tracing::trace!(lower, upper, bins, "pushed grid mass through transform");
    Marginal::new(linspace(lower, upper, n), densities)
}

/// Central difference with a one-sided fallback where `f` is undefined on one side.
fn finite_difference<F: Fn(f64) -> f64>(f: &F, v: f64, rel_step: f64) -> f64 {
    let h = rel_step * v.abs().max(1.0);
    let (ahead, behind) = (f(v + h), f(v - h));
    match (ahead.is_finite(), behind.is_finite()) {
        (true, true) => (ahead - behind) / (2.0 * h),
        (true, false) => (ahead - f(v)) / h,
        (false, true) => (f(v) - behind) / h,
        (false, false) => f64::NAN,
    }
}
