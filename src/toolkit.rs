//! The toolkit itself and the integration grid behind its probability computations.
//!
//! Marginals from latent Gaussian solvers are often tabulated on uneven knots, e.g. log
//! spaced for precisions. Every grid built here therefore keeps the knots and places
//! extra points inside the segments, weighted by the segment's interpolated mass and width.

use crate::config::{SupportPolicy, ToolkitConfig};
use crate::error::{MarginalError, Result};
use crate::interp::Interpolant;
use crate::marginal::{Marginal, linspace, refine, trapezoid};
use rand::Rng;

/// Post-processing operations on posterior marginals.
///
/// The toolkit is a pure function bundle around a validated [`ToolkitConfig`]: every
/// operation reads its inputs and allocates its outputs, so a single toolkit can be
/// shared freely between threads.
///
/// Probability computations (HPD regions, cdf, quantiles, moments, sampling) use the
/// interpolated density normalised to unit mass on a grid of at least `grid_points`
/// values that contains every knot. [`density_at`](Self::density_at) returns the
/// interpolated curve as is.
///
/// # Example
/// ```rust
/// use posterior_marginals::{Marginal, MarginalToolkit};
/// use statrs::distribution::Normal;
///
/// let toolkit = MarginalToolkit::default();
/// let normal = Normal::new(0.0, 1.0).unwrap();
/// let marginal = Marginal::from_continuous(&normal, -6.0, 6.0, 41).unwrap();
///
/// let smooth = toolkit.resample(&marginal, 400).unwrap();
/// assert_eq!(smooth.knot_count(), 400);
///
/// let interval = toolkit.hpd_interval(&marginal, 0.95).unwrap();
/// assert!((interval.upper - 1.96).abs() < 0.02);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MarginalToolkit {
    config: ToolkitConfig,
}

impl MarginalToolkit {
    /// # Errors
    /// Returns `InvalidInput` if the configuration does not validate.
    pub fn new(config: ToolkitConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ToolkitConfig {
        &self.config
    }

    /// Interpolate `marginal` onto `n_points` values spanning its support.
    ///
    /// With `n_points` at least the knot count, every knot is kept and the extra points are
    /// spread inside the segments by interpolated mass and width; fewer points are equally
    /// spaced. The first and last output values are exactly the support bounds of the
    /// input, and the densities are rescaled so the trapezoid mass equals the input's.
    ///
    /// # Errors
    /// Returns `InvalidInput` if `n_points < 2`.
    pub fn resample(&self, marginal: &Marginal, n_points: usize) -> Result<Marginal> {
        if n_points < 2 {
            return Err(MarginalError::invalid(format!(
                "resampling needs at least 2 points, got {n_points}"
            )));
        }
        let interp = self.interpolant(marginal);
        let values = match n_points.checked_sub(marginal.knot_count()) {
            Some(extra) => refine(marginal.values(), &segment_weights(marginal, &interp), extra),
            None => {
                let (lower, upper) = marginal.support();
                linspace(lower, upper, n_points)
            }
        };
        let mut densities: Vec<f64> = values.iter().map(|&x| interp.eval(x).max(0.0)).collect();
        let mass = trapezoid(&values, &densities);
        if mass > 0.0 {
            let scale = marginal.mass() / mass;
            densities.iter_mut().for_each(|d| *d *= scale);
        }
        Marginal::new(values, densities)
    }

    /// Interpolated density at `x`.
    ///
    /// Outside the support the result depends on [`SupportPolicy`]: zero under `ZeroFill`,
    /// an `OutOfSupport` error under `Strict`.
    ///
    /// # Errors
    /// Returns `InvalidInput` for a non-finite `x`, and `OutOfSupport` as described above.
    pub fn density_at(&self, marginal: &Marginal, x: f64) -> Result<f64> {
        if !x.is_finite() {
            return Err(MarginalError::invalid(format!(
                "cannot evaluate a density at {x}"
            )));
        }
        let (lower, upper) = marginal.support();
        if x < lower || x > upper {
            return match self.config.support_policy {
                SupportPolicy::ZeroFill => Ok(0.0),
                SupportPolicy::Strict => Err(MarginalError::OutOfSupport { x, lower, upper }),
            };
        }
        Ok(self.interpolant(marginal).eval(x).max(0.0))
    }

    /// Cumulative probability `P(X <= x)`; 0 below the support and 1 above it.
    ///
    /// # Errors
    /// Returns `InvalidInput` if `x` is NaN.
    pub fn cdf(&self, marginal: &Marginal, x: f64) -> Result<f64> {
        if x.is_nan() {
            return Err(MarginalError::invalid("cdf evaluated at NaN"));
        }
        Ok(self.grid(marginal)?.cdf(x))
    }

    /// Inverse cdf.
    ///
    /// # Errors
    /// Returns `InvalidInput` if `p` is outside `[0, 1]`.
    pub fn quantile(&self, marginal: &Marginal, p: f64) -> Result<f64> {
        check_unit_interval(p)?;
        Ok(self.grid(marginal)?.quantile(p))
    }

    /// Posterior expectation `E[g(X)]`.
    ///
    /// # Errors
    /// Returns `InvalidInput` if `g` produces a non-finite integral.
    pub fn expectation<G>(&self, marginal: &Marginal, g: G) -> Result<f64>
    where
        G: Fn(f64) -> f64,
    {
        let value = self.grid(marginal)?.integrate(g);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(MarginalError::invalid(
                "expectation is not finite over the support",
            ))
        }
    }

    /// Location of the highest interpolated density.
    ///
    /// # Errors
    /// Propagates grid construction errors.
    pub fn mode(&self, marginal: &Marginal) -> Result<f64> {
        Ok(self.grid(marginal)?.mode())
    }

    /// Draw `n` values by inverse-cdf sampling.
    ///
    /// # Example
    /// ```rust
    /// # use posterior_marginals::{Marginal, MarginalToolkit};
    /// # use rand::SeedableRng;
    /// # use rand::rngs::StdRng;
    /// let marginal = Marginal::from_fn(0.0, 1.0, 11, |_| 1.0).unwrap();
    /// let draws = MarginalToolkit::default()
    ///     .sample(&marginal, &mut StdRng::seed_from_u64(0), 100)
    ///     .unwrap();
    /// assert!(draws.iter().all(|x| (0.0..=1.0).contains(x)));
    /// ```
    ///
    /// # Errors
    /// Propagates grid construction errors.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        marginal: &Marginal,
        rng: &mut R,
        n: usize,
    ) -> Result<Vec<f64>> {
        let grid = self.grid(marginal)?;
        Ok((0..n).map(|_| grid.quantile(rng.r#gen::<f64>())).collect())
    }
}

impl MarginalToolkit {
    pub(crate) fn interpolant<'a>(&self, marginal: &'a Marginal) -> Interpolant<'a> {
        Interpolant::new(
            marginal.values(),
            marginal.densities(),
            self.config.interpolation,
        )
    }

    /// Normalised density on the integration grid.
    pub(crate) fn grid(&self, marginal: &Marginal) -> Result<DensityGrid> {
        let interp = self.interpolant(marginal);
        let extra = self
            .config
            .grid_points
            .saturating_sub(marginal.knot_count());
        let xs = refine(marginal.values(), &segment_weights(marginal, &interp), extra);
        let raw: Vec<f64> = xs.iter().map(|&x| interp.eval(x).max(0.0)).collect();
        DensityGrid::new(xs, raw)
    }
}

/// Share of a grid's extra points owed to each knot segment: half by interpolated mass,
/// half by width.
fn segment_weights(marginal: &Marginal, interp: &Interpolant<'_>) -> Vec<f64> {
    let masses: Vec<f64> = interp
        .segment_integrals()
        .into_iter()
        .map(|m| m.max(0.0))
        .collect();
    let total: f64 = masses.iter().sum();
    let (lower, upper) = marginal.support();
    let span = upper - lower;
    marginal
        .values()
        .windows(2)
        .zip(&masses)
        .map(|(w, &m)| {
            let by_width = 0.5 * (w[1] - w[0]) / span;
            if total > 0.0 {
                by_width + 0.5 * m / total
            } else {
                2.0 * by_width
            }
        })
        .collect()
}

pub(crate) fn check_unit_interval(p: f64) -> Result<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(MarginalError::invalid(format!(
            "probability must lie in [0, 1], got {p}"
        )))
    }
}

/// Tabulation of a unit-mass density with its trapezoid cdf.
///
/// Within a cell the density is treated as linear, so `cdf` and `quantile` are exact
/// inverses of each other.
#[derive(Debug, Clone)]
pub(crate) struct DensityGrid {
    pub(crate) xs: Vec<f64>,
    pub(crate) ds: Vec<f64>,
    pub(crate) cum: Vec<f64>,
}

impl DensityGrid {
    fn new(xs: Vec<f64>, raw: Vec<f64>) -> Result<Self> {
        let mut cum = Vec::with_capacity(xs.len());
        cum.push(0.0);
        for k in 1..xs.len() {
            let cell = 0.5 * (xs[k] - xs[k - 1]) * (raw[k - 1] + raw[k]);
            cum.push(cum[k - 1] + cell);
        }
        let mass = cum[cum.len() - 1];
        if !(mass > 0.0 && mass.is_finite()) {
            return Err(MarginalError::invalid(
                "interpolated density has no mass on the grid",
            ));
        }
        let ds = raw.iter().map(|d| d / mass).collect();
        cum.iter_mut().for_each(|c| *c /= mass);
        let last = cum.len() - 1;
        cum[last] = 1.0;
        Ok(Self { xs, ds, cum })
    }

    pub(crate) fn cdf(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if x <= self.xs[0] {
            return 0.0;
        }
        if x >= self.xs[n - 1] {
            return 1.0;
        }
        let k = self.xs.partition_point(|&v| v <= x) - 1;
        let s = x - self.xs[k];
        let h = self.xs[k + 1] - self.xs[k];
        let slope = (self.ds[k + 1] - self.ds[k]) / h;
        (self.cum[k] + s * (self.ds[k] + 0.5 * slope * s)).min(1.0)
    }

    pub(crate) fn quantile(&self, p: f64) -> f64 {
        let n = self.xs.len();
        if p <= 0.0 {
            // Leftmost point with mass to its right.
            let k = self.cum.partition_point(|&c| c <= 0.0);
            return self.xs[k.saturating_sub(1)];
        }
        if p >= 1.0 {
            let k = self.cum.partition_point(|&c| c < 1.0);
            return self.xs[k.min(n - 1)];
        }
        let k = (self.cum.partition_point(|&c| c < p) - 1).min(n - 2);
        let h = self.xs[k + 1] - self.xs[k];
        let remaining = p - self.cum[k];
        let d0 = self.ds[k];
        let slope = (self.ds[k + 1] - d0) / h;
        // Root of d0 s + slope s^2 / 2 = remaining, in the form stable for slope -> 0.
        let denom = d0 + (d0 * d0 + 2.0 * slope * remaining).max(0.0).sqrt();
        let s = if denom > 0.0 {
            2.0 * remaining / denom
        } else {
            0.0
        };
        self.xs[k] + s.clamp(0.0, h)
    }

    /// Trapezoid integral of `g(x) * density(x)`.
    pub(crate) fn integrate<G: Fn(f64) -> f64>(&self, g: G) -> f64 {
        let values: Vec<f64> = self
            .xs
            .iter()
            .zip(&self.ds)
            .map(|(&x, &d)| if d > 0.0 { g(x) * d } else { 0.0 })
            .collect();
        trapezoid(&self.xs, &values)
    }

    pub(crate) fn mode(&self) -> f64 {
        let best = self
            .ds
            .iter()
            .enumerate()
            .fold(0, |best, (i, d)| if *d > self.ds[best] { i } else { best });
        self.xs[best]
    }
}
