//! Validated container for a discretised scalar posterior marginal.

use crate::error::{MarginalError, Result};
use statrs::distribution::Continuous;

/// A scalar marginal density represented by `(value, density)` knots.
///
/// Values are finite and strictly increasing, densities are finite and non-negative, there
/// are at least two knots and the total (trapezoid) mass is strictly positive. These
/// invariants are checked once at construction, so every [`MarginalToolkit`](crate::MarginalToolkit)
/// operation can rely on them. A marginal is never mutated; transforms build a new one.
///
/// # Example
/// ```rust
/// use posterior_marginals::Marginal;
/// use statrs::distribution::Normal;
///
/// let normal = Normal::new(0.0, 1.0).unwrap();
/// let marginal = Marginal::from_continuous(&normal, -6.0, 6.0, 61).unwrap();
/// assert_eq!(marginal.support(), (-6.0, 6.0));
/// assert!((marginal.mass() - 1.0).abs() < 1e-2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Marginal {
    values: Vec<f64>,
    densities: Vec<f64>,
}

impl Marginal {
    /// Build a marginal from parallel value and density vectors.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the vectors differ in length, hold fewer than two knots,
    /// contain non-finite numbers or negative densities, if the values are not strictly
    /// increasing, or if the curve has zero mass.
    pub fn new(values: Vec<f64>, densities: Vec<f64>) -> Result<Self> {
        if values.len() != densities.len() {
            return Err(MarginalError::invalid(format!(
                "{} values but {} densities",
                values.len(),
                densities.len()
            )));
        }
        if values.len() < 2 {
            return Err(MarginalError::invalid(format!(
                "a marginal needs at least 2 knots, got {}",
                values.len()
            )));
        }
        if let Some(v) = values.iter().find(|v| !v.is_finite()) {
            return Err(MarginalError::invalid(format!("non-finite value {v}")));
        }
        if let Some(i) = values.windows(2).position(|w| w[1] <= w[0]) {
            return Err(MarginalError::invalid(format!(
                "values must be strictly increasing: {} followed by {}",
                values[i],
                values[i + 1]
            )));
        }
        if let Some(d) = densities.iter().find(|d| !d.is_finite() || **d < 0.0) {
            return Err(MarginalError::invalid(format!(
                "densities must be finite and non-negative, got {d}"
            )));
        }

        let marginal = Self { values, densities };
        if marginal.mass() <= 0.0 {
            return Err(MarginalError::invalid("marginal has zero total mass"));
        }
        Ok(marginal)
    }

    /// Build a marginal from `(value, density)` pairs already sorted by value.
    ///
    /// # Errors
    /// Same conditions as [`Marginal::new`].
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let (values, densities) = pairs.into_iter().unzip();
        Self::new(values, densities)
    }

    /// Tabulate `density` at `n` equally spaced knots over `[lower, upper]`.
    ///
    /// # Errors
    /// Returns `InvalidInput` for an empty or non-finite range, `n < 2`, or when the
    /// tabulated densities violate the invariants of [`Marginal::new`].
    pub fn from_fn<F>(lower: f64, upper: f64, n: usize, density: F) -> Result<Self>
    where
        F: Fn(f64) -> f64,
    {
        if !(lower.is_finite() && upper.is_finite() && lower < upper) {
            return Err(MarginalError::invalid(format!(
                "invalid support [{lower}, {upper}]"
            )));
        }
        if n < 2 {
            return Err(MarginalError::invalid(format!(
                "a marginal needs at least 2 knots, got {n}"
            )));
        }
        let values = linspace(lower, upper, n);
        let densities = values.iter().map(|&x| density(x)).collect();
        Self::new(values, densities)
    }

    /// Tabulate the pdf of a `statrs` continuous distribution.
    ///
    /// # Errors
    /// Same conditions as [`Marginal::from_fn`].
    pub fn from_continuous<D>(dist: &D, lower: f64, upper: f64, n: usize) -> Result<Self>
    where
        D: Continuous<f64, f64>,
    {
        Self::from_fn(lower, upper, n, |x| dist.pdf(x))
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn densities(&self) -> &[f64] {
        &self.densities
    }

    /// Iterate over the `(value, density)` knots in value order.
    pub fn knots(&self) -> impl ExactSizeIterator<Item = (f64, f64)> + '_ {
        self.values
            .iter()
            .copied()
            .zip(self.densities.iter().copied())
    }

    pub fn knot_count(&self) -> usize {
        self.values.len()
    }

    /// `(first value, last value)`.
    pub fn support(&self) -> (f64, f64) {
        (self.values[0], self.values[self.values.len() - 1])
    }

    /// Trapezoid integral of the raw knots.
    pub fn mass(&self) -> f64 {
        trapezoid(&self.values, &self.densities)
    }

    /// Copy with densities rescaled so that [`Marginal::mass`] is one.
    pub fn normalized(&self) -> Self {
        let mass = self.mass();
        Self {
            values: self.values.clone(),
            densities: self.densities.iter().map(|d| d / mass).collect(),
        }
    }
}

/// `n` equally spaced points from `lower` to exactly `upper`.
pub(crate) fn linspace(lower: f64, upper: f64, n: usize) -> Vec<f64> {
    let step = (upper - lower) / (n - 1) as f64;
    (0..n)
        .map(|i| {
            if i == n - 1 {
                upper
            } else {
                lower + i as f64 * step
            }
        })
        .collect()
}

/// Every knot plus `extra` points placed inside the segments, segment `k` receiving a
/// share proportional to `weights[k]` (largest remainder). Each segment is cut into equal
/// cells, so the result is strictly increasing and ends exactly on the last knot.
pub(crate) fn refine(knots: &[f64], weights: &[f64], extra: usize) -> Vec<f64> {
    debug_assert_eq!(knots.len(), weights.len() + 1);
    let total: f64 = weights.iter().sum();
    let quotas: Vec<f64> = if total > 0.0 {
        weights.iter().map(|w| extra as f64 * w / total).collect()
    } else {
        vec![extra as f64 / weights.len() as f64; weights.len()]
    };
    let mut counts: Vec<usize> = quotas.iter().map(|q| q.floor() as usize).collect();
    let mut left = extra.saturating_sub(counts.iter().sum());
    let mut order: Vec<usize> = (0..quotas.len()).collect();
    order.sort_by(|&i, &j| {
        let remainder = |k: usize| quotas[k] - counts[k] as f64;
        remainder(j).total_cmp(&remainder(i))
    });
    for &k in order.iter().cycle() {
        if left == 0 {
            break;
        }
        counts[k] += 1;
        left -= 1;
    }

    let mut points = Vec::with_capacity(knots.len() + extra);
    for (segment, &inner) in knots.windows(2).zip(&counts) {
        let cells = inner + 1;
        let h = (segment[1] - segment[0]) / cells as f64;
        points.extend((0..cells).map(|j| segment[0] + j as f64 * h));
    }
    points.push(knots[knots.len() - 1]);
    points
}

pub(crate) fn trapezoid(xs: &[f64], ys: &[f64]) -> f64 {
    xs.windows(2)
        .zip(ys.windows(2))
        .map(|(x, y)| 0.5 * (x[1] - x[0]) * (y[0] + y[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use statrs::distribution::Gamma;

    #[test]
    fn rejects_malformed_knots() {
        let cases = [
            (vec![0.0], vec![1.0]),
            (vec![0.0, 1.0], vec![1.0]),
            (vec![0.0, 0.0], vec![1.0, 1.0]),
            (vec![1.0, 0.0], vec![1.0, 1.0]),
            (vec![0.0, f64::NAN], vec![1.0, 1.0]),
            (vec![0.0, 1.0], vec![-1.0, 1.0]),
            (vec![0.0, 1.0], vec![0.0, 0.0]),
        ];
        for (values, densities) in cases {
            assert!(
                matches!(
                    Marginal::new(values.clone(), densities.clone()),
                    Err(MarginalError::InvalidInput(_))
                ),
                "accepted {values:?} / {densities:?}"
            );
        }
    }

    #[test]
    fn refine_keeps_knots_and_follows_weights() {
        let knots = [0.0, 1.0, 3.0, 3.5];
        let points = refine(&knots, &[0.0, 3.0, 1.0], 8);
        assert_eq!(points.len(), 12);
        assert!(points.windows(2).all(|w| w[1] > w[0]));
        for knot in knots {
            assert!(points.contains(&knot), "{knot} missing");
        }
        // 6 extra points in [1, 3], 2 in [3, 3.5], none in [0, 1].
        assert_eq!(points.iter().filter(|&&x| x > 1.0 && x < 3.0).count(), 6);
        assert_eq!(points.iter().filter(|&&x| x > 3.0 && x < 3.5).count(), 2);
        assert_eq!(points[1], 1.0);

        assert_eq!(refine(&knots, &[1.0, 1.0, 1.0], 0), knots.to_vec());
        assert_eq!(refine(&[0.0, 1.0], &[0.0], 3), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn linspace_hits_both_ends() {
        let xs = linspace(0.1, 0.7, 7);
        assert_eq!(xs.len(), 7);
        assert_eq!(xs[0], 0.1);
        assert_eq!(xs[6], 0.7);
    }

    #[test]
    fn gamma_tabulation_has_unit_mass() {
        let gamma = Gamma::new(2.0, 1.0).unwrap();
        let marginal = Marginal::from_continuous(&gamma, 0.0, 20.0, 200).unwrap();
        assert_relative_eq!(marginal.mass(), 1.0, epsilon = 1e-2);
        assert_relative_eq!(marginal.normalized().mass(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn pairs_and_vectors_agree() {
        let a = Marginal::from_pairs([(0.0, 0.5), (1.0, 1.0), (2.0, 0.5)]).unwrap();
        let b = Marginal::new(vec![0.0, 1.0, 2.0], vec![0.5, 1.0, 0.5]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.knots().len(), 3);
        assert_eq!(a.support(), (0.0, 2.0));
    }
}
