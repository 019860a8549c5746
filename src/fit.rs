//! Output of a fitted model: named marginals and fitted values with credible bounds.

use crate::error::{MarginalError, Result};
use crate::marginal::Marginal;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Marginals keyed by parameter name, ordered by name.
///
/// Lookup of a missing name is an error rather than a silent `None`, so a typo in a
/// parameter name surfaces where it is made.
///
/// # Example
/// ```rust
/// use posterior_marginals::{Marginal, MarginalError, MarginalSet};
///
/// let mut set = MarginalSet::new();
/// set.insert("(Intercept)", Marginal::from_fn(-1.0, 1.0, 5, |_| 0.5).unwrap()).unwrap();
/// assert!(set.get("(Intercept)").is_ok());
/// assert!(matches!(set.get("x"), Err(MarginalError::UnknownMarginal { .. })));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarginalSet {
    marginals: BTreeMap<String, Marginal>,
}

impl MarginalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect named marginals, as repeated [`insert`](Self::insert) calls would.
    ///
    /// # Errors
    /// Returns `InvalidInput` on the first repeated name.
    pub fn try_from_iter<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Marginal)>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for (name, marginal) in entries {
            set.insert(name, marginal)?;
        }
        Ok(set)
    }

    /// # Errors
    /// Returns `InvalidInput` if `name` is already present.
    pub fn insert(&mut self, name: impl Into<String>, marginal: Marginal) -> Result<()> {
        let name = name.into();
        if self.marginals.contains_key(&name) {
            return Err(MarginalError::invalid(format!(
                "duplicate marginal name `{name}`"
            )));
        }
        self.marginals.insert(name, marginal);
        Ok(())
    }

    /// # Errors
    /// Returns `UnknownMarginal` if no marginal has this name.
    pub fn get(&self, name: &str) -> Result<&Marginal> {
        self.marginals
            .get(name)
            .ok_or_else(|| MarginalError::UnknownMarginal {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.marginals.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.marginals.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Marginal)> {
        self.marginals.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.marginals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marginals.is_empty()
    }

    pub(crate) fn as_map(&self) -> &BTreeMap<String, Marginal> {
        &self.marginals
    }
}


/// Posterior summary of the linear predictor at one time or unit index.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FittedValue {
    pub index: usize,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Everything the toolkit needs from a fitted latent Gaussian model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelFitResult {
    pub fixed: MarginalSet,
    pub hyperparameters: MarginalSet,
    /// Sorted by `index`.
    fitted: Vec<FittedValue>,
}

impl ModelFitResult {
    /// # Errors
    /// Returns `InvalidInput` if two fitted values share an index or a fitted value has
    /// `lower > upper`.
    pub fn new(
        fixed: MarginalSet,
        hyperparameters: MarginalSet,
        mut fitted: Vec<FittedValue>,
    ) -> Result<Self> {
        fitted.sort_by_key(|v| v.index);
        if let Some(w) = fitted.windows(2).find(|w| w[0].index == w[1].index) {
            return Err(MarginalError::invalid(format!(
                "duplicate fitted index {}",
                w[0].index
            )));
        }
        if let Some(v) = fitted.iter().find(|v| !(v.lower <= v.upper)) {
            return Err(MarginalError::invalid(format!(
                "fitted value at index {} has lower bound {} above upper bound {}",
                v.index, v.lower, v.upper
            )));
        }
        Ok(Self {
            fixed,
            hyperparameters,
            fitted,
        })
    }

    /// # Errors
    /// Returns `UnknownMarginal` if there is no such fixed effect.
    pub fn fixed(&self, name: &str) -> Result<&Marginal> {
        self.fixed.get(name)
    }

    /// # Errors
    /// Returns `UnknownMarginal` if there is no such hyperparameter.
    pub fn hyperparameter(&self, name: &str) -> Result<&Marginal> {
        self.hyperparameters.get(name)
    }

    pub fn fitted(&self) -> &[FittedValue] {
        &self.fitted
    }

    /// # Errors
    /// Returns `UnknownIndex` if no fitted value has this index.
    pub fn fitted_at(&self, index: usize) -> Result<&FittedValue> {
        self.fitted
            .binary_search_by_key(&index, |v| v.index)
            .map(|i| &self.fitted[i])
            .map_err(|_| MarginalError::UnknownIndex { index })
    }
}
