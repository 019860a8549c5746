//! Model specification handed to an external fitting backend.
//!
//! The toolkit never fits models itself. A backend (for example a latent Gaussian model
//! solver) implements [`ModelFitter`] and returns a [`ModelFitResult`] whose marginals the
//! toolkit then post-processes.

use crate::dataset::Dataset;
use crate::error::{MarginalError, Result};
use crate::fit::ModelFitResult;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Likelihood family of the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Family {
    #[default]
    Gaussian,
}

/// Structure of a temporally correlated latent term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LatentModel {
    /// Autoregressive process of order one over consecutive index values.
    Ar1,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LatentTerm {
    /// Column holding the time index (see [`time_index`](crate::time_index)).
    pub index_column: String,
    pub model: LatentModel,
}

/// Gaussian prior `N(mean, 1 / precision)` on a fixed effect.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NormalPrior {
    pub mean: f64,
    pub precision: f64,
}

/// Log-gamma prior on `log(τ)`, i.e. `τ ~ Gamma(shape, rate)` for a precision `τ`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LogGammaPrior {
    pub shape: f64,
    pub rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Priors {
    pub intercept: Option<NormalPrior>,
    /// Keyed by covariate name.
    pub fixed: BTreeMap<String, NormalPrior>,
    /// Keyed by hyperparameter name, e.g. `"precision"` of the observation noise.
    pub precision: BTreeMap<String, LogGammaPrior>,
}

/// `response ~ intercept + fixed_effects [+ latent]` with a given likelihood family.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModelSpec {
    pub response: String,
    pub fixed_effects: Vec<String>,
    pub latent: Option<LatentTerm>,
    pub family: Family,
    pub priors: Priors,
}

impl ModelSpec {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            fixed_effects: Vec::new(),
            latent: None,
            family: Family::default(),
            priors: Priors::default(),
        }
    }

    pub fn fixed_effect(mut self, name: impl Into<String>, prior: Option<NormalPrior>) -> Self {
        let name = name.into();
        if let Some(prior) = prior {
            self.priors.fixed.insert(name.clone(), prior);
        }
        self.fixed_effects.push(name);
        self
    }

    pub fn latent(mut self, index_column: impl Into<String>, model: LatentModel) -> Self {
        self.latent = Some(LatentTerm {
            index_column: index_column.into(),
            model,
        });
        self
    }

    pub fn precision_prior(mut self, name: impl Into<String>, prior: LogGammaPrior) -> Self {
        self.priors.precision.insert(name.into(), prior);
        self
    }

    /// Check the specification against a dataset.
    ///
    /// # Errors
    /// Returns `InvalidInput` if a referenced column is missing, the dataset is empty, a
    /// prior names an unknown covariate, or a prior precision/shape/rate is not positive.
    pub fn validate(&self, data: &Dataset) -> Result<()> {
        if data.rows() == 0 {
            return Err(MarginalError::invalid("dataset has no rows"));
        }
        let latent = self.latent.iter().map(|l| l.index_column.as_str());
        for column in std::iter::once(self.response.as_str())
            .chain(self.fixed_effects.iter().map(String::as_str))
            .chain(latent)
        {
            if !data.has_column(column) {
                return Err(MarginalError::invalid(format!(
                    "model refers to missing column `{column}`"
                )));
            }
        }
        if let Some(name) = self
            .priors
            .fixed
            .keys()
            .find(|name| !self.fixed_effects.contains(*name))
        {
            return Err(MarginalError::invalid(format!(
                "prior given for `{name}`, which is not a fixed effect"
            )));
        }
        let mut normal_priors = self.priors.intercept.iter().chain(self.priors.fixed.values());
        if normal_priors.any(|p| !(p.precision > 0.0) || !p.mean.is_finite()) {
            return Err(MarginalError::invalid(
                "fixed-effect priors need a finite mean and positive precision",
            ));
        }
        if self
            .priors
            .precision
            .values()
            .any(|p| !(p.shape > 0.0 && p.rate > 0.0))
        {
            return Err(MarginalError::invalid(
                "log-gamma priors need positive shape and rate",
            ));
        }
        Ok(())
    }
}

/// A backend that fits a [`ModelSpec`] to a [`Dataset`].
pub trait ModelFitter {
    type Error: std::error::Error + From<MarginalError>;

    /// # Errors
    /// Backend-specific; specification problems should surface as `MarginalError`.
    fn fit(
        &self,
        spec: &ModelSpec,
        data: &Dataset,
    ) -> std::result::Result<ModelFitResult, Self::Error>;
}
