//! End-to-end use of the toolkit on the output of a (stand-in) fitting backend.

use approx::assert_relative_eq;
use posterior_marginals::{
    Dataset, FittedValue, LogGammaPrior, Marginal, MarginalError, MarginalSet, MarginalToolkit,
    ModelFitResult, ModelFitter, ModelSpec, NormalPrior, time_index,
};
use statrs::distribution::{Gamma, Normal};

/// Conjugate simple linear regression with a plug-in noise precision.
struct ConjugateLine {
    noise_precision: f64,
}

impl ModelFitter for ConjugateLine {
    type Error = MarginalError;

    fn fit(&self, spec: &ModelSpec, data: &Dataset) -> Result<ModelFitResult, MarginalError> {
        spec.validate(data)?;
        let y = data.column(&spec.response)?;
        let covariate = &spec.fixed_effects[0];
        let x = data.column(covariate)?;
        let n = y.len() as f64;
        let tau = self.noise_precision;

        let flat = NormalPrior {
            mean: 0.0,
            precision: 1e-6,
        };
        let p0 = spec.priors.intercept.unwrap_or(flat);
        let p1 = spec.priors.fixed.get(covariate).copied().unwrap_or(flat);

        let (sx, sxx) = (x.iter().sum::<f64>(), x.iter().map(|v| v * v).sum::<f64>());
        let sy = y.iter().sum::<f64>();
        let sxy = x.iter().zip(y).map(|(a, b)| a * b).sum::<f64>();

        // Posterior precision [[a, b], [b, d]] and its inverse.
        let (a, b, d) = (p0.precision + tau * n, tau * sx, p1.precision + tau * sxx);
        let det = a * d - b * b;
        let (ia, ib, id) = (d / det, -b / det, a / det);
        let r0 = p0.precision * p0.mean + tau * sy;
        let r1 = p1.precision * p1.mean + tau * sxy;
        let (m0, m1) = (ia * r0 + ib * r1, ib * r0 + id * r1);

        let mut fixed = MarginalSet::new();
        for (name, mean, var) in [("(Intercept)", m0, ia), (covariate.as_str(), m1, id)] {
            let sd = var.sqrt();
            let normal = Normal::new(mean, sd).unwrap();
            fixed.insert(
                name,
                Marginal::from_continuous(&normal, mean - 6.0 * sd, mean + 6.0 * sd, 75)?,
            )?;
        }

        let ssr: f64 = x
            .iter()
            .zip(y)
            .map(|(xi, yi)| (yi - m0 - m1 * xi).powi(2))
            .sum();
        let prior = spec.priors.precision["precision"];
        let shape = prior.shape + 0.5 * n;
        let rate = prior.rate + 0.5 * ssr;
        let gamma = Gamma::new(shape, rate).unwrap();
        let (mean, sd) = (shape / rate, shape.sqrt() / rate);
        let mut hyperparameters = MarginalSet::new();
        let lower = (mean - 6.0 * sd).max(0.05 * mean);
        hyperparameters.insert(
            "Precision for the Gaussian observations",
            Marginal::from_continuous(&gamma, lower, mean + 6.0 * sd, 120)?,
        )?;

        let index = time_index(&x.iter().map(|v| (v * 1e6) as i64).collect::<Vec<_>>());
        let fitted = x
            .iter()
            .zip(index)
            .map(|(xi, index)| {
                let mean = m0 + m1 * xi;
                let sd = (ia + 2.0 * xi * ib + xi * xi * id).sqrt();
                FittedValue {
                    index,
                    mean,
                    lower: mean - 1.96 * sd,
                    upper: mean + 1.96 * sd,
                }
            })
            .collect();
        ModelFitResult::new(fixed, hyperparameters, fitted)
    }
}

fn simulated() -> Dataset {
    let x: Vec<f64> = (0..60).map(|i| i as f64 / 10.0).collect();
    let y: Vec<f64> = x
        .iter()
        .enumerate()
        .map(|(i, xi)| 1.0 + 2.0 * xi + 0.5 * (i as f64 * 1.7).sin())
        .collect();
    Dataset::new()
        .with_column("y", y)
        .and_then(|d| d.with_column("x", x))
        .unwrap()
}

fn spec() -> ModelSpec {
    ModelSpec::new("y")
        .fixed_effect(
            "x",
            Some(NormalPrior {
                mean: 0.0,
                precision: 0.001,
            }),
        )
        .precision_prior(
            "precision",
            LogGammaPrior {
                shape: 1.0,
                rate: 5e-5,
            },
        )
}

#[test]
fn regression_marginals_are_summarised() {
    let fit = ConjugateLine {
        noise_precision: 8.0,
    }
    .fit(&spec(), &simulated())
    .unwrap();
    let toolkit = MarginalToolkit::default();

    let summaries = toolkit.summarize_all(&fit.fixed).unwrap();
    assert_relative_eq!(summaries["x"].mean, 2.0, epsilon = 0.05);
    assert_relative_eq!(summaries["(Intercept)"].mean, 1.0, epsilon = 0.15);

    let slope = fit.fixed("x").unwrap();
    let interval = toolkit.hpd_interval(slope, 0.95).unwrap();
    assert!(interval.contains(summaries["x"].mean));
    assert_relative_eq!(
        interval.width(),
        summaries["x"].q975 - summaries["x"].q025,
        max_relative = 1e-2
    );

    assert!(matches!(
        fit.fixed("z"),
        Err(MarginalError::UnknownMarginal { .. })
    ));
}

#[test]
fn precision_hyperparameter_becomes_a_standard_deviation() {
    let fit = ConjugateLine {
        noise_precision: 8.0,
    }
    .fit(&spec(), &simulated())
    .unwrap();
    let toolkit = MarginalToolkit::default();

    let tau = fit
        .hyperparameter("Precision for the Gaussian observations")
        .unwrap();
    let sigma = toolkit.transform(tau, |t| 1.0 / t.sqrt()).unwrap();
    let summary = toolkit.summarize(&sigma).unwrap();

    // Residual sd of 0.5 * sin(...) is about 0.35.
    assert!(summary.mean > 0.25 && summary.mean < 0.45, "{summary:?}");
    let tau_median = toolkit.quantile(tau, 0.5).unwrap();
    assert_relative_eq!(summary.q50, 1.0 / tau_median.sqrt(), max_relative = 1e-2);
}

#[test]
fn fitted_values_follow_time_order() {
    let fit = ConjugateLine {
        noise_precision: 8.0,
    }
    .fit(&spec(), &simulated())
    .unwrap();
    let fitted = fit.fitted();
    assert_eq!(fitted.len(), 60);
    assert_eq!(fitted[0].index, 1);
    assert!(fitted.windows(2).all(|w| w[1].mean > w[0].mean));
    assert!(fitted.iter().all(|v| v.lower < v.mean && v.mean < v.upper));
    assert!(fit.fitted_at(61).is_err());
}

#[test]
fn invalid_spec_is_reported_by_the_backend() {
    let fitter = ConjugateLine {
        noise_precision: 1.0,
    };
    let missing = ModelSpec::new("y").fixed_effect("income", None);
    assert!(matches!(
        fitter.fit(&missing, &simulated()),
        Err(MarginalError::InvalidInput(_))
    ));
}
