//! AR(1) smoothing of a daily temperature series.
//!
//! The example:
//! 1. Builds a year of synthetic daily temperatures keyed by ISO dates, shuffled
//! 2. Assigns the time index from the date order and checks the model specification
//! 3. Stands in for the backend output: fitted values with 95% bands, and marginals for
//!    the AR(1) precision and lag-one correlation
//! 4. Reports the marginal standard deviation of the latent process and an HPD interval
//!    for the correlation
//!
//! Set `POSTERIOR_MARGINALS_LOG=debug` to see the toolkit's internal events.

use posterior_marginals::{
    Dataset, FittedValue, LatentModel, LogGammaPrior, Marginal, MarginalSet, MarginalToolkit,
    ModelFitResult, ModelSpec, time_index, write_summary_table,
};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use statrs::distribution::{Beta, Continuous, Gamma};
use std::error::Error;
use std::io;
use tracing_subscriber::EnvFilter;

const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_env("POSTERIOR_MARGINALS_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut rows: Vec<(String, f64)> = DAYS_IN_MONTH
        .iter()
        .enumerate()
        .flat_map(|(m, &days)| (1..=days).map(move |d| format!("2019-{:02}-{:02}", m + 1, d)))
        .enumerate()
        .map(|(day, date)| {
            let season = (2.0 * std::f64::consts::PI * (day as f64 - 200.0) / 365.0).cos();
            (date, 9.0 + 8.0 * season)
        })
        .collect();
    // Rows arrive in file order, not date order.
    rows.shuffle(&mut ChaCha8Rng::seed_from_u64(7));

    let dates: Vec<&str> = rows.iter().map(|(date, _)| date.as_str()).collect();
    let index = time_index(&dates);
    let data = Dataset::new()
        .with_column("temp", rows.iter().map(|(_, t)| *t).collect())
        .and_then(|d| d.with_column("t", index.iter().map(|&i| i as f64).collect()))?;

    let spec = ModelSpec::new("temp")
        .latent("t", LatentModel::Ar1)
        .precision_prior(
            "Precision for t",
            LogGammaPrior {
                shape: 1.0,
                rate: 5e-5,
            },
        );
    spec.validate(&data)?;

    // Backend stand-in: smoothed series with bands and AR(1) hyperparameter marginals.
    let mut by_time: Vec<(usize, f64)> = index
        .iter()
        .copied()
        .zip(data.column("temp")?.iter().copied())
        .collect();
    by_time.sort_by_key(|(t, _)| *t);
    let fitted = by_time
        .iter()
        .map(|&(t, temp)| FittedValue {
            index: t,
            mean: temp,
            lower: temp - 1.2,
            upper: temp + 1.2,
        })
        .collect();

    let mut hyperparameters = MarginalSet::new();
    let precision = Gamma::new(40.0, 400.0)?;
    hyperparameters.insert(
        "Precision for t",
        Marginal::from_continuous(&precision, 0.02, 0.25, 80)?,
    )?;
    // Correlation on (-1, 1) as a stretched Beta(90, 4).
    let beta = Beta::new(90.0, 4.0)?;
    hyperparameters.insert(
        "Rho for t",
        Marginal::from_fn(0.7, 0.999, 80, |rho| 0.5 * beta.pdf(0.5 * (rho + 1.0)))?,
    )?;
    let fit = ModelFitResult::new(MarginalSet::new(), hyperparameters, fitted)?;

    let toolkit = MarginalToolkit::default();
    write_summary_table(&mut io::stdout(), &toolkit.summarize_all(&fit.hyperparameters)?)?;

    let tau = fit.hyperparameter("Precision for t")?;
    let sd = toolkit.transform(tau, |t| 1.0 / t.sqrt())?;
    let summary = toolkit.summarize(&sd)?;
    println!(
        "\nConditional sd of the AR(1) process: {:.3} (2.5%: {:.3}, 97.5%: {:.3})",
        summary.mean, summary.q025, summary.q975
    );

    let rho = toolkit.hpd_interval(fit.hyperparameter("Rho for t")?, 0.95)?;
    println!("Lag-one correlation 95% HPD: [{:.4}, {:.4}]", rho.lower, rho.upper);

    for day in [1, 91, 182, 274] {
        let value = fit.fitted_at(day)?;
        println!(
            "day {day:>3}: {:.2} [{:.2}, {:.2}] ({})",
            value.mean,
            value.lower,
            value.upper,
            dates[index.iter().position(|&i| i == day).unwrap_or(0)]
        );
    }
    Ok(())
}
