//! Posterior marginals of a simple linear regression.
//!
//! This example demonstrates the post-processing side of a Bayesian regression. A fitting
//! backend would normally hand over the marginals; here they come from the closed-form
//! posterior under the reference prior, where each coefficient is Student-t and the noise
//! precision is Gamma distributed.
//!
//! The example:
//! 1. Simulates data from `y = 1 + 2x + ε`, `ε ~ N(0, 0.5²)`
//! 2. Tabulates the posterior marginals into a `ModelFitResult`
//! 3. Summarises every marginal and reports 95% HPD intervals
//! 4. Turns the noise precision into a standard deviation
//!
//! Set `POSTERIOR_MARGINALS_LOG=debug` to see the toolkit's internal events.

use posterior_marginals::{
    Marginal, MarginalSet, MarginalToolkit, ModelFitResult, write_summary_table,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use statrs::distribution::{Gamma, Normal, StudentsT};
use std::error::Error;
use std::io;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_env("POSTERIOR_MARGINALS_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let n = 100;
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let noise = Normal::new(0.0, 0.5)?;
    let x: Vec<f64> = (0..n).map(|_| rng.sample(Normal::standard())).collect();
    let y: Vec<f64> = x.iter().map(|xi| 1.0 + 2.0 * xi + rng.sample(noise)).collect();

    // Least squares, which is also the posterior mode under the reference prior.
    let nf = n as f64;
    let x_bar = x.iter().sum::<f64>() / nf;
    let y_bar = y.iter().sum::<f64>() / nf;
    let sxx: f64 = x.iter().map(|xi| (xi - x_bar).powi(2)).sum();
    let sxy: f64 = x.iter().zip(&y).map(|(xi, yi)| (xi - x_bar) * (yi - y_bar)).sum();
    let slope = sxy / sxx;
    let intercept = y_bar - slope * x_bar;
    let ssr: f64 = x
        .iter()
        .zip(&y)
        .map(|(xi, yi)| (yi - intercept - slope * xi).powi(2))
        .sum();
    let dof = nf - 2.0;
    let s2 = ssr / dof;

    let mut fixed = MarginalSet::new();
    for (name, location, scale) in [
        ("(Intercept)", intercept, (s2 * (1.0 / nf + x_bar * x_bar / sxx)).sqrt()),
        ("x", slope, (s2 / sxx).sqrt()),
    ] {
        let t = StudentsT::new(location, scale, dof)?;
        let marginal =
            Marginal::from_continuous(&t, location - 8.0 * scale, location + 8.0 * scale, 75)?;
        fixed.insert(name, marginal)?;
    }

    let precision = Gamma::new(0.5 * dof, 0.5 * ssr)?;
    let mean = 0.5 * dof / (0.5 * ssr);
    let mut hyperparameters = MarginalSet::new();
    hyperparameters.insert(
        "Precision for the Gaussian observations",
        Marginal::from_continuous(&precision, 0.2 * mean, 2.5 * mean, 60)?,
    )?;

    let fit = ModelFitResult::new(fixed, hyperparameters, Vec::new())?;
    let toolkit = MarginalToolkit::default();

    let mut stdout = io::stdout();
    println!("Fixed effects");
    write_summary_table(&mut stdout, &toolkit.summarize_all(&fit.fixed)?)?;
    println!("\nHyperparameters");
    write_summary_table(&mut stdout, &toolkit.summarize_all(&fit.hyperparameters)?)?;

    println!("\n95% HPD intervals");
    for (name, marginal) in fit.fixed.iter() {
        let interval = toolkit.hpd_interval(marginal, 0.95)?;
        println!("{name:<16} [{:.4}, {:.4}]", interval.lower, interval.upper);
    }

    let tau = fit.hyperparameter("Precision for the Gaussian observations")?;
    let sigma = toolkit.transform(tau, |t| 1.0 / t.sqrt())?;
    let summary = toolkit.summarize(&sigma)?;
    let interval = toolkit.hpd_interval(&sigma, 0.95)?;
    println!(
        "\nNoise sd: mean {:.4}, 95% HPD [{:.4}, {:.4}] (true 0.5)",
        summary.mean, interval.lower, interval.upper
    );

    // A smooth curve for plotting.
    let curve = toolkit.resample(fit.fixed("x")?, 200)?;
    println!("Slope density resampled onto {} points", curve.knot_count());
    Ok(())
}
