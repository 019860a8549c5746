//! Numeric summaries of marginals.

use crate::MarginalToolkit;
use crate::error::Result;
use crate::fit::MarginalSet;
use crate::marginal::Marginal;
use std::collections::BTreeMap;
use std::fmt;
use std::io;

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Moments, quantiles and mode of a marginal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MarginalSummary {
    pub mean: f64,
    pub sd: f64,
    pub q025: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub q975: f64,
    pub mode: f64,
}

impl fmt::Display for MarginalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<12.4} {:<12.4} {:<12.4} {:<12.4} {:<12.4} {:<12.4}",
            self.mean, self.sd, self.q025, self.q50, self.q975, self.mode
        )
    }
}

impl MarginalToolkit {
    /// Mean, standard deviation, quantiles at 2.5/25/50/75/97.5 % and mode.
    ///
    /// # Errors
    /// Propagates grid construction errors.
    pub fn summarize(&self, marginal: &Marginal) -> Result<MarginalSummary> {
        let grid = self.grid(marginal)?;
        let mean = grid.integrate(|x| x);
        let variance = grid.integrate(|x| (x - mean) * (x - mean));
        Ok(MarginalSummary {
            mean,
            sd: variance.max(0.0).sqrt(),
            q025: grid.quantile(0.025),
            q25: grid.quantile(0.25),
            q50: grid.quantile(0.5),
            q75: grid.quantile(0.75),
            q975: grid.quantile(0.975),
            mode: grid.mode(),
        })
    }

    /// Summaries for every marginal in `set`, keyed by name.
    ///
    /// With the `rayon` feature the marginals are summarised in parallel.
    ///
    /// # Errors
    /// Returns the first error produced by [`summarize`](Self::summarize).
    pub fn summarize_all(&self, set: &MarginalSet) -> Result<BTreeMap<String, MarginalSummary>> {
        #[cfg(feature = "rayon")]
        let summaries = set
            .as_map()
            .par_iter()
            .map(|(name, marginal)| Ok((name.clone(), self.summarize(marginal)?)))
            .collect();
        #[cfg(not(feature = "rayon"))]
        let summaries = set
            .iter()
            .map(|(name, marginal)| Ok((name.to_string(), self.summarize(marginal)?)))
            .collect();
        summaries
    }
}

/// Write a summary table in the layout of a fitted-model report, one row per name.
///
/// # Errors
/// Propagates write errors from `out`.
pub fn write_summary_table<W: io::Write>(
    out: &mut W,
    summaries: &BTreeMap<String, MarginalSummary>,
) -> io::Result<()> {
    writeln!(
        out,
        "{:<16} {:<12} {:<12} {:<12} {:<12} {:<12} {:<12}",
        "Parameter", "Mean", "Std. Dev.", "2.5%", "50%", "97.5%", "Mode"
    )?;
    writeln!(out, "{}", "-".repeat(96))?;
    for (name, summary) in summaries {
        writeln!(out, "{name:<16} {summary}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use statrs::distribution::{Gamma, Normal};

    #[test]
    fn normal_summary() {
        let toolkit = MarginalToolkit::default();
        let normal = Normal::new(-0.4, 2.0).unwrap();
        let marginal = Marginal::from_continuous(&normal, -12.4, 11.6, 73).unwrap();
        let summary = toolkit.summarize(&marginal).unwrap();
        assert_relative_eq!(summary.mean, -0.4, epsilon = 1e-3);
        assert_relative_eq!(summary.sd, 2.0, epsilon = 1e-2);
        assert_relative_eq!(summary.q50, -0.4, epsilon = 1e-2);
        assert_relative_eq!(summary.q975 - summary.q50, 1.96 * 2.0, epsilon = 0.03);
        assert!(summary.q025 < summary.q25 && summary.q75 < summary.q975);
    }

    #[test]
    fn summarize_all_covers_every_name() {
        let toolkit = MarginalToolkit::default();
        let mut set = MarginalSet::new();
        let normal = Normal::new(1.0, 0.5).unwrap();
        let gamma = Gamma::new(3.0, 2.0).unwrap();
        set.insert("slope", Marginal::from_continuous(&normal, -2.0, 4.0, 61).unwrap())
            .unwrap();
        set.insert("precision", Marginal::from_continuous(&gamma, 0.0, 10.0, 101).unwrap())
            .unwrap();

        let summaries = toolkit.summarize_all(&set).unwrap();
        assert_eq!(
            summaries.keys().map(String::as_str).collect::<Vec<_>>(),
            ["precision", "slope"]
        );
        assert_relative_eq!(summaries["slope"].mean, 1.0, epsilon = 1e-3);
        assert_relative_eq!(summaries["precision"].mean, 1.5, epsilon = 1e-2);

        let mut table: Vec<u8> = Vec::new();
        write_summary_table(&mut table, &summaries).unwrap();
        let table = String::from_utf8(table).unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Parameter"));
        assert!(lines[2].starts_with("precision"));
        assert!(lines[3].starts_with("slope"));
    }
}
