//! CSV tables of convergence series

use crate::convergence::{difference, summarize, ConvergenceSeries, ConvergenceSummary};
use crate::errors::*;
use ndarray::Array1;
use std::io;
use tracing::debug;

/// Tabulated convergence data for plotting elsewhere
///
/// Each row is one exchange: the elapsed time, the forward and reverse estimates, and
/// optionally their difference.
#[derive(Builder, Debug, Clone)]
#[builder(build_fn(validate = "Self::validate", name = "build_inner", private))]
pub struct ConvergenceReport {
    /// The series to report
    series: ConvergenceSeries,

    /// Time between exchange attempts, in ps
    exchange_interval: f64,

    /// Add a column with the forward minus reverse difference
    #[builder(default = "false")]
    include_difference: bool,
}

impl ConvergenceReportBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(interval) = self.exchange_interval {
            if !interval.is_finite() || interval <= 0.0 {
                return Err(format!(
                    "exchange_interval must be finite and positive (not {})",
                    interval
                ));
            }
        }

        Ok(())
    }

    /// Build the report
    pub fn build(&self) -> Result<ConvergenceReport> {
        Ok(self.build_inner()?)
    }
}

impl ConvergenceReport {
    /// Get a new builder for the `ConvergenceReport` struct.
    pub fn builder() -> ConvergenceReportBuilder {
        ConvergenceReportBuilder::default()
    }

    /// The series being reported
    pub fn series(&self) -> &ConvergenceSeries {
        &self.series
    }

    /// Elapsed time in ps at each exchange
    pub fn time(&self) -> Result<Array1<f64>> {
        self.series.time_axis(self.exchange_interval)
    }

    /// Converged free energy and display range of the series
    pub fn summary(&self) -> Result<ConvergenceSummary> {
        summarize(&self.series)
    }

    /// Column names, in order
    pub fn headers(&self) -> Vec<&'static str> {
        let mut headers = vec!["time", "forward", "reverse"];
        if self.include_difference {
            headers.push("difference");
        }
        headers
    }

    /// Write the table as CSV with a header row
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let time = self.time()?;
        let diff = if self.include_difference {
            Some(difference(&self.series))
        } else {
            None
        };

        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.headers())?;

        for (i, &t) in time.iter().enumerate() {
            let mut record = vec![
                t.to_string(),
                self.series.forward()[i].to_string(),
                self.series.reverse()[i].to_string(),
            ];
            if let Some(diff) = &diff {
                record.push(diff[i].to_string());
            }
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        debug!(rows = time.len(), "Wrote convergence table");
        Ok(())
    }
}
