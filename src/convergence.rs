//! Forward and reverse free energy estimates accumulated over a replica ladder

use crate::errors::*;
use crate::ladder::{Position, ReplicaLadder};
use ndarray::{Array1, Zip};
use tracing::debug;

/// Forward and reverse free energy estimates after every exchange
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceSeries {
    forward: Array1<f64>,
    reverse: Array1<f64>,
}

impl ConvergenceSeries {
    /// Create a series from precomputed forward and reverse estimates
    ///
    /// The two arrays must be the same length.
    pub fn new(forward: Array1<f64>, reverse: Array1<f64>) -> Result<Self> {
        if forward.len() != reverse.len() {
            return Err(RefepError::BuilderError(format!(
                "forward and reverse must have equal lengths (not {} and {})",
                forward.len(),
                reverse.len()
            )));
        }
        Ok(Self { forward, reverse })
    }

    /// `forward[i]` is the accumulated forward free energy estimate after exchange `i`
    pub fn forward(&self) -> &Array1<f64> {
        &self.forward
    }

    /// `reverse[i]` is the accumulated reverse free energy estimate after exchange `i`
    pub fn reverse(&self) -> &Array1<f64> {
        &self.reverse
    }

    /// Number of exchanges covered
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Does the series cover no exchanges?
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Elapsed simulation time at each exchange
    ///
    /// `t[i] = i * interval`, where `interval` is the time between exchange attempts (the
    /// inverse of the exchange attempt frequency).
    pub fn time_axis(&self, interval: f64) -> Result<Array1<f64>> {
        if !interval.is_finite() || interval <= 0.0 {
            return Err(RefepError::InvalidInterval(interval));
        }
        Ok((0..self.len()).map(|i| i as f64 * interval).collect())
    }
}

/// Symmetric window around the converged estimate that shows both series in full
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRange {
    /// Lower bound
    pub low: f64,
    /// Upper bound
    pub high: f64,
}

impl DisplayRange {
    /// Half the width of the window
    pub fn spread(&self) -> f64 {
        (self.high - self.low) * 0.5
    }

    /// Is `x` inside the window (inclusive)?
    pub fn contains(&self, x: f64) -> bool {
        self.low <= x && x <= self.high
    }
}

/// Final free energy and display bounds of a convergence series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceSummary {
    /// Mean of the final forward and reverse estimates
    pub converged_estimate: f64,
    /// Window centred on `converged_estimate` containing every value of both series
    pub display_range: DisplayRange,
}

/// Accumulate the forward and reverse free energy estimates over the replica ladder
///
/// For each exchange `i` the free energy between the end states is the sum of the free energy
/// differences between adjacent replicas. Walking down the ladder sums the left contributions
/// and walking up sums the right contributions:
///
/// $$
/// \begin{aligned}
///     \mathrm{forward}_i &= -\sum_{j=1}^{R-1} \mathrm{left}_{j,i} \\\\
///     \mathrm{reverse}_i &= \sum_{j=0}^{R-2} \mathrm{right}_{j,i}
/// \end{aligned}
/// $$
///
/// The first replica has no left neighbour and the last has no right neighbour, so each end of
/// the ladder contributes to only one of the two walks. Once sampling has converged the two
/// estimates agree.
///
/// # Errors
///
/// - `InsufficientReplicas` if the ladder has fewer than 2 replicas. Nothing is read.
/// - `MalformedLadder` if any replica's contributions are not `numexchg` long.
pub fn compute_series(ladder: &ReplicaLadder) -> Result<ConvergenceSeries> {
    ladder.validate()?;

    let numexchg = ladder.numexchg();
    let mut forward = Array1::zeros(numexchg);
    let mut reverse = Array1::zeros(numexchg);

    for i in 0..numexchg {
        let mut lfe = 0.0;
        let mut rfe = 0.0;
        for (j, rep) in ladder.replicas().iter().enumerate() {
            match ladder.position(j) {
                Position::First => {
                    rfe += rep.right_fe()[i];
                }
                Position::Last => {
                    lfe += rep.left_fe()[i];
                }
                Position::Interior => {
                    rfe += rep.right_fe()[i];
                    lfe += rep.left_fe()[i];
                }
            }
        }
        forward[i] = -lfe;
        reverse[i] = rfe;
    }

    debug!(
        replicas = ladder.len(),
        numexchg, "Accumulated free energies over the replica ladder"
    );

    Ok(ConvergenceSeries { forward, reverse })
}

/// Reduce a convergence series to its converged estimate and a display window
///
/// The converged estimate is the mean of the last forward and last reverse estimates. The
/// display window is centred on it and wide enough to show the extremes of both series.
///
/// # Errors
///
/// - `EmptySeries` if the series covers no exchanges.
/// - `NonFiniteEstimate` if any estimate is NaN or infinite.
pub fn summarize(series: &ConvergenceSeries) -> Result<ConvergenceSummary> {
    let last = series.len().checked_sub(1).ok_or(RefepError::EmptySeries)?;

    for &(name, estimates) in &[("forward", &series.forward), ("reverse", &series.reverse)] {
        if let Some(index) = estimates.iter().position(|x| !x.is_finite()) {
            return Err(RefepError::NonFiniteEstimate {
                series: name,
                index,
                value: estimates[index],
            });
        }
    }

    let converged_estimate = (series.forward[last] + series.reverse[last]) * 0.5;

    let low = series
        .forward
        .iter()
        .chain(series.reverse.iter())
        .copied()
        .fold(f64::INFINITY, f64::min);
    let high = series
        .forward
        .iter()
        .chain(series.reverse.iter())
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    let spread = f64::max(converged_estimate - low, high - converged_estimate);

    debug!(
        converged_estimate,
        low, high, "Summarized convergence series"
    );

    Ok(ConvergenceSummary {
        converged_estimate,
        // Rounding in the subtraction can leave the extremes one ulp outside the window
        display_range: DisplayRange {
            low: (converged_estimate - spread).min(low),
            high: (converged_estimate + spread).max(high),
        },
    })
}

/// Disagreement between the forward and reverse estimates at each exchange
pub fn difference(series: &ConvergenceSeries) -> Array1<f64> {
    let mut diff = Array1::zeros(series.len());
    Zip::from(&mut diff)
        .and(&series.forward)
        .and(&series.reverse)
        .apply(|d, &f, &r| *d = f - r);
    diff
}
