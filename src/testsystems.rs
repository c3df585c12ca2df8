//! Synthetic replica ladders with known free energies

use crate::errors::*;
use crate::ladder::{Replica, ReplicaLadder};
use ndarray::{array, Array1};

/// A synthetic replica ladder whose free energy estimates relax onto a known answer.
///
/// Window `k` connects replicas `k` and `k + 1` and has the exact free energy difference
/// `delta_f[k]`. Both directional contributions carry the same bias, which decays exponentially
/// with the exchange index:
///
/// $$
/// \begin{aligned}
///     \mathrm{right}_{k,i} &= \Delta f_k + b e^{-i/\tau} \\\\
///     \mathrm{left}_{k+1,i} &= -\Delta f_k + b e^{-i/\tau}
/// \end{aligned}
/// $$
///
/// so the forward and reverse estimates start apart and converge onto $\sum_k \Delta f_k$.
///
/// # Examples
///
/// ```
/// use refep_rs::testsystems::*;
/// use refep_rs::convergence::*;
/// use ndarray::array;
///
/// let testcase = LinearLadder::builder()
///     .delta_f(array![1.0, -0.5, 2.0])
///     .numexchg(500)
///     .build()
///     .unwrap();
/// let series = compute_series(&testcase.ladder()).unwrap();
/// let summary = summarize(&series).unwrap();
/// assert!((summary.converged_estimate - testcase.exact_free_energy()).abs() < 1e-6);
/// ```
#[derive(Builder, Debug, Clone)]
#[builder(build_fn(validate = "Self::validate", name = "build_inner", private))]
pub struct LinearLadder {
    /// Free energy difference of each window between adjacent replicas.
    #[builder(default = "array![1.0, 2.0, 0.5, -0.5]")]
    delta_f: Array1<f64>,

    /// Number of exchange attempts to generate.
    #[builder(default = "200")]
    numexchg: usize,

    /// Decay constant of the bias, in exchanges.
    #[builder(default = "20.0")]
    relaxation: f64,

    /// Initial bias of every contribution.
    #[builder(default = "0.5")]
    bias: f64,
}

impl LinearLadderBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(delta_f) = &self.delta_f {
            if delta_f.is_empty() {
                return Err("delta_f needs at least one window".to_string());
            }
        }

        if let Some(relaxation) = self.relaxation {
            if !(relaxation > 0.0) {
                return Err(format!(
                    "relaxation must be positive (not {})",
                    relaxation
                ));
            }
        }

        Ok(())
    }

    /// Build the test case
    pub fn build(&self) -> Result<LinearLadder> {
        Ok(self.build_inner()?)
    }
}

impl LinearLadder {
    /// Get a new builder for the `LinearLadder` struct.
    pub fn builder() -> LinearLadderBuilder {
        LinearLadderBuilder::default()
    }

    /// Number of replicas; one more than the number of windows
    pub fn num_replicas(&self) -> usize {
        self.delta_f.len() + 1
    }

    /// The free energy difference between the ends of the ladder
    pub fn exact_free_energy(&self) -> f64 {
        self.delta_f.sum()
    }

    /// Generate the ladder
    pub fn ladder(&self) -> ReplicaLadder {
        let n_rep = self.num_replicas();
        let bias: Array1<f64> = (0..self.numexchg)
            .map(|i| self.bias * (-(i as f64) / self.relaxation).exp())
            .collect();

        let replicas = (0..n_rep)
            .map(|j| {
                let left_fe = if j == 0 {
                    Array1::zeros(self.numexchg)
                } else {
                    &bias - self.delta_f[j - 1]
                };
                let right_fe = if j + 1 == n_rep {
                    Array1::zeros(self.numexchg)
                } else {
                    &bias + self.delta_f[j]
                };
                Replica::new(left_fe, right_fe)
            })
            .collect();

        ReplicaLadder::new(self.numexchg, replicas)
    }
}

impl Default for LinearLadder {
    fn default() -> Self {
        Self::builder()
            .build()
            .expect("LinearLadder should not fail with default params")
    }
}
