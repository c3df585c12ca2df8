#![warn(rust_2018_idioms, missing_docs, missing_debug_implementations)]

//! Convergence analysis of free energies from Hamiltonian replica exchange free energy
//! perturbation (REFEP) simulations.
//!
//! Each replica in the ladder reports a free energy contribution towards its left and right
//! neighbours at every exchange attempt. Summing the contributions down the ladder gives a
//! forward estimate of the free energy between the end states, and summing them up the ladder
//! gives a reverse estimate. When sampling has converged, the two estimates agree.
//!
//! ```
//! use refep_rs::convergence::*;
//! use refep_rs::ladder::*;
//!
//! let ladder = ReplicaLadder::builder()
//!     .numexchg(2)
//!     .replica(Replica::from_slices(&[0.0, 0.0], &[1.0, 1.2]))
//!     .replica(Replica::from_slices(&[0.5, 0.6], &[0.4, 0.5]))
//!     .replica(Replica::from_slices(&[2.0, 2.1], &[0.0, 0.0]))
//!     .build()
//!     .unwrap();
//!
//! let series = compute_series(&ladder).unwrap();
//! let summary = summarize(&series).unwrap();
//! assert!((summary.converged_estimate - -0.5).abs() < 1e-12);
//! ```

#[macro_use]
extern crate derive_builder;

pub mod convergence;
pub mod errors;
pub mod ladder;
pub mod remlog;
pub mod report;
pub mod testsystems;

pub use convergence::{
    compute_series, difference, summarize, ConvergenceSeries, ConvergenceSummary, DisplayRange,
};
pub use errors::{RefepError, Result};
pub use ladder::{Position, Replica, ReplicaLadder, Side};
pub use remlog::HRemLog;
pub use report::ConvergenceReport;
