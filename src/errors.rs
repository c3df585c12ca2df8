//! Error type shared by the whole crate

use crate::ladder::Side;
use thiserror::Error;

/// Enum for errors in this crate
#[derive(Error, Debug)]
pub enum RefepError {
    /// Error returned when a builder's build() was called improperly
    #[error("Could not build: {0}")]
    BuilderError(String),

    /// Error returned when the ladder is too short to have two ends
    #[error("A replica ladder needs at least 2 replicas; found {found}")]
    InsufficientReplicas {
        #[allow(missing_docs)]
        found: usize,
    },

    /// Error returned when a replica's contributions don't cover every exchange
    #[error(
        "Replica {replica} has {found} {side} free energies; the ladder has {expected} exchanges"
    )]
    MalformedLadder {
        /// Index of the offending replica in ladder order
        replica: usize,
        /// Which contribution array is the wrong length
        side: Side,
        #[allow(missing_docs)]
        found: usize,
        #[allow(missing_docs)]
        expected: usize,
    },

    /// Error returned when a summary is requested for a series with no exchanges
    #[error("Cannot summarize an empty convergence series")]
    EmptySeries,

    /// Error returned when a free energy estimate is NaN or infinite
    #[error("The {series} estimate at exchange {index} is not finite ({value})")]
    NonFiniteEstimate {
        /// `"forward"` or `"reverse"`
        series: &'static str,
        #[allow(missing_docs)]
        index: usize,
        #[allow(missing_docs)]
        value: f64,
    },

    /// Error returned when the time between exchange attempts is not a positive number
    #[error("Exchange attempt interval must be finite and positive, not {0}")]
    InvalidInterval(f64),

    /// Error returned when an exchange log cannot be parsed
    #[error("Malformed exchange log at line {line}: {message}")]
    RemLogParse {
        /// 1-based line number in the log
        line: usize,
        #[allow(missing_docs)]
        message: String,
    },

    /// Error returned when reading or writing a file fails
    #[error("I/O error")]
    Io {
        #[allow(missing_docs)]
        #[from]
        source: std::io::Error,
    },

    /// Error returned when the CSV report cannot be written
    #[error("Could not write CSV report")]
    Csv {
        #[allow(missing_docs)]
        #[from]
        source: csv::Error,
    },
}

impl From<String> for RefepError {
    fn from(s: String) -> Self {
        Self::BuilderError(s)
    }
}

/// Result type for the refep-rs crate
pub type Result<T> = std::result::Result<T, RefepError>;
