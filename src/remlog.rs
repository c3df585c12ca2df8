//! Reader for Amber-style Hamiltonian replica exchange logs
//!
//! The log is a sequence of exchange blocks, each introduced by a `# exchange N` comment and
//! holding one record per replica:
//!
//! ```text
//! # H-REMD exchange file
//! # numexchg is          2
//! # Rep#, Neibr#, Temp0, PotE(x_1), PotE(x_2), left_fe, right_fe, Success, Success_rate
//! # exchange          1
//!      1     2   300.00  -1000.00  -1000.50     0.00     1.00    F    0.00
//!      2     1   300.00  -1001.00  -1001.20     2.00     0.00    T    1.00
//! # exchange          2
//!      1     2   300.00  -1000.10  -1000.60     0.00     1.20    T    0.50
//!      2     1   300.00  -1001.10  -1001.30     2.10     0.00    F    0.50
//! ```
//!
//! Only the replica number and the `left_fe` and `right_fe` columns are read.

use crate::errors::*;
use crate::ladder::{Replica, ReplicaLadder};
use ndarray::Array1;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

const REPLICA_COLUMN: usize = 0;
const LEFT_FE_COLUMN: usize = 5;
const RIGHT_FE_COLUMN: usize = 6;
const MIN_COLUMNS: usize = 7;

/// A parsed H-REMD exchange log
#[derive(Debug, Clone, PartialEq)]
pub struct HRemLog {
    declared_numexchg: Option<usize>,
    ladder: ReplicaLadder,
}

#[derive(Debug, Default)]
struct Contributions {
    left_fe: Vec<f64>,
    right_fe: Vec<f64>,
    /// 1-based exchange block this replica last appeared in; 0 if never
    last_block: usize,
}

impl HRemLog {
    /// Read and parse the log at `path`
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Reading exchange log");
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse a log from any buffered reader
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut declared_numexchg = None;
        let mut numexchg = 0;
        let mut replicas: Vec<Contributions> = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let lineno = idx + 1;
            let trimmed = line.trim();

            if trimmed.is_empty() {
                continue;
            }

            if let Some(comment) = trimmed.strip_prefix('#') {
                let words: Vec<&str> = comment.split_whitespace().collect();
                match words.as_slice() {
                    ["numexchg", "is", n] => {
                        declared_numexchg = Some(parse_column(n, lineno, "numexchg")?);
                    }
                    ["exchange", _] => {
                        numexchg += 1;
                    }
                    _ => {}
                }
                continue;
            }

            if numexchg == 0 {
                return Err(RefepError::RemLogParse {
                    line: lineno,
                    message: "replica record before the first exchange".to_string(),
                });
            }

            let columns: Vec<&str> = trimmed.split_whitespace().collect();
            if columns.len() < MIN_COLUMNS {
                return Err(RefepError::RemLogParse {
                    line: lineno,
                    message: format!(
                        "expected at least {} columns, found {}",
                        MIN_COLUMNS,
                        columns.len()
                    ),
                });
            }

            let rep: usize = parse_column(columns[REPLICA_COLUMN], lineno, "replica number")?;
            if rep == 0 {
                return Err(RefepError::RemLogParse {
                    line: lineno,
                    message: "replica numbers start at 1".to_string(),
                });
            }
            let left_fe: f64 = parse_column(columns[LEFT_FE_COLUMN], lineno, "left_fe")?;
            let right_fe: f64 = parse_column(columns[RIGHT_FE_COLUMN], lineno, "right_fe")?;

            if replicas.len() < rep {
                replicas.resize_with(rep, Contributions::default);
            }
            let contributions = &mut replicas[rep - 1];
            contributions.left_fe.push(left_fe);
            contributions.right_fe.push(right_fe);
            contributions.last_block = numexchg;
        }

        // A log from a running or killed simulation usually stops partway through a block
        let seen = replicas.iter().filter(|c| c.last_block != 0).count();
        let in_last_block = replicas
            .iter()
            .filter(|c| c.last_block == numexchg)
            .count();
        if numexchg > 0 && (in_last_block == 0 || in_last_block < seen) {
            for c in replicas.iter_mut().filter(|c| c.last_block == numexchg) {
                c.left_fe.pop();
                c.right_fe.pop();
            }
            numexchg -= 1;
            warn!(
                exchange = numexchg + 1,
                "Dropping the last exchange, which is missing replicas"
            );
        }

        if numexchg == 0 {
            return Err(RefepError::RemLogParse {
                line: 0,
                message: "no complete exchange blocks".to_string(),
            });
        }

        if let Some(declared) = declared_numexchg {
            if declared != numexchg {
                warn!(
                    declared,
                    found = numexchg,
                    "Exchange log is incomplete; analyzing the exchanges it contains"
                );
            }
        }

        debug!(
            replicas = replicas.len(),
            numexchg, "Parsed exchange log"
        );

        let replicas = replicas
            .into_iter()
            .map(|c| Replica::new(Array1::from(c.left_fe), Array1::from(c.right_fe)))
            .collect();

        Ok(Self {
            declared_numexchg,
            ladder: ReplicaLadder::new(numexchg, replicas),
        })
    }

    /// Number of exchange blocks in the log
    pub fn numexchg(&self) -> usize {
        self.ladder.numexchg()
    }

    /// Number of exchanges announced in the log header, if any
    pub fn declared_numexchg(&self) -> Option<usize> {
        self.declared_numexchg
    }

    /// Number of replicas seen in the log
    pub fn num_replicas(&self) -> usize {
        self.ladder.len()
    }

    /// The replica ladder described by the log
    pub fn ladder(&self) -> &ReplicaLadder {
        &self.ladder
    }

    /// Consume the log and return its replica ladder
    pub fn into_ladder(self) -> ReplicaLadder {
        self.ladder
    }
}

fn parse_column<T: std::str::FromStr>(word: &str, line: usize, what: &str) -> Result<T> {
    word.parse().map_err(|_| RefepError::RemLogParse {
        line,
        message: format!("could not parse {} from {:?}", what, word),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convergence::compute_series;
    use std::io::Write;

    const LOG: &str = "\
# H-REMD exchange file
# numexchg is          2
# Rep#, Neibr#, Temp0, PotE(x_1), PotE(x_2), left_fe, right_fe, Success, Success_rate
# exchange          1
     1     3   300.00  -1000.00  -1000.50     0.00     1.00    F    0.00
     2     1   300.00  -1001.00  -1001.20     0.50     0.40    T    1.00
     3     2   300.00  -1002.00  -1002.20     2.00     0.00    F    0.00
# exchange          2
     1     2   300.00  -1000.10  -1000.60     0.00     1.20    T    0.50
     2     3   300.00  -1001.10  -1001.30     0.60     0.50    F    0.50
     3     1   300.00  -1002.10  -1002.30     2.10     0.00    T    0.50
";

    #[test]
    fn parse_log() {
        let log = HRemLog::from_reader(LOG.as_bytes()).unwrap();

        assert_eq!(log.numexchg(), 2);
        assert_eq!(log.declared_numexchg(), Some(2));
        assert_eq!(log.num_replicas(), 3);

        let reps = log.ladder().replicas();
        assert_eq!(reps[0].right_fe().to_vec(), vec![1.0, 1.2]);
        assert_eq!(reps[1].left_fe().to_vec(), vec![0.5, 0.6]);
        assert_eq!(reps[1].right_fe().to_vec(), vec![0.4, 0.5]);
        assert_eq!(reps[2].left_fe().to_vec(), vec![2.0, 2.1]);
    }

    #[test]
    fn parse_log_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LOG.as_bytes()).unwrap();

        let log = HRemLog::from_path(file.path()).unwrap();
        assert_eq!(log.into_ladder().numexchg(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = HRemLog::from_path(dir.path().join("rem.log"));

        assert!(matches!(result, Err(RefepError::Io { .. })));
    }

    #[test]
    fn truncated_log_uses_blocks_read() {
        let log = LOG.replace("numexchg is          2", "numexchg is       1000");
        let log = HRemLog::from_reader(log.as_bytes()).unwrap();

        assert_eq!(log.declared_numexchg(), Some(1000));
        assert_eq!(log.numexchg(), 2);
    }

    #[test]
    fn log_without_header_count() {
        let log = "\
# exchange 1
1 2 300.0 0.0 0.0 0.0 1.5 T 1.0
2 1 300.0 0.0 0.0 -1.5 0.0 T 1.0
";
        let log = HRemLog::from_reader(log.as_bytes()).unwrap();

        assert_eq!(log.declared_numexchg(), None);
        assert_eq!(log.numexchg(), 1);
        assert_eq!(log.num_replicas(), 2);
    }

    #[test]
    fn record_before_exchange_is_rejected() {
        let log = "# numexchg is 1\n1 2 300.0 0.0 0.0 0.0 1.5 T 1.0\n";

        assert!(matches!(
            HRemLog::from_reader(log.as_bytes()),
            Err(RefepError::RemLogParse { line: 2, .. })
        ));
    }

    #[test]
    fn short_record_is_rejected() {
        let log = "# exchange 1\n1 2 300.0 0.0 0.0 0.0\n";

        assert!(matches!(
            HRemLog::from_reader(log.as_bytes()),
            Err(RefepError::RemLogParse { line: 2, .. })
        ));
    }

    #[test]
    fn non_numeric_free_energy_is_rejected() {
        let log = "# exchange 1\n1 2 300.0 0.0 0.0 abc 1.5 T 1.0\n";

        assert!(matches!(
            HRemLog::from_reader(log.as_bytes()),
            Err(RefepError::RemLogParse { line: 2, .. })
        ));
    }

    #[test]
    fn replica_zero_is_rejected() {
        let log = "# exchange 1\n0 2 300.0 0.0 0.0 0.0 1.5 T 1.0\n";

        assert!(matches!(
            HRemLog::from_reader(log.as_bytes()),
            Err(RefepError::RemLogParse { line: 2, .. })
        ));
    }

    #[test]
    fn empty_log_is_rejected() {
        assert!(matches!(
            HRemLog::from_reader("# nothing here\n\n".as_bytes()),
            Err(RefepError::RemLogParse { line: 0, .. })
        ));
    }

    #[test]
    fn missing_record_surfaces_as_malformed_ladder() {
        // Replica 2 is absent from the second of three exchanges
        let log = "\
# exchange 1
1 2 300.0 0.0 0.0 0.0 1.0 T 1.0
2 1 300.0 0.0 0.0 0.5 0.0 T 1.0
# exchange 2
1 2 300.0 0.0 0.0 0.0 1.0 T 1.0
# exchange 3
1 2 300.0 0.0 0.0 0.0 1.0 T 1.0
2 1 300.0 0.0 0.0 0.5 0.0 T 1.0
";
        let log = HRemLog::from_reader(log.as_bytes()).unwrap();

        assert_eq!(log.numexchg(), 3);
        assert!(matches!(
            compute_series(log.ladder()),
            Err(RefepError::MalformedLadder {
                replica: 1,
                found: 2,
                expected: 3,
                ..
            })
        ));
    }

    #[test]
    fn partial_last_exchange_is_dropped() {
        let log = format!(
            "{}# exchange          3\n     1     2   300.00  -1000.20  -1000.70     0.00     1.30    F    0.33\n",
            LOG.replace("numexchg is          2", "numexchg is          3")
        );
        let log = HRemLog::from_reader(log.as_bytes()).unwrap();

        assert_eq!(log.declared_numexchg(), Some(3));
        assert_eq!(log.numexchg(), 2);
        assert_eq!(log.ladder().replicas()[0].right_fe().to_vec(), vec![1.0, 1.2]);

        let series = compute_series(log.ladder()).unwrap();
        assert_eq!(series.len(), 2);
        assert!((series.forward()[1] - -2.7).abs() < 1e-12);
        assert!((series.reverse()[1] - 1.7).abs() < 1e-12);
    }

    #[test]
    fn empty_last_exchange_is_dropped() {
        let log = format!("{}# exchange          3\n", LOG);
        let log = HRemLog::from_reader(log.as_bytes()).unwrap();

        assert_eq!(log.numexchg(), 2);
        assert!(compute_series(log.ladder()).is_ok());
    }

    #[test]
    fn record_free_trailing_exchange_is_dropped() {
        let log = "# exchange 1\n1 2 300.0 0.0 0.0 0.0 1.0 T 1.0\n# exchange 2\n";

        // The first block is complete; the second has no records and is dropped
        assert_eq!(HRemLog::from_reader(log.as_bytes()).unwrap().numexchg(), 1);
        assert!(matches!(
            HRemLog::from_reader("# exchange 1\n".as_bytes()),
            Err(RefepError::RemLogParse { line: 0, .. })
        ));
    }
}
