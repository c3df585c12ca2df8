//! Replicas and the ladder they form

use crate::errors::*;
use ndarray::Array1;
use std::fmt;

/// Which neighbour a free energy contribution points to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Towards the replica below in the ladder
    Left,
    /// Towards the replica above in the ladder
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Where a replica sits in the ladder
///
/// The two ends of the ladder only have one neighbour, so they only contribute to one of the
/// directional free energy estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// The lowest rung; only has a neighbour to its right
    First,
    /// Has neighbours on both sides
    Interior,
    /// The topmost rung; only has a neighbour to its left
    Last,
}

/// One simulated copy of the system in the exchange ladder
///
/// `left_fe[i]` and `right_fe[i]` are the free energy contributions towards the left and right
/// neighbours computed at exchange `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Replica {
    left_fe: Array1<f64>,
    right_fe: Array1<f64>,
}

impl Replica {
    /// Create a replica from its left and right free energy contributions
    pub fn new(left_fe: Array1<f64>, right_fe: Array1<f64>) -> Self {
        Self { left_fe, right_fe }
    }

    /// Create a replica from slices of contributions
    pub fn from_slices(left_fe: &[f64], right_fe: &[f64]) -> Self {
        Self::new(Array1::from(left_fe.to_vec()), Array1::from(right_fe.to_vec()))
    }

    /// `left_fe[i]` is the free energy contribution towards the left neighbour at exchange `i`
    pub fn left_fe(&self) -> &Array1<f64> {
        &self.left_fe
    }

    /// `right_fe[i]` is the free energy contribution towards the right neighbour at exchange `i`
    pub fn right_fe(&self) -> &Array1<f64> {
        &self.right_fe
    }

    /// The contributions on one side
    pub fn side(&self, side: Side) -> &Array1<f64> {
        match side {
            Side::Left => &self.left_fe,
            Side::Right => &self.right_fe,
        }
    }
}

/// The ordered set of replicas connected by adjacent-neighbour exchange attempts
///
/// Replicas are stored in ladder order. The ladder makes no promise that every replica has
/// `numexchg` contributions; that is checked when the convergence series is computed.
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(name = "build_inner", private))]
pub struct ReplicaLadder {
    /// Number of exchange attempts in the simulation
    numexchg: usize,

    /// Replicas in ladder order
    replicas: Vec<Replica>,
}

impl ReplicaLadderBuilder {
    /// Add a single replica to the top of the ladder
    pub fn replica(&mut self, replica: Replica) -> &mut Self {
        self.replicas.get_or_insert_with(Vec::new).push(replica);
        self
    }

    /// Build the ladder
    pub fn build(&self) -> Result<ReplicaLadder> {
        Ok(self.build_inner()?)
    }
}

impl ReplicaLadder {
    /// Create a ladder directly
    pub fn new(numexchg: usize, replicas: Vec<Replica>) -> Self {
        Self { numexchg, replicas }
    }

    /// Get a new builder for the `ReplicaLadder` struct
    pub fn builder() -> ReplicaLadderBuilder {
        ReplicaLadderBuilder::default()
    }

    /// Number of exchange attempts
    pub fn numexchg(&self) -> usize {
        self.numexchg
    }

    /// $R$, the number of replicas
    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    /// Does the ladder have no replicas at all?
    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    /// Replicas in ladder order
    pub fn replicas(&self) -> &[Replica] {
        &self.replicas
    }

    /// Position of replica `j` in the ladder
    ///
    /// For a ladder of one replica this reports `First`; such a ladder is rejected before any
    /// accumulation happens.
    pub fn position(&self, j: usize) -> Position {
        if j == 0 {
            Position::First
        } else if j + 1 == self.replicas.len() {
            Position::Last
        } else {
            Position::Interior
        }
    }

    /// Check that the ladder can be accumulated over
    ///
    /// Fails with `InsufficientReplicas` if there are fewer than two replicas, and with
    /// `MalformedLadder` for the first replica whose contributions are not exactly `numexchg`
    /// long.
    pub fn validate(&self) -> Result<()> {
        if self.replicas.len() < 2 {
            return Err(RefepError::InsufficientReplicas {
                found: self.replicas.len(),
            });
        }

        for (replica, rep) in self.replicas.iter().enumerate() {
            for &side in &[Side::Left, Side::Right] {
                let found = rep.side(side).len();
                if found != self.numexchg {
                    return Err(RefepError::MalformedLadder {
                        replica,
                        side,
                        found,
                        expected: self.numexchg,
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_ladder() {
        let ladder = ReplicaLadder::builder()
            .numexchg(2)
            .replica(Replica::from_slices(&[0.0, 0.0], &[1.0, 1.2]))
            .replica(Replica::from_slices(&[2.0, 2.1], &[0.0, 0.0]))
            .build()
            .unwrap();

        assert_eq!(ladder.numexchg(), 2);
        assert_eq!(ladder.len(), 2);
        assert_eq!(ladder.replicas()[0].right_fe().to_vec(), vec![1.0, 1.2]);
        assert_eq!(ladder.replicas()[1].left_fe().to_vec(), vec![2.0, 2.1]);
    }

    #[test]
    fn builder_requires_numexchg() {
        let result = ReplicaLadder::builder()
            .replicas(vec![Replica::from_slices(&[0.0], &[0.0])])
            .build();

        assert!(matches!(result, Err(RefepError::BuilderError(_))));
    }

    #[test]
    fn positions() {
        let rep = Replica::from_slices(&[0.0], &[0.0]);
        let ladder = ReplicaLadder::new(1, vec![rep.clone(), rep.clone(), rep.clone(), rep]);

        assert_eq!(ladder.position(0), Position::First);
        assert_eq!(ladder.position(1), Position::Interior);
        assert_eq!(ladder.position(2), Position::Interior);
        assert_eq!(ladder.position(3), Position::Last);
    }

    #[test]
    fn two_replicas_have_no_interior() {
        let rep = Replica::from_slices(&[0.0], &[0.0]);
        let ladder = ReplicaLadder::new(1, vec![rep.clone(), rep]);

        assert_eq!(ladder.position(0), Position::First);
        assert_eq!(ladder.position(1), Position::Last);
        assert!(ladder.validate().is_ok());
    }

    #[test]
    fn validate_rejects_single_replica() {
        let ladder = ReplicaLadder::new(1, vec![Replica::from_slices(&[0.0], &[0.0])]);

        assert!(matches!(
            ladder.validate(),
            Err(RefepError::InsufficientReplicas { found: 1 })
        ));
    }

    #[test]
    fn validate_reports_short_side() {
        let ladder = ReplicaLadder::new(
            3,
            vec![
                Replica::from_slices(&[0.0; 3], &[0.0; 3]),
                Replica::from_slices(&[0.0; 3], &[0.0; 2]),
            ],
        );

        match ladder.validate() {
            Err(RefepError::MalformedLadder {
                replica,
                side,
                found,
                expected,
            }) => {
                assert_eq!(replica, 1);
                assert_eq!(side, Side::Right);
                assert_eq!(found, 2);
                assert_eq!(expected, 3);
            }
            other => panic!("Expected MalformedLadder, got {:?}", other),
        }
    }
}
