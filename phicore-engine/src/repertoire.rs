//! Cause/effect repertoires.
//!
//! For element `i`:
//! - cause influence  = Σ_j w[j][i] · a[j] / max(n, 1)   (incoming edges)
//! - effect influence = Σ_j w[i][j] · a[i] / max(n, 1)   (outgoing edges)
//!
//! Each influence goes through the logistic function and the resulting vector
//! is L1-normalised on absolute values.

use serde::{Deserialize, Serialize};

use crate::state::SystemState;

/// Cause and effect distributions of one state, both of length `n`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Repertoires {
    pub cause: Vec<f64>,
    pub effect: Vec<f64>,
}

impl Repertoires {
    pub fn from_state(state: &SystemState) -> Self {
        Self {
            cause: cause_repertoire(state),
            effect: effect_repertoire(state),
        }
    }

    pub fn len(&self) -> usize {
        self.cause.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cause.is_empty()
    }
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

pub fn cause_repertoire(state: &SystemState) -> Vec<f64> {
    let n = state.len();
    let scale = n.max(1) as f64;
    let raw = (0..n)
        .map(|i| {
            let incoming: f64 = (0..n).map(|j| state.weight(j, i) * state.activation(j)).sum();
            sigmoid(nan_to_zero(incoming / scale))
        })
        .collect();
    normalize(raw)
}

pub fn effect_repertoire(state: &SystemState) -> Vec<f64> {
    let n = state.len();
    let scale = n.max(1) as f64;
    let raw = (0..n)
        .map(|i| {
            let activation = state.activation(i);
            let outgoing: f64 = (0..n).map(|j| state.weight(i, j) * activation).sum();
            sigmoid(nan_to_zero(outgoing / scale))
        })
        .collect();
    normalize(raw)
}

/// Divide every component by Σ|component|; a zero (or non-finite) mass
/// yields the uniform distribution.
pub fn normalize(values: Vec<f64>) -> Vec<f64> {
    let total: f64 = values.iter().map(|v| v.abs()).sum();
    if total == 0.0 || !total.is_finite() {
        return uniform(values.len());
    }
    values.into_iter().map(|v| v / total).collect()
}

pub fn uniform(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    vec![1.0 / n as f64; n]
}

fn nan_to_zero(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_distribution(values: &[f64]) {
        let sum: f64 = values.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "sum was {sum}");
        assert!(values.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn sigmoid_midpoint_and_saturation() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert_eq!(sigmoid(f64::INFINITY), 1.0);
        assert_eq!(sigmoid(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn normalize_zero_mass_is_uniform() {
        assert_eq!(normalize(vec![0.0; 4]), vec![0.25; 4]);
        assert!(normalize(Vec::new()).is_empty());
    }

    #[test]
    fn unconnected_state_is_uniform() {
        let state = SystemState::new(vec![0.3, 0.7, 0.1], Vec::new(), 0);
        let reps = Repertoires::from_state(&state);
        for value in reps.cause.iter().chain(reps.effect.iter()) {
            assert!((value - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn incoming_and_outgoing_edges_are_distinguished() {
        // Single edge 0 -> 1.
        let state = SystemState::new(vec![1.0, 1.0], vec![vec![0.0, 4.0], vec![0.0, 0.0]], 0);
        let reps = Repertoires::from_state(&state);
        assert_distribution(&reps.cause);
        assert_distribution(&reps.effect);
        // Element 1 receives the edge; element 0 emits it.
        assert!(reps.cause[1] > reps.cause[0]);
        assert!(reps.effect[0] > reps.effect[1]);
    }
}
