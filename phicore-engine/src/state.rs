use serde::{Deserialize, Serialize};

/// Activation graph fed into the Φ engine.
///
/// `connections[i][j]` is the directed weight from element `i` to element `j`.
/// Rows or columns that are missing, short, or hold non-finite values read as
/// weight `0.0`; the engine never rejects a state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemState {
    pub elements: Vec<f64>,
    #[serde(default)]
    pub connections: Vec<Vec<f64>>,
    /// Only consumed by decay logic outside the engine.
    #[serde(default)]
    pub time_step: i64,
}

impl SystemState {
    pub fn new(elements: Vec<f64>, connections: Vec<Vec<f64>>, time_step: i64) -> Self {
        Self {
            elements,
            connections,
            time_step,
        }
    }

    /// Fully connected state with one activation level for every element.
    pub fn uniform(n: usize, activation: f64, off_diagonal: f64, diagonal: f64) -> Self {
        let connections = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| if i == j { diagonal } else { off_diagonal })
                    .collect()
            })
            .collect();
        Self::new(vec![activation; n], connections, 0)
    }

    pub fn with_time_step(mut self, time_step: i64) -> Self {
        self.time_step = time_step;
        self
    }

    /// Number of elements; the connection matrix never widens the system.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn activation(&self, index: usize) -> f64 {
        finite_or_zero(self.elements.get(index).copied())
    }

    pub fn weight(&self, from: usize, to: usize) -> f64 {
        finite_or_zero(self.connections.get(from).and_then(|row| row.get(to)).copied())
    }
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}
