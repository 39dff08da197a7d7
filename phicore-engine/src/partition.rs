//! Minimum information partition search.
//!
//! Candidates come from a flat bitmask walk: mask `m` in
//! `1..min(2^(n-1), 2^bits)` puts element `j` in part A when bit `j` is set and
//! in part B otherwise. Because the top element never gets a bit, each
//! unordered bipartition is visited at most once.

use serde::{Deserialize, Serialize};

use crate::config::PhiConfig;
use crate::repertoire::{normalize, Repertoires};

/// Two-way split of the element indices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bipartition {
    pub part_a: Vec<usize>,
    pub part_b: Vec<usize>,
}

impl Bipartition {
    pub fn from_mask(n: usize, mask: u64) -> Self {
        let (part_a, part_b): (Vec<usize>, Vec<usize>) = (0..n).partition(|&j| j < 64 && (mask >> j) & 1 == 1);
        Self { part_a, part_b }
    }

    pub fn is_proper(&self) -> bool {
        !self.part_a.is_empty() && !self.part_b.is_empty()
    }

    pub fn parts(&self) -> [&[usize]; 2] {
        [&self.part_a, &self.part_b]
    }

    pub fn into_groups(self) -> Vec<Vec<usize>> {
        vec![self.part_a, self.part_b]
    }
}

/// Iterator over the proper bipartitions reachable under the mask cap.
#[derive(Clone, Debug)]
pub struct Bipartitions {
    n: usize,
    mask: u64,
    limit: u64,
}

impl Bipartitions {
    pub fn new(n: usize, mask_bits: u32) -> Self {
        // min(2^(n-1), 2^bits) == 2^min(n-1, bits)
        let limit = match n.checked_sub(1) {
            Some(span) if span > 0 => 1u64 << span.min(mask_bits.min(63) as usize),
            _ => 1,
        };
        Self { n, mask: 1, limit }
    }

    /// Upper bound on the number of candidates (masks examined).
    pub fn mask_limit(&self) -> u64 {
        self.limit
    }
}

impl Iterator for Bipartitions {
    type Item = Bipartition;

    fn next(&mut self) -> Option<Self::Item> {
        while self.mask < self.limit {
            let candidate = Bipartition::from_mask(self.n, self.mask);
            self.mask += 1;
            if candidate.is_proper() {
                return Some(candidate);
            }
        }
        None
    }
}

/// Winning partition of a search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionInfo {
    /// Two groups for the MIP, or one group holding every index when no
    /// candidate was evaluated.
    pub minimum_information_partition: Vec<Vec<usize>>,
    pub partition_phi: f64,
    pub num_partitions: usize,
    pub integration_level: f64,
}

impl PartitionInfo {
    fn unpartitioned(n: usize) -> Self {
        Self::from_groups(vec![(0..n).collect()], 0.0, n)
    }

    fn from_groups(groups: Vec<Vec<usize>>, partition_phi: f64, n: usize) -> Self {
        let integration_level = integration_level(&groups, n);
        Self {
            num_partitions: groups.len(),
            minimum_information_partition: groups,
            partition_phi,
            integration_level,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartitionSearch {
    mask_bits: u32,
}

impl Default for PartitionSearch {
    fn default() -> Self {
        Self::from_config(&PhiConfig::default())
    }
}

impl PartitionSearch {
    pub fn new(mask_bits: u32) -> Self {
        Self { mask_bits }
    }

    pub fn from_config(config: &PhiConfig) -> Self {
        Self::new(config.partition_mask_bits)
    }

    pub fn candidates(&self, n: usize) -> Bipartitions {
        Bipartitions::new(n, self.mask_bits)
    }

    /// Score every candidate and keep the first one with the lowest loss.
    pub fn search(&self, repertoires: &Repertoires) -> PartitionInfo {
        let n = repertoires.len();
        let mut best: Option<(Bipartition, f64)> = None;
        for candidate in self.candidates(n) {
            let loss = partition_loss(repertoires, &candidate);
            if !loss.is_finite() {
                continue;
            }
            if best.as_ref().map_or(true, |(_, min)| loss < *min) {
                best = Some((candidate, loss));
            }
        }
        match best {
            Some((partition, loss)) => PartitionInfo::from_groups(partition.into_groups(), loss, n),
            None => PartitionInfo::unpartitioned(n),
        }
    }
}

/// Cause loss plus effect loss of cutting the system along `partition`.
pub fn partition_loss(repertoires: &Repertoires, partition: &Bipartition) -> f64 {
    let cause_loss = distribution_loss(&repertoires.cause, partition);
    let effect_loss = distribution_loss(&repertoires.effect, partition);
    cause_loss + effect_loss
}

fn distribution_loss(distribution: &[f64], partition: &Bipartition) -> f64 {
    let subs: Vec<Vec<f64>> = partition
        .parts()
        .iter()
        .map(|part| restrict(distribution, part))
        .collect();
    let mut loss = 0.0;
    for (index, raw) in subs.iter().enumerate() {
        let others: Vec<&[f64]> = subs
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != index)
            .map(|(_, sub)| sub.as_slice())
            .collect();
        loss += earth_movers_distance(raw, &partitioned(raw, &others));
    }
    loss
}

/// Values of `distribution` at `indices`; out-of-range indices read as 0.
pub fn restrict(distribution: &[f64], indices: &[usize]) -> Vec<f64> {
    indices
        .iter()
        .map(|&i| distribution.get(i).copied().unwrap_or(0.0))
        .collect()
}

fn partitioned(raw: &[f64], others: &[&[f64]]) -> Vec<f64> {
    let values = raw
        .iter()
        .map(|value| {
            others
                .iter()
                .fold(*value, |acc, other| acc * (1.0 - mean(other) * 0.5))
        })
        .collect();
    normalize(values)
}

/// Running-sum distance: Σ_k |Σ_{i≤k} (a_i − b_i)|.
pub fn earth_movers_distance(a: &[f64], b: &[f64]) -> f64 {
    let mut carried = 0.0;
    let mut total = 0.0;
    for (x, y) in a.iter().zip(b) {
        carried += x - y;
        total += f64::abs(carried);
    }
    total
}

/// `max(0.1, 1 − sqrt(var(sizes)) / n)` with population variance.
pub fn integration_level(groups: &[Vec<usize>], n: usize) -> f64 {
    if groups.is_empty() {
        return 1.0;
    }
    let count = groups.len() as f64;
    let mean = groups.iter().map(|g| g.len() as f64).sum::<f64>() / count;
    let variance = groups
        .iter()
        .map(|g| (g.len() as f64 - mean).powi(2))
        .sum::<f64>()
        / count;
    (1.0 - variance.sqrt() / n.max(1) as f64).max(0.1)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
