//! Integration scoring.
//!
//! The mutual-information estimator below is intentionally non-standard; the
//! `phi > 3.0` threshold is calibrated against its output range, so its
//! arithmetic must not be swapped for a textbook KL formulation.

use serde::{Deserialize, Serialize};

use crate::config::{PhiConfig, PhiConfigError};
use crate::partition::{restrict, PartitionInfo, PartitionSearch};
use crate::repertoire::Repertoires;
use crate::state::SystemState;

pub const PROBABILITY_FLOOR: f64 = 1e-10;
pub const PHI_CEILING: f64 = 15.0;
pub const CONSCIOUSNESS_THRESHOLD: f64 = 3.0;
const PHI_SCALE: f64 = 10.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhiResult {
    pub phi: f64,
    pub integrated_information: f64,
    pub partition_info: PartitionInfo,
    pub cause_repertoire: Vec<f64>,
    pub effect_repertoire: Vec<f64>,
    pub consciousness_threshold: bool,
}

/// `|Σ_i joint · log2(joint / (p1·p2 + ε))|` with `joint = (p1 + p2) / 2`
/// over the common prefix of both distributions, each element floored at ε.
pub fn mutual_information(d1: &[f64], d2: &[f64]) -> f64 {
    let total: f64 = d1
        .iter()
        .zip(d2)
        .map(|(&a, &b)| {
            let p1 = a.max(PROBABILITY_FLOOR);
            let p2 = b.max(PROBABILITY_FLOOR);
            let joint = (p1 + p2) / 2.0;
            joint * (joint / (p1 * p2 + PROBABILITY_FLOOR)).log2()
        })
        .sum();
    total.abs()
}

/// Sum of per-group information over the raw (unpartitioned) sub-vectors.
pub fn partition_information(repertoires: &Repertoires, groups: &[Vec<usize>]) -> f64 {
    groups
        .iter()
        .map(|group| {
            mutual_information(
                &restrict(&repertoires.cause, group),
                &restrict(&repertoires.effect, group),
            )
        })
        .sum()
}

/// Stateless Φ calculator; cheap to clone and share across threads.
#[derive(Clone, Debug, Default)]
pub struct PhiEngine {
    config: PhiConfig,
    search: PartitionSearch,
}

impl PhiEngine {
    pub fn new(config: PhiConfig) -> Result<Self, PhiConfigError> {
        config.validate()?;
        let search = PartitionSearch::from_config(&config);
        Ok(Self { config, search })
    }

    pub fn config(&self) -> &PhiConfig {
        &self.config
    }

    pub fn compute_phi(&self, state: &SystemState) -> PhiResult {
        let repertoires = Repertoires::from_state(state);
        let partition_info = self.search.search(&repertoires);

        let whole = mutual_information(&repertoires.cause, &repertoires.effect);
        let parts =
            partition_information(&repertoires, &partition_info.minimum_information_partition);
        let integrated_information = finite_or_zero((whole - parts).max(0.0));

        let phi = scaled_phi(integrated_information, partition_info.integration_level);

        PhiResult {
            phi,
            integrated_information,
            partition_info,
            cause_repertoire: repertoires.cause,
            effect_repertoire: repertoires.effect,
            consciousness_threshold: phi > CONSCIOUSNESS_THRESHOLD,
        }
    }
}

/// `clamp(ii · level · 10, 0, 15)`; non-finite products read as 0.
pub fn scaled_phi(integrated_information: f64, integration_level: f64) -> f64 {
    let raw = integrated_information * integration_level * PHI_SCALE;
    finite_or_zero(raw).clamp(0.0, PHI_CEILING)
}

/// [`PhiEngine::compute_phi`] with the default configuration.
pub fn compute_phi(state: &SystemState) -> PhiResult {
    PhiEngine::default().compute_phi(state)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
