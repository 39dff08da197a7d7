use phicore_engine::{
    compute_phi, mutual_information, PhiConfig, PhiEngine, PhiResult, SystemState,
};
use pretty_assertions::assert_eq;

fn scenario_a() -> SystemState {
    SystemState::new(
        vec![0.5, 0.6, 0.7, 0.8],
        vec![
            vec![0.9, 0.7, 0.5, 0.3],
            vec![0.7, 0.9, 0.7, 0.5],
            vec![0.5, 0.7, 0.9, 0.7],
            vec![0.3, 0.5, 0.7, 0.9],
        ],
        1,
    )
}

fn ring(n: usize) -> SystemState {
    let elements = (0..n).map(|i| 0.1 + 0.8 * (i as f64) / (n as f64)).collect();
    let connections = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| if (i + 1) % n == j { 0.8 } else { 0.05 * (i + j) as f64 })
                .collect()
        })
        .collect();
    SystemState::new(elements, connections, 3)
}

fn assert_repertoire(values: &[f64], n: usize) {
    assert_eq!(values.len(), n);
    assert!(values.iter().all(|v| *v >= 0.0));
    if n > 0 {
        let sum: f64 = values.iter().sum();
        assert!((sum - 1.0).abs() <= 1e-6, "repertoire sums to {sum}");
    }
}

fn assert_invariants(result: &PhiResult, n: usize) {
    assert!((0.0..=15.0).contains(&result.phi));
    assert!(result.integrated_information >= 0.0);
    assert_eq!(result.consciousness_threshold, result.phi > 3.0);
    assert_repertoire(&result.cause_repertoire, n);
    assert_repertoire(&result.effect_repertoire, n);
    let info = &result.partition_info;
    assert_eq!(info.num_partitions, info.minimum_information_partition.len());
    assert!((0.1..=1.0).contains(&info.integration_level));
    assert!(info.minimum_information_partition.iter().all(|g| !g.is_empty()) || n == 0);
}

#[test]
fn scenario_a_symmetric_four_element_state() {
    let result = compute_phi(&scenario_a());
    assert!(result.phi >= 0.0);
    assert!(result.integrated_information >= 0.0);
    assert_eq!(result.cause_repertoire.len(), 4);
    assert_eq!(result.effect_repertoire.len(), 4);
    assert_eq!(result.partition_info.num_partitions, 2);
    assert_invariants(&result, 4);
}

fn skewed() -> SystemState {
    SystemState::new(
        vec![0.2, 0.9, 0.4, 0.7, 0.1],
        vec![
            vec![0.0, 0.8, 0.1, 0.0, 0.5],
            vec![0.3, 0.6, 0.0, 0.9, 0.2],
            vec![0.7, 0.0, 0.4, 0.2, 0.0],
            vec![0.1, 0.5, 0.0, 0.3, 0.8],
            vec![0.0, 0.2, 0.9, 0.0, 0.1],
        ],
        2,
    )
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (index, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!((a - e).abs() <= 1e-12, "index {index}: {a} != {e}");
    }
}

struct Golden {
    cause: [f64; 5],
    effect: [f64; 5],
    groups: Vec<Vec<usize>>,
    partition_phi: f64,
    integration_level: f64,
    whole_information: f64,
}

fn assert_golden(result: &PhiResult, n: usize, golden: Golden) {
    assert_close(&result.cause_repertoire, &golden.cause[..n]);
    assert_close(&result.effect_repertoire, &golden.effect[..n]);
    let info = &result.partition_info;
    assert_eq!(info.minimum_information_partition, golden.groups);
    assert_close(&[info.partition_phi], &[golden.partition_phi]);
    assert_eq!(info.integration_level, golden.integration_level);
    assert_close(
        &[mutual_information(&result.cause_repertoire, &result.effect_repertoire)],
        &[golden.whole_information],
    );
    // Every per-element term is non-negative, so the MIP groups carry the
    // whole-system information and nothing is left over.
    assert!(result.integrated_information <= 1e-12);
    assert!(result.phi <= 1e-10);
    assert!(!result.consciousness_threshold);
}

#[test]
fn scenario_a_matches_reference_values() {
    let result = compute_phi(&scenario_a());
    assert_golden(
        &result,
        4,
        Golden {
            cause: [
                0.2442900866479305,
                0.25223630140480874,
                0.2542021514814079,
                0.2492714604658528,
                0.0,
            ],
            effect: [
                0.23778758796977215,
                0.24980885321993296,
                0.2566899359222558,
                0.255713622888039,
                0.0,
            ],
            groups: vec![vec![0], vec![1, 2, 3]],
            partition_phi: 2.481193973951925,
            integration_level: 0.75,
            whole_information: 1.9997993977742676,
        },
    );
}

#[test]
fn asymmetric_state_matches_reference_values() {
    let result = compute_phi(&skewed());
    assert_golden(
        &result,
        5,
        Golden {
            cause: [
                0.1970218684825054,
                0.20531017616083275,
                0.19054169543273913,
                0.20586027492886513,
                0.20126598499505757,
            ],
            effect: [
                0.19077644347324088,
                0.21863003641110007,
                0.195223068768658,
                0.2075620615223137,
                0.18780838982468726,
            ],
            groups: vec![vec![0, 1, 2, 3], vec![4]],
            partition_phi: 2.579015683913048,
            integration_level: 0.7,
            whole_information: 2.3215880818192085,
        },
    );
}

#[test]
fn scenario_b_threshold_tracks_phi() {
    let state = SystemState::uniform(6, 0.9, 0.95, 1.0);
    let result = compute_phi(&state);
    assert_eq!(result.consciousness_threshold, result.phi > 3.0);
    // Uniform activity leaves nothing to integrate.
    assert!(result.integrated_information < 1e-9);
    assert_invariants(&result, 6);
}

#[test]
fn repeated_computation_is_bit_identical() {
    for state in [scenario_a(), ring(5), ring(9), SystemState::uniform(3, 0.2, 0.4, 0.1)] {
        let first = compute_phi(&state);
        let second = compute_phi(&state);
        assert_eq!(first.phi.to_bits(), second.phi.to_bits());
        assert_eq!(
            first.integrated_information.to_bits(),
            second.integrated_information.to_bits()
        );
        assert_eq!(first, second);
    }
}

#[test]
fn invariants_hold_across_sizes() {
    for n in 0..12 {
        let result = compute_phi(&ring(n));
        assert_invariants(&result, n);
    }
}

#[test]
fn ragged_and_non_finite_inputs_are_tolerated() {
    let state = SystemState::new(
        vec![0.5, f64::NAN, 0.7, 1.5],
        vec![vec![0.2, f64::INFINITY], vec![], vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]],
        0,
    );
    let result = compute_phi(&state);
    assert!(result.phi.is_finite());
    assert_invariants(&result, 4);
}

#[test]
fn single_element_has_no_integration() {
    let result = compute_phi(&SystemState::new(vec![0.9], vec![vec![1.0]], 0));
    assert_eq!(result.partition_info.minimum_information_partition, vec![vec![0]]);
    assert_eq!(result.partition_info.partition_phi, 0.0);
    assert_eq!(result.integrated_information, 0.0);
    assert_eq!(result.phi, 0.0);
    assert_eq!(result.cause_repertoire, vec![1.0]);
}

#[test]
fn wider_mask_reaches_high_index_partitions() {
    let state = ring(9);
    let capped = PhiEngine::default().compute_phi(&state);
    let exhaustive = PhiEngine::new(PhiConfig {
        partition_mask_bits: 8,
    })
    .unwrap()
    .compute_phi(&state);
    assert_invariants(&capped, 9);
    assert_invariants(&exhaustive, 9);
    // The exhaustive walk sees a superset of candidates, so its loss can only match or improve.
    assert!(exhaustive.partition_info.partition_phi <= capped.partition_info.partition_phi);
}

#[test]
fn result_serializes_with_camel_case_fields() {
    let value = serde_json::to_value(compute_phi(&scenario_a())).unwrap();
    for key in [
        "phi",
        "integratedInformation",
        "partitionInfo",
        "causeRepertoire",
        "effectRepertoire",
        "consciousnessThreshold",
    ] {
        assert!(value.get(key).is_some(), "missing {key}");
    }
    assert!(value["partitionInfo"].get("minimumInformationPartition").is_some());
}
