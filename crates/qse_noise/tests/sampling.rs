//! Shot-sampling behavior under a seeded random engine.

use std::collections::BTreeMap;

use qse_core::rng;
use qse_noise::{NoiseConfig, NoisySimulator};
use qse_simulator::StateVectorSimulator;

fn desc(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn test_deterministic_outcome_with_zero_noise() {
    rng::seed(0);
    let config = NoiseConfig::parse(&desc(&[("depolarizing", 0.0)]), vec![[0.0, 0.0], [0.0, 0.0]])
        .unwrap();
    let mut sim = NoisySimulator::new(2, config).unwrap();
    sim.x(0, &[], false).unwrap();

    let histogram = sim.measure_shots_on(&[0, 1], 10_000).unwrap();
    // every outcome has bit 0 set
    assert_eq!(histogram.len(), 1);
    assert_eq!(histogram[&0b01], 10_000);
}

#[test]
fn test_bitflip_statistics() {
    rng::seed(0);
    let config = NoiseConfig::parse(&desc(&[("bitflip", 0.5)]), vec![]).unwrap();
    let mut sim = NoisySimulator::new(1, config).unwrap();
    sim.h(0, &[], false).unwrap();

    let shots = 100_000;
    let histogram = sim.measure_shots(shots).unwrap();
    let zeros = histogram.get(&0).copied().unwrap_or(0);
    let frequency = zeros as f64 / shots as f64;
    assert!(
        (frequency - 0.5).abs() < 0.01,
        "outcome 0 frequency = {}",
        frequency
    );
    let observed: usize = histogram.values().sum();
    assert_eq!(observed, shots);
}

#[test]
fn test_readout_error_flips_ground_state() {
    rng::seed(1);
    // ideal circuit, but |0> always reads as 1
    let config = NoiseConfig::parse(&desc(&[]), vec![[1.0, 0.0]]).unwrap();
    let mut sim = NoisySimulator::new(1, config).unwrap();
    sim.id(0, &[], false).unwrap();

    let histogram = sim.measure_shots(2_000).unwrap();
    assert_eq!(histogram.len(), 1);
    assert_eq!(histogram[&1], 2_000);
}

#[test]
fn test_readout_error_statistics() {
    rng::seed(5);
    let config = NoiseConfig::parse(&desc(&[]), vec![[0.1, 0.0]]).unwrap();
    let mut sim = NoisySimulator::new(1, config).unwrap();
    sim.id(0, &[], false).unwrap();

    let shots = 50_000;
    let histogram = sim.measure_shots(shots).unwrap();
    let ones = histogram.get(&1).copied().unwrap_or(0);
    let frequency = ones as f64 / shots as f64;
    assert!(
        (frequency - 0.1).abs() < 0.01,
        "flip frequency = {}",
        frequency
    );
}

#[test]
fn test_damping_collapses_excited_state() {
    rng::seed(2);
    let config = NoiseConfig::parse(&desc(&[("damping", 1.0)]), vec![]).unwrap();
    let mut sim = NoisySimulator::new(1, config).unwrap();
    sim.x(0, &[], false).unwrap();

    let histogram = sim.measure_shots(500).unwrap();
    assert_eq!(histogram.len(), 1);
    assert_eq!(histogram[&0], 500);
}

#[test]
fn test_seeded_replay_is_identical() {
    let config = NoiseConfig::parse(&desc(&[("depolarizing", 0.2)]), vec![]).unwrap();
    let mut sim = NoisySimulator::new(2, config).unwrap();
    sim.h(0, &[], false).unwrap();
    sim.cnot(0, 1, &[], false).unwrap();

    rng::seed(99);
    let first = sim.measure_shots(2_000).unwrap();
    rng::seed(99);
    let second = sim.measure_shots(2_000).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_shot_frequencies_match_statevector() {
    rng::seed(0);
    let mut reference = StateVectorSimulator::new(3).unwrap();
    reference.h(0, &[], false).unwrap();
    reference.ry(1, 0.77, &[], false).unwrap();
    reference.cnot(0, 2, &[], false).unwrap();
    let expected = reference.probabilities();

    let mut sim = NoisySimulator::new(3, NoiseConfig::new()).unwrap();
    sim.h(0, &[], false).unwrap();
    sim.ry(1, 0.77, &[], false).unwrap();
    sim.cnot(0, 2, &[], false).unwrap();

    let shots = 50_000;
    let histogram = sim.measure_shots(shots).unwrap();
    for (index, &p) in expected.iter().enumerate() {
        let observed = histogram.get(&index).copied().unwrap_or(0) as f64 / shots as f64;
        assert!(
            (observed - p).abs() < 0.02,
            "index {}: observed {} expected {}",
            index,
            observed,
            p
        );
    }
}

#[test]
fn test_projection_marginalizes_unmeasured_qubits() {
    rng::seed(3);
    let mut sim = NoisySimulator::new(2, NoiseConfig::new()).unwrap();
    sim.x(1, &[], false).unwrap();
    sim.h(0, &[], false).unwrap();

    // measuring only qubit 1 ignores the superposed qubit 0
    let histogram = sim.measure_shots_on(&[1], 1_000).unwrap();
    assert_eq!(histogram.len(), 1);
    assert_eq!(histogram[&1], 1_000);
}

#[test]
fn test_measure_list_validated() {
    let mut sim = NoisySimulator::new(2, NoiseConfig::new()).unwrap();
    sim.h(0, &[], false).unwrap();
    assert!(sim.measure_shots_on(&[0, 0], 10).is_err());
    assert!(sim.measure_shots_on(&[2], 10).is_err());
}

#[test]
fn test_gate_dependent_noise_only_fires_on_its_gate() {
    rng::seed(4);
    // a bit flip after every X, nothing after H
    let mut gate_desc = BTreeMap::new();
    gate_desc.insert("x".to_string(), desc(&[("bitflip", 1.0)]));
    let config = NoiseConfig::new().with_gate_dependent(&gate_desc).unwrap();

    let mut sim = NoisySimulator::new(1, config).unwrap();
    sim.x(0, &[], false).unwrap();
    // X followed by a certain flip lands back on |0>
    let histogram = sim.measure_shots(200).unwrap();
    assert_eq!(histogram[&0], 200);
}

#[test]
fn test_crosstalk_error_reaches_spectator() {
    rng::seed(6);
    // twoqubit_depolarizing with p = 1 always applies one of the 15
    // nontrivial Pauli pairs, so over many shots the spectator qubit
    // gets hit at a known rate
    let config = NoiseConfig::new()
        .with_gate_error_2q("x", (0, 1), &desc(&[("twoqubit_depolarizing", 1.0)]))
        .unwrap();
    let mut sim = NoisySimulator::new(2, config).unwrap();
    sim.x(0, &[], false).unwrap();

    let shots = 5_000;
    let histogram = sim.measure_shots(shots).unwrap();
    let spectator_flipped: usize = histogram
        .iter()
        .filter(|(index, _)| *index & 0b10 != 0)
        .map(|(_, count)| count)
        .sum();
    // 8 of the 15 Pauli pairs act as X or Y on the spectator
    let frequency = spectator_flipped as f64 / shots as f64;
    assert!(
        (frequency - 8.0 / 15.0).abs() < 0.03,
        "spectator flip frequency = {}",
        frequency
    );
}
