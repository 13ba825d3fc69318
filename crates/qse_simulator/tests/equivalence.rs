//! Cross-engine equivalence: for unitary-only circuits the diagonal of
//! the density matrix must match the state-vector probabilities.

use std::collections::BTreeMap;

use qse_simulator::{DensityOperatorSimulator, StateVectorSimulator};

const TOLERANCE: f64 = 1e-9;

/// Drives both engines through the same gate sequence.
struct Tandem {
    sv: StateVectorSimulator,
    dm: DensityOperatorSimulator,
}

impl Tandem {
    fn new(n: usize) -> Self {
        Self {
            sv: StateVectorSimulator::new(n).unwrap(),
            dm: DensityOperatorSimulator::new(n).unwrap(),
        }
    }

    fn assert_probs_match(&self) {
        let sv_probs = self.sv.probabilities();
        let dm_probs = self.dm.stateprob();
        for (i, (a, b)) in sv_probs.iter().zip(dm_probs.iter()).enumerate() {
            assert!(
                (a - b).abs() < TOLERANCE,
                "probability mismatch at index {}: sv = {}, dm = {}",
                i,
                a,
                b
            );
        }
    }
}

#[test]
fn test_bell_circuit_matches() {
    let mut t = Tandem::new(2);
    t.sv.h(0, &[], false).unwrap();
    t.dm.h(0, &[], false).unwrap();
    t.sv.cnot(0, 1, &[], false).unwrap();
    t.dm.cnot(0, 1, &[], false).unwrap();
    t.assert_probs_match();
}

#[test]
fn test_dense_circuit_matches() {
    let mut t = Tandem::new(3);
    let thetas = [0.31, -1.2, 2.7, 0.05, 1.9];

    for (layer, &theta) in thetas.iter().enumerate() {
        let q = layer % 3;
        let q2 = (layer + 1) % 3;
        t.sv.u3(q, theta, 0.4, -0.9, &[], false).unwrap();
        t.dm.u3(q, theta, 0.4, -0.9, &[], false).unwrap();
        t.sv.h(q2, &[], false).unwrap();
        t.dm.h(q2, &[], false).unwrap();
        t.sv.xx(q, q2, theta, &[], false).unwrap();
        t.dm.xx(q, q2, theta, &[], false).unwrap();
        t.sv.zz(q2, (q2 + 1) % 3, -theta, &[], true).unwrap();
        t.dm.zz(q2, (q2 + 1) % 3, -theta, &[], true).unwrap();
        t.sv.cnot(q, q2, &[], false).unwrap();
        t.dm.cnot(q, q2, &[], false).unwrap();
        t.sv.s(q, &[], layer % 2 == 0).unwrap();
        t.dm.s(q, &[], layer % 2 == 0).unwrap();
        t.assert_probs_match();
    }
}

#[test]
fn test_controlled_gates_match() {
    let mut t = Tandem::new(3);
    t.sv.h(0, &[], false).unwrap();
    t.dm.h(0, &[], false).unwrap();
    t.sv.ry(1, 0.77, &[0], false).unwrap();
    t.dm.ry(1, 0.77, &[0], false).unwrap();
    t.sv.u1(2, 1.1, &[0, 1], false).unwrap();
    t.dm.u1(2, 1.1, &[0, 1], false).unwrap();
    t.sv.iswap(1, 2, &[0], false).unwrap();
    t.dm.iswap(1, 2, &[0], false).unwrap();
    t.assert_probs_match();
}

#[test]
fn test_composites_match() {
    let params: Vec<f64> = (0..15).map(|i| 0.11 * (i as f64) - 0.6).collect();
    let mut t = Tandem::new(2);
    t.sv.h(0, &[], false).unwrap();
    t.dm.h(0, &[], false).unwrap();
    t.sv.uu15(0, 1, &params, &[], false).unwrap();
    t.dm.uu15(0, 1, &params, &[], false).unwrap();
    t.sv.phase2q(0, 1, 0.3, -0.2, 0.9, &[], false).unwrap();
    t.dm.phase2q(0, 1, 0.3, -0.2, 0.9, &[], false).unwrap();
    t.assert_probs_match();
}

#[test]
fn test_marginals_match() {
    let mut t = Tandem::new(3);
    t.sv.h(0, &[], false).unwrap();
    t.dm.h(0, &[], false).unwrap();
    t.sv.cnot(0, 2, &[], false).unwrap();
    t.dm.cnot(0, 2, &[], false).unwrap();
    t.sv.ry(1, 1.0, &[], false).unwrap();
    t.dm.ry(1, 1.0, &[], false).unwrap();

    let sv_marginal = t.sv.pmeasure_list(&[2, 0]).unwrap();
    let dm_marginal = t.dm.pmeasure_list(&[2, 0]).unwrap();
    for (a, b) in sv_marginal.iter().zip(dm_marginal.iter()) {
        assert!((a - b).abs() < TOLERANCE);
    }

    let mut assignment = BTreeMap::new();
    assignment.insert(0, 1);
    assignment.insert(2, 1);
    let sv_joint = t.sv.get_prob_map(&assignment).unwrap();
    let dm_joint = t.dm.get_prob_map(&assignment).unwrap();
    assert!((sv_joint - dm_joint).abs() < TOLERANCE);
    assert!((sv_joint - 0.5).abs() < TOLERANCE);
}
