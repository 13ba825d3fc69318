//! Shot-sampling engine over a deferred operation trace.
//!
//! Gate calls on [`NoisySimulator`] do not touch a state; they are
//! validated, appended to the trace, and followed by the noise opcodes
//! their configuration demands. `measure_shots` then replays the trace
//! against a fresh state vector once per shot, samples one outcome
//! from the final amplitude distribution, perturbs it with readout
//! error, and aggregates counts into a histogram.
//!
//! Noise insertion order after every gate is deterministic:
//! global, then gate-dependent, then gate-qubit-specific pair errors
//! (crosstalk), then gate-qubit-specific local errors. Three-qubit
//! gates participate in the global and gate-dependent layers only.
//!
//! Because every gate method validates eagerly, a trace that was
//! assembled successfully cannot raise `InvalidArgument` during a
//! shot; shot-time failures are internal (`Runtime`) by construction.

use std::collections::HashMap;

use tracing::debug;

use qse_core::bits::{pow2, preprocess_measure_list, project_index};
use qse_core::error::{QseError, Result};
use qse_core::gates::GateKind;
use qse_core::matrix::{abs_sqr, is_unitary2, is_unitary4, C64, Mat2, Mat4};
use qse_core::rng;
use qse_simulator::StateVectorSimulator;

use crate::config::NoiseConfig;
use crate::opcode::{pack_mat2, pack_mat4, unpack_mat2, unpack_mat4, NoiseKind, Opcode};

/// Deferred-execution noisy simulator.
pub struct NoisySimulator {
    nqubit: usize,
    config: NoiseConfig,
    sim: StateVectorSimulator,
    opcodes: Vec<Opcode>,
}

impl NoisySimulator {
    /// Creates an n-qubit noisy engine with the given configuration.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when n exceeds the state-vector ceiling or the
    /// configuration carries an out-of-range probability.
    pub fn new(nqubit: usize, config: NoiseConfig) -> Result<Self> {
        config.validate()?;
        let sim = StateVectorSimulator::new(nqubit)?;
        debug!(
            nqubit,
            global_noise = config.global.len(),
            gate_dependent = config.gate_dependent.len(),
            "initializing noisy sampling engine"
        );
        Ok(Self {
            nqubit,
            config,
            sim,
            opcodes: Vec::new(),
        })
    }

    /// Returns the number of qubits.
    pub fn total_qubits(&self) -> usize {
        self.nqubit
    }

    /// Returns the assembled trace.
    pub fn opcodes(&self) -> &[Opcode] {
        &self.opcodes
    }

    /// Returns the noise configuration.
    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }

    /// Returns the internal amplitude vector (state of the last shot).
    pub fn state(&self) -> &[C64] {
        self.sim.state()
    }

    /// Drops every recorded opcode.
    pub fn clear(&mut self) {
        self.opcodes.clear();
    }

    // -----------------------------------------------------------------
    // validation (submission time)
    // -----------------------------------------------------------------

    fn check_qubit(&self, qn: usize) -> Result<()> {
        if qn >= self.nqubit {
            return Err(QseError::invalid_argument(format!(
                "Exceed total (total_qubit = {}, input = {})",
                self.nqubit, qn
            )));
        }
        Ok(())
    }

    fn check_targets(&self, targets: &[usize], controls: &[usize]) -> Result<()> {
        for &qn in targets.iter().chain(controls.iter()) {
            self.check_qubit(qn)?;
        }
        for (a, &qa) in targets.iter().enumerate() {
            for &qb in &targets[a + 1..] {
                if qa == qb {
                    return Err(QseError::invalid_argument(format!(
                        "Duplicate qubit ({}) in gate operands",
                        qa
                    )));
                }
            }
            if controls.contains(&qa) {
                return Err(QseError::invalid_argument(format!(
                    "Qubit {} used as both target and control",
                    qa
                )));
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // trace construction
    // -----------------------------------------------------------------

    fn push_gate(
        &mut self,
        kind: GateKind,
        qubits: Vec<usize>,
        params: Vec<f64>,
        dagger: bool,
        controls: &[usize],
    ) {
        self.opcodes.push(Opcode::Gate {
            kind,
            qubits: qubits.clone(),
            params,
            dagger,
            controls: controls.to_vec(),
        });
        self.insert_error(&qubits, kind);
    }

    fn push_noise_map(&mut self, qubits: &[usize], entries: Vec<(NoiseKind, f64)>) {
        for (kind, p) in entries {
            self.opcodes.push(Opcode::Noise {
                kind,
                qubits: qubits.to_vec(),
                p,
            });
        }
    }

    /// Appends the noise opcodes that follow a gate on `qubits`.
    fn insert_error(&mut self, qubits: &[usize], gate: GateKind) {
        let global: Vec<(NoiseKind, f64)> =
            self.config.global.iter().map(|(k, v)| (*k, *v)).collect();
        self.push_noise_map(qubits, global);

        if let Some(noise) = self.config.gate_dependent.get(&gate) {
            let entries: Vec<(NoiseKind, f64)> = noise.iter().map(|(k, v)| (*k, *v)).collect();
            self.push_noise_map(qubits, entries);
        }

        match qubits {
            &[qn] => {
                self.insert_crosstalk_error(gate, qn);
                self.insert_local_error(gate, qn);
            }
            &[qn1, qn2] => {
                self.insert_pair_error(gate, qn1, qn2);
                self.insert_local_error(gate, qn1);
                self.insert_local_error(gate, qn2);
            }
            // 3-qubit gates carry global and gate-dependent noise only
            _ => {}
        }
    }

    /// Crosstalk on a single-qubit gate: every (gate, (qn, spectator))
    /// entry fires on the pair.
    fn insert_crosstalk_error(&mut self, gate: GateKind, qn: usize) {
        let matches: Vec<(usize, Vec<(NoiseKind, f64)>)> = self
            .config
            .gate_error_2q
            .iter()
            .filter(|((g, (q1, _)), _)| *g == gate && *q1 == qn)
            .map(|((_, (_, q2)), noise)| (*q2, noise.iter().map(|(k, v)| (*k, *v)).collect()))
            .collect();
        for (spectator, entries) in matches {
            self.push_noise_map(&[qn, spectator], entries);
        }
    }

    /// Pair error on a two-qubit gate: exact (gate, (qn1, qn2)) lookup.
    fn insert_pair_error(&mut self, gate: GateKind, qn1: usize, qn2: usize) {
        if let Some(noise) = self.config.gate_error_2q.get(&(gate, (qn1, qn2))) {
            let entries: Vec<(NoiseKind, f64)> = noise.iter().map(|(k, v)| (*k, *v)).collect();
            self.push_noise_map(&[qn1, qn2], entries);
        }
    }

    fn insert_local_error(&mut self, gate: GateKind, qn: usize) {
        if let Some(noise) = self.config.gate_error_1q.get(&(gate, qn)) {
            let entries: Vec<(NoiseKind, f64)> = noise.iter().map(|(k, v)| (*k, *v)).collect();
            self.push_noise_map(&[qn], entries);
        }
    }

    // -----------------------------------------------------------------
    // gate vocabulary (deferred)
    // -----------------------------------------------------------------

    pub fn id(&mut self, qn: usize, controls: &[usize], dagger: bool) -> Result<()> {
        self.check_targets(&[qn], controls)?;
        self.push_gate(GateKind::I, vec![qn], vec![], dagger, controls);
        Ok(())
    }

    pub fn h(&mut self, qn: usize, controls: &[usize], dagger: bool) -> Result<()> {
        self.check_targets(&[qn], controls)?;
        self.push_gate(GateKind::H, vec![qn], vec![], dagger, controls);
        Ok(())
    }

    pub fn x(&mut self, qn: usize, controls: &[usize], dagger: bool) -> Result<()> {
        self.check_targets(&[qn], controls)?;
        self.push_gate(GateKind::X, vec![qn], vec![], dagger, controls);
        Ok(())
    }

    pub fn y(&mut self, qn: usize, controls: &[usize], dagger: bool) -> Result<()> {
        self.check_targets(&[qn], controls)?;
        self.push_gate(GateKind::Y, vec![qn], vec![], dagger, controls);
        Ok(())
    }

    pub fn z(&mut self, qn: usize, controls: &[usize], dagger: bool) -> Result<()> {
        self.check_targets(&[qn], controls)?;
        self.push_gate(GateKind::Z, vec![qn], vec![], dagger, controls);
        Ok(())
    }

    pub fn s(&mut self, qn: usize, controls: &[usize], dagger: bool) -> Result<()> {
        self.check_targets(&[qn], controls)?;
        self.push_gate(GateKind::S, vec![qn], vec![], dagger, controls);
        Ok(())
    }

    pub fn t(&mut self, qn: usize, controls: &[usize], dagger: bool) -> Result<()> {
        self.check_targets(&[qn], controls)?;
        self.push_gate(GateKind::T, vec![qn], vec![], dagger, controls);
        Ok(())
    }

    pub fn sx(&mut self, qn: usize, controls: &[usize], dagger: bool) -> Result<()> {
        self.check_targets(&[qn], controls)?;
        self.push_gate(GateKind::SX, vec![qn], vec![], dagger, controls);
        Ok(())
    }

    pub fn rx(&mut self, qn: usize, theta: f64, controls: &[usize], dagger: bool) -> Result<()> {
        self.check_targets(&[qn], controls)?;
        self.push_gate(GateKind::RX, vec![qn], vec![theta], dagger, controls);
        Ok(())
    }

    pub fn ry(&mut self, qn: usize, theta: f64, controls: &[usize], dagger: bool) -> Result<()> {
        self.check_targets(&[qn], controls)?;
        self.push_gate(GateKind::RY, vec![qn], vec![theta], dagger, controls);
        Ok(())
    }

    pub fn rz(&mut self, qn: usize, theta: f64, controls: &[usize], dagger: bool) -> Result<()> {
        self.check_targets(&[qn], controls)?;
        self.push_gate(GateKind::RZ, vec![qn], vec![theta], dagger, controls);
        Ok(())
    }

    pub fn u1(&mut self, qn: usize, lambda: f64, controls: &[usize], dagger: bool) -> Result<()> {
        self.check_targets(&[qn], controls)?;
        self.push_gate(GateKind::U1, vec![qn], vec![lambda], dagger, controls);
        Ok(())
    }

    pub fn u2(
        &mut self,
        qn: usize,
        phi: f64,
        lambda: f64,
        controls: &[usize],
        dagger: bool,
    ) -> Result<()> {
        self.check_targets(&[qn], controls)?;
        self.push_gate(GateKind::U2, vec![qn], vec![phi, lambda], dagger, controls);
        Ok(())
    }

    pub fn u3(
        &mut self,
        qn: usize,
        theta: f64,
        phi: f64,
        lambda: f64,
        controls: &[usize],
        dagger: bool,
    ) -> Result<()> {
        self.check_targets(&[qn], controls)?;
        self.push_gate(
            GateKind::U3,
            vec![qn],
            vec![theta, phi, lambda],
            dagger,
            controls,
        );
        Ok(())
    }

    pub fn rphi90(&mut self, qn: usize, phi: f64, controls: &[usize], dagger: bool) -> Result<()> {
        self.check_targets(&[qn], controls)?;
        self.push_gate(GateKind::RPHI90, vec![qn], vec![phi], dagger, controls);
        Ok(())
    }

    pub fn rphi180(&mut self, qn: usize, phi: f64, controls: &[usize], dagger: bool) -> Result<()> {
        self.check_targets(&[qn], controls)?;
        self.push_gate(GateKind::RPHI180, vec![qn], vec![phi], dagger, controls);
        Ok(())
    }

    pub fn rphi(
        &mut self,
        qn: usize,
        theta: f64,
        phi: f64,
        controls: &[usize],
        dagger: bool,
    ) -> Result<()> {
        self.check_targets(&[qn], controls)?;
        self.push_gate(GateKind::RPHI, vec![qn], vec![theta, phi], dagger, controls);
        Ok(())
    }

    /// User-supplied single-qubit unitary; validated here, carried
    /// flattened in the trace.
    pub fn u22(&mut self, qn: usize, unitary: &Mat2, controls: &[usize], dagger: bool) -> Result<()> {
        self.check_targets(&[qn], controls)?;
        if !is_unitary2(unitary) {
            return Err(QseError::invalid_argument("Input is not a unitary."));
        }
        self.push_gate(GateKind::U22, vec![qn], pack_mat2(unitary), dagger, controls);
        Ok(())
    }

    pub fn cz(&mut self, qn1: usize, qn2: usize, controls: &[usize], dagger: bool) -> Result<()> {
        self.check_targets(&[qn1, qn2], controls)?;
        self.push_gate(GateKind::CZ, vec![qn1, qn2], vec![], dagger, controls);
        Ok(())
    }

    pub fn cnot(
        &mut self,
        controller: usize,
        target: usize,
        controls: &[usize],
        dagger: bool,
    ) -> Result<()> {
        self.check_targets(&[controller, target], controls)?;
        self.push_gate(GateKind::CNOT, vec![controller, target], vec![], dagger, controls);
        Ok(())
    }

    pub fn swap(&mut self, qn1: usize, qn2: usize, controls: &[usize], dagger: bool) -> Result<()> {
        self.check_targets(&[qn1, qn2], controls)?;
        self.push_gate(GateKind::SWAP, vec![qn1, qn2], vec![], dagger, controls);
        Ok(())
    }

    pub fn iswap(&mut self, qn1: usize, qn2: usize, controls: &[usize], dagger: bool) -> Result<()> {
        self.check_targets(&[qn1, qn2], controls)?;
        self.push_gate(GateKind::ISWAP, vec![qn1, qn2], vec![], dagger, controls);
        Ok(())
    }

    pub fn xy(
        &mut self,
        qn1: usize,
        qn2: usize,
        theta: f64,
        controls: &[usize],
        dagger: bool,
    ) -> Result<()> {
        self.check_targets(&[qn1, qn2], controls)?;
        self.push_gate(GateKind::XY, vec![qn1, qn2], vec![theta], dagger, controls);
        Ok(())
    }

    pub fn xx(
        &mut self,
        qn1: usize,
        qn2: usize,
        theta: f64,
        controls: &[usize],
        dagger: bool,
    ) -> Result<()> {
        self.check_targets(&[qn1, qn2], controls)?;
        self.push_gate(GateKind::XX, vec![qn1, qn2], vec![theta], dagger, controls);
        Ok(())
    }

    pub fn yy(
        &mut self,
        qn1: usize,
        qn2: usize,
        theta: f64,
        controls: &[usize],
        dagger: bool,
    ) -> Result<()> {
        self.check_targets(&[qn1, qn2], controls)?;
        self.push_gate(GateKind::YY, vec![qn1, qn2], vec![theta], dagger, controls);
        Ok(())
    }

    pub fn zz(
        &mut self,
        qn1: usize,
        qn2: usize,
        theta: f64,
        controls: &[usize],
        dagger: bool,
    ) -> Result<()> {
        self.check_targets(&[qn1, qn2], controls)?;
        self.push_gate(GateKind::ZZ, vec![qn1, qn2], vec![theta], dagger, controls);
        Ok(())
    }

    /// User-supplied two-qubit unitary.
    pub fn u44(
        &mut self,
        qn1: usize,
        qn2: usize,
        unitary: &Mat4,
        controls: &[usize],
        dagger: bool,
    ) -> Result<()> {
        self.check_targets(&[qn1, qn2], controls)?;
        if !is_unitary4(unitary) {
            return Err(QseError::invalid_argument("Input is not a unitary."));
        }
        self.push_gate(
            GateKind::U44,
            vec![qn1, qn2],
            pack_mat4(unitary),
            dagger,
            controls,
        );
        Ok(())
    }

    pub fn toffoli(
        &mut self,
        qn1: usize,
        qn2: usize,
        target: usize,
        controls: &[usize],
        dagger: bool,
    ) -> Result<()> {
        self.check_targets(&[qn1, qn2, target], controls)?;
        self.push_gate(
            GateKind::TOFFOLI,
            vec![qn1, qn2, target],
            vec![],
            dagger,
            controls,
        );
        Ok(())
    }

    pub fn cswap(
        &mut self,
        controller: usize,
        target1: usize,
        target2: usize,
        controls: &[usize],
        dagger: bool,
    ) -> Result<()> {
        self.check_targets(&[controller, target1, target2], controls)?;
        self.push_gate(
            GateKind::CSWAP,
            vec![controller, target1, target2],
            vec![],
            dagger,
            controls,
        );
        Ok(())
    }

    pub fn phase2q(
        &mut self,
        qn1: usize,
        qn2: usize,
        theta1: f64,
        theta2: f64,
        thetazz: f64,
        controls: &[usize],
        dagger: bool,
    ) -> Result<()> {
        self.check_targets(&[qn1, qn2], controls)?;
        self.push_gate(
            GateKind::PHASE2Q,
            vec![qn1, qn2],
            vec![theta1, theta2, thetazz],
            dagger,
            controls,
        );
        Ok(())
    }

    pub fn uu15(
        &mut self,
        qn1: usize,
        qn2: usize,
        parameters: &[f64],
        controls: &[usize],
        dagger: bool,
    ) -> Result<()> {
        if parameters.len() != 15 {
            return Err(QseError::invalid_argument(format!(
                "uu15 expects 15 parameters, got {}",
                parameters.len()
            )));
        }
        self.check_targets(&[qn1, qn2], controls)?;
        self.push_gate(
            GateKind::UU15,
            vec![qn1, qn2],
            parameters.to_vec(),
            dagger,
            controls,
        );
        Ok(())
    }

    // -----------------------------------------------------------------
    // per-shot execution
    // -----------------------------------------------------------------

    /// Replays the trace once against a fresh |0...0> state.
    pub fn execute_once(&mut self) -> Result<()> {
        self.sim.reset();
        let opcodes = std::mem::take(&mut self.opcodes);
        let mut outcome = Ok(());
        for op in &opcodes {
            outcome = self.apply_opcode(op);
            if outcome.is_err() {
                break;
            }
        }
        self.opcodes = opcodes;
        outcome
    }

    fn apply_opcode(&mut self, op: &Opcode) -> Result<()> {
        match op {
            Opcode::Noise { kind, qubits, p } => match kind {
                NoiseKind::Depolarizing => {
                    for &qn in qubits {
                        self.sim.depolarizing(qn, *p)?;
                    }
                    Ok(())
                }
                NoiseKind::Damping => {
                    for &qn in qubits {
                        self.sim.damping(qn, *p)?;
                    }
                    Ok(())
                }
                NoiseKind::BitFlip => {
                    for &qn in qubits {
                        self.sim.bitflip(qn, *p)?;
                    }
                    Ok(())
                }
                NoiseKind::PhaseFlip => {
                    for &qn in qubits {
                        self.sim.phaseflip(qn, *p)?;
                    }
                    Ok(())
                }
                NoiseKind::TwoQubitDepolarizing => {
                    if qubits.len() != 2 {
                        return Err(QseError::runtime(
                            "TwoQubitDepolarizing opcode must carry exactly 2 qubits",
                        ));
                    }
                    self.sim.twoqubit_depolarizing(qubits[0], qubits[1], *p)
                }
            },
            Opcode::Gate {
                kind,
                qubits,
                params,
                dagger,
                controls,
            } => self.apply_gate(*kind, qubits, params, *dagger, controls),
        }
    }

    fn apply_gate(
        &mut self,
        kind: GateKind,
        qubits: &[usize],
        params: &[f64],
        dagger: bool,
        controls: &[usize],
    ) -> Result<()> {
        use GateKind::*;

        let qubit = |k: usize| -> Result<usize> {
            qubits.get(k).copied().ok_or_else(|| {
                QseError::runtime(format!("Malformed {} opcode: missing qubit {}", kind, k))
            })
        };
        let param = |k: usize| -> Result<f64> {
            params.get(k).copied().ok_or_else(|| {
                QseError::runtime(format!("Malformed {} opcode: missing parameter {}", kind, k))
            })
        };

        match kind {
            I => self.sim.id(qubit(0)?, controls, dagger),
            H => self.sim.h(qubit(0)?, controls, dagger),
            X => self.sim.x(qubit(0)?, controls, dagger),
            Y => self.sim.y(qubit(0)?, controls, dagger),
            Z => self.sim.z(qubit(0)?, controls, dagger),
            S => self.sim.s(qubit(0)?, controls, dagger),
            T => self.sim.t(qubit(0)?, controls, dagger),
            SX => self.sim.sx(qubit(0)?, controls, dagger),
            RX => self.sim.rx(qubit(0)?, param(0)?, controls, dagger),
            RY => self.sim.ry(qubit(0)?, param(0)?, controls, dagger),
            RZ => self.sim.rz(qubit(0)?, param(0)?, controls, dagger),
            U1 => self.sim.u1(qubit(0)?, param(0)?, controls, dagger),
            U2 => self.sim.u2(qubit(0)?, param(0)?, param(1)?, controls, dagger),
            U3 => self
                .sim
                .u3(qubit(0)?, param(0)?, param(1)?, param(2)?, controls, dagger),
            RPHI90 => self.sim.rphi90(qubit(0)?, param(0)?, controls, dagger),
            RPHI180 => self.sim.rphi180(qubit(0)?, param(0)?, controls, dagger),
            RPHI => self.sim.rphi(qubit(0)?, param(0)?, param(1)?, controls, dagger),
            U22 => {
                let unitary = unpack_mat2(params)?;
                self.sim.u22(qubit(0)?, &unitary, controls, dagger)
            }
            CZ => self.sim.cz(qubit(0)?, qubit(1)?, controls, dagger),
            CNOT => self.sim.cnot(qubit(0)?, qubit(1)?, controls, dagger),
            SWAP => self.sim.swap(qubit(0)?, qubit(1)?, controls, dagger),
            ISWAP => self.sim.iswap(qubit(0)?, qubit(1)?, controls, dagger),
            XY => self.sim.xy(qubit(0)?, qubit(1)?, param(0)?, controls, dagger),
            XX => self.sim.xx(qubit(0)?, qubit(1)?, param(0)?, controls, dagger),
            YY => self.sim.yy(qubit(0)?, qubit(1)?, param(0)?, controls, dagger),
            ZZ => self.sim.zz(qubit(0)?, qubit(1)?, param(0)?, controls, dagger),
            U44 => {
                let unitary = unpack_mat4(params)?;
                self.sim.u44(qubit(0)?, qubit(1)?, &unitary, controls, dagger)
            }
            TOFFOLI => self
                .sim
                .toffoli(qubit(0)?, qubit(1)?, qubit(2)?, controls, dagger),
            CSWAP => self
                .sim
                .cswap(qubit(0)?, qubit(1)?, qubit(2)?, controls, dagger),
            PHASE2Q => self.sim.phase2q(
                qubit(0)?,
                qubit(1)?,
                param(0)?,
                param(1)?,
                param(2)?,
                controls,
                dagger,
            ),
            UU15 => {
                if params.len() != 15 {
                    return Err(QseError::runtime(format!(
                        "Malformed uu15 opcode: expected 15 parameters, got {}",
                        params.len()
                    )));
                }
                self.sim.uu15(qubit(0)?, qubit(1)?, params, controls, dagger)
            }
        }
    }

    // -----------------------------------------------------------------
    // outcome sampling
    // -----------------------------------------------------------------

    /// Samples one full basis index from the final amplitude
    /// distribution by a linear cumulative scan.
    pub fn get_measure_no_readout_error(&mut self) -> Result<usize> {
        let mut r = rng::random_f64();
        for (i, amp) in self.sim.state().iter().enumerate() {
            let prob = abs_sqr(*amp);
            if r < prob {
                return Ok(i);
            }
            r -= prob;
        }
        Err(QseError::runtime(
            "Outcome sampling fell through the cumulative distribution",
        ))
    }

    /// Samples one outcome and perturbs each bit with its readout flip
    /// probability.
    pub fn get_measure(&mut self) -> Result<usize> {
        let mut meas = self.get_measure_no_readout_error()?;
        if self.config.readout.is_empty() {
            return Ok(meas);
        }
        if self.config.readout.len() != self.nqubit {
            return Err(QseError::runtime(format!(
                "Readout matrix length ({}) does not match the qubit number ({})",
                self.config.readout.len(),
                self.nqubit
            )));
        }
        for (qn, flip) in self.config.readout.iter().enumerate() {
            let r = rng::random_f64();
            if meas & pow2(qn) != 0 {
                if r < flip[1] {
                    meas -= pow2(qn);
                }
            } else if r < flip[0] {
                meas += pow2(qn);
            }
        }
        Ok(meas)
    }

    /// Runs the trace `shots` times, measuring every qubit.
    ///
    /// Returns a histogram over full basis indices; missing keys mean
    /// zero observations.
    pub fn measure_shots(&mut self, shots: usize) -> Result<HashMap<usize, usize>> {
        debug!(shots, opcodes = self.opcodes.len(), "sampling shots");
        let mut histogram = HashMap::new();
        for _ in 0..shots {
            self.execute_once()?;
            let meas = self.get_measure()?;
            *histogram.entry(meas).or_insert(0) += 1;
        }
        Ok(histogram)
    }

    /// Runs the trace `shots` times, projecting each outcome onto the
    /// listed qubits.
    pub fn measure_shots_on(
        &mut self,
        measure_list: &[usize],
        shots: usize,
    ) -> Result<HashMap<usize, usize>> {
        let measure_map = preprocess_measure_list(measure_list, self.nqubit)?;
        debug!(
            shots,
            measured = measure_list.len(),
            opcodes = self.opcodes.len(),
            "sampling projected shots"
        );
        let mut histogram = HashMap::new();
        for _ in 0..shots {
            self.execute_once()?;
            let meas = self.get_measure()?;
            *histogram.entry(project_index(meas, &measure_map)).or_insert(0) += 1;
        }
        Ok(histogram)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn desc(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_gate_appends_opcode() {
        let mut sim = NoisySimulator::new(2, NoiseConfig::new()).unwrap();
        sim.h(0, &[], false).unwrap();
        sim.cnot(0, 1, &[], false).unwrap();
        assert_eq!(sim.opcodes().len(), 2);
        assert!(matches!(
            sim.opcodes()[0],
            Opcode::Gate {
                kind: GateKind::H,
                ..
            }
        ));
    }

    #[test]
    fn test_submission_time_validation() {
        let mut sim = NoisySimulator::new(2, NoiseConfig::new()).unwrap();
        assert!(sim.h(2, &[], false).is_err());
        assert!(sim.cnot(1, 1, &[], false).is_err());
        assert!(sim.uu15(0, 1, &[0.0; 14], &[], false).is_err());
        // nothing reached the trace
        assert!(sim.opcodes().is_empty());
    }

    #[test]
    fn test_global_noise_follows_every_gate() {
        let config = NoiseConfig::parse(&desc(&[("depolarizing", 0.1)]), vec![]).unwrap();
        let mut sim = NoisySimulator::new(2, config).unwrap();
        sim.h(0, &[], false).unwrap();
        sim.cnot(0, 1, &[], false).unwrap();
        // gate, noise, gate, noise
        assert_eq!(sim.opcodes().len(), 4);
        assert!(matches!(
            sim.opcodes()[1],
            Opcode::Noise {
                kind: NoiseKind::Depolarizing,
                ..
            }
        ));
        if let Opcode::Noise { qubits, .. } = &sim.opcodes()[3] {
            assert_eq!(qubits, &[0, 1]);
        } else {
            panic!("expected noise opcode after cnot");
        }
    }

    #[test]
    fn test_insertion_order() {
        // global + gate-dependent + crosstalk + local on the same gate
        let mut gate_desc = BTreeMap::new();
        gate_desc.insert("h".to_string(), desc(&[("phaseflip", 0.02)]));
        let config = NoiseConfig::parse(&desc(&[("depolarizing", 0.01)]), vec![])
            .unwrap()
            .with_gate_dependent(&gate_desc)
            .unwrap()
            .with_gate_error_1q("h", 0, &desc(&[("bitflip", 0.03)]))
            .unwrap()
            .with_gate_error_2q("h", (0, 1), &desc(&[("twoqubit_depolarizing", 0.04)]))
            .unwrap();

        let mut sim = NoisySimulator::new(2, config).unwrap();
        sim.h(0, &[], false).unwrap();

        let kinds: Vec<NoiseKind> = sim
            .opcodes()
            .iter()
            .filter_map(|op| match op {
                Opcode::Noise { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                NoiseKind::Depolarizing,
                NoiseKind::PhaseFlip,
                NoiseKind::TwoQubitDepolarizing,
                NoiseKind::BitFlip,
            ]
        );

        // the crosstalk entry names the spectator
        if let Opcode::Noise { qubits, .. } = &sim.opcodes()[3] {
            assert_eq!(qubits, &[0, 1]);
        } else {
            panic!("expected crosstalk opcode");
        }
    }

    #[test]
    fn test_two_qubit_gate_attaches_operand_errors() {
        let config = NoiseConfig::new()
            .with_gate_error_1q("cnot", 0, &desc(&[("bitflip", 0.01)]))
            .unwrap()
            .with_gate_error_1q("cnot", 1, &desc(&[("phaseflip", 0.01)]))
            .unwrap()
            .with_gate_error_2q("cnot", (0, 1), &desc(&[("twoqubit_depolarizing", 0.02)]))
            .unwrap();
        let mut sim = NoisySimulator::new(2, config).unwrap();
        sim.cnot(0, 1, &[], false).unwrap();

        let kinds: Vec<NoiseKind> = sim
            .opcodes()
            .iter()
            .filter_map(|op| match op {
                Opcode::Noise { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect();
        // pair error first, then per-operand local errors in order
        assert_eq!(
            kinds,
            vec![
                NoiseKind::TwoQubitDepolarizing,
                NoiseKind::BitFlip,
                NoiseKind::PhaseFlip,
            ]
        );

        // swapped operand order does not match the (0, 1) pair entry
        let config = NoiseConfig::new()
            .with_gate_error_2q("cnot", (0, 1), &desc(&[("twoqubit_depolarizing", 0.02)]))
            .unwrap();
        let mut sim = NoisySimulator::new(2, config).unwrap();
        sim.cnot(1, 0, &[], false).unwrap();
        assert_eq!(sim.opcodes().len(), 1);
    }

    #[test]
    fn test_toffoli_skips_gate_specific_noise() {
        let config = NoiseConfig::parse(&desc(&[("bitflip", 0.01)]), vec![])
            .unwrap()
            .with_gate_error_1q("toffoli", 0, &desc(&[("phaseflip", 0.5)]))
            .unwrap();
        let mut sim = NoisySimulator::new(3, config).unwrap();
        sim.toffoli(0, 1, 2, &[], false).unwrap();
        let noise_count = sim
            .opcodes()
            .iter()
            .filter(|op| matches!(op, Opcode::Noise { .. }))
            .count();
        // only the global layer fires
        assert_eq!(noise_count, 1);
    }

    #[test]
    fn test_execute_once_replays_trace() {
        rng::seed(0);
        let mut sim = NoisySimulator::new(2, NoiseConfig::new()).unwrap();
        sim.x(0, &[], false).unwrap();
        sim.execute_once().unwrap();
        let meas = sim.get_measure_no_readout_error().unwrap();
        assert_eq!(meas, 1);
        // replay leaves the trace intact
        assert_eq!(sim.opcodes().len(), 1);
        sim.execute_once().unwrap();
        assert_eq!(sim.get_measure_no_readout_error().unwrap(), 1);
    }

    #[test]
    fn test_clear() {
        let mut sim = NoisySimulator::new(1, NoiseConfig::new()).unwrap();
        sim.h(0, &[], false).unwrap();
        sim.clear();
        assert!(sim.opcodes().is_empty());
    }
}
