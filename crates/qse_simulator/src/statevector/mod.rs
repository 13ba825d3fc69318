//! Full state-vector engine.
//!
//! Maintains the complete quantum state as a length-2^n complex
//! amplitude vector (qubit k is bit k of the basis index, LSB-first)
//! and evolves it eagerly, gate call by gate call. Every gate method
//! follows the same contract:
//!
//! 1. validate qubit indices and pairwise distinctness;
//! 2. build the 2x2 / 4x4 matrix, applying the dagger transform to the
//!    matrix itself;
//! 3. dispatch to the generic `u22` / `u44` kernel with the combined
//!    controller mask.
//!
//! Composite gates reuse the primitives: CNOT and TOFFOLI are X with
//! an extended controller mask, CSWAP is SWAP with an extended mask,
//! and `phase2q` / `uu15` are fixed primitive sequences.
//!
//! Besides unitaries, the engine carries the stochastic channel set
//! used for trajectory sampling (`depolarizing`, `damping`, `bitflip`,
//! `phaseflip`, `twoqubit_depolarizing`, `kraus1q`, `reset_qubit`);
//! these mutate the state through the shared random engine and
//! renormalize explicitly.

pub mod kernel;

use std::collections::BTreeMap;

use tracing::debug;

use qse_core::bits::{make_controller_mask, pow2, preprocess_measure_list, project_index};
use qse_core::error::{QseError, Result};
use qse_core::gates;
use qse_core::matrix::{
    abs_sqr, is_unitary2, is_unitary4, mat2_dag, mat2_dag_if, mat4_dag_if, C64, Mat2, Mat4, ONE,
    ZERO,
};
use qse_core::rng;

/// Default qubit ceiling; 2^30 amplitudes is 16 GiB of state.
pub const DEFAULT_MAX_QUBITS: usize = 30;

/// Full state-vector simulator.
///
/// Memory usage is O(2^n) complex doubles; every gate is O(2^n).
pub struct StateVectorSimulator {
    total_qubit: usize,
    max_qubits: usize,
    state: Vec<C64>,
}

impl StateVectorSimulator {
    /// Creates an n-qubit engine initialized to |0...0>.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `total_qubit` exceeds the ceiling
    /// ([`DEFAULT_MAX_QUBITS`]).
    pub fn new(total_qubit: usize) -> Result<Self> {
        Self::with_max_qubits(total_qubit, DEFAULT_MAX_QUBITS)
    }

    /// Creates an engine with a caller-chosen qubit ceiling.
    pub fn with_max_qubits(total_qubit: usize, max_qubits: usize) -> Result<Self> {
        if total_qubit > max_qubits {
            return Err(QseError::invalid_argument(format!(
                "Exceed max_qubit_num (nqubit = {}, limit = {})",
                total_qubit, max_qubits
            )));
        }
        debug!(total_qubit, "initializing state-vector engine");
        let mut state = vec![ZERO; pow2(total_qubit)];
        state[0] = ONE;
        Ok(Self {
            total_qubit,
            max_qubits,
            state,
        })
    }

    /// Returns the number of qubits.
    pub fn total_qubits(&self) -> usize {
        self.total_qubit
    }

    /// Returns the configured qubit ceiling.
    pub fn max_qubits(&self) -> usize {
        self.max_qubits
    }

    /// Returns the amplitude vector.
    pub fn state(&self) -> &[C64] {
        &self.state
    }

    /// Returns |amplitude|^2 for every basis index.
    pub fn probabilities(&self) -> Vec<f64> {
        self.state.iter().map(|a| abs_sqr(*a)).collect()
    }

    /// Resets to |0...0>.
    pub fn reset(&mut self) {
        self.state.fill(ZERO);
        self.state[0] = ONE;
    }

    /// Sum of |amplitude|^2 over the whole register.
    pub fn norm_sqr(&self) -> f64 {
        self.state.iter().map(|a| abs_sqr(*a)).sum()
    }

    // -----------------------------------------------------------------
    // validation
    // -----------------------------------------------------------------

    fn check_qubit(&self, qn: usize) -> Result<()> {
        if qn >= self.total_qubit {
            return Err(QseError::invalid_argument(format!(
                "Exceed total (total_qubit = {}, input = {})",
                self.total_qubit, qn
            )));
        }
        Ok(())
    }

    /// Range-checks targets and controls and rejects any duplicate
    /// across the combined set.
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

    fn apply_1q(&mut self, qn: usize, u: &Mat2, controls: &[usize]) -> Result<()> {
        self.check_targets(&[qn], controls)?;
        kernel::u22_unsafe(&mut self.state, qn, u, make_controller_mask(controls));
        Ok(())
    }

    fn apply_2q(&mut self, qn1: usize, qn2: usize, u: &Mat4, controls: &[usize]) -> Result<()> {
        self.check_targets(&[qn1, qn2], controls)?;
        kernel::u44_unsafe(&mut self.state, qn1, qn2, u, make_controller_mask(controls));
        Ok(())
    }

    // -----------------------------------------------------------------
    // single-qubit gates
    // -----------------------------------------------------------------

    /// Identity; validates and leaves the state untouched.
    pub fn id(&mut self, qn: usize, controls: &[usize], _dagger: bool) -> Result<()> {
        self.check_targets(&[qn], controls)
    }

    pub fn h(&mut self, qn: usize, controls: &[usize], dagger: bool) -> Result<()> {
        self.apply_1q(qn, &mat2_dag_if(&gates::h_matrix(), dagger), controls)
    }

    pub fn x(&mut self, qn: usize, controls: &[usize], _dagger: bool) -> Result<()> {
        self.apply_1q(qn, &gates::x_matrix(), controls)
    }

    pub fn y(&mut self, qn: usize, controls: &[usize], _dagger: bool) -> Result<()> {
        self.apply_1q(qn, &gates::y_matrix(), controls)
    }

    pub fn z(&mut self, qn: usize, controls: &[usize], _dagger: bool) -> Result<()> {
        self.apply_1q(qn, &gates::z_matrix(), controls)
    }

    pub fn s(&mut self, qn: usize, controls: &[usize], dagger: bool) -> Result<()> {
        self.apply_1q(qn, &mat2_dag_if(&gates::s_matrix(), dagger), controls)
    }

    pub fn t(&mut self, qn: usize, controls: &[usize], dagger: bool) -> Result<()> {
        self.apply_1q(qn, &mat2_dag_if(&gates::t_matrix(), dagger), controls)
    }

    pub fn sx(&mut self, qn: usize, controls: &[usize], dagger: bool) -> Result<()> {
        self.apply_1q(qn, &mat2_dag_if(&gates::sx_matrix(), dagger), controls)
    }

    pub fn rx(&mut self, qn: usize, theta: f64, controls: &[usize], dagger: bool) -> Result<()> {
        self.apply_1q(qn, &mat2_dag_if(&gates::rx_matrix(theta), dagger), controls)
    }

    pub fn ry(&mut self, qn: usize, theta: f64, controls: &[usize], dagger: bool) -> Result<()> {
        self.apply_1q(qn, &mat2_dag_if(&gates::ry_matrix(theta), dagger), controls)
    }

    pub fn rz(&mut self, qn: usize, theta: f64, controls: &[usize], dagger: bool) -> Result<()> {
        self.apply_1q(qn, &mat2_dag_if(&gates::rz_matrix(theta), dagger), controls)
    }

    pub fn u1(&mut self, qn: usize, lambda: f64, controls: &[usize], dagger: bool) -> Result<()> {
        self.apply_1q(qn, &mat2_dag_if(&gates::u1_matrix(lambda), dagger), controls)
    }

    pub fn u2(
        &mut self,
        qn: usize,
        phi: f64,
        lambda: f64,
        controls: &[usize],
        dagger: bool,
    ) -> Result<()> {
        self.apply_1q(qn, &mat2_dag_if(&gates::u2_matrix(phi, lambda), dagger), controls)
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
        self.apply_1q(
            qn,
            &mat2_dag_if(&gates::u3_matrix(theta, phi, lambda), dagger),
            controls,
        )
    }

    pub fn rphi90(&mut self, qn: usize, phi: f64, controls: &[usize], dagger: bool) -> Result<()> {
        self.apply_1q(qn, &mat2_dag_if(&gates::rphi90_matrix(phi), dagger), controls)
    }

    pub fn rphi180(&mut self, qn: usize, phi: f64, controls: &[usize], dagger: bool) -> Result<()> {
        self.apply_1q(qn, &mat2_dag_if(&gates::rphi180_matrix(phi), dagger), controls)
    }

    pub fn rphi(
        &mut self,
        qn: usize,
        theta: f64,
        phi: f64,
        controls: &[usize],
        dagger: bool,
    ) -> Result<()> {
        self.apply_1q(
            qn,
            &mat2_dag_if(&gates::rphi_matrix(theta, phi), dagger),
            controls,
        )
    }

    /// User-supplied single-qubit unitary.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `U U† != I` within tolerance.
    pub fn u22(&mut self, qn: usize, unitary: &Mat2, controls: &[usize], dagger: bool) -> Result<()> {
        if !is_unitary2(unitary) {
            return Err(QseError::invalid_argument("Input is not a unitary."));
        }
        self.apply_1q(qn, &mat2_dag_if(unitary, dagger), controls)
    }

    // -----------------------------------------------------------------
    // two- and three-qubit gates
    // -----------------------------------------------------------------

    pub fn cz(&mut self, qn1: usize, qn2: usize, controls: &[usize], _dagger: bool) -> Result<()> {
        self.apply_2q(qn1, qn2, &gates::cz_matrix(), controls)
    }

    pub fn swap(&mut self, qn1: usize, qn2: usize, controls: &[usize], _dagger: bool) -> Result<()> {
        self.apply_2q(qn1, qn2, &gates::swap_matrix(), controls)
    }

    pub fn iswap(&mut self, qn1: usize, qn2: usize, controls: &[usize], dagger: bool) -> Result<()> {
        self.apply_2q(qn1, qn2, &mat4_dag_if(&gates::iswap_matrix(), dagger), controls)
    }

    pub fn xy(
        &mut self,
        qn1: usize,
        qn2: usize,
        theta: f64,
        controls: &[usize],
        dagger: bool,
    ) -> Result<()> {
        self.apply_2q(qn1, qn2, &mat4_dag_if(&gates::xy_matrix(theta), dagger), controls)
    }

    pub fn xx(
        &mut self,
        qn1: usize,
        qn2: usize,
        theta: f64,
        controls: &[usize],
        dagger: bool,
    ) -> Result<()> {
        self.apply_2q(qn1, qn2, &mat4_dag_if(&gates::xx_matrix(theta), dagger), controls)
    }

    pub fn yy(
        &mut self,
        qn1: usize,
        qn2: usize,
        theta: f64,
        controls: &[usize],
        dagger: bool,
    ) -> Result<()> {
        self.apply_2q(qn1, qn2, &mat4_dag_if(&gates::yy_matrix(theta), dagger), controls)
    }

    pub fn zz(
        &mut self,
        qn1: usize,
        qn2: usize,
        theta: f64,
        controls: &[usize],
        dagger: bool,
    ) -> Result<()> {
        self.apply_2q(qn1, qn2, &mat4_dag_if(&gates::zz_matrix(theta), dagger), controls)
    }

    /// User-supplied two-qubit unitary; row sub-index is
    /// `bit(qn1) + 2 * bit(qn2)`.
    pub fn u44(
        &mut self,
        qn1: usize,
        qn2: usize,
        unitary: &Mat4,
        controls: &[usize],
        dagger: bool,
    ) -> Result<()> {
        if !is_unitary4(unitary) {
            return Err(QseError::invalid_argument("Input is not a unitary."));
        }
        self.apply_2q(qn1, qn2, &mat4_dag_if(unitary, dagger), controls)
    }

    /// CNOT: X on `target` with `controller` folded into the mask.
    pub fn cnot(
        &mut self,
        controller: usize,
        target: usize,
        controls: &[usize],
        _dagger: bool,
    ) -> Result<()> {
        self.check_targets(&[controller, target], controls)?;
        let mask = make_controller_mask(controls) | pow2(controller);
        kernel::u22_unsafe(&mut self.state, target, &gates::x_matrix(), mask);
        Ok(())
    }

    /// TOFFOLI: X on `target` with both controls folded into the mask.
    pub fn toffoli(
        &mut self,
        qn1: usize,
        qn2: usize,
        target: usize,
        controls: &[usize],
        _dagger: bool,
    ) -> Result<()> {
        self.check_targets(&[qn1, qn2, target], controls)?;
        let mask = make_controller_mask(controls) | pow2(qn1) | pow2(qn2);
        kernel::u22_unsafe(&mut self.state, target, &gates::x_matrix(), mask);
        Ok(())
    }

    /// CSWAP: SWAP on the targets with `controller` folded into the mask.
    pub fn cswap(
        &mut self,
        controller: usize,
        target1: usize,
        target2: usize,
        controls: &[usize],
        _dagger: bool,
    ) -> Result<()> {
        self.check_targets(&[controller, target1, target2], controls)?;
        let mask = make_controller_mask(controls) | pow2(controller);
        kernel::u44_unsafe(&mut self.state, target1, target2, &gates::swap_matrix(), mask);
        Ok(())
    }

    /// `U1(qn1, theta1); U1(qn2, theta2); ZZ(qn1, qn2, thetazz)`.
    ///
    /// All three factors commute, so the dagger form just negates the
    /// angles.
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
        let sign = if dagger { -1.0 } else { 1.0 };
        let mask = make_controller_mask(controls);
        kernel::u22_unsafe(&mut self.state, qn1, &gates::u1_matrix(sign * theta1), mask);
        kernel::u22_unsafe(&mut self.state, qn2, &gates::u1_matrix(sign * theta2), mask);
        kernel::u44_unsafe(
            &mut self.state,
            qn1,
            qn2,
            &gates::zz_matrix(sign * thetazz),
            mask,
        );
        Ok(())
    }

    /// 15-parameter two-qubit unitary in KAK form:
    ///
    /// `U3(q1, p[0..3]); U3(q2, p[3..6]); XX(p[6]); YY(p[7]); ZZ(p[8]);
    /// U3(q1, p[9..12]); U3(q2, p[12..15])`.
    ///
    /// Dagger applies the reversed sequence with daggered U3 factors
    /// and negated interaction angles.
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
        let mask = make_controller_mask(controls);
        let p = parameters;
        let pre1 = gates::u3_matrix(p[0], p[1], p[2]);
        let pre2 = gates::u3_matrix(p[3], p[4], p[5]);
        let post1 = gates::u3_matrix(p[9], p[10], p[11]);
        let post2 = gates::u3_matrix(p[12], p[13], p[14]);

        if !dagger {
            kernel::u22_unsafe(&mut self.state, qn1, &pre1, mask);
            kernel::u22_unsafe(&mut self.state, qn2, &pre2, mask);
            kernel::u44_unsafe(&mut self.state, qn1, qn2, &gates::xx_matrix(p[6]), mask);
            kernel::u44_unsafe(&mut self.state, qn1, qn2, &gates::yy_matrix(p[7]), mask);
            kernel::u44_unsafe(&mut self.state, qn1, qn2, &gates::zz_matrix(p[8]), mask);
            kernel::u22_unsafe(&mut self.state, qn1, &post1, mask);
            kernel::u22_unsafe(&mut self.state, qn2, &post2, mask);
        } else {
            kernel::u22_unsafe(&mut self.state, qn1, &mat2_dag(&post1), mask);
            kernel::u22_unsafe(&mut self.state, qn2, &mat2_dag(&post2), mask);
            kernel::u44_unsafe(&mut self.state, qn1, qn2, &gates::zz_matrix(-p[8]), mask);
            kernel::u44_unsafe(&mut self.state, qn1, qn2, &gates::yy_matrix(-p[7]), mask);
            kernel::u44_unsafe(&mut self.state, qn1, qn2, &gates::xx_matrix(-p[6]), mask);
            kernel::u22_unsafe(&mut self.state, qn1, &mat2_dag(&pre1), mask);
            kernel::u22_unsafe(&mut self.state, qn2, &mat2_dag(&pre2), mask);
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // probability queries
    // -----------------------------------------------------------------

    /// Probability of qubit `qn` reading `qstate` (0 or 1).
    pub fn get_prob(&self, qn: usize, qstate: usize) -> Result<f64> {
        self.check_qubit(qn)?;
        if qstate > 1 {
            return Err(QseError::invalid_argument(format!(
                "State must be 0 or 1. (input = {} at qn = {})",
                qstate, qn
            )));
        }
        Ok(if qstate == 0 {
            kernel::prob_0(&self.state, qn)
        } else {
            kernel::prob_1(&self.state, qn)
        })
    }

    /// Probability that every (qubit -> value) pair of `assignment`
    /// holds simultaneously.
    pub fn get_prob_map(&self, assignment: &BTreeMap<usize, usize>) -> Result<f64> {
        let mut mask_qubit = 0usize;
        let mut mask_state = 0usize;
        for (&qn, &qstate) in assignment {
            self.check_qubit(qn)?;
            if qstate > 1 {
                return Err(QseError::invalid_argument(format!(
                    "State must be 0 or 1. (input = {} at qn = {})",
                    qstate, qn
                )));
            }
            mask_qubit |= pow2(qn);
            if qstate == 1 {
                mask_state |= pow2(qn);
            }
        }

        let prob = self
            .state
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask_qubit == mask_state)
            .map(|(_, a)| abs_sqr(*a))
            .sum();
        Ok(prob)
    }

    /// Marginal distribution over the listed qubits, indexed by the
    /// sub-index whose bit j is `measure_list[j]`.
    pub fn pmeasure_list(&self, measure_list: &[usize]) -> Result<Vec<f64>> {
        let measure_map = preprocess_measure_list(measure_list, self.total_qubit)?;
        let mut ret = vec![0.0; pow2(measure_list.len())];
        for (i, amp) in self.state.iter().enumerate() {
            ret[project_index(i, &measure_map)] += abs_sqr(*amp);
        }
        Ok(ret)
    }

    /// Marginal distribution [p0, p1] of one qubit.
    pub fn pmeasure(&self, measure_qubit: usize) -> Result<Vec<f64>> {
        self.pmeasure_list(&[measure_qubit])
    }

    // -----------------------------------------------------------------
    // stochastic channels (trajectory sampling)
    // -----------------------------------------------------------------

    fn check_probability(p: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&p) {
            return Err(QseError::invalid_argument(format!(
                "Probability must be between 0 and 1 (got {})",
                p
            )));
        }
        Ok(())
    }

    /// Depolarizing error: with probability p, applies X, Y or Z with
    /// equal weight.
    pub fn depolarizing(&mut self, qn: usize, p: f64) -> Result<()> {
        self.check_qubit(qn)?;
        Self::check_probability(p)?;
        let r = rng::random_f64();
        if r >= p {
            return Ok(());
        }
        if r < p / 3.0 {
            self.x(qn, &[], false)
        } else if r < p / 3.0 * 2.0 {
            self.y(qn, &[], false)
        } else {
            self.z(qn, &[], false)
        }
    }

    /// Amplitude damping with decay rate gamma.
    pub fn damping(&mut self, qn: usize, gamma: f64) -> Result<()> {
        self.check_qubit(qn)?;
        Self::check_probability(gamma)?;
        kernel::amplitude_damping(&mut self.state, qn, gamma)
    }

    /// Bit flip (X) with probability p.
    pub fn bitflip(&mut self, qn: usize, p: f64) -> Result<()> {
        self.check_qubit(qn)?;
        Self::check_probability(p)?;
        if rng::random_f64() < p {
            self.x(qn, &[], false)?;
        }
        Ok(())
    }

    /// Phase flip (Z) with probability p.
    pub fn phaseflip(&mut self, qn: usize, p: f64) -> Result<()> {
        self.check_qubit(qn)?;
        Self::check_probability(p)?;
        if rng::random_f64() < p {
            self.z(qn, &[], false)?;
        }
        Ok(())
    }

    /// Two-qubit depolarizing error: with probability p, draws one of
    /// the 15 nontrivial Pauli pairs uniformly and applies it as two
    /// independent single-qubit Paulis.
    pub fn twoqubit_depolarizing(&mut self, qn1: usize, qn2: usize, p: f64) -> Result<()> {
        self.check_targets(&[qn1, qn2], &[])?;
        Self::check_probability(p)?;
        let r = rng::random_f64();
        if r >= p {
            return Ok(());
        }
        let depol_case = (15.0 * r / p) as usize + 1;
        match depol_case % 4 {
            1 => self.x(qn1, &[], false)?,
            2 => self.y(qn1, &[], false)?,
            3 => self.z(qn1, &[], false)?,
            _ => {}
        }
        match depol_case / 4 {
            1 => self.x(qn2, &[], false)?,
            2 => self.y(qn2, &[], false)?,
            3 => self.z(qn2, &[], false)?,
            _ => {}
        }
        Ok(())
    }

    /// Stochastic single-qubit Kraus channel.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the set is empty or incomplete
    /// (`sum(E†E) != I`).
    pub fn kraus1q(&mut self, qn: usize, kraus_ops: &[Mat2]) -> Result<()> {
        self.check_qubit(qn)?;
        if kraus_ops.is_empty() {
            return Err(QseError::invalid_argument("Empty Kraus operator set"));
        }
        if !qse_core::matrix::validate_kraus1q(kraus_ops) {
            return Err(QseError::invalid_argument(
                "Invalid Kraus operators: sum(E†E) != I",
            ));
        }
        kernel::kraus1q(&mut self.state, qn, kraus_ops)
    }

    /// Forces qubit `qn` back to |0>.
    pub fn reset_qubit(&mut self, qn: usize) -> Result<()> {
        self.check_qubit(qn)?;
        kernel::reset_qubit(&mut self.state, qn)
    }

    /// Renormalizes the whole register to unit norm.
    pub fn normalize(&mut self) -> Result<()> {
        let norm = self.norm_sqr().sqrt();
        kernel::rescale(&mut self.state, norm)
    }
}
