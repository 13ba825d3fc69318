//! Density-operator engine.
//!
//! Evolves a 2^n x 2^n density matrix eagerly. Unitary gates share
//! the matrix builders of the state-vector engine and conjugate the
//! affected blocks (`rho <- U rho U†`, with partial-action variants
//! under controls). CPTP maps are expressed as Kraus operator sets and
//! applied as deterministic mixtures; completeness is validated before
//! any channel touches the state.
//!
//! Memory is O(4^n), which caps the practical register size well below
//! the state-vector engine; the default ceiling is 10 qubits.

pub mod kernel;

use std::collections::BTreeMap;

use tracing::debug;

use qse_core::bits::{make_controller_mask, pow2, preprocess_measure_list, project_index};
use qse_core::error::{QseError, Result};
use qse_core::gates;
use qse_core::matrix::{
    is_unitary2, is_unitary4, mat2_dag, mat2_dag_if, mat2_scale, mat4_dag_if, mat4_scale,
    two_qubit_pauli, validate_kraus1q, validate_kraus2q, C64, ID2, Mat2, Mat4, ONE, PAULI_X,
    PAULI_Y, PAULI_Z, ZERO,
};

/// Default qubit ceiling; 4^10 amplitudes is 16 MiB of state.
pub const DEFAULT_MAX_QUBITS: usize = 10;

/// Density-operator simulator.
pub struct DensityOperatorSimulator {
    total_qubit: usize,
    max_qubits: usize,
    state: Vec<C64>,
}

impl DensityOperatorSimulator {
    /// Creates an n-qubit engine initialized to |0...0><0...0|.
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
        debug!(total_qubit, "initializing density-operator engine");
        let mut state = vec![ZERO; pow2(2 * total_qubit)];
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

    /// Returns the flattened row-major density matrix.
    pub fn state(&self) -> &[C64] {
        &self.state
    }

    /// Resets to |0...0><0...0|.
    pub fn reset(&mut self) {
        self.state.fill(ZERO);
        self.state[0] = ONE;
    }

    /// The (i, j) entry of the density matrix.
    pub fn entry(&self, i: usize, j: usize) -> C64 {
        self.state[i * pow2(self.total_qubit) + j]
    }

    /// Trace of the density matrix.
    pub fn trace(&self) -> C64 {
        let n = pow2(self.total_qubit);
        (0..n).map(|i| self.state[i * n + i]).sum()
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

    fn check_probability(p: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&p) {
            return Err(QseError::invalid_argument(format!(
                "Probability must be between 0 and 1 (got {})",
                p
            )));
        }
        Ok(())
    }

    fn apply_1q(&mut self, qn: usize, u: &Mat2, controls: &[usize]) -> Result<()> {
        self.check_targets(&[qn], controls)?;
        kernel::u22_unsafe(
            &mut self.state,
            qn,
            u,
            self.total_qubit,
            make_controller_mask(controls),
        );
        Ok(())
    }

    fn apply_2q(&mut self, qn1: usize, qn2: usize, u: &Mat4, controls: &[usize]) -> Result<()> {
        self.check_targets(&[qn1, qn2], controls)?;
        kernel::u44_unsafe(
            &mut self.state,
            qn1,
            qn2,
            u,
            self.total_qubit,
            make_controller_mask(controls),
        );
        Ok(())
    }

    // -----------------------------------------------------------------
    // gates (same vocabulary as the state-vector engine)
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
    pub fn u22(&mut self, qn: usize, unitary: &Mat2, controls: &[usize], dagger: bool) -> Result<()> {
        if !is_unitary2(unitary) {
            return Err(QseError::invalid_argument("Input is not a unitary."));
        }
        self.apply_1q(qn, &mat2_dag_if(unitary, dagger), controls)
    }

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

    /// CNOT: X on `target` with `controller` folded into the mask, so
    /// the partial-action kernel keeps all coherences consistent.
    pub fn cnot(
        &mut self,
        controller: usize,
        target: usize,
        controls: &[usize],
        _dagger: bool,
    ) -> Result<()> {
        self.check_targets(&[controller, target], controls)?;
        let mask = make_controller_mask(controls) | pow2(controller);
        kernel::u22_unsafe(&mut self.state, target, &gates::x_matrix(), self.total_qubit, mask);
        Ok(())
    }

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
        kernel::u22_unsafe(&mut self.state, target, &gates::x_matrix(), self.total_qubit, mask);
        Ok(())
    }

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
        kernel::u44_unsafe(
            &mut self.state,
            target1,
            target2,
            &gates::swap_matrix(),
            self.total_qubit,
            mask,
        );
        Ok(())
    }

    /// `U1(qn1, theta1); U1(qn2, theta2); ZZ(qn1, qn2, thetazz)`.
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
        kernel::u22_unsafe(
            &mut self.state,
            qn1,
            &gates::u1_matrix(sign * theta1),
            self.total_qubit,
            mask,
        );
        kernel::u22_unsafe(
            &mut self.state,
            qn2,
            &gates::u1_matrix(sign * theta2),
            self.total_qubit,
            mask,
        );
        kernel::u44_unsafe(
            &mut self.state,
            qn1,
            qn2,
            &gates::zz_matrix(sign * thetazz),
            self.total_qubit,
            mask,
        );
        Ok(())
    }

    /// 15-parameter two-qubit unitary in KAK form; see the
    /// state-vector engine for the factor order.
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
        let tq = self.total_qubit;
        let p = parameters;
        let pre1 = gates::u3_matrix(p[0], p[1], p[2]);
        let pre2 = gates::u3_matrix(p[3], p[4], p[5]);
        let post1 = gates::u3_matrix(p[9], p[10], p[11]);
        let post2 = gates::u3_matrix(p[12], p[13], p[14]);

        if !dagger {
            kernel::u22_unsafe(&mut self.state, qn1, &pre1, tq, mask);
            kernel::u22_unsafe(&mut self.state, qn2, &pre2, tq, mask);
            kernel::u44_unsafe(&mut self.state, qn1, qn2, &gates::xx_matrix(p[6]), tq, mask);
            kernel::u44_unsafe(&mut self.state, qn1, qn2, &gates::yy_matrix(p[7]), tq, mask);
            kernel::u44_unsafe(&mut self.state, qn1, qn2, &gates::zz_matrix(p[8]), tq, mask);
            kernel::u22_unsafe(&mut self.state, qn1, &post1, tq, mask);
            kernel::u22_unsafe(&mut self.state, qn2, &post2, tq, mask);
        } else {
            kernel::u22_unsafe(&mut self.state, qn1, &mat2_dag(&post1), tq, mask);
            kernel::u22_unsafe(&mut self.state, qn2, &mat2_dag(&post2), tq, mask);
            kernel::u44_unsafe(&mut self.state, qn1, qn2, &gates::zz_matrix(-p[8]), tq, mask);
            kernel::u44_unsafe(&mut self.state, qn1, qn2, &gates::yy_matrix(-p[7]), tq, mask);
            kernel::u44_unsafe(&mut self.state, qn1, qn2, &gates::xx_matrix(-p[6]), tq, mask);
            kernel::u22_unsafe(&mut self.state, qn1, &mat2_dag(&pre1), tq, mask);
            kernel::u22_unsafe(&mut self.state, qn2, &mat2_dag(&pre2), tq, mask);
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // channels
    // -----------------------------------------------------------------

    /// Applies a validated single-qubit Kraus set as a deterministic
    /// mixture.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the set is empty or `sum(E†E) != I`.
    pub fn kraus1q(&mut self, qn: usize, kraus_ops: &[Mat2]) -> Result<()> {
        self.check_qubit(qn)?;
        if kraus_ops.is_empty() {
            return Err(QseError::invalid_argument("Empty Kraus operator set"));
        }
        if !validate_kraus1q(kraus_ops) {
            return Err(QseError::invalid_argument(
                "Invalid Kraus operators: sum(E†E) != I",
            ));
        }
        kernel::kraus1q_unsafe(&mut self.state, qn, kraus_ops, self.total_qubit);
        Ok(())
    }

    /// Applies a validated two-qubit Kraus set as a deterministic
    /// mixture.
    pub fn kraus2q(&mut self, qn1: usize, qn2: usize, kraus_ops: &[Mat4]) -> Result<()> {
        self.check_targets(&[qn1, qn2], &[])?;
        if kraus_ops.is_empty() {
            return Err(QseError::invalid_argument("Empty Kraus operator set"));
        }
        if !validate_kraus2q(kraus_ops) {
            return Err(QseError::invalid_argument(
                "Invalid Kraus operators: sum(E†E) != I",
            ));
        }
        kernel::kraus2q_unsafe(&mut self.state, qn1, qn2, kraus_ops, self.total_qubit);
        Ok(())
    }

    /// Single-qubit Pauli error with independent X/Y/Z weights.
    ///
    /// The residual `1 - px - py - pz` stays on the identity.
    pub fn pauli_error_1q(&mut self, qn: usize, px: f64, py: f64, pz: f64) -> Result<()> {
        for p in [px, py, pz] {
            Self::check_probability(p)?;
        }
        let sum = px + py + pz;
        if sum > 1.0 {
            return Err(QseError::invalid_argument(
                "Probabilities must be less than or equal to 1.",
            ));
        }
        let ex = mat2_scale(&PAULI_X, px.sqrt());
        let ey = mat2_scale(&PAULI_Y, py.sqrt());
        let ez = mat2_scale(&PAULI_Z, pz.sqrt());
        let ei = mat2_scale(&ID2, (1.0 - sum).sqrt());
        self.kraus1q(qn, &[ex, ey, ez, ei])
    }

    /// Depolarizing channel with total error probability p.
    pub fn depolarizing(&mut self, qn: usize, p: f64) -> Result<()> {
        Self::check_probability(p)?;
        self.pauli_error_1q(qn, p / 3.0, p / 3.0, p / 3.0)
    }

    /// Bit flip channel `{sqrt(p) X, sqrt(1-p) I}`.
    pub fn bitflip(&mut self, qn: usize, p: f64) -> Result<()> {
        Self::check_probability(p)?;
        let ex = mat2_scale(&PAULI_X, p.sqrt());
        let ei = mat2_scale(&ID2, (1.0 - p).sqrt());
        self.kraus1q(qn, &[ex, ei])
    }

    /// Phase flip channel `{sqrt(p) Z, sqrt(1-p) I}`.
    pub fn phaseflip(&mut self, qn: usize, p: f64) -> Result<()> {
        Self::check_probability(p)?;
        let ez = mat2_scale(&PAULI_Z, p.sqrt());
        let ei = mat2_scale(&ID2, (1.0 - p).sqrt());
        self.kraus1q(qn, &[ez, ei])
    }

    /// Amplitude damping with decay rate gamma:
    /// `E0 = diag(1, sqrt(1-gamma))`, `E1 = sqrt(gamma) |0><1|`.
    pub fn amplitude_damping(&mut self, qn: usize, gamma: f64) -> Result<()> {
        Self::check_probability(gamma)?;
        let e0: Mat2 = [ONE, ZERO, ZERO, C64::new((1.0 - gamma).sqrt(), 0.0)];
        let e1: Mat2 = [ZERO, C64::new(gamma.sqrt(), 0.0), ZERO, ZERO];
        self.kraus1q(qn, &[e0, e1])
    }

    /// Two-qubit Pauli error over the 15 nontrivial tensor Paulis.
    ///
    /// `p` lists the weights in the order XI, YI, ZI, IX, XX, YX, ZX,
    /// IY, XY, YY, ZY, IZ, XZ, YZ, ZZ (first letter acts on `qn1`);
    /// the residual `1 - sum(p)` stays on II.
    pub fn pauli_error_2q(&mut self, qn1: usize, qn2: usize, p: &[f64]) -> Result<()> {
        if p.len() != 15 {
            return Err(QseError::invalid_argument(format!(
                "pauli_error_2q expects 15 probabilities, got {}",
                p.len()
            )));
        }
        for &prob in p {
            Self::check_probability(prob)?;
        }
        let sum: f64 = p.iter().sum();
        if sum > 1.0 {
            return Err(QseError::invalid_argument(
                "Probabilities must be less than or equal to 1.",
            ));
        }

        let paulis: [Mat2; 4] = [ID2, PAULI_X, PAULI_Y, PAULI_Z];
        let mut kraus_ops = Vec::with_capacity(16);
        kraus_ops.push(mat4_scale(
            &two_qubit_pauli(&ID2, &ID2),
            (1.0 - sum).sqrt(),
        ));
        let mut weight = p.iter();
        for second in 0..4 {
            for first in 0..4 {
                if first == 0 && second == 0 {
                    continue;
                }
                let op = two_qubit_pauli(&paulis[first], &paulis[second]);
                kraus_ops.push(mat4_scale(&op, weight.next().unwrap().sqrt()));
            }
        }
        self.kraus2q(qn1, qn2, &kraus_ops)
    }

    /// Symmetric two-qubit depolarizing channel.
    pub fn twoqubit_depolarizing(&mut self, qn1: usize, qn2: usize, p: f64) -> Result<()> {
        Self::check_probability(p)?;
        self.pauli_error_2q(qn1, qn2, &[p / 15.0; 15])
    }

    // -----------------------------------------------------------------
    // probability queries
    // -----------------------------------------------------------------

    /// Probability of qubit `qn` reading `qstate` (0 or 1), from the
    /// diagonal of rho.
    pub fn get_prob(&self, qn: usize, qstate: usize) -> Result<f64> {
        self.check_qubit(qn)?;
        if qstate > 1 {
            return Err(QseError::invalid_argument(format!(
                "State must be 0 or 1. (input = {} at qn = {})",
                qstate, qn
            )));
        }
        let n = pow2(self.total_qubit);
        let mask = pow2(qn);
        let want = if qstate == 1 { mask } else { 0 };
        let prob = (0..n)
            .filter(|i| i & mask == want)
            .map(|i| self.state[i * n + i].norm())
            .sum();
        Ok(prob)
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
        let n = pow2(self.total_qubit);
        let prob = (0..n)
            .filter(|i| i & mask_qubit == mask_state)
            .map(|i| self.state[i * n + i].norm())
            .sum();
        Ok(prob)
    }

    /// Marginal distribution over the listed qubits.
    pub fn pmeasure_list(&self, measure_list: &[usize]) -> Result<Vec<f64>> {
        let measure_map = preprocess_measure_list(measure_list, self.total_qubit)?;
        let n = pow2(self.total_qubit);
        let mut ret = vec![0.0; pow2(measure_list.len())];
        for i in 0..n {
            ret[project_index(i, &measure_map)] += self.state[i * n + i].norm();
        }
        Ok(ret)
    }

    /// Marginal distribution [p0, p1] of one qubit.
    pub fn pmeasure(&self, measure_qubit: usize) -> Result<Vec<f64>> {
        self.pmeasure_list(&[measure_qubit])
    }

    /// The diagonal of rho: probability of every basis index.
    pub fn stateprob(&self) -> Vec<f64> {
        let n = pow2(self.total_qubit);
        (0..n).map(|i| self.state[i * n + i].norm()).collect()
    }
}
