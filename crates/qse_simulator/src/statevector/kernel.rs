//! In-place amplitude-vector kernels.
//!
//! Every unitary goes through one of two entry points: `u22_unsafe`
//! for a single target and `u44_unsafe` for a target pair. "Unsafe"
//! means argument validation has already happened at the facade; the
//! kernels only iterate. Both branch once on `controller_mask == 0`
//! so the uncontrolled hot path never tests the mask.
//!
//! Iteration invariant: a basis index is processed only when every
//! target bit is 0, so each 2- or 4-amplitude group is touched exactly
//! once per pass.

use qse_core::bits::pow2;
use qse_core::error::{QseError, Result};
use qse_core::matrix::{abs_sqr, C64, EPSILON, Mat2, Mat4, ZERO};
use qse_core::rng;

/// Applies a 2x2 unitary to `qn`, restricted to indices where every
/// bit of `controller_mask` is set.
pub fn u22_unsafe(state: &mut [C64], qn: usize, u: &Mat2, controller_mask: usize) {
    let mask = pow2(qn);
    if controller_mask == 0 {
        for i in 0..state.len() {
            if i & mask != 0 {
                continue;
            }
            let j = i | mask;
            let a0 = state[i];
            let a1 = state[j];
            state[i] = u[0] * a0 + u[1] * a1;
            state[j] = u[2] * a0 + u[3] * a1;
        }
    } else {
        for i in 0..state.len() {
            if i & controller_mask != controller_mask {
                continue;
            }
            if i & mask != 0 {
                continue;
            }
            let j = i | mask;
            let a0 = state[i];
            let a1 = state[j];
            state[i] = u[0] * a0 + u[1] * a1;
            state[j] = u[2] * a0 + u[3] * a1;
        }
    }
}

/// Applies a 4x4 unitary to the pair `(qn1, qn2)`.
///
/// The matrix row/column sub-index is `bit(qn1) + 2 * bit(qn2)`, i.e.
/// the four partners of a base index i are
/// `i, i + 2^qn1, i + 2^qn2, i + 2^qn1 + 2^qn2`.
pub fn u44_unsafe(state: &mut [C64], qn1: usize, qn2: usize, u: &Mat4, controller_mask: usize) {
    let mask1 = pow2(qn1);
    let mask2 = pow2(qn2);
    let both = mask1 | mask2;
    for i in 0..state.len() {
        if i & both != 0 {
            continue;
        }
        if controller_mask != 0 && i & controller_mask != controller_mask {
            continue;
        }
        let idx = [i, i | mask1, i | mask2, i | both];
        let a = [state[idx[0]], state[idx[1]], state[idx[2]], state[idx[3]]];
        for (row, &target) in idx.iter().enumerate() {
            state[target] = u[row * 4] * a[0]
                + u[row * 4 + 1] * a[1]
                + u[row * 4 + 2] * a[2]
                + u[row * 4 + 3] * a[3];
        }
    }
}

/// Total probability of qubit `qn` reading 0.
pub fn prob_0(state: &[C64], qn: usize) -> f64 {
    let mask = pow2(qn);
    state
        .iter()
        .enumerate()
        .filter(|(i, _)| i & mask == 0)
        .map(|(_, a)| abs_sqr(*a))
        .sum()
}

/// Total probability of qubit `qn` reading 1.
pub fn prob_1(state: &[C64], qn: usize) -> f64 {
    let mask = pow2(qn);
    state
        .iter()
        .enumerate()
        .filter(|(i, _)| i & mask != 0)
        .map(|(_, a)| abs_sqr(*a))
        .sum()
}

/// Divides every amplitude by `norm`.
///
/// # Errors
///
/// Returns `Runtime` when the normalization constant underflows the
/// comparison tolerance.
pub fn rescale(state: &mut [C64], norm: f64) -> Result<()> {
    if norm < EPSILON {
        return Err(QseError::runtime(format!(
            "The normalization factor ({}) is invalid.",
            norm
        )));
    }
    let inv = 1.0 / norm;
    for amp in state.iter_mut() {
        *amp *= inv;
    }
    Ok(())
}

/// Stochastic amplitude damping on `qn` with decay rate `gamma`.
///
/// With probability `gamma * p1` the |1> population collapses onto the
/// |0> slots (renormalized by sqrt(p1)); otherwise every |1> amplitude
/// shrinks by sqrt(1 - gamma) and the state is renormalized by
/// sqrt(1 - gamma * p1).
pub fn amplitude_damping(state: &mut [C64], qn: usize, gamma: f64) -> Result<()> {
    let mask = pow2(qn);
    let p1 = prob_1(state, qn);
    let prob_decay = gamma * p1;
    let r = rng::random_f64();

    if r < prob_decay {
        for i in 0..state.len() {
            if i & mask != 0 {
                continue;
            }
            let j = i | mask;
            state[i] = state[j];
            state[j] = ZERO;
        }
        rescale(state, p1.sqrt())
    } else {
        let shrink = (1.0 - gamma).sqrt();
        for (i, amp) in state.iter_mut().enumerate() {
            if i & mask != 0 {
                *amp *= shrink;
            }
        }
        rescale(state, (1.0 - prob_decay).sqrt())
    }
}

/// Stochastic single-qubit Kraus channel on `qn`.
///
/// Samples one operator from the set by its outcome probability and
/// renormalizes. The last operator is applied without a scratch copy,
/// using the residual probability `1 - sum(previous)`; that shortcut
/// is only sound for complete sets, which the facade has validated.
pub fn kraus1q(state: &mut Vec<C64>, qn: usize, kraus_ops: &[Mat2]) -> Result<()> {
    let r = rng::random_f64();
    let mut cumulative = 0.0;

    for op in &kraus_ops[..kraus_ops.len() - 1] {
        let mut candidate = state.clone();
        u22_unsafe(&mut candidate, qn, op, 0);
        let prob: f64 = candidate.iter().map(|a| abs_sqr(*a)).sum();
        if r < cumulative + prob {
            rescale(&mut candidate, prob.sqrt())?;
            *state = candidate;
            return Ok(());
        }
        cumulative += prob;
    }

    let last = kraus_ops[kraus_ops.len() - 1];
    u22_unsafe(state, qn, &last, 0);
    rescale(state, (1.0 - cumulative).sqrt())
}

/// Forces qubit `qn` to |0>: folds each |1> amplitude into its |0>
/// partner, clears the |1> slots, then renormalizes.
pub fn reset_qubit(state: &mut [C64], qn: usize) -> Result<()> {
    let mask = pow2(qn);
    for i in 0..state.len() {
        if i & mask != 0 {
            continue;
        }
        let j = i | mask;
        state[i] += state[j];
        state[j] = ZERO;
    }
    let norm: f64 = state.iter().map(|a| abs_sqr(*a)).sum();
    rescale(state, norm.sqrt())
}
