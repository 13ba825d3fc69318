//! In-place density-matrix kernels.
//!
//! The density matrix is stored row-major as a flat vector of
//! 2^(2n) amplitudes with `rho[i * N + j]` the (i, j) entry. A 1-qubit
//! gate on q partitions every (i, j) pair with both target bits 0 into
//! a 2x2 block; the block is loaded as a `Mat2`, transformed with the
//! core matrix algebra, and stored back. Two-qubit gates use 4x4
//! blocks the same way.
//!
//! Under a nonzero controller mask the transform splits into three
//! cases, keyed on whether the controls hold on the row index (a) and
//! the column index (b):
//!
//! | a | b | action                      |
//! |---|---|-----------------------------|
//! | T | T | `block <- U block U†`       |
//! | T | F | `block <- U block`          |
//! | F | T | `block <- block U†`         |
//! | F | F | identity                    |
//!
//! The one-sided actions keep the coherences between the controlled
//! and uncontrolled subspaces consistent.

use qse_core::bits::pow2;
use qse_core::matrix::{C64, Mat2, Mat4, mat2_dag, mat2_mul, mat4_dag, mat4_mul, ZERO};

#[inline]
fn at(i: usize, j: usize, n: usize) -> usize {
    i * n + j
}

fn load2(state: &[C64], i: usize, j: usize, mask: usize, n: usize) -> Mat2 {
    [
        state[at(i, j, n)],
        state[at(i, j | mask, n)],
        state[at(i | mask, j, n)],
        state[at(i | mask, j | mask, n)],
    ]
}

fn store2(state: &mut [C64], i: usize, j: usize, mask: usize, n: usize, block: &Mat2) {
    state[at(i, j, n)] = block[0];
    state[at(i, j | mask, n)] = block[1];
    state[at(i | mask, j, n)] = block[2];
    state[at(i | mask, j | mask, n)] = block[3];
}

fn load4(state: &[C64], rows: &[usize; 4], cols: &[usize; 4], n: usize) -> Mat4 {
    let mut block = [ZERO; 16];
    for (r, &row) in rows.iter().enumerate() {
        for (c, &col) in cols.iter().enumerate() {
            block[r * 4 + c] = state[at(row, col, n)];
        }
    }
    block
}

fn store4(state: &mut [C64], rows: &[usize; 4], cols: &[usize; 4], n: usize, block: &Mat4) {
    for (r, &row) in rows.iter().enumerate() {
        for (c, &col) in cols.iter().enumerate() {
            state[at(row, col, n)] = block[r * 4 + c];
        }
    }
}

/// Applies a 2x2 unitary to qubit `qn` of the density matrix:
/// `rho <- U rho U†`, with the partial-action decomposition when
/// `controller_mask` is nonzero.
pub fn u22_unsafe(
    state: &mut [C64],
    qn: usize,
    u: &Mat2,
    total_qubit: usize,
    controller_mask: usize,
) {
    let n = pow2(total_qubit);
    let mask = pow2(qn);
    let udag = mat2_dag(u);

    if controller_mask == 0 {
        for i in 0..n {
            if i & mask != 0 {
                continue;
            }
            for j in 0..n {
                if j & mask != 0 {
                    continue;
                }
                let block = load2(state, i, j, mask, n);
                let evolved = mat2_mul(&mat2_mul(u, &block), &udag);
                store2(state, i, j, mask, n, &evolved);
            }
        }
        return;
    }

    for i in 0..n {
        if i & mask != 0 {
            continue;
        }
        let row_enabled = i & controller_mask == controller_mask;
        for j in 0..n {
            if j & mask != 0 {
                continue;
            }
            let col_enabled = j & controller_mask == controller_mask;

            let block = load2(state, i, j, mask, n);
            let evolved = match (row_enabled, col_enabled) {
                (true, true) => mat2_mul(&mat2_mul(u, &block), &udag),
                (true, false) => mat2_mul(u, &block),
                (false, true) => mat2_mul(&block, &udag),
                (false, false) => continue,
            };
            store2(state, i, j, mask, n, &evolved);
        }
    }
}

/// Applies a 4x4 unitary to the qubit pair `(qn1, qn2)`.
///
/// Block sub-index is `bit(qn1) + 2 * bit(qn2)` on both axes.
pub fn u44_unsafe(
    state: &mut [C64],
    qn1: usize,
    qn2: usize,
    u: &Mat4,
    total_qubit: usize,
    controller_mask: usize,
) {
    let n = pow2(total_qubit);
    let mask1 = pow2(qn1);
    let mask2 = pow2(qn2);
    let both = mask1 | mask2;
    let udag = mat4_dag(u);

    for i in 0..n {
        if i & both != 0 {
            continue;
        }
        let rows = [i, i | mask1, i | mask2, i | both];
        let row_enabled = controller_mask == 0 || i & controller_mask == controller_mask;
        for j in 0..n {
            if j & both != 0 {
                continue;
            }
            let cols = [j, j | mask1, j | mask2, j | both];
            let col_enabled = controller_mask == 0 || j & controller_mask == controller_mask;

            let block = load4(state, &rows, &cols, n);
            let evolved = match (row_enabled, col_enabled) {
                (true, true) => mat4_mul(&mat4_mul(u, &block), &udag),
                (true, false) => mat4_mul(u, &block),
                (false, true) => mat4_mul(&block, &udag),
                (false, false) => continue,
            };
            store4(state, &rows, &cols, n, &evolved);
        }
    }
}

/// Componentwise `target += addend`.
pub fn merge_state(target: &mut [C64], addend: &[C64]) {
    for (t, a) in target.iter_mut().zip(addend.iter()) {
        *t += *a;
    }
}

/// Deterministic single-qubit Kraus mixture:
/// `rho <- sum_k E_k rho E_k†`.
///
/// Allocates one scratch copy of rho per operator. Completeness of the
/// set is the caller's responsibility.
pub fn kraus1q_unsafe(state: &mut Vec<C64>, qn: usize, kraus_ops: &[Mat2], total_qubit: usize) {
    let mut accumulator = vec![ZERO; state.len()];
    for op in kraus_ops {
        let mut branch = state.clone();
        u22_unsafe(&mut branch, qn, op, total_qubit, 0);
        merge_state(&mut accumulator, &branch);
    }
    *state = accumulator;
}

/// Deterministic two-qubit Kraus mixture.
pub fn kraus2q_unsafe(
    state: &mut Vec<C64>,
    qn1: usize,
    qn2: usize,
    kraus_ops: &[Mat4],
    total_qubit: usize,
) {
    let mut accumulator = vec![ZERO; state.len()];
    for op in kraus_ops {
        let mut branch = state.clone();
        u44_unsafe(&mut branch, qn1, qn2, op, total_qubit, 0);
        merge_state(&mut accumulator, &branch);
    }
    *state = accumulator;
}
