//! Complex 2x2 / 4x4 matrix algebra for gate and channel construction.
//!
//! Matrices are stored row-major in flat arrays (`Mat2` = 4 entries,
//! `Mat4` = 16 entries). Two-qubit matrices follow the sub-index
//! convention `r = bit(q1) + 2 * bit(q2)`, matching the kernel partner
//! order `i, i + 2^q1, i + 2^q2, i + 2^q1 + 2^q2`.

use num_complex::Complex64;

/// Complex number type alias for readability.
pub type C64 = Complex64;

/// 2x2 complex matrix, row-major: `[u00, u01, u10, u11]`.
pub type Mat2 = [C64; 4];

/// 4x4 complex matrix, row-major.
pub type Mat4 = [C64; 16];

/// Create a complex number from real and imaginary parts.
#[inline]
pub const fn c(re: f64, im: f64) -> C64 {
    C64::new(re, im)
}

/// Complex zero.
pub const ZERO: C64 = C64::new(0.0, 0.0);

/// Complex one.
pub const ONE: C64 = C64::new(1.0, 0.0);

/// Complex imaginary unit i.
pub const I: C64 = C64::new(0.0, 1.0);

/// 1/sqrt(2).
pub const INV_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Comparison tolerance for amplitudes and unitarity checks.
pub const EPSILON: f64 = 1e-7;

/// Identity matrix I.
pub const ID2: Mat2 = [ONE, ZERO, ZERO, ONE];

/// Pauli-X (NOT) gate.
pub const PAULI_X: Mat2 = [ZERO, ONE, ONE, ZERO];

/// Pauli-Y gate.
pub const PAULI_Y: Mat2 = [ZERO, C64::new(0.0, -1.0), I, ZERO];

/// Pauli-Z gate.
pub const PAULI_Z: Mat2 = [ONE, ZERO, ZERO, C64::new(-1.0, 0.0)];

/// |amplitude|^2.
#[inline]
pub fn abs_sqr(a: C64) -> f64 {
    a.norm_sqr()
}

/// Equality within [`EPSILON`].
#[inline]
pub fn float_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

/// Componentwise equality within [`EPSILON`].
#[inline]
pub fn complex_equal(a: C64, b: C64) -> bool {
    float_equal(a.re, b.re) && float_equal(a.im, b.im)
}

/// Entry (i, j) of a 2x2 matrix.
#[inline]
pub fn val2(u: &Mat2, i: usize, j: usize) -> C64 {
    u[i * 2 + j]
}

/// Entry (i, j) of a 4x4 matrix.
#[inline]
pub fn val4(u: &Mat4, i: usize, j: usize) -> C64 {
    u[i * 4 + j]
}

/// Matrix product of two 2x2 matrices.
pub fn mat2_mul(a: &Mat2, b: &Mat2) -> Mat2 {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
    ]
}

/// Matrix product of two 4x4 matrices.
pub fn mat4_mul(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut ret = [ZERO; 16];
    for i in 0..4 {
        for j in 0..4 {
            let mut acc = ZERO;
            for k in 0..4 {
                acc += val4(a, i, k) * val4(b, k, j);
            }
            ret[i * 4 + j] = acc;
        }
    }
    ret
}

/// Hermitian conjugate (conjugate transpose) of a 2x2 matrix.
pub fn mat2_dag(u: &Mat2) -> Mat2 {
    [u[0].conj(), u[2].conj(), u[1].conj(), u[3].conj()]
}

/// Hermitian conjugate of a 4x4 matrix.
pub fn mat4_dag(u: &Mat4) -> Mat4 {
    let mut ret = [ZERO; 16];
    for i in 0..4 {
        for j in 0..4 {
            ret[i * 4 + j] = val4(u, j, i).conj();
        }
    }
    ret
}

/// The matrix itself, or its Hermitian conjugate when `dagger` is set.
#[inline]
pub fn mat2_dag_if(u: &Mat2, dagger: bool) -> Mat2 {
    if dagger {
        mat2_dag(u)
    } else {
        *u
    }
}

/// The matrix itself, or its Hermitian conjugate when `dagger` is set.
#[inline]
pub fn mat4_dag_if(u: &Mat4, dagger: bool) -> Mat4 {
    if dagger {
        mat4_dag(u)
    } else {
        *u
    }
}

/// Real-scalar multiple of a 2x2 matrix.
pub fn mat2_scale(u: &Mat2, s: f64) -> Mat2 {
    [u[0] * s, u[1] * s, u[2] * s, u[3] * s]
}

/// Real-scalar multiple of a 4x4 matrix.
pub fn mat4_scale(u: &Mat4, s: f64) -> Mat4 {
    let mut ret = *u;
    for entry in ret.iter_mut() {
        *entry *= s;
    }
    ret
}

/// Kronecker product `a (x) b`.
///
/// Under the sub-index convention `r = bit(q1) + 2 * bit(q2)`, `a`
/// acts on the second qubit (high bit) and `b` on the first (low bit).
pub fn kron(a: &Mat2, b: &Mat2) -> Mat4 {
    let mut ret = [ZERO; 16];
    for i in 0..2 {
        for j in 0..2 {
            for k in 0..2 {
                for l in 0..2 {
                    ret[(2 * i + k) * 4 + (2 * j + l)] = val2(a, i, j) * val2(b, k, l);
                }
            }
        }
    }
    ret
}

/// Tensor Pauli pair with `first` acting on q1 and `second` on q2.
pub fn two_qubit_pauli(first: &Mat2, second: &Mat2) -> Mat4 {
    kron(second, first)
}

/// Checks `U U† = I` within [`EPSILON`] for a 2x2 matrix.
pub fn is_unitary2(u: &Mat2) -> bool {
    let product = mat2_mul(u, &mat2_dag(u));
    complex_equal(product[0], ONE)
        && complex_equal(product[1], ZERO)
        && complex_equal(product[2], ZERO)
        && complex_equal(product[3], ONE)
}

/// Checks `U U† = I` within [`EPSILON`] for a 4x4 matrix.
pub fn is_unitary4(u: &Mat4) -> bool {
    let product = mat4_mul(u, &mat4_dag(u));
    for i in 0..4 {
        for j in 0..4 {
            let expected = if i == j { ONE } else { ZERO };
            if !complex_equal(val4(&product, i, j), expected) {
                return false;
            }
        }
    }
    true
}

/// Checks the Kraus completeness condition `sum(E†E) = I` for a
/// single-qubit operator set.
pub fn validate_kraus1q(kraus_ops: &[Mat2]) -> bool {
    let mut sum = [ZERO; 4];
    for op in kraus_ops {
        let product = mat2_mul(&mat2_dag(op), op);
        for (s, p) in sum.iter_mut().zip(product.iter()) {
            *s += *p;
        }
    }
    complex_equal(sum[0], ONE)
        && complex_equal(sum[1], ZERO)
        && complex_equal(sum[2], ZERO)
        && complex_equal(sum[3], ONE)
}

/// Checks the Kraus completeness condition `sum(E†E) = I` for a
/// two-qubit operator set.
pub fn validate_kraus2q(kraus_ops: &[Mat4]) -> bool {
    let mut sum = [ZERO; 16];
    for op in kraus_ops {
        let product = mat4_mul(&mat4_dag(op), op);
        for (s, p) in sum.iter_mut().zip(product.iter()) {
            *s += *p;
        }
    }
    for i in 0..4 {
        for j in 0..4 {
            let expected = if i == j { ONE } else { ZERO };
            if !complex_equal(sum[i * 4 + j], expected) {
                return false;
            }
        }
    }
    true
}
