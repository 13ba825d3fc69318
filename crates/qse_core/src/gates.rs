//! Gate vocabulary and matrix builders.
//!
//! Every parameterized gate is built as a small stack matrix and handed
//! to a generic 2x2 / 4x4 kernel; the builders here return the
//! non-dagger form, and callers apply [`crate::matrix::mat2_dag`] /
//! [`crate::matrix::mat4_dag`] when the dagger variant is requested.
//!
//! Rotation conventions:
//! - `RX(theta) = exp(-i theta X / 2)`, likewise RY, RZ;
//! - `XX(theta) = exp(-i theta XX / 2)`, likewise YY, ZZ;
//! - `XY(theta) = exp(-i theta (XX + YY) / 4)`: identity on |00> and
//!   |11>, a rotation in the |01>/|10> subspace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QseError;
use crate::matrix::{c, Mat2, Mat4, INV_SQRT_2, ONE, ZERO};

/// Gate vocabulary shared by all three engines.
///
/// The trace recorder stores a `GateKind` next to its numeric
/// parameters; the engines use it to pick a matrix builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GateKind {
    /// Identity (useful as an idle slot for noise insertion)
    I,
    /// Hadamard
    H,
    /// Pauli-X
    X,
    /// Pauli-Y
    Y,
    /// Pauli-Z
    Z,
    /// S (sqrt(Z)); dagger gives S†
    S,
    /// T (pi/8); dagger gives T†
    T,
    /// sqrt(X)
    SX,
    /// Rotation about X
    RX,
    /// Rotation about Y
    RY,
    /// Rotation about Z
    RZ,
    /// Diagonal phase `diag(1, e^{i lambda})`
    U1,
    /// `U3(pi/2, phi, lambda)`
    U2,
    /// General single-qubit rotation `U3(theta, phi, lambda)`
    U3,
    /// pi/2 rotation about the axis `cos(phi) X + sin(phi) Y`
    RPHI90,
    /// pi rotation about the axis `cos(phi) X + sin(phi) Y`
    RPHI180,
    /// Rotation by theta about the axis `cos(phi) X + sin(phi) Y`
    RPHI,
    /// User-supplied 2x2 unitary
    U22,
    /// Controlled-Z
    CZ,
    /// Controlled-NOT
    CNOT,
    /// SWAP
    SWAP,
    /// iSWAP
    ISWAP,
    /// XY interaction
    XY,
    /// XX interaction
    XX,
    /// YY interaction
    YY,
    /// ZZ interaction
    ZZ,
    /// User-supplied 4x4 unitary
    U44,
    /// Doubly-controlled X
    TOFFOLI,
    /// Controlled SWAP
    CSWAP,
    /// `U1(q1); U1(q2); ZZ(q1, q2)`
    PHASE2Q,
    /// 15-parameter two-qubit unitary (KAK form)
    UU15,
}

impl GateKind {
    /// Number of operand qubits (excluding global controls).
    pub fn qubit_count(&self) -> usize {
        use GateKind::*;
        match self {
            I | H | X | Y | Z | S | T | SX | RX | RY | RZ | U1 | U2 | U3 | RPHI90 | RPHI180
            | RPHI | U22 => 1,
            CZ | CNOT | SWAP | ISWAP | XY | XX | YY | ZZ | U44 | PHASE2Q | UU15 => 2,
            TOFFOLI | CSWAP => 3,
        }
    }

    /// Number of f64 parameters carried in an opcode of this kind.
    ///
    /// U22/U44 matrices travel as interleaved re/im pairs.
    pub fn param_count(&self) -> usize {
        use GateKind::*;
        match self {
            I | H | X | Y | Z | S | T | SX | CZ | CNOT | SWAP | ISWAP | TOFFOLI | CSWAP => 0,
            RX | RY | RZ | U1 | RPHI90 | RPHI180 | XY | XX | YY | ZZ => 1,
            U2 | RPHI => 2,
            U3 | PHASE2Q => 3,
            U22 => 8,
            UU15 => 15,
            U44 => 32,
        }
    }

    /// Canonical lower-case name used in configuration maps.
    pub fn as_str(&self) -> &'static str {
        use GateKind::*;
        match self {
            I => "id",
            H => "h",
            X => "x",
            Y => "y",
            Z => "z",
            S => "s",
            T => "t",
            SX => "sx",
            RX => "rx",
            RY => "ry",
            RZ => "rz",
            U1 => "u1",
            U2 => "u2",
            U3 => "u3",
            RPHI90 => "rphi90",
            RPHI180 => "rphi180",
            RPHI => "rphi",
            U22 => "u22",
            CZ => "cz",
            CNOT => "cnot",
            SWAP => "swap",
            ISWAP => "iswap",
            XY => "xy",
            XX => "xx",
            YY => "yy",
            ZZ => "zz",
            U44 => "u44",
            TOFFOLI => "toffoli",
            CSWAP => "cswap",
            PHASE2Q => "phase2q",
            UU15 => "uu15",
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GateKind {
    type Err = QseError;

    /// Case-insensitive; accepts the canonical names plus the common
    /// aliases "cx" and "ccx".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use GateKind::*;
        let canonical = s.to_ascii_lowercase();
        let kind = match canonical.as_str() {
            "id" | "i" => I,
            "h" | "hadamard" => H,
            "x" => X,
            "y" => Y,
            "z" => Z,
            "s" => S,
            "t" => T,
            "sx" => SX,
            "rx" => RX,
            "ry" => RY,
            "rz" => RZ,
            "u1" => U1,
            "u2" => U2,
            "u3" => U3,
            "rphi90" => RPHI90,
            "rphi180" => RPHI180,
            "rphi" => RPHI,
            "u22" => U22,
            "cz" => CZ,
            "cnot" | "cx" => CNOT,
            "swap" => SWAP,
            "iswap" => ISWAP,
            "xy" => XY,
            "xx" => XX,
            "yy" => YY,
            "zz" => ZZ,
            "u44" => U44,
            "toffoli" | "ccx" => TOFFOLI,
            "cswap" => CSWAP,
            "phase2q" => PHASE2Q,
            "uu15" => UU15,
            _ => {
                return Err(QseError::invalid_argument(format!(
                    "Unknown gate name '{}'",
                    s
                )))
            }
        };
        Ok(kind)
    }
}

// ---------------------------------------------------------------------------
// single-qubit matrix builders
// ---------------------------------------------------------------------------

/// Hadamard.
pub fn h_matrix() -> Mat2 {
    let s = c(INV_SQRT_2, 0.0);
    [s, s, s, c(-INV_SQRT_2, 0.0)]
}

/// Pauli-X.
pub fn x_matrix() -> Mat2 {
    crate::matrix::PAULI_X
}

/// Pauli-Y.
pub fn y_matrix() -> Mat2 {
    crate::matrix::PAULI_Y
}

/// Pauli-Z.
pub fn z_matrix() -> Mat2 {
    crate::matrix::PAULI_Z
}

/// S = diag(1, i).
pub fn s_matrix() -> Mat2 {
    [ONE, ZERO, ZERO, c(0.0, 1.0)]
}

/// T = diag(1, e^{i pi/4}).
pub fn t_matrix() -> Mat2 {
    [ONE, ZERO, ZERO, c(INV_SQRT_2, INV_SQRT_2)]
}

/// sqrt(X) = (1/2) [[1+i, 1-i], [1-i, 1+i]].
pub fn sx_matrix() -> Mat2 {
    [
        c(0.5, 0.5),
        c(0.5, -0.5),
        c(0.5, -0.5),
        c(0.5, 0.5),
    ]
}

/// RX(theta) = exp(-i theta X / 2).
pub fn rx_matrix(theta: f64) -> Mat2 {
    let half = theta / 2.0;
    let cos = half.cos();
    let sin = half.sin();
    [c(cos, 0.0), c(0.0, -sin), c(0.0, -sin), c(cos, 0.0)]
}

/// RY(theta) = exp(-i theta Y / 2).
pub fn ry_matrix(theta: f64) -> Mat2 {
    let half = theta / 2.0;
    let cos = half.cos();
    let sin = half.sin();
    [c(cos, 0.0), c(-sin, 0.0), c(sin, 0.0), c(cos, 0.0)]
}

/// RZ(theta) = diag(e^{-i theta/2}, e^{i theta/2}).
pub fn rz_matrix(theta: f64) -> Mat2 {
    let half = theta / 2.0;
    [
        c(half.cos(), -half.sin()),
        ZERO,
        ZERO,
        c(half.cos(), half.sin()),
    ]
}

/// U1(lambda) = diag(1, e^{i lambda}).
pub fn u1_matrix(lambda: f64) -> Mat2 {
    [ONE, ZERO, ZERO, c(lambda.cos(), lambda.sin())]
}

/// U2(phi, lambda) = U3(pi/2, phi, lambda).
pub fn u2_matrix(phi: f64, lambda: f64) -> Mat2 {
    let eilambda = c(lambda.cos(), lambda.sin());
    let eiphi = c(phi.cos(), phi.sin());
    let eiboth = c((phi + lambda).cos(), (phi + lambda).sin());
    [
        c(INV_SQRT_2, 0.0),
        -eilambda * INV_SQRT_2,
        eiphi * INV_SQRT_2,
        eiboth * INV_SQRT_2,
    ]
}

/// U3(theta, phi, lambda), the general single-qubit rotation.
pub fn u3_matrix(theta: f64, phi: f64, lambda: f64) -> Mat2 {
    let ctheta = (theta / 2.0).cos();
    let stheta = (theta / 2.0).sin();
    let eilambda = c(lambda.cos(), lambda.sin());
    let eiphi = c(phi.cos(), phi.sin());
    let eiboth = c((phi + lambda).cos(), (phi + lambda).sin());
    [
        c(ctheta, 0.0),
        -eilambda * stheta,
        eiphi * stheta,
        eiboth * ctheta,
    ]
}

/// pi/2 rotation about the in-plane axis at angle phi.
pub fn rphi90_matrix(phi: f64) -> Mat2 {
    let minus_i = c(0.0, -1.0);
    [
        c(INV_SQRT_2, 0.0),
        minus_i * c(phi.cos(), -phi.sin()) * INV_SQRT_2,
        minus_i * c(phi.cos(), phi.sin()) * INV_SQRT_2,
        c(INV_SQRT_2, 0.0),
    ]
}

/// pi rotation about the in-plane axis at angle phi.
pub fn rphi180_matrix(phi: f64) -> Mat2 {
    let minus_i = c(0.0, -1.0);
    [
        ZERO,
        minus_i * c(phi.cos(), -phi.sin()),
        minus_i * c(phi.cos(), phi.sin()),
        ZERO,
    ]
}

/// Rotation by theta about the in-plane axis at angle phi.
pub fn rphi_matrix(theta: f64, phi: f64) -> Mat2 {
    let cos = (theta / 2.0).cos();
    let msin = c(0.0, -(theta / 2.0).sin());
    [
        c(cos, 0.0),
        msin * c(phi.cos(), -phi.sin()),
        msin * c(phi.cos(), phi.sin()),
        c(cos, 0.0),
    ]
}

// ---------------------------------------------------------------------------
// two-qubit matrix builders (sub-index r = bit(q1) + 2 * bit(q2))
// ---------------------------------------------------------------------------

/// Controlled-Z: diag(1, 1, 1, -1).
pub fn cz_matrix() -> Mat4 {
    let mut m = [ZERO; 16];
    m[0] = ONE;
    m[5] = ONE;
    m[10] = ONE;
    m[15] = c(-1.0, 0.0);
    m
}

/// SWAP.
pub fn swap_matrix() -> Mat4 {
    let mut m = [ZERO; 16];
    m[0] = ONE;
    m[6] = ONE;
    m[9] = ONE;
    m[15] = ONE;
    m
}

/// iSWAP: swaps |01> and |10> with an i phase.
pub fn iswap_matrix() -> Mat4 {
    let mut m = [ZERO; 16];
    m[0] = ONE;
    m[6] = c(0.0, 1.0);
    m[9] = c(0.0, 1.0);
    m[15] = ONE;
    m
}

/// XY(theta): rotation in the |01>/|10> subspace.
pub fn xy_matrix(theta: f64) -> Mat4 {
    let cos = c((theta / 2.0).cos(), 0.0);
    let msin = c(0.0, -(theta / 2.0).sin());
    let mut m = [ZERO; 16];
    m[0] = ONE;
    m[5] = cos;
    m[6] = msin;
    m[9] = msin;
    m[10] = cos;
    m[15] = ONE;
    m
}

/// XX(theta) = exp(-i theta XX / 2).
pub fn xx_matrix(theta: f64) -> Mat4 {
    let t = -theta / 2.0;
    let cos = c(t.cos(), 0.0);
    let isin = c(0.0, t.sin());
    let mut m = [ZERO; 16];
    m[0] = cos;
    m[3] = isin;
    m[5] = cos;
    m[6] = isin;
    m[9] = isin;
    m[10] = cos;
    m[12] = isin;
    m[15] = cos;
    m
}

/// YY(theta) = exp(-i theta YY / 2).
pub fn yy_matrix(theta: f64) -> Mat4 {
    let t = -theta / 2.0;
    let cos = c(t.cos(), 0.0);
    let isin = c(0.0, t.sin());
    let mut m = [ZERO; 16];
    m[0] = cos;
    m[3] = -isin;
    m[5] = cos;
    m[6] = isin;
    m[9] = isin;
    m[10] = cos;
    m[12] = -isin;
    m[15] = cos;
    m
}

/// ZZ(theta) = exp(-i theta ZZ / 2): diagonal phases.
pub fn zz_matrix(theta: f64) -> Mat4 {
    let half = theta / 2.0;
    let aligned = c(half.cos(), -half.sin());
    let opposed = c(half.cos(), half.sin());
    let mut m = [ZERO; 16];
    m[0] = aligned;
    m[5] = opposed;
    m[10] = opposed;
    m[15] = aligned;
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{
        complex_equal, is_unitary2, is_unitary4, mat2_dag, mat2_mul, mat4_mul, val4, ID2,
        PAULI_X, PAULI_Z,
    };
    use std::f64::consts::PI;

    fn assert_mat2_eq(a: &Mat2, b: &Mat2) {
        for (x, y) in a.iter().zip(b.iter()) {
            assert!(complex_equal(*x, *y), "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn test_all_builders_unitary() {
        for theta in [0.0, 0.3, PI / 2.0, PI, 4.1] {
            assert!(is_unitary2(&rx_matrix(theta)));
            assert!(is_unitary2(&ry_matrix(theta)));
            assert!(is_unitary2(&rz_matrix(theta)));
            assert!(is_unitary2(&u1_matrix(theta)));
            assert!(is_unitary2(&u2_matrix(theta, 0.7)));
            assert!(is_unitary2(&u3_matrix(theta, 0.7, 1.9)));
            assert!(is_unitary2(&rphi90_matrix(theta)));
            assert!(is_unitary2(&rphi180_matrix(theta)));
            assert!(is_unitary2(&rphi_matrix(theta, 0.7)));
            assert!(is_unitary4(&xy_matrix(theta)));
            assert!(is_unitary4(&xx_matrix(theta)));
            assert!(is_unitary4(&yy_matrix(theta)));
            assert!(is_unitary4(&zz_matrix(theta)));
        }
        assert!(is_unitary2(&h_matrix()));
        assert!(is_unitary2(&s_matrix()));
        assert!(is_unitary2(&t_matrix()));
        assert!(is_unitary2(&sx_matrix()));
        assert!(is_unitary4(&cz_matrix()));
        assert!(is_unitary4(&swap_matrix()));
        assert!(is_unitary4(&iswap_matrix()));
    }

    #[test]
    fn test_hzh_is_x() {
        let h = h_matrix();
        let hzh = mat2_mul(&mat2_mul(&h, &PAULI_Z), &h);
        assert_mat2_eq(&hzh, &PAULI_X);
    }

    #[test]
    fn test_s_squared_is_z() {
        let s2 = mat2_mul(&s_matrix(), &s_matrix());
        assert_mat2_eq(&s2, &PAULI_Z);
    }

    #[test]
    fn test_t_squared_is_s() {
        let t2 = mat2_mul(&t_matrix(), &t_matrix());
        assert_mat2_eq(&t2, &s_matrix());
    }

    #[test]
    fn test_sx_squared_is_x() {
        let sx2 = mat2_mul(&sx_matrix(), &sx_matrix());
        assert_mat2_eq(&sx2, &PAULI_X);
    }

    #[test]
    fn test_rotation_dagger_is_inverse() {
        let theta = 1.234;
        for build in [rx_matrix, ry_matrix, rz_matrix] {
            let m = build(theta);
            let product = mat2_mul(&m, &build(-theta));
            assert_mat2_eq(&product, &ID2);
            // dagger of the matrix equals the negated-angle matrix
            assert_mat2_eq(&mat2_dag(&m), &build(-theta));
        }
    }

    #[test]
    fn test_u3_dagger_matches_conjugated_parameters() {
        let (theta, phi, lambda) = (0.4, 1.1, -0.6);
        let dag = mat2_dag(&u3_matrix(theta, phi, lambda));
        // U3(theta, phi, lambda)† = U3(-theta, -lambda, -phi)
        let rebuilt = u3_matrix(-theta, -lambda, -phi);
        assert_mat2_eq(&dag, &rebuilt);
    }

    #[test]
    fn test_u2_matches_u3_half_pi() {
        let (phi, lambda) = (0.8, -1.3);
        assert_mat2_eq(&u2_matrix(phi, lambda), &u3_matrix(PI / 2.0, phi, lambda));
    }

    #[test]
    fn test_rphi_specializations() {
        let phi = 0.9;
        assert_mat2_eq(&rphi90_matrix(phi), &rphi_matrix(PI / 2.0, phi));
        assert_mat2_eq(&rphi180_matrix(phi), &rphi_matrix(PI, phi));
        // phi = 0 gives an X rotation
        assert_mat2_eq(&rphi_matrix(0.77, 0.0), &rx_matrix(0.77));
    }

    #[test]
    fn test_zz_xx_cancel_with_negated_angle() {
        let theta = 0.83;
        for build in [xx_matrix, yy_matrix, zz_matrix, xy_matrix] {
            let product = mat4_mul(&build(theta), &build(-theta));
            for i in 0..4 {
                for j in 0..4 {
                    let expected = if i == j { ONE } else { ZERO };
                    assert!(complex_equal(val4(&product, i, j), expected));
                }
            }
        }
    }

    #[test]
    fn test_gate_kind_parsing() {
        assert_eq!("H".parse::<GateKind>().unwrap(), GateKind::H);
        assert_eq!("CNOT".parse::<GateKind>().unwrap(), GateKind::CNOT);
        assert_eq!("cx".parse::<GateKind>().unwrap(), GateKind::CNOT);
        assert_eq!("Toffoli".parse::<GateKind>().unwrap(), GateKind::TOFFOLI);
        assert!("bell".parse::<GateKind>().is_err());
    }

    #[test]
    fn test_gate_kind_arity() {
        assert_eq!(GateKind::H.qubit_count(), 1);
        assert_eq!(GateKind::XX.qubit_count(), 2);
        assert_eq!(GateKind::CSWAP.qubit_count(), 3);
        assert_eq!(GateKind::U3.param_count(), 3);
        assert_eq!(GateKind::UU15.param_count(), 15);
        assert_eq!(GateKind::U22.param_count(), 8);
    }

    #[test]
    fn test_display_roundtrip() {
        for kind in [GateKind::H, GateKind::RPHI90, GateKind::UU15, GateKind::CZ] {
            let name = kind.to_string();
            assert_eq!(name.parse::<GateKind>().unwrap(), kind);
        }
    }
}
