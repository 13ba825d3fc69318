//! Deferred operation trace.
//!
//! The noisy engine does not mutate a state when a gate method is
//! called; it appends an [`Opcode`] to its trace. Gate and noise
//! operations are disjoint tagged variants, so the per-shot executor
//! can never confuse the two spaces.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use qse_core::error::QseError;
use qse_core::gates::GateKind;
use qse_core::matrix::{C64, Mat2, Mat4, ZERO};

/// Stochastic error channels insertable into a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NoiseKind {
    /// Uniform X/Y/Z error with total probability p
    Depolarizing,
    /// Amplitude damping with decay rate p
    Damping,
    /// X with probability p
    BitFlip,
    /// Z with probability p
    PhaseFlip,
    /// One of the 15 nontrivial Pauli pairs, uniformly, with total
    /// probability p
    TwoQubitDepolarizing,
}

impl NoiseKind {
    /// Canonical configuration-map key.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoiseKind::Depolarizing => "depolarizing",
            NoiseKind::Damping => "damping",
            NoiseKind::BitFlip => "bitflip",
            NoiseKind::PhaseFlip => "phaseflip",
            NoiseKind::TwoQubitDepolarizing => "twoqubit_depolarizing",
        }
    }
}

impl fmt::Display for NoiseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoiseKind {
    type Err = QseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "depolarizing" => Ok(NoiseKind::Depolarizing),
            "damping" => Ok(NoiseKind::Damping),
            "bitflip" => Ok(NoiseKind::BitFlip),
            "phaseflip" => Ok(NoiseKind::PhaseFlip),
            "twoqubit_depolarizing" => Ok(NoiseKind::TwoQubitDepolarizing),
            _ => Err(QseError::invalid_argument(format!(
                "Unknown noise name '{}'",
                s
            ))),
        }
    }
}

/// One deferred operation.
///
/// Appended by the noisy facade, consumed in order by the per-shot
/// executor, never mutated. U22/U44 matrices are flattened into
/// `params` as interleaved re/im pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Opcode {
    /// A unitary gate from the shared vocabulary.
    Gate {
        kind: GateKind,
        qubits: Vec<usize>,
        params: Vec<f64>,
        dagger: bool,
        controls: Vec<usize>,
    },
    /// A stochastic error channel.
    Noise {
        kind: NoiseKind,
        qubits: Vec<usize>,
        p: f64,
    },
}

/// Flattens a 2x2 matrix into opcode parameters.
pub fn pack_mat2(u: &Mat2) -> Vec<f64> {
    u.iter().flat_map(|a| [a.re, a.im]).collect()
}

/// Flattens a 4x4 matrix into opcode parameters.
pub fn pack_mat4(u: &Mat4) -> Vec<f64> {
    u.iter().flat_map(|a| [a.re, a.im]).collect()
}

/// Rebuilds a 2x2 matrix from opcode parameters.
pub fn unpack_mat2(params: &[f64]) -> Result<Mat2, QseError> {
    if params.len() != 8 {
        return Err(QseError::runtime(format!(
            "Malformed u22 opcode: expected 8 parameters, got {}",
            params.len()
        )));
    }
    let mut u = [ZERO; 4];
    for (k, entry) in u.iter_mut().enumerate() {
        *entry = C64::new(params[2 * k], params[2 * k + 1]);
    }
    Ok(u)
}

/// Rebuilds a 4x4 matrix from opcode parameters.
pub fn unpack_mat4(params: &[f64]) -> Result<Mat4, QseError> {
    if params.len() != 32 {
        return Err(QseError::runtime(format!(
            "Malformed u44 opcode: expected 32 parameters, got {}",
            params.len()
        )));
    }
    let mut u = [ZERO; 16];
    for (k, entry) in u.iter_mut().enumerate() {
        *entry = C64::new(params[2 * k], params[2 * k + 1]);
    }
    Ok(u)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qse_core::gates;
    use qse_core::matrix::complex_equal;

    #[test]
    fn test_noise_kind_parsing() {
        assert_eq!(
            "depolarizing".parse::<NoiseKind>().unwrap(),
            NoiseKind::Depolarizing
        );
        assert_eq!("BitFlip".parse::<NoiseKind>().unwrap(), NoiseKind::BitFlip);
        assert_eq!(
            "twoqubit_depolarizing".parse::<NoiseKind>().unwrap(),
            NoiseKind::TwoQubitDepolarizing
        );
        assert!("thermal".parse::<NoiseKind>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for kind in [
            NoiseKind::Depolarizing,
            NoiseKind::Damping,
            NoiseKind::BitFlip,
            NoiseKind::PhaseFlip,
            NoiseKind::TwoQubitDepolarizing,
        ] {
            assert_eq!(kind.to_string().parse::<NoiseKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_matrix_packing_roundtrip() {
        let u = gates::u3_matrix(0.4, -1.2, 2.2);
        let packed = pack_mat2(&u);
        let unpacked = unpack_mat2(&packed).unwrap();
        for (a, b) in u.iter().zip(unpacked.iter()) {
            assert!(complex_equal(*a, *b));
        }
        assert!(unpack_mat2(&packed[..6]).is_err());

        let v = gates::xx_matrix(0.9);
        let packed = pack_mat4(&v);
        let unpacked = unpack_mat4(&packed).unwrap();
        for (a, b) in v.iter().zip(unpacked.iter()) {
            assert!(complex_equal(*a, *b));
        }
        assert!(unpack_mat4(&packed[..10]).is_err());
    }

    #[test]
    fn test_opcode_serde_roundtrip() {
        let op = Opcode::Gate {
            kind: GateKind::RX,
            qubits: vec![1],
            params: vec![0.5],
            dagger: true,
            controls: vec![0],
        };
        let json = serde_json::to_string(&op).unwrap();
        let back: Opcode = serde_json::from_str(&json).unwrap();
        assert_eq!(op, back);
    }
}
