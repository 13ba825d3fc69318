//! # QSE Core
//!
//! Core types and utilities for QSE (Quantum Simulation Engine).
//!
//! This crate provides:
//! - `bits`: pure bit-index algebra over computational basis indices
//! - `matrix`: complex 2x2 / 4x4 matrix algebra, unitarity and Kraus
//!   completeness checks
//! - `gates`: the gate vocabulary (`GateKind`) and per-gate matrix
//!   builders
//! - `rng`: the shared deterministic random engine
//! - `QseError`: unified error type with a `Result` alias
//!
//! ## Example
//!
//! ```rust
//! use qse_core::prelude::*;
//! use qse_core::gates;
//! use qse_core::matrix::{is_unitary2, mat2_mul};
//!
//! let h = gates::h_matrix();
//! assert!(is_unitary2(&h));
//!
//! // H Z H = X
//! let hzh = mat2_mul(&mat2_mul(&h, &PAULI_Z), &h);
//! assert!(qse_core::matrix::complex_equal(hzh[1], ONE));
//! ```

pub mod bits;
pub mod error;
pub mod gates;
pub mod matrix;
pub mod prelude;
pub mod rng;

pub use error::{QseError, Result};
pub use gates::GateKind;
pub use matrix::{C64, Mat2, Mat4};
