//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```rust
//! use qse_core::prelude::*;
//! ```

pub use crate::bits::{
    extract_digit, extract_digits, make_controller_mask, pow2, preprocess_measure_list,
    project_index,
};
pub use crate::error::{QseError, Result};
pub use crate::gates::GateKind;
pub use crate::matrix::{C64, EPSILON, ID2, Mat2, Mat4, ONE, PAULI_X, PAULI_Y, PAULI_Z, ZERO};
pub use crate::rng;
