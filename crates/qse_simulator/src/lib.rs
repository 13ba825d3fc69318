//! # QSE Simulator
//!
//! Simulation backends for QSE (Quantum Simulation Engine).
//!
//! ## Modules
//! - **StateVectorSimulator**: exact full state-vector evolution with
//!   probability and marginal queries, plus the stochastic channel set
//!   used for trajectory sampling.
//! - **DensityOperatorSimulator**: density-matrix evolution under
//!   unitaries (with partial-action controlled gates) and CPTP maps
//!   given as Kraus operator sets.
//!
//! Both engines expose the same gate vocabulary with uniform
//! signatures `(qubits.., params.., controls, dagger)`; gate matrices
//! come from `qse_core::gates` and the dagger transform is applied to
//! the matrix before dispatch.

pub mod density;
pub mod statevector;

pub use density::DensityOperatorSimulator;
pub use statevector::StateVectorSimulator;
