//! # QSE Noise
//!
//! Noise configuration and shot sampling for QSE (Quantum Simulation
//! Engine).
//!
//! This crate provides:
//! - `Opcode` / `NoiseKind`: the deferred operation trace with gate
//!   and noise operations as disjoint tagged variants
//! - `NoiseConfig`: global, gate-dependent and gate-qubit-specific
//!   error maps plus the readout matrix, with string-keyed and JSON
//!   description forms
//! - `NoisySimulator`: the trace-recording facade whose
//!   `measure_shots` replays the trace against a fresh state vector
//!   once per shot and aggregates outcomes into a histogram
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use qse_noise::{NoiseConfig, NoisySimulator};
//!
//! let mut global = BTreeMap::new();
//! global.insert("depolarizing".to_string(), 0.01);
//! let config = NoiseConfig::parse(&global, vec![]).unwrap();
//!
//! let mut sim = NoisySimulator::new(2, config).unwrap();
//! sim.h(0, &[], false).unwrap();
//! sim.cnot(0, 1, &[], false).unwrap();
//!
//! let histogram = sim.measure_shots(1000).unwrap();
//! let observed: usize = histogram.values().sum();
//! assert_eq!(observed, 1000);
//! ```

pub mod config;
pub mod opcode;
pub mod sampler;

pub use config::{GateErrorEntry, NoiseConfig, NoiseConfigDescription};
pub use opcode::{NoiseKind, Opcode};
pub use sampler::NoisySimulator;
