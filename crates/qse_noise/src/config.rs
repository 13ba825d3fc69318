//! Noise configuration.
//!
//! Three maps describe where errors attach (all probabilities are
//! validated into [0, 1] at construction):
//!
//! - *global*: applied after every gate, on that gate's qubits;
//! - *gate-dependent*: applied after every occurrence of a gate kind;
//! - *gate-qubit-specific*: 1q entries keyed `(gate, qubit)` and 2q
//!   entries keyed `(gate, (q1, q2))`. A 2q entry whose gate is a
//!   single-qubit kind models crosstalk: the error fires on
//!   `(q1, spectator)` whenever the gate touches `q1`.
//!
//! All maps are `BTreeMap`s so trace construction is deterministic.
//! The readout matrix lists per-qubit flip probabilities
//! `(p_flip_when_0, p_flip_when_1)`; empty means ideal readout.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use qse_core::error::{QseError, Result};
use qse_core::gates::GateKind;

use crate::opcode::NoiseKind;

/// Typed noise configuration consumed by the sampler.
#[derive(Debug, Clone, Default)]
pub struct NoiseConfig {
    /// Applied after every gate.
    pub global: BTreeMap<NoiseKind, f64>,
    /// Applied after every occurrence of a gate kind.
    pub gate_dependent: BTreeMap<GateKind, BTreeMap<NoiseKind, f64>>,
    /// Local errors keyed by (gate kind, qubit).
    pub gate_error_1q: BTreeMap<(GateKind, usize), BTreeMap<NoiseKind, f64>>,
    /// Pair errors / crosstalk keyed by (gate kind, (q1, q2)).
    pub gate_error_2q: BTreeMap<(GateKind, (usize, usize)), BTreeMap<NoiseKind, f64>>,
    /// Per-qubit readout flip probabilities; empty = ideal.
    pub readout: Vec<[f64; 2]>,
}

fn check_probability(p: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(QseError::invalid_argument(format!(
            "Noise probability must be between 0 and 1 (got {})",
            p
        )));
    }
    Ok(())
}

fn parse_noise_map(description: &BTreeMap<String, f64>) -> Result<BTreeMap<NoiseKind, f64>> {
    let mut map = BTreeMap::new();
    for (name, &p) in description {
        check_probability(p)?;
        map.insert(name.parse::<NoiseKind>()?, p);
    }
    Ok(map)
}

impl NoiseConfig {
    /// An empty (noiseless, ideal-readout) configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from a string-keyed global noise map and
    /// a readout matrix.
    pub fn parse(global: &BTreeMap<String, f64>, readout: Vec<[f64; 2]>) -> Result<Self> {
        let config = Self {
            global: parse_noise_map(global)?,
            readout,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Adds gate-dependent noise from string-keyed descriptions.
    pub fn with_gate_dependent(
        mut self,
        description: &BTreeMap<String, BTreeMap<String, f64>>,
    ) -> Result<Self> {
        for (gate, noise) in description {
            self.gate_dependent
                .insert(gate.parse::<GateKind>()?, parse_noise_map(noise)?);
        }
        Ok(self)
    }

    /// Adds a local error entry for (gate, qubit).
    pub fn with_gate_error_1q(
        mut self,
        gate: &str,
        qn: usize,
        description: &BTreeMap<String, f64>,
    ) -> Result<Self> {
        self.gate_error_1q
            .insert((gate.parse::<GateKind>()?, qn), parse_noise_map(description)?);
        Ok(self)
    }

    /// Adds a pair error / crosstalk entry for (gate, (q1, q2)).
    pub fn with_gate_error_2q(
        mut self,
        gate: &str,
        qubits: (usize, usize),
        description: &BTreeMap<String, f64>,
    ) -> Result<Self> {
        self.gate_error_2q.insert(
            (gate.parse::<GateKind>()?, qubits),
            parse_noise_map(description)?,
        );
        Ok(self)
    }

    /// Checks every probability in the configuration.
    pub fn validate(&self) -> Result<()> {
        for &p in self.global.values() {
            check_probability(p)?;
        }
        for noise in self.gate_dependent.values() {
            for &p in noise.values() {
                check_probability(p)?;
            }
        }
        for noise in self.gate_error_1q.values() {
            for &p in noise.values() {
                check_probability(p)?;
            }
        }
        for noise in self.gate_error_2q.values() {
            for &p in noise.values() {
                check_probability(p)?;
            }
        }
        for entry in &self.readout {
            check_probability(entry[0])?;
            check_probability(entry[1])?;
        }
        Ok(())
    }

    /// Builds the typed configuration from its serializable form.
    pub fn from_description(description: &NoiseConfigDescription) -> Result<Self> {
        let mut config = Self::parse(&description.global, description.readout.clone())?
            .with_gate_dependent(&description.gate_dependent)?;
        for entry in &description.gate_errors {
            match entry.qubits.as_slice() {
                [qn] => {
                    config = config.with_gate_error_1q(&entry.gate, *qn, &entry.noise)?;
                }
                [q1, q2] => {
                    config = config.with_gate_error_2q(&entry.gate, (*q1, *q2), &entry.noise)?;
                }
                other => {
                    return Err(QseError::invalid_argument(format!(
                        "Gate error entry must name 1 or 2 qubits, got {}",
                        other.len()
                    )))
                }
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Parses a configuration from its JSON description.
    pub fn from_json(json: &str) -> Result<Self> {
        let description: NoiseConfigDescription = serde_json::from_str(json)
            .map_err(|e| QseError::invalid_argument(format!("Malformed noise config: {}", e)))?;
        Self::from_description(&description)
    }
}

/// String-keyed, JSON-friendly form of [`NoiseConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoiseConfigDescription {
    /// Noise kind name -> probability.
    #[serde(default)]
    pub global: BTreeMap<String, f64>,
    /// Gate name -> (noise kind name -> probability).
    #[serde(default)]
    pub gate_dependent: BTreeMap<String, BTreeMap<String, f64>>,
    /// Qubit-specific entries.
    #[serde(default)]
    pub gate_errors: Vec<GateErrorEntry>,
    /// Per-qubit readout flip probabilities.
    #[serde(default)]
    pub readout: Vec<[f64; 2]>,
}

/// One gate-qubit-specific error entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateErrorEntry {
    /// Gate name.
    pub gate: String,
    /// One qubit for a local error, two for a pair/crosstalk error.
    pub qubits: Vec<usize>,
    /// Noise kind name -> probability.
    pub noise: BTreeMap<String, f64>,
}
