use serde::Serialize;

use super::{Calibration, SimulationError};

/// Payoff of a single throw, in ascending order.
pub const OUTCOMES: [f64; 4] = [-1.0, 0.0, 1.0, 2.0];
pub const RUIN_THRESHOLD: f64 = 1.0;
pub const PATH_SAMPLE_SIZE: usize = 10;
pub const QUANTILE_LEVELS: [f64; 5] = [0.05, 0.25, 0.5, 0.75, 0.95];
pub const PROBABILITY_TOLERANCE: f64 = 1e-3;
pub const DEFAULT_CALIBRATION_RESOLUTION: f64 = 1e-4;

/// Discrete payoff distribution. Probabilities are non-negative and sum to one
/// within [`PROBABILITY_TOLERANCE`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    outcomes: Vec<f64>,
    probabilities: Vec<f64>,
}

impl Distribution {
    pub fn new(outcomes: Vec<f64>, probabilities: Vec<f64>) -> Result<Self, SimulationError> {
        if outcomes.len() != probabilities.len() {
            return Err(SimulationError::LengthMismatch {
                outcomes: outcomes.len(),
                probabilities: probabilities.len(),
            });
        }
        if outcomes.is_empty() {
            return Err(SimulationError::EmptyDistribution);
        }

        for (&outcome, &probability) in outcomes.iter().zip(&probabilities) {
            if !outcome.is_finite() {
                return Err(SimulationError::NonFiniteOutcome { outcome });
            }
            if !probability.is_finite() || probability < 0.0 {
                return Err(SimulationError::InvalidMass {
                    outcome,
                    probability,
                });
            }
        }

        let sum: f64 = probabilities.iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(SimulationError::InvalidDistribution {
                sum,
                tolerance: PROBABILITY_TOLERANCE,
            });
        }

        Ok(Self {
            outcomes,
            probabilities,
        })
    }

    pub fn outcomes(&self) -> &[f64] {
        &self.outcomes
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.outcomes
            .iter()
            .copied()
            .zip(self.probabilities.iter().copied())
    }

    /// Expected return of one throw.
    pub fn mean(&self) -> f64 {
        mean_of(&self.outcomes, &self.probabilities)
    }
}

pub(crate) fn mean_of(outcomes: &[f64], probabilities: &[f64]) -> f64 {
    outcomes
        .iter()
        .zip(probabilities)
        .map(|(x, p)| x * p)
        .sum()
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub initial_level: f64,
    pub num_trials: u32,
    pub num_steps: u32,
    pub distribution: Distribution,
    pub seed: u64,
    pub ruin_threshold: f64,
    pub path_sample_size: usize,
}

impl SimulationConfig {
    pub fn new(
        initial_level: f64,
        num_trials: u32,
        num_steps: u32,
        distribution: Distribution,
        seed: u64,
    ) -> Self {
        Self {
            initial_level,
            num_trials,
            num_steps,
            distribution,
            seed,
            ruin_threshold: RUIN_THRESHOLD,
            path_sample_size: PATH_SAMPLE_SIZE,
        }
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if !self.initial_level.is_finite() {
            return Err(SimulationError::InvalidConfig(
                "initial level must be finite".to_string(),
            ));
        }
        if self.num_trials == 0 {
            return Err(SimulationError::InvalidConfig(
                "number of trials must be > 0".to_string(),
            ));
        }
        if self.num_steps == 0 {
            return Err(SimulationError::InvalidConfig(
                "number of steps must be > 0".to_string(),
            ));
        }
        if !self.ruin_threshold.is_finite() {
            return Err(SimulationError::InvalidConfig(
                "ruin threshold must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Validated run parameters as they arrive from the CLI or HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inputs {
    pub initial_level: f64,
    pub num_steps: u32,
    pub target_roi: f64,
    pub prob_minus_one: f64,
    pub prob_zero: f64,
    pub num_trials: u32,
    pub seed: u64,
    pub calibration_resolution: f64,
}

/// Final levels of every trial plus the first few full paths.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutput {
    pub trial_outcomes: Vec<f64>,
    pub path_sample: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantileRow {
    pub level: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QuantileTable {
    pub rows: Vec<QuantileRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSummary {
    pub ruin_probability: f64,
    pub ruin_count: usize,
    pub trials: usize,
    pub mean_final_level: f64,
    pub min_final_level: f64,
    pub max_final_level: f64,
}

/// Everything one run hands to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResult {
    pub calibration: Calibration,
    pub distribution: Distribution,
    pub output: SimulationOutput,
    pub quantiles: QuantileTable,
    pub risk: RiskSummary,
}
