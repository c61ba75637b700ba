use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("distribution needs at least one outcome")]
    EmptyDistribution,

    #[error("distribution has {outcomes} outcomes but {probabilities} probabilities")]
    LengthMismatch { outcomes: usize, probabilities: usize },

    #[error("invalid distribution: probability {probability} for outcome {outcome} is out of range")]
    InvalidMass { outcome: f64, probability: f64 },

    #[error("invalid distribution: outcome {outcome} is not finite")]
    NonFiniteOutcome { outcome: f64 },

    #[error("invalid distribution: probabilities sum to {sum}, expected 1 within {tolerance}")]
    InvalidDistribution { sum: f64, tolerance: f64 },

    #[error("invalid simulation config: {0}")]
    InvalidConfig(String),
}

impl SimulationError {
    /// True for every variant describing a distribution that must not be simulated.
    pub fn is_invalid_distribution(&self) -> bool {
        matches!(
            self,
            SimulationError::EmptyDistribution
                | SimulationError::LengthMismatch { .. }
                | SimulationError::InvalidMass { .. }
                | SimulationError::NonFiniteOutcome { .. }
                | SimulationError::InvalidDistribution { .. }
        )
    }
}
