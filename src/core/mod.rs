mod calibrator;
mod engine;
mod error;
mod sampler;
mod stats;
mod types;

pub use calibrator::{Calibration, CalibrationConfig, calibrate, calibrated_distribution};
pub use engine::{derive_seed, run_model, simulate, simulate_with_rng};
pub use error::SimulationError;
pub use sampler::Sampler;
pub use stats::{quantile, quantile_table, risk_summary, ruin_probability};
pub use types::{
    DEFAULT_CALIBRATION_RESOLUTION, Distribution, Inputs, ModelResult, OUTCOMES, PATH_SAMPLE_SIZE,
    PROBABILITY_TOLERANCE, QUANTILE_LEVELS, QuantileRow, QuantileTable, RUIN_THRESHOLD,
    RiskSummary, SimulationConfig, SimulationOutput,
};
