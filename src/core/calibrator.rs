use log::{info, warn};

use super::types::mean_of;
use super::{DEFAULT_CALIBRATION_RESOLUTION, Distribution, OUTCOMES, SimulationError};

/// Error assigned to candidates whose complement mass is negative.
const INVALID_CANDIDATE_ERROR: f64 = f64::INFINITY;

/// Inputs for solving the `+1` mass of a four-outcome distribution.
///
/// The `-1` and `0` masses are fixed, the `+1` mass is searched on a grid and
/// the `+2` mass is whatever is left over.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationConfig {
    pub outcomes: [f64; 4],
    pub prob_minus_one: f64,
    pub prob_zero: f64,
    pub target_mean: f64,
    pub resolution: f64,
}

impl CalibrationConfig {
    pub fn new(prob_minus_one: f64, prob_zero: f64, target_mean: f64) -> Self {
        Self {
            outcomes: OUTCOMES,
            prob_minus_one,
            prob_zero,
            target_mean,
            resolution: DEFAULT_CALIBRATION_RESOLUTION,
        }
    }

    /// Sets the grid spacing. A resolution outside `(0, 1]` (including NaN)
    /// collapses the grid to the single candidate `p = 0`; the CLI and HTTP
    /// boundary reject such values before they get here.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    fn complement(&self, p: f64) -> f64 {
        1.0 - (self.prob_minus_one + self.prob_zero + p)
    }

    fn masses(&self, p: f64) -> [f64; 4] {
        [self.prob_minus_one, self.prob_zero, p, self.complement(p)]
    }

    fn squared_error(&self, p: f64) -> f64 {
        if self.complement(p) < 0.0 {
            return INVALID_CANDIDATE_ERROR;
        }
        let mean = mean_of(&self.outcomes, &self.masses(p));
        (mean - self.target_mean).powi(2)
    }

    fn grid_steps(&self) -> u64 {
        if !(self.resolution > 0.0 && self.resolution <= 1.0) {
            return 0;
        }
        // Guard against 1/resolution landing just below an integer.
        (1.0 / self.resolution + 1e-9).floor() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub masses: [f64; 4],
    pub outcomes: [f64; 4],
    pub mean: f64,
    pub squared_error: f64,
}

impl Calibration {
    /// The solved `+1` mass.
    pub fn unknown_mass(&self) -> f64 {
        self.masses[2]
    }

    pub fn complement(&self) -> f64 {
        self.masses[3]
    }

    /// False when no grid point left a non-negative complement. The squared
    /// error alone cannot tell, since it overflows to `inf` for huge targets.
    pub fn is_feasible(&self) -> bool {
        self.complement() >= 0.0
    }

    pub fn to_distribution(&self) -> Result<Distribution, SimulationError> {
        Distribution::new(self.outcomes.to_vec(), self.masses.to_vec())
    }
}

/// Exhaustive grid search for the `+1` mass.
///
/// Candidates are `k * resolution` for `k = 0..=floor(1 / resolution)`. A later
/// candidate only replaces the incumbent on a strictly smaller error, so ties
/// resolve to the smallest `p`. When every candidate is infeasible the result
/// is `p = 0`; callers validate it through [`Calibration::to_distribution`].
pub fn calibrate(config: &CalibrationConfig) -> Calibration {
    let mut best_p = 0.0;
    let mut best_error = f64::INFINITY;

    for k in 0..=config.grid_steps() {
        let p = k as f64 * config.resolution;
        let error = config.squared_error(p);
        if error < best_error {
            best_error = error;
            best_p = p;
        }
    }

    let masses = config.masses(best_p);
    let calibration = Calibration {
        masses,
        outcomes: config.outcomes,
        mean: mean_of(&config.outcomes, &masses),
        squared_error: best_error,
    };

    if calibration.is_feasible() {
        info!(
            "calibrated p(+1)={:.4} p(+2)={:.4} mean={:.6} target={:.6}",
            calibration.unknown_mass(),
            calibration.complement(),
            calibration.mean,
            config.target_mean
        );
    } else {
        warn!(
            "no feasible calibration for p(-1)={} p(0)={}; complement would be {:.4}",
            config.prob_minus_one,
            config.prob_zero,
            calibration.complement()
        );
    }

    calibration
}

/// Calibrates and validates in one step; the distribution is only returned when
/// it is safe to simulate.
pub fn calibrated_distribution(
    config: &CalibrationConfig,
) -> Result<(Calibration, Distribution), SimulationError> {
    let calibration = calibrate(config);
    let distribution = calibration.to_distribution()?;
    Ok((calibration, distribution))
}
