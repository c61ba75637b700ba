use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::{
    CalibrationConfig, Inputs, ModelResult, QUANTILE_LEVELS, RiskSummary, Sampler,
    SimulationConfig, SimulationError, SimulationOutput, calibrated_distribution,
    quantile_table, risk_summary,
};

#[derive(Debug, Clone, PartialEq)]
struct TrialResult {
    final_level: f64,
    path: Option<Vec<f64>>,
}

/// Calibrates the distribution, rejects it if invalid, simulates, and
/// summarises the final levels.
pub fn run_model(inputs: &Inputs) -> Result<ModelResult, SimulationError> {
    let calibration_config =
        CalibrationConfig::new(inputs.prob_minus_one, inputs.prob_zero, inputs.target_roi)
            .with_resolution(inputs.calibration_resolution);
    let (calibration, distribution) = calibrated_distribution(&calibration_config)?;

    let config = SimulationConfig::new(
        inputs.initial_level,
        inputs.num_trials,
        inputs.num_steps,
        distribution.clone(),
        inputs.seed,
    );
    let output = simulate(&config)?;
    let quantiles = quantile_table(&output.trial_outcomes, &QUANTILE_LEVELS);
    let risk = risk_summary(&output.trial_outcomes, config.ruin_threshold);
    log_summary(&risk);

    Ok(ModelResult {
        calibration,
        distribution,
        output,
        quantiles,
        risk,
    })
}

/// Runs every trial in parallel. Trial `i` draws from its own generator seeded
/// with `derive_seed(config.seed, i)`, so the output does not depend on the
/// thread count.
pub fn simulate(config: &SimulationConfig) -> Result<SimulationOutput, SimulationError> {
    config.validate()?;
    debug!(
        "simulating {} trials x {} steps from level {}",
        config.num_trials, config.num_steps, config.initial_level
    );

    let trials: Vec<TrialResult> = (0..config.num_trials)
        .into_par_iter()
        .map(|trial| {
            let mut rng = StdRng::seed_from_u64(derive_seed(config.seed, trial));
            run_trial(config, &mut rng, (trial as usize) < config.path_sample_size)
        })
        .collect();

    Ok(collect_output(trials))
}

/// Runs every trial sequentially from one caller-supplied generator.
pub fn simulate_with_rng<R: Rng + ?Sized>(
    config: &SimulationConfig,
    rng: &mut R,
) -> Result<SimulationOutput, SimulationError> {
    config.validate()?;

    let trials: Vec<TrialResult> = (0..config.num_trials as usize)
        .map(|trial| run_trial(config, rng, trial < config.path_sample_size))
        .collect();

    Ok(collect_output(trials))
}

/// One random walk. Stops on the first step that leaves the level below the
/// ruin threshold; that step is still recorded.
fn run_trial<R: Rng + ?Sized>(
    config: &SimulationConfig,
    rng: &mut R,
    keep_path: bool,
) -> TrialResult {
    let sampler = Sampler::new(&config.distribution);
    let mut level = config.initial_level;
    let mut path = keep_path.then(|| {
        let mut path = Vec::with_capacity(config.num_steps as usize + 1);
        path.push(level);
        path
    });

    for _ in 0..config.num_steps {
        level += sampler.sample(rng);
        if let Some(path) = path.as_mut() {
            path.push(level);
        }
        if level < config.ruin_threshold {
            break;
        }
    }

    TrialResult {
        final_level: level,
        path,
    }
}

fn collect_output(trials: Vec<TrialResult>) -> SimulationOutput {
    let mut trial_outcomes = Vec::with_capacity(trials.len());
    let mut path_sample = Vec::new();
    for trial in trials {
        trial_outcomes.push(trial.final_level);
        if let Some(path) = trial.path {
            path_sample.push(path);
        }
    }
    SimulationOutput {
        trial_outcomes,
        path_sample,
    }
}

fn log_summary(summary: &RiskSummary) {
    info!(
        "{} trials finished: ruin probability {:.4} ({} ruined), mean final level {:.3}",
        summary.trials, summary.ruin_probability, summary.ruin_count, summary.mean_final_level
    );
}

pub fn derive_seed(base_seed: u64, trial: u32) -> u64 {
    splitmix64(base_seed ^ (((trial as u64) << 32) | trial as u64))
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
