use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    DEFAULT_CALIBRATION_RESOLUTION, Distribution, Inputs, ModelResult, QuantileTable,
    RiskSummary, SimulationError, run_model,
};

/// Largest run accepted from the CLI or an HTTP request.
const MAX_NUMBER_OF_THROWS: u32 = 100_000;
const MAX_NUMBER_OF_SIMULATIONS: u32 = 1_000_000;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    #[serde(alias = "initialLevel")]
    initial_units: Option<f64>,
    #[serde(alias = "numSteps")]
    number_of_throws: Option<u32>,
    #[serde(alias = "targetRoi", alias = "throwROI")]
    throw_roi: Option<f64>,
    prob_minus_one: Option<f64>,
    prob_zero: Option<f64>,
    #[serde(alias = "numTrials")]
    number_of_simulations: Option<u32>,
    seed: Option<u64>,
    calibration_resolution: Option<f64>,
}

#[derive(Parser, Debug)]
#[command(
    name = "ruin",
    about = "Monte Carlo risk-of-ruin estimator for a calibrated four-outcome throw"
)]
struct Cli {
    #[arg(long, default_value_t = 10.0, help = "Starting level, in units")]
    initial_units: f64,
    #[arg(long, default_value_t = 100, help = "Throws per simulated path")]
    number_of_throws: u32,
    #[arg(
        long,
        default_value_t = 0.05,
        allow_negative_numbers = true,
        help = "Target expected return of one throw, in units"
    )]
    throw_roi: f64,
    #[arg(long, default_value_t = 0.4, help = "Probability of losing one unit")]
    prob_minus_one: f64,
    #[arg(long, default_value_t = 0.2, help = "Probability of a push")]
    prob_zero: f64,
    #[arg(long, default_value_t = 1_000)]
    number_of_simulations: u32,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    #[arg(
        long,
        default_value_t = DEFAULT_CALIBRATION_RESOLUTION,
        help = "Grid step used when solving for the +1 probability"
    )]
    calibration_resolution: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    distribution: Distribution,
    calibrated_probability: f64,
    complement_probability: f64,
    expected_return: f64,
    calibration_squared_error: f64,
    number_of_throws: u32,
    trial_outcomes: Vec<f64>,
    paths: Vec<Vec<f64>>,
    quantiles: QuantileTable,
    risk: RiskSummary,
    ruin_percent: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Simulation(SimulationError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Simulation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Simulation(err) => err.to_string(),
        }
    }
}

impl From<SimulationError> for ApiError {
    fn from(value: SimulationError) -> Self {
        ApiError::Simulation(value)
    }
}

fn build_inputs(cli: Cli) -> Result<Inputs, String> {
    if !cli.initial_units.is_finite() {
        return Err("--initial-units must be a finite number".to_string());
    }

    if cli.number_of_throws == 0 {
        return Err("--number-of-throws must be > 0".to_string());
    }

    if cli.number_of_throws > MAX_NUMBER_OF_THROWS {
        return Err(format!("--number-of-throws must be <= {MAX_NUMBER_OF_THROWS}"));
    }

    if cli.number_of_simulations == 0 {
        return Err("--number-of-simulations must be > 0".to_string());
    }

    if cli.number_of_simulations > MAX_NUMBER_OF_SIMULATIONS {
        return Err(format!("--number-of-simulations must be <= {MAX_NUMBER_OF_SIMULATIONS}"));
    }

    if !cli.throw_roi.is_finite() {
        return Err("--throw-roi must be a finite number".to_string());
    }

    if !(0.0..=1.0).contains(&cli.prob_minus_one) {
        return Err("--prob-minus-one must be between 0 and 1".to_string());
    }

    if !(0.0..=1.0).contains(&cli.prob_zero) {
        return Err("--prob-zero must be between 0 and 1".to_string());
    }

    if !(cli.calibration_resolution > 0.0 && cli.calibration_resolution <= 1.0) {
        return Err("--calibration-resolution must be in (0, 1]".to_string());
    }

    Ok(Inputs {
        initial_level: cli.initial_units,
        num_steps: cli.number_of_throws,
        target_roi: cli.throw_roi,
        prob_minus_one: cli.prob_minus_one,
        prob_zero: cli.prob_zero,
        num_trials: cli.number_of_simulations,
        seed: cli.seed,
        calibration_resolution: cli.calibration_resolution,
    })
}

/// Parses process arguments, runs one simulation and returns the JSON report.
pub fn run_cli() -> Result<String, String> {
    let inputs = build_inputs(Cli::parse())?;
    let response = simulate_inputs(&inputs).map_err(|e| e.message())?;
    serde_json::to_string_pretty(&response).map_err(|e| format!("Failed to encode report: {e}"))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("risk-of-ruin HTTP API listening on http://{addr}");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    // The simulation is CPU-bound; keep it off the async workers.
    let result = tokio::task::spawn_blocking(move || simulate_payload(payload)).await;

    match result {
        Ok(Ok(response)) => json_response(StatusCode::OK, response),
        Ok(Err(err)) => {
            warn!("simulate request rejected: {}", err.message());
            error_response(err.status(), &err.message())
        }
        Err(join_err) => {
            error!("simulation task failed: {join_err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Simulation failed")
        }
    }
}

fn simulate_payload(payload: SimulatePayload) -> Result<SimulateResponse, ApiError> {
    let inputs = inputs_from_payload(payload).map_err(ApiError::BadRequest)?;
    simulate_inputs(&inputs)
}

fn simulate_inputs(inputs: &Inputs) -> Result<SimulateResponse, ApiError> {
    let model = run_model(inputs)?;
    Ok(build_simulate_response(inputs, model))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn inputs_from_json(json: &str) -> Result<Inputs, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    inputs_from_payload(payload)
}

fn inputs_from_payload(payload: SimulatePayload) -> Result<Inputs, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.initial_units {
        cli.initial_units = v;
    }
    if let Some(v) = payload.number_of_throws {
        cli.number_of_throws = v;
    }
    if let Some(v) = payload.throw_roi {
        cli.throw_roi = v;
    }
    if let Some(v) = payload.prob_minus_one {
        cli.prob_minus_one = v;
    }
    if let Some(v) = payload.prob_zero {
        cli.prob_zero = v;
    }
    if let Some(v) = payload.number_of_simulations {
        cli.number_of_simulations = v;
    }
    if let Some(v) = payload.seed {
        cli.seed = v;
    }
    if let Some(v) = payload.calibration_resolution {
        cli.calibration_resolution = v;
    }

    build_inputs(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        initial_units: 10.0,
        number_of_throws: 100,
        throw_roi: 0.05,
        prob_minus_one: 0.4,
        prob_zero: 0.2,
        number_of_simulations: 1_000,
        seed: 42,
        calibration_resolution: DEFAULT_CALIBRATION_RESOLUTION,
    }
}

fn build_simulate_response(inputs: &Inputs, model: ModelResult) -> SimulateResponse {
    let ruin_percent = format!("{:.2}%", model.risk.ruin_probability * 100.0);
    SimulateResponse {
        calibrated_probability: model.calibration.unknown_mass(),
        complement_probability: model.calibration.complement(),
        expected_return: model.distribution.mean(),
        calibration_squared_error: model.calibration.squared_error,
        distribution: model.distribution,
        number_of_throws: inputs.num_steps,
        trial_outcomes: model.output.trial_outcomes,
        paths: model.output.path_sample,
        quantiles: model.quantiles,
        risk: model.risk,
        ruin_percent,
    }
}
