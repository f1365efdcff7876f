use std::collections::HashMap;
use std::net::SocketAddr;

use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::core::{Inputs, project};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Retirement savings projection calculator (compound growth + withdrawal-rate income estimate)"
)]
struct Cli {
    #[arg(long)]
    current_age: u32,
    #[arg(long)]
    retirement_age: u32,
    #[arg(long, help = "Savings balance today")]
    current_savings: f64,
    #[arg(long)]
    monthly_contribution: f64,
    #[arg(long, help = "Expected annual nominal return in percent, e.g. 7")]
    expected_return_percent: f64,
    #[arg(long, help = "Expected annual inflation in percent, e.g. 3")]
    inflation_percent: f64,
    #[arg(long, help = "Percent of the balance withdrawn per year, e.g. 4")]
    withdrawal_rate_percent: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Desired monthly income in today's dollars; 0 means no target"
    )]
    target_monthly_income: f64,
}

impl From<Cli> for Inputs {
    fn from(cli: Cli) -> Self {
        Inputs {
            current_age: cli.current_age,
            retirement_age: cli.retirement_age,
            current_savings: cli.current_savings,
            monthly_contribution: cli.monthly_contribution,
            expected_return_percent: cli.expected_return_percent,
            inflation_percent: cli.inflation_percent,
            withdrawal_rate_percent: cli.withdrawal_rate_percent,
            target_monthly_income: cli.target_monthly_income,
        }
    }
}

/// Flat request mapping. Fields stay as raw JSON values so callers can send
/// numbers or numeric strings; coercion happens in `build_inputs`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProjectPayload {
    current_age: Option<Value>,
    retirement_age: Option<Value>,
    current_savings: Option<Value>,
    monthly_contribution: Option<Value>,
    expected_return_percent: Option<Value>,
    inflation_percent: Option<Value>,
    withdrawal_rate_percent: Option<Value>,
    target_monthly_income: Option<Value>,
}

impl ProjectPayload {
    fn from_query(params: HashMap<String, String>) -> Self {
        let mut payload = Self::default();
        for (key, value) in params {
            let slot = match key.as_str() {
                "current_age" => &mut payload.current_age,
                "retirement_age" => &mut payload.retirement_age,
                "current_savings" => &mut payload.current_savings,
                "monthly_contribution" => &mut payload.monthly_contribution,
                "expected_return_percent" => &mut payload.expected_return_percent,
                "inflation_percent" => &mut payload.inflation_percent,
                "withdrawal_rate_percent" => &mut payload.withdrawal_rate_percent,
                "target_monthly_income" => &mut payload.target_monthly_income,
                _ => continue,
            };
            *slot = Some(Value::String(value));
        }
        payload
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("field {field} is not a valid number (got {value})")]
    InvalidNumber { field: &'static str, value: String },
}

impl InputError {
    fn invalid(field: &'static str, value: &Value) -> Self {
        InputError::InvalidNumber {
            field,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn require<'a>(field: &'static str, value: &'a Option<Value>) -> Result<&'a Value, InputError> {
    value.as_ref().ok_or(InputError::MissingField(field))
}

fn coerce_age(field: &'static str, value: &Value) -> Result<u32, InputError> {
    let whole = match value {
        Value::Number(n) => n.as_f64().map(f64::trunc),
        Value::String(s) => s.trim().parse::<i64>().ok().map(|v| v as f64),
        _ => None,
    };
    whole
        .filter(|v| (0.0..=f64::from(u32::MAX)).contains(v))
        .map(|v| v as u32)
        .ok_or_else(|| InputError::invalid(field, value))
}

fn coerce_amount(field: &'static str, value: &Value) -> Result<f64, InputError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| InputError::invalid(field, value)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| InputError::invalid(field, value)),
        _ => Err(InputError::invalid(field, value)),
    }
}

fn build_inputs(payload: &ProjectPayload) -> Result<Inputs, InputError> {
    Ok(Inputs {
        current_age: coerce_age("current_age", require("current_age", &payload.current_age)?)?,
        retirement_age: coerce_age(
            "retirement_age",
            require("retirement_age", &payload.retirement_age)?,
        )?,
        current_savings: coerce_amount(
            "current_savings",
            require("current_savings", &payload.current_savings)?,
        )?,
        monthly_contribution: coerce_amount(
            "monthly_contribution",
            require("monthly_contribution", &payload.monthly_contribution)?,
        )?,
        expected_return_percent: coerce_amount(
            "expected_return_percent",
            require("expected_return_percent", &payload.expected_return_percent)?,
        )?,
        inflation_percent: coerce_amount(
            "inflation_percent",
            require("inflation_percent", &payload.inflation_percent)?,
        )?,
        withdrawal_rate_percent: coerce_amount(
            "withdrawal_rate_percent",
            require("withdrawal_rate_percent", &payload.withdrawal_rate_percent)?,
        )?,
        target_monthly_income: match &payload.target_monthly_income {
            Some(value) => coerce_amount("target_monthly_income", value)?,
            None => 0.0,
        },
    })
}

/// Parses the projection flags from the command line and prints the result
/// as pretty JSON on stdout. Missing or malformed flags are fatal and are
/// reported by clap before this returns.
pub fn run_cli() -> Result<(), String> {
    let cli = Cli::parse();
    let projection = project(&cli.into());
    let json = serde_json::to_string_pretty(&projection)
        .map_err(|e| format!("Failed to serialize projection: {e}"))?;
    println!("{json}");
    Ok(())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("nestegg HTTP API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(params): Query<HashMap<String, String>>) -> Response {
    project_handler_impl(ProjectPayload::from_query(params))
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

fn project_handler_impl(payload: ProjectPayload) -> Response {
    match build_inputs(&payload) {
        Ok(inputs) => json_response(StatusCode::OK, project(&inputs)),
        Err(err) => {
            warn!("rejected projection request: {err}");
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
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
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid JSON payload: {e}"))?;
    build_inputs(&payload).map_err(|e| e.to_string())
}
