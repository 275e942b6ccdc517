use anyhow::Context;
use axum::{
    Router,
    extract::{Json, Query},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::{
    DEFAULT_INITIAL_PRINCIPAL, DEFAULT_MONTHS, DEFAULT_RATE, DEFAULT_SUPPORT_DELAY,
    DEFAULT_SUPPORT_RATE, ScenarioFile, check_month_count,
};
use crate::core::{
    InputSet, MonthNames, PeriodRecord, ProjectionError, ProjectionResult, RateSchedule,
    ResultTable, Totals, project, render_text_table, validate,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliMonthNames {
    Turkish,
    English,
}

impl From<CliMonthNames> for MonthNames {
    fn from(value: CliMonthNames) -> Self {
        match value {
            CliMonthNames::Turkish => MonthNames::Turkish,
            CliMonthNames::English => MonthNames::English,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliOutputFormat {
    Table,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiMonthNames {
    #[serde(alias = "tr")]
    Turkish,
    #[serde(alias = "en")]
    English,
}

impl From<ApiMonthNames> for CliMonthNames {
    fn from(value: ApiMonthNames) -> Self {
        match value {
            ApiMonthNames::Turkish => CliMonthNames::Turkish,
            ApiMonthNames::English => CliMonthNames::English,
        }
    }
}

/// A list of numbers as sent by web clients: a bare number, a JSON array,
/// or a comma-separated string (the only form a query string can carry).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum NumberListPayload {
    Single(f64),
    List(Vec<f64>),
    Text(String),
}

impl NumberListPayload {
    fn into_values(self, field: &str) -> ProjectionResult<Vec<f64>> {
        match self {
            NumberListPayload::Single(v) => Ok(vec![v]),
            NumberListPayload::List(values) => Ok(values),
            NumberListPayload::Text(text) => text
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| {
                    part.parse::<f64>().map_err(|_| {
                        ProjectionError::invalid(format!(
                            "{field}: could not parse '{part}' as a number"
                        ))
                    })
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    initial_principal: Option<f64>,
    #[serde(alias = "rates")]
    rate: Option<NumberListPayload>,
    support_rate: Option<f64>,
    support_delay: Option<u32>,
    months: Option<u32>,
    withdrawals: Option<NumberListPayload>,
    month_names: Option<ApiMonthNames>,
}

#[derive(Parser, Debug)]
#[command(
    name = "rtp-projection",
    about = "Monthly principal projection with returns, withdrawals and delayed support income",
    after_help = "Run `rtp-projection serve [port]` to start the HTTP API instead."
)]
struct Cli {
    #[arg(
        long,
        value_name = "FILE",
        conflicts_with_all = [
            "initial_principal",
            "rate",
            "support_rate",
            "support_delay",
            "months",
            "withdrawals",
            "month_names",
        ],
        help = "Load inputs from a TOML scenario file instead of the flags below"
    )]
    scenario: Option<PathBuf>,
    #[arg(long, help = "Print a default scenario file and exit")]
    print_scenario: bool,
    #[arg(
        long,
        default_value_t = DEFAULT_INITIAL_PRINCIPAL,
        allow_negative_numbers = true,
        help = "Opening principal of the first month"
    )]
    initial_principal: f64,
    #[arg(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        default_values_t = [DEFAULT_RATE],
        help = "Return rate; one value for every month or a comma-separated value per month"
    )]
    rate: Vec<f64>,
    #[arg(
        long,
        default_value_t = DEFAULT_SUPPORT_RATE,
        allow_negative_numbers = true,
        help = "Support income as a share of the opening principal"
    )]
    support_rate: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_SUPPORT_DELAY,
        help = "Months before banked support income is credited"
    )]
    support_delay: u32,
    #[arg(long, default_value_t = DEFAULT_MONTHS, help = "Number of months to project")]
    months: u32,
    #[arg(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        help = "Comma-separated amount withdrawn each month; defaults to zero"
    )]
    withdrawals: Vec<f64>,
    #[arg(long, value_enum, default_value_t = CliMonthNames::Turkish)]
    month_names: CliMonthNames,
    #[arg(long, value_enum, default_value_t = CliOutputFormat::Table)]
    format: CliOutputFormat,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Headline {
    total_return: f64,
    total_support: f64,
    total_investment: f64,
    total_profit: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    period_count: usize,
    support_delay: usize,
    rows: Vec<PeriodRecord>,
    totals: Totals,
    headline: Headline,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

fn build_inputs(cli: &Cli) -> ProjectionResult<InputSet> {
    if cli.rate.is_empty() {
        return Err(ProjectionError::invalid("--rate needs at least one value"));
    }
    check_month_count(cli.months)?;

    let inputs = InputSet::monthly(
        cli.initial_principal,
        cli.withdrawals.clone(),
        RateSchedule::from_values(cli.rate.clone()),
        cli.support_rate,
        cli.support_delay as usize,
        cli.months as usize,
        cli.month_names.into(),
    );
    validate(&inputs)?;
    Ok(inputs)
}

/// Runs a single projection from command-line arguments and prints the result.
pub fn run_cli<I, T>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    if cli.print_scenario {
        print!("{}", ScenarioFile::default_toml()?);
        return Ok(());
    }

    let inputs = match &cli.scenario {
        Some(path) => {
            info!("Loading scenario from {}", path.display());
            ScenarioFile::load(path)?.into_inputs()?
        }
        None => build_inputs(&cli)?,
    };

    let table = project(&inputs)?;
    info!(
        months = table.rows.len(),
        total_profit = table.total_profit(),
        "projection complete"
    );

    match cli.format {
        CliOutputFormat::Table => {
            print!("{}", render_text_table(&table));
            println!();
            println!("Total return:     {:.2}", table.total_return());
            println!("Total support:    {:.2}", table.total_support());
            println!("Total investment: {:.2}", table.total_investment());
            println!("Total profit:     {:.2}", table.total_profit());
        }
        CliOutputFormat::Json => {
            let response = build_project_response(&inputs, &table);
            let json = serde_json::to_string_pretty(&response)
                .context("Failed to serialize projection")?;
            println!("{json}");
        }
    }
    Ok(())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router();

    let listener = TcpListener::bind(addr).await?;
    info!("Projection HTTP API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/api/project");

    axum::serve(listener, app).await
}

fn router() -> Router {
    Router::new()
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .fallback(not_found_handler)
}

async fn not_found_handler() -> Response {
    json_response(
        StatusCode::NOT_FOUND,
        ErrorResponse {
            error: "Not found".to_string(),
            kind: "not-found",
        },
    )
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_handler_impl(payload: ProjectPayload) -> Response {
    let result = api_inputs_from_payload(payload)
        .and_then(|inputs| project(&inputs).map(|table| (inputs, table)));

    match result {
        Ok((inputs, table)) => {
            json_response(StatusCode::OK, build_project_response(&inputs, &table))
        }
        Err(err) => {
            warn!("Rejected projection request: {err}");
            error_response(StatusCode::BAD_REQUEST, &err)
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, err: &ProjectionError) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: err.to_string(),
            kind: err.kind(),
        },
    )
}

fn api_inputs_from_payload(payload: ProjectPayload) -> ProjectionResult<InputSet> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.initial_principal {
        cli.initial_principal = v;
    }
    if let Some(v) = payload.rate {
        cli.rate = v.into_values("rate")?;
    }
    if let Some(v) = payload.support_rate {
        cli.support_rate = v;
    }
    if let Some(v) = payload.support_delay {
        cli.support_delay = v;
    }
    if let Some(v) = payload.months {
        cli.months = v;
    }
    if let Some(v) = payload.withdrawals {
        cli.withdrawals = v.into_values("withdrawals")?;
    }
    if let Some(v) = payload.month_names {
        cli.month_names = v.into();
    }

    build_inputs(&cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        scenario: None,
        print_scenario: false,
        initial_principal: DEFAULT_INITIAL_PRINCIPAL,
        rate: vec![DEFAULT_RATE],
        support_rate: DEFAULT_SUPPORT_RATE,
        support_delay: DEFAULT_SUPPORT_DELAY,
        months: DEFAULT_MONTHS,
        withdrawals: Vec::new(),
        month_names: CliMonthNames::Turkish,
        format: CliOutputFormat::Table,
    }
}

fn build_project_response(inputs: &InputSet, table: &ResultTable) -> ProjectResponse {
    ProjectResponse {
        period_count: inputs.period_count(),
        support_delay: inputs.support_delay,
        rows: table.rows.clone(),
        totals: table.totals,
        headline: Headline {
            total_return: table.total_return(),
            total_support: table.total_support(),
            total_investment: table.total_investment(),
            total_profit: table.total_profit(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Uri;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    async fn response_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body is readable");
        serde_json::from_slice(&bytes).expect("body is json")
    }

    fn api_inputs_from_json(json: &str) -> ProjectionResult<InputSet> {
        let payload = serde_json::from_str::<ProjectPayload>(json)
            .map_err(|e| ProjectionError::invalid(format!("Invalid API JSON payload: {e}")))?;
        api_inputs_from_payload(payload)
    }

    fn api_inputs_from_query(uri: &str) -> ProjectionResult<InputSet> {
        let uri: Uri = uri.parse().expect("valid uri");
        let Query(payload) = Query::<ProjectPayload>::try_from_uri(&uri).expect("query parses");
        api_inputs_from_payload(payload)
    }

    #[test]
    fn empty_payload_uses_cli_defaults() {
        let inputs = api_inputs_from_json("{}").expect("defaults are valid");
        assert_approx(inputs.initial_principal, DEFAULT_INITIAL_PRINCIPAL);
        assert_eq!(inputs.rates, RateSchedule::Uniform(DEFAULT_RATE));
        assert_eq!(inputs.support_delay, DEFAULT_SUPPORT_DELAY as usize);
        assert_eq!(inputs.period_count(), DEFAULT_MONTHS as usize);
        assert_eq!(inputs.withdrawals, vec![0.0; DEFAULT_MONTHS as usize]);
    }

    #[test]
    fn api_inputs_from_json_parses_web_keys() {
        let json = r#"{
          "initialPrincipal": 20000,
          "rate": [1.1, 1.2, 1.3],
          "supportRate": 0.4,
          "supportDelay": 2,
          "months": 3,
          "withdrawals": [0, 500, 250],
          "monthNames": "en"
        }"#;
        let inputs = api_inputs_from_json(json).expect("json should parse");

        assert_approx(inputs.initial_principal, 20_000.0);
        assert_eq!(inputs.rates, RateSchedule::PerPeriod(vec![1.1, 1.2, 1.3]));
        assert_approx(inputs.support_rate, 0.4);
        assert_eq!(inputs.support_delay, 2);
        assert_eq!(inputs.withdrawals, vec![0.0, 500.0, 250.0]);
        assert_eq!(inputs.period_labels, vec!["January", "February", "March"]);
    }

    #[test]
    fn api_inputs_accept_scalar_rate_and_comma_strings() {
        let json = r#"{ "rates": 2, "months": 2, "withdrawals": "10, 20" }"#;
        let inputs = api_inputs_from_json(json).expect("json should parse");
        assert_eq!(inputs.rates, RateSchedule::Uniform(2.0));
        assert_eq!(inputs.withdrawals, vec![10.0, 20.0]);
    }

    #[test]
    fn api_inputs_from_query_string() {
        let inputs = api_inputs_from_query(
            "http://localhost/api/project?initialPrincipal=5000&rate=1.5,1.2&months=2&withdrawals=0,100&monthNames=turkish",
        )
        .expect("query should parse");

        assert_approx(inputs.initial_principal, 5_000.0);
        assert_eq!(inputs.rates, RateSchedule::PerPeriod(vec![1.5, 1.2]));
        assert_eq!(inputs.withdrawals, vec![0.0, 100.0]);
        assert_eq!(inputs.period_labels, vec!["Ocak", "Şubat"]);
    }

    #[test]
    fn api_inputs_reject_unparsable_list_entries() {
        let err = api_inputs_from_json(r#"{ "withdrawals": "10,abc" }"#)
            .expect_err("must reject non-numeric entry");
        assert_eq!(err.kind(), "invalid-input");
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn api_inputs_reject_length_mismatch_before_projection() {
        let err = api_inputs_from_json(r#"{ "months": 3, "withdrawals": [1, 2] }"#)
            .expect_err("must reject length mismatch");
        assert!(matches!(err, ProjectionError::InvalidInput { .. }));
    }

    #[test]
    fn build_inputs_rejects_negative_principal() {
        let mut cli = default_cli_for_api();
        cli.initial_principal = -100.0;
        let err = build_inputs(&cli).expect_err("must reject negative principal");
        assert_eq!(err.kind(), "negative-value");
        assert!(err.to_string().contains("initial principal"));
    }

    #[test]
    fn build_inputs_rejects_empty_rate_list() {
        let mut cli = default_cli_for_api();
        cli.rate.clear();
        let err = build_inputs(&cli).expect_err("must reject empty rates");
        assert!(err.to_string().contains("--rate"));
    }

    #[test]
    fn api_inputs_reject_months_above_limit() {
        let err = api_inputs_from_query("http://localhost/api/project?months=4000000000")
            .expect_err("horizon too long");
        assert_eq!(err.kind(), "invalid-input");
        assert!(err.to_string().contains("months must be <="));

        let err = api_inputs_from_json(r#"{ "months": 1201 }"#).expect_err("horizon too long");
        assert_eq!(err.kind(), "invalid-input");
    }

    #[test]
    fn cli_negative_list_values_reach_validation() {
        let cli = Cli::try_parse_from(["rtp-projection", "--rate", "-1"])
            .expect("negative rate parses");
        let err = build_inputs(&cli).expect_err("must reject negative rate");
        assert_eq!(err.kind(), "negative-value");

        let cli = Cli::try_parse_from([
            "rtp-projection",
            "--months",
            "2",
            "--withdrawals",
            "-5,0",
        ])
        .expect("negative withdrawal parses");
        assert_eq!(cli.withdrawals, vec![-5.0, 0.0]);
        let err = build_inputs(&cli).expect_err("must reject negative withdrawal");
        assert_eq!(err.kind(), "negative-value");
    }

    #[test]
    fn cli_parses_comma_separated_lists() {
        let cli = Cli::try_parse_from([
            "rtp-projection",
            "--rate",
            "1.5,1.2,1.1",
            "--months",
            "3",
            "--withdrawals",
            "0,100,200",
            "--month-names",
            "english",
        ])
        .expect("valid arguments");
        let inputs = build_inputs(&cli).expect("valid inputs");
        assert_eq!(inputs.rates, RateSchedule::PerPeriod(vec![1.5, 1.2, 1.1]));
        assert_eq!(inputs.withdrawals, vec![0.0, 100.0, 200.0]);
        assert_eq!(inputs.period_labels[2], "March");
    }

    #[test]
    fn cli_defaults_match_api_defaults() {
        let cli = Cli::try_parse_from(["rtp-projection"]).expect("no arguments needed");
        let from_cli = build_inputs(&cli).expect("valid inputs");
        let from_api = build_inputs(&default_cli_for_api()).expect("valid inputs");
        assert_eq!(from_cli, from_api);
    }

    #[test]
    fn cli_rejects_scenario_combined_with_input_flags() {
        let result = Cli::try_parse_from([
            "rtp-projection",
            "--scenario",
            "plan.toml",
            "--months",
            "6",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn project_response_serialization_contains_expected_fields() {
        let inputs = build_inputs(&default_cli_for_api()).expect("valid inputs");
        let table = project(&inputs).expect("valid projection");
        let json = serde_json::to_value(build_project_response(&inputs, &table))
            .expect("response serializes");

        assert_eq!(json["periodCount"], 12);
        assert_eq!(json["supportDelay"], 4);
        assert_eq!(json["rows"].as_array().map(Vec::len), Some(12));
        assert_eq!(json["rows"][0]["label"], "Ocak");
        assert_eq!(json["rows"][0]["returnAmount"], 150_000.0);
        assert_eq!(json["rows"][4]["supportApplied"], true);
        assert!(json["totals"]["supportIncome"].is_number());
        assert!(json["totals"]["carriedPrincipal"].is_number());
        assert_eq!(json["headline"]["totalProfit"], json["totals"]["profit"]);
        assert_eq!(
            json["headline"]["totalInvestment"],
            json["totals"]["openingPrincipal"]
        );
    }

    #[tokio::test]
    async fn project_handler_status_codes() {
        let ok = project_handler_impl(ProjectPayload::default()).await;
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(
            ok.headers().get(header::CACHE_CONTROL),
            Some(&HeaderValue::from_static("no-store"))
        );

        let bad = project_handler_impl(ProjectPayload {
            support_delay: Some(0),
            ..ProjectPayload::default()
        })
        .await;
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        let body = response_json(bad).await;
        assert_eq!(body["kind"], "invalid-input");
        assert!(body["error"].is_string());

        let missing = not_found_handler().await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        let body = response_json(missing).await;
        assert_eq!(body["error"], "Not found");
        assert_eq!(body["kind"], "not-found");
    }
}
