use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bpx_core::settings::ConfigError;
use bpx_core::{parse_json, parse_str, BpxError, ParseOptions};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

// Application State
struct AppState {
    /// Options used when a request does not override them
    defaults: ParseOptions,
}

/// Process-wide defaults, with the voltage tolerance optionally taken from
/// the `BPX_V_TOL` environment variable.
fn default_options(v_tol: Option<&str>) -> Result<ParseOptions, Box<dyn std::error::Error>> {
    let options = ParseOptions::new();
    match v_tol {
        None => Ok(options),
        Some(raw) => {
            let v: f64 = raw.trim().parse()?;
            Ok(options.with_voltage_tolerance(v)?)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let defaults = default_options(std::env::var("BPX_V_TOL").ok().as_deref())?;
    info!("default voltage tolerance {} V", defaults.tolerances.voltage());

    let app = app(Arc::new(AppState { defaults }));

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/schema", get(schema))
        .route("/parse", post(parse))
        .route("/evaluate", post(evaluate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> &'static str {
    "BPX parameter service"
}

async fn schema() -> Json<serde_json::Value> {
    Json(bpx_core::schema::export::export())
}

#[derive(Debug, Default, Deserialize)]
struct ParseQuery {
    v_tol: Option<f64>,
    strict: Option<bool>,
}

impl ParseQuery {
    fn options(&self, defaults: ParseOptions) -> Result<ParseOptions, ConfigError> {
        let mut options = defaults;
        if let Some(v) = self.v_tol {
            options = options.with_voltage_tolerance(v)?;
        }
        if let Some(strict) = self.strict {
            options = options.strict(strict);
        }
        Ok(options)
    }
}

/// Map a library error onto a status code and JSON body.
fn error_response(err: &BpxError) -> Response {
    let status = match err {
        BpxError::Config(_) | BpxError::Json(_) => StatusCode::BAD_REQUEST,
        BpxError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        BpxError::Syntax(_)
        | BpxError::Evaluation(_)
        | BpxError::Validation(_)
        | BpxError::Schema(_)
        | BpxError::Consistency { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };
    let body = match err {
        BpxError::Schema(e) => json!({ "error": err.to_string(), "issues": e.issues }),
        BpxError::Consistency { warnings, .. } => json!({ "error": err.to_string(), "warnings": warnings }),
        _ => json!({ "error": err.to_string() }),
    };
    warn!("request failed: {}", err);
    (status, Json(body)).into_response()
}

async fn parse(State(state): State<Arc<AppState>>, Query(query): Query<ParseQuery>, body: String) -> Response {
    let options = match query.options(state.defaults) {
        Ok(options) => options,
        Err(e) => return error_response(&BpxError::Config(e)),
    };
    match parse_str(&body, &options) {
        Ok(parsed) => {
            info!("parsed {} document with {} warning(s)", parsed.document.model(), parsed.warnings.len());
            (StatusCode::OK, Json(parsed)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

#[derive(Debug, Deserialize)]
struct EvaluateRequest {
    document: serde_json::Value,
    path: String,
    x: Vec<f64>,
    #[serde(rename = "T")]
    temperature: Option<f64>,
}

async fn evaluate(State(state): State<Arc<AppState>>, Json(request): Json<EvaluateRequest>) -> Response {
    let parsed = match parse_json(&request.document, &state.defaults) {
        Ok(parsed) => parsed,
        Err(e) => return error_response(&e),
    };
    let Some(value) = parsed.document.value(&request.path) else {
        warn!("no value at '{}'", request.path);
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("no value at '{}'", request.path) })),
        )
            .into_response();
    };
    match value.evaluate_many(&request.x, request.temperature) {
        Ok(y) => (StatusCode::OK, Json(json!({ "y": y }))).into_response(),
        Err(e) => error_response(&BpxError::Evaluation(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINEAR_SPM: &str = include_str!("../../core/tests/data/linear_ocp_spm.json");

    fn state() -> State<Arc<AppState>> {
        State(Arc::new(AppState {
            defaults: ParseOptions::new(),
        }))
    }

    fn query(v_tol: Option<f64>, strict: Option<bool>) -> Query<ParseQuery> {
        Query(ParseQuery { v_tol, strict })
    }

    #[test]
    fn test_default_options_from_env_value() {
        assert_eq!(default_options(None).unwrap(), ParseOptions::new());
        assert_eq!(default_options(Some("0.002")).unwrap().tolerances.voltage(), 0.002);
        assert!(default_options(Some("-0.001")).is_err());
        assert!(default_options(Some("lots")).is_err());
    }

    #[test]
    fn test_query_overrides_defaults() {
        let q = ParseQuery {
            v_tol: Some(0.005),
            strict: Some(true),
        };
        let options = q.options(ParseOptions::new()).unwrap();
        assert_eq!(options.tolerances.voltage(), 0.005);
        assert!(options.strict);
        assert!(ParseQuery::default().options(ParseOptions::new()).unwrap() == ParseOptions::new());
    }

    #[tokio::test]
    async fn test_parse_ok() {
        let response = parse(state(), query(None, None), LINEAR_SPM.to_string()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_parse_negative_tolerance_is_bad_request() {
        let response = parse(state(), query(Some(-0.001), None), LINEAR_SPM.to_string()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_parse_malformed_json_is_bad_request() {
        let response = parse(state(), query(None, None), "{\"Header\":".to_string()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_parse_schema_failure_is_unprocessable() {
        let response = parse(state(), query(None, None), "{\"Header\": {}}".to_string()).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_strict_mismatch_is_unprocessable() {
        let text = LINEAR_SPM.replace("3.48", "3.4788");
        let lenient = parse(state(), query(None, None), text.clone()).await;
        assert_eq!(lenient.status(), StatusCode::OK);
        let strict = parse(state(), query(None, Some(true)), text).await;
        assert_eq!(strict.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_evaluate_value_at_path() {
        let request = EvaluateRequest {
            document: serde_json::from_str(LINEAR_SPM).unwrap(),
            path: "Parameterisation/Positive electrode/OCP [V]".to_string(),
            x: vec![0.0, 1.0],
            temperature: None,
        };
        let response = evaluate(state(), Json(request)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_evaluate_unknown_path() {
        let request = EvaluateRequest {
            document: serde_json::from_str(LINEAR_SPM).unwrap(),
            path: "Parameterisation/Cell/Volume [m3]".to_string(),
            x: vec![0.5],
            temperature: None,
        };
        let response = evaluate(state(), Json(request)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
