//! HTTP surface: the single and bulk analysis endpoints plus a liveness
//! probe. Handlers translate the judge/scoring pipeline's outcomes into
//! short structured errors; no internal detail leaks beyond the optional
//! `detail` string on the single-query 500 path.

use metrics::counter;
use serde_json::{json, Value};
use shuttle_axum::axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::batch::{run_batch, MAX_BATCH_QUERIES, MIN_BATCH_QUERIES};
use crate::judge::{DynJudgeClient, JudgeError};
use crate::query::validate_query;
use crate::report::{build_csv, bulk_filename, ist_date_stamp};
use crate::scoring::single_ccp;

#[derive(Clone)]
pub struct AppState {
    pub judge: DynJudgeClient,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/single", post(single))
        .route("/api/bulk", post(bulk))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

fn error_json(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn unavailable() -> Response {
    error_json(
        StatusCode::SERVICE_UNAVAILABLE,
        "Judgment service is not configured; missing API credential",
    )
}

/// Bodies are parsed by hand so even a syntactically broken payload gets the
/// same `{"error": ...}` shape as every other failure path.
fn parse_body(bytes: &Bytes) -> Result<Value, Response> {
    serde_json::from_slice(bytes)
        .map_err(|_| error_json(StatusCode::BAD_REQUEST, "Request body must be valid JSON"))
}

#[derive(serde::Serialize)]
struct SingleResp {
    query: String,
    needs_search: bool,
    ccp: u8,
    fanout_queries: Vec<String>,
    snippets: Vec<String>,
    urls: Vec<String>,
}

async fn single(State(state): State<AppState>, bytes: Bytes) -> Response {
    counter!("ccp_single_requests_total").increment(1);

    // Fail fast on missing credential, before any per-query work.
    if !state.judge.is_configured() {
        return unavailable();
    }

    let body = match parse_body(&bytes) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let raw = body.get("query").and_then(Value::as_str).unwrap_or_default();
    let query = match validate_query(raw) {
        Ok(q) => q,
        Err(e) => return error_json(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match state.judge.judge(&query).await {
        Ok(judgment) => {
            let ccp = single_ccp(&judgment);
            Json(SingleResp {
                query,
                needs_search: judgment.needs_search,
                ccp,
                fanout_queries: judgment.fanout_queries,
                snippets: judgment.snippets,
                urls: judgment.urls,
            })
            .into_response()
        }
        Err(JudgeError::MissingApiKey) => unavailable(),
        Err(err) => {
            counter!("judge_failures_total").increment(1);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Judgment call failed. Try again.",
                    "detail": err.to_string(),
                })),
            )
                .into_response()
        }
    }
}

async fn bulk(State(state): State<AppState>, bytes: Bytes) -> Response {
    counter!("ccp_bulk_requests_total").increment(1);

    if !state.judge.is_configured() {
        return unavailable();
    }

    let body = match parse_body(&bytes) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    // Absent/non-array/mistyped query lists get a structured 400 as well,
    // never an extractor rejection.
    let size_error = format!("Provide {MIN_BATCH_QUERIES}-{MAX_BATCH_QUERIES} queries only");
    let Some(items) = body.get("queries").and_then(Value::as_array) else {
        return error_json(StatusCode::BAD_REQUEST, size_error);
    };
    if !(MIN_BATCH_QUERIES..=MAX_BATCH_QUERIES).contains(&items.len()) {
        return error_json(StatusCode::BAD_REQUEST, size_error);
    }
    let mut queries = Vec::with_capacity(items.len());
    for item in items {
        match item.as_str() {
            Some(s) => queries.push(s.to_string()),
            None => return error_json(StatusCode::BAD_REQUEST, "Queries must be strings"),
        }
    }

    let rows = run_batch(state.judge.as_ref(), &queries).await;

    let date_stamp = ist_date_stamp();
    let csv = build_csv(&rows, &date_stamp);
    let disposition = format!("attachment; filename=\"{}\"", bulk_filename(&date_stamp));

    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response()
}
