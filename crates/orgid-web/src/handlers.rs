use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use tracing::info;

use orgid_core::{OrgId, OrgIdError};

use crate::WebState;
use crate::dto::{BatchMatchRequest, HealthResponse, MatchQuery, RootResponse, RunTestsRequest};
use crate::error::orgid_error_response;

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        name: "orgid",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: [
            "GET /entities/institutions?query=",
            "POST /entities/institutions",
            "POST /tests/{dataset}",
            "GET /health",
        ],
    })
}

pub async fn health(State(state): State<WebState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        institutions: state.orgid.institution_count(),
        keys: state.orgid.key_count(),
        boot_secs: state.orgid.boot_secs(),
    })
}

pub async fn match_institution(
    State(state): State<WebState>,
    Query(params): Query<MatchQuery>,
) -> Response {
    let Some(query) = params.query.filter(|query| !query.trim().is_empty()) else {
        return orgid_error_response(
            OrgIdError::Validation("query parameter must not be empty".to_string()),
            "institutions.match",
        );
    };
    Json(state.orgid.match_query(&query)).into_response()
}

pub async fn match_institutions(State(state): State<WebState>, body: Bytes) -> Response {
    const OPERATION: &str = "institutions.match_batch";
    let request = match parse_json_body::<BatchMatchRequest>(&body) {
        Ok(Some(request)) => request,
        Ok(None) => {
            return orgid_error_response(
                OrgIdError::Validation("request body must contain `queries`".to_string()),
                OPERATION,
            );
        }
        Err(err) => return orgid_error_response(err, OPERATION),
    };
    let orgid = Arc::clone(&state.orgid);
    match run_blocking(move || Ok(orgid.match_batch(&request.queries))).await {
        Ok(results) => Json(results).into_response(),
        Err(err) => orgid_error_response(err, OPERATION),
    }
}

/// Score `dataset`. Test cases in the body are evaluated as given; without
/// them the gold standard is fetched afresh for this run.
pub async fn run_tests(
    State(state): State<WebState>,
    Path(dataset): Path<String>,
    body: Bytes,
) -> Response {
    const OPERATION: &str = "tests.run";
    let request = match parse_json_body::<RunTestsRequest>(&body) {
        Ok(request) => request.unwrap_or_default(),
        Err(err) => return orgid_error_response(err, OPERATION),
    };
    let tests = request.tests.map(|tests| {
        tests
            .into_iter()
            .map(|test| test.into_test_case(&dataset))
            .collect::<Vec<_>>()
    });
    info!(
        dataset = %dataset,
        supplied_tests = tests.as_ref().map(Vec::len),
        "evaluation requested"
    );

    let orgid = Arc::clone(&state.orgid);
    let report = run_blocking(move || evaluate(&orgid, &dataset, tests.as_deref())).await;
    match report {
        Ok(report) => Json(report).into_response(),
        Err(err) => orgid_error_response(err, OPERATION),
    }
}

fn evaluate(
    orgid: &OrgId,
    dataset: &str,
    tests: Option<&[orgid_core::models::TestCase]>,
) -> orgid_core::Result<orgid_core::models::EvalReport> {
    match tests {
        Some(tests) => Ok(orgid.evaluate(dataset, tests)),
        None => orgid.run_eval(dataset),
    }
}

/// Empty or whitespace-only bodies read as `None`.
fn parse_json_body<T: DeserializeOwned>(body: &[u8]) -> orgid_core::Result<Option<T>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|err| OrgIdError::Validation(format!("invalid JSON body: {err}")))
}

async fn run_blocking<T, F>(task: F) -> orgid_core::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> orgid_core::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| OrgIdError::Internal(format!("blocking task failed: {err}")))?
}
