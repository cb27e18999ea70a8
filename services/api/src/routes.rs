use crate::infra::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use doc_compliance::analysis::InvocationResponse;
use doc_compliance::compliance::{ComplianceEvaluator, ComplianceRules, ComplianceVerdict};
use doc_compliance::error::AppError;
use doc_compliance::graph::BlockGraph;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EvaluateRequest {
    #[serde(default)]
    pub(crate) document_id: Option<String>,
    pub(crate) blocks: Vec<Value>,
    #[serde(default)]
    pub(crate) required_prefixes: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) keyword: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EvaluateResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) document_id: Option<String>,
    pub(crate) passed: bool,
    pub(crate) messages: Vec<String>,
    pub(crate) key_values: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) keyword_passed: Option<bool>,
    pub(crate) skipped_records: usize,
}

impl EvaluateResponse {
    fn build(
        document_id: Option<String>,
        evaluator: &ComplianceEvaluator,
        verdict: ComplianceVerdict,
        graph: Option<&BlockGraph>,
    ) -> Self {
        Self {
            document_id,
            passed: verdict.passed(),
            messages: verdict.messages().to_vec(),
            key_values: graph
                .map(BlockGraph::resolve_key_value_pairs)
                .unwrap_or_default(),
            keyword_passed: graph.and_then(|graph| evaluator.configured_keyword(graph)),
            skipped_records: graph.map(BlockGraph::skipped_records).unwrap_or_default(),
        }
    }
}

pub(crate) fn with_compliance_routes(rules: ComplianceRules) -> Router {
    Router::new()
        .route("/api/v1/compliance/evaluate", post(evaluate_endpoint))
        .route("/api/v1/compliance/invocation", post(invocation_endpoint))
        .with_state(Arc::new(ComplianceEvaluator::new(rules)))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Field presence (and the keyword rule, if any) over a posted block array.
/// Request fields override the configured rules for this call only.
pub(crate) async fn evaluate_endpoint(
    State(evaluator): State<Arc<ComplianceEvaluator>>,
    Json(payload): Json<Value>,
) -> Result<Json<EvaluateResponse>, AppError> {
    let EvaluateRequest {
        document_id,
        blocks,
        required_prefixes,
        keyword,
    } = serde_json::from_value(payload)?;

    let mut rules = evaluator.rules().clone();
    if let Some(prefixes) = required_prefixes {
        rules.required_prefixes = prefixes;
    }
    if keyword.is_some() {
        rules.keyword = keyword;
    }
    let evaluator = ComplianceEvaluator::new(rules);

    let graph = BlockGraph::from_records(blocks);
    let verdict = evaluator.evaluate_field_presence(&graph);
    info!(
        document_id = document_id.as_deref().unwrap_or("-"),
        passed = verdict.passed(),
        skipped = graph.skipped_records(),
        "blocks evaluated"
    );

    Ok(Json(EvaluateResponse::build(
        document_id,
        &evaluator,
        verdict,
        Some(&graph),
    )))
}

pub(crate) async fn invocation_endpoint(
    State(evaluator): State<Arc<ComplianceEvaluator>>,
    Json(payload): Json<Value>,
) -> Result<Json<EvaluateResponse>, AppError> {
    let response: InvocationResponse = serde_json::from_value(payload)?;
    let evaluation = evaluator.evaluate_invocation(&response)?;
    info!(passed = evaluation.verdict.passed(), "invocation envelope evaluated");

    Ok(Json(EvaluateResponse::build(
        None,
        &evaluator,
        evaluation.verdict,
        evaluation.graph.as_ref(),
    )))
}
