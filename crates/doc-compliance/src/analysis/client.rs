use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{AnalysisJob, DocumentRef, JobId, ObjectRef, PollResponse};
use super::invocation::{InvocationPayload, InvocationResponse};
use crate::config::AnalysisConfig;

/// Failures at the analysis service boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("document rejected by analysis service: {0}")]
    Submission(String),
    #[error("analysis service unavailable: {0}")]
    Transient(String),
    #[error("analysis service refused the request: {0}")]
    Permanent(String),
}

impl AnalysisError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, AnalysisError::Transient(_))
    }
}

/// Remote analysis service seen as an opaque dependency.
#[async_trait]
pub trait AnalysisJobClient: Send + Sync {
    /// Submit a document; one remote call.
    async fn submit(&self, document: &DocumentRef) -> Result<JobId, AnalysisError>;

    /// Current status of a job, with its blocks once it succeeded.
    async fn poll(&self, job_id: &JobId) -> Result<AnalysisJob, AnalysisError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum SubmitRequest<'a> {
    DocumentLocation(&'a ObjectRef),
    InlineBytes(String),
}

impl<'a> SubmitRequest<'a> {
    fn from_document(document: &'a DocumentRef) -> Self {
        match document {
            DocumentRef::Location(object) => SubmitRequest::DocumentLocation(object),
            DocumentRef::Inline(bytes) => SubmitRequest::InlineBytes(STANDARD.encode(bytes)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    job_id: String,
}

/// HTTP client for one analysis target (function or model name).
#[derive(Debug, Clone)]
pub struct HttpAnalysisClient {
    http: reqwest::Client,
    base_url: String,
    target: String,
}

impl HttpAnalysisClient {
    pub fn new(config: &AnalysisConfig, target: impl Into<String>) -> Result<Self, AnalysisError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| AnalysisError::Permanent(format!("could not build client: {err}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            target: target.into(),
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.target, path)
    }

    /// Run the analysis synchronously and return the raw invocation envelope.
    pub async fn invoke(&self, document: &DocumentRef) -> Result<InvocationResponse, AnalysisError> {
        let payload = match document {
            DocumentRef::Location(object) => InvocationPayload::S3Object {
                bucket: &object.bucket,
                name: &object.key,
            },
            DocumentRef::Inline(bytes) => InvocationPayload::Image(STANDARD.encode(bytes)),
        };

        debug!(target_name = %self.target, document = %document.describe(), "invoking analysis function");
        let response = self
            .http
            .post(self.endpoint("invocations"))
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_submit_status(status, body));
        }

        response
            .json::<InvocationResponse>()
            .await
            .map_err(|err| AnalysisError::Permanent(format!("undecodable invocation response: {err}")))
    }
}

#[async_trait]
impl AnalysisJobClient for HttpAnalysisClient {
    async fn submit(&self, document: &DocumentRef) -> Result<JobId, AnalysisError> {
        debug!(target_name = %self.target, document = %document.describe(), "submitting document");
        let response = self
            .http
            .post(self.endpoint("jobs"))
            .json(&SubmitRequest::from_document(document))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_submit_status(status, body));
        }

        let accepted = response
            .json::<SubmitResponse>()
            .await
            .map_err(|err| AnalysisError::Permanent(format!("undecodable submit response: {err}")))?;

        if accepted.job_id.is_empty() {
            return Err(AnalysisError::Permanent(
                "service returned an empty job id".to_string(),
            ));
        }
        Ok(JobId(accepted.job_id))
    }

    async fn poll(&self, job_id: &JobId) -> Result<AnalysisJob, AnalysisError> {
        let response = self
            .http
            .get(self.endpoint(&format!("jobs/{}", job_id.0)))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_poll_status(status, body));
        }

        let payload = response
            .json::<PollResponse>()
            .await
            .map_err(|err| AnalysisError::Permanent(format!("undecodable poll response: {err}")))?;

        Ok(payload.into_job(job_id.clone()))
    }
}

fn transport_error(err: reqwest::Error) -> AnalysisError {
    AnalysisError::Transient(err.to_string())
}

fn describe_status(status: StatusCode, body: &str) -> String {
    if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    }
}

pub(crate) fn classify_submit_status(status: StatusCode, body: String) -> AnalysisError {
    let detail = describe_status(status, &body);
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        AnalysisError::Transient(detail)
    } else {
        AnalysisError::Submission(detail)
    }
}

pub(crate) fn classify_poll_status(status: StatusCode, body: String) -> AnalysisError {
    let detail = describe_status(status, &body);
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        AnalysisError::Transient(detail)
    } else {
        AnalysisError::Permanent(detail)
    }
}
