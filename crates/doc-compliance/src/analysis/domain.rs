use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::graph::BlockGraph;

/// Identifier returned by the analysis service at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    InProgress,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::InProgress)
    }

    pub fn label(self) -> &'static str {
        match self {
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Succeeded => "SUCCEEDED",
            JobStatus::Failed => "FAILED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub page_count: u32,
}

/// One submitted unit of work and, once it succeeded, its block graph.
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub job_id: JobId,
    pub status: JobStatus,
    pub result: Option<BlockGraph>,
    pub document_metadata: Option<DocumentMetadata>,
    pub status_message: Option<String>,
}

impl AnalysisJob {
    pub fn in_progress(job_id: JobId) -> Self {
        Self {
            job_id,
            status: JobStatus::InProgress,
            result: None,
            document_metadata: None,
            status_message: None,
        }
    }

    pub fn succeeded(job_id: JobId, result: BlockGraph) -> Self {
        Self {
            job_id,
            status: JobStatus::Succeeded,
            result: Some(result),
            document_metadata: None,
            status_message: None,
        }
    }

    pub fn failed(job_id: JobId, message: impl Into<String>) -> Self {
        Self {
            job_id,
            status: JobStatus::Failed,
            result: None,
            document_metadata: None,
            status_message: Some(message.into()),
        }
    }
}

/// Object-storage locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parse `scheme://bucket/key`. The key keeps any further slashes.
    pub fn parse_locator(raw: &str) -> Option<Self> {
        let (scheme, rest) = raw.trim().split_once("://")?;
        if scheme.is_empty() {
            return None;
        }
        let (bucket, key) = rest.split_once('/')?;
        if bucket.is_empty() || key.is_empty() {
            return None;
        }
        Some(Self::new(bucket, key))
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Document handed to the analysis service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentRef {
    Location(ObjectRef),
    Inline(Vec<u8>),
}

impl DocumentRef {
    pub fn describe(&self) -> String {
        match self {
            DocumentRef::Location(object) => format!("object {object}"),
            DocumentRef::Inline(bytes) => format!("inline document ({} bytes)", bytes.len()),
        }
    }
}

/// Status payload returned when polling a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub job_status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_metadata: Option<DocumentMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

impl PollResponse {
    /// Blocks are only kept for a succeeded job.
    pub fn into_job(self, job_id: JobId) -> AnalysisJob {
        let result = match self.job_status {
            JobStatus::Succeeded => Some(BlockGraph::from_records(
                self.blocks.unwrap_or_default(),
            )),
            JobStatus::InProgress | JobStatus::Failed => None,
        };

        AnalysisJob {
            job_id,
            status: self.job_status,
            result,
            document_metadata: self.document_metadata,
            status_message: self.status_message,
        }
    }
}
