use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::{
    AnalysisError, AnalysisJobClient, DocumentRef, JobId, JobPoller, JobStatus, PollCancellation,
    PollError,
};
use crate::compliance::{ComplianceEvaluator, ComplianceRules, ComplianceVerdict};
use crate::notify::{DeliveryReceipt, WorkflowNotifier};

/// Service composing the analysis client, poller, evaluator and notifier for
/// one document at a time.
pub struct DocumentPipeline<C, N> {
    client: Arc<C>,
    notifier: Arc<N>,
    poller: JobPoller,
    evaluator: Arc<ComplianceEvaluator>,
}

impl<C, N> Clone for DocumentPipeline<C, N> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            notifier: Arc::clone(&self.notifier),
            poller: self.poller.clone(),
            evaluator: Arc::clone(&self.evaluator),
        }
    }
}

/// Outcome of delivering a verdict downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationOutcome {
    Delivered(DeliveryReceipt),
    Failed(String),
}

/// Everything learned about one document in a single run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub document_id: String,
    pub job_id: JobId,
    pub status: JobStatus,
    pub verdict: ComplianceVerdict,
    pub key_values: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_passed: Option<bool>,
    pub skipped_records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    pub notification: NotificationOutcome,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Poll(#[from] PollError),
    #[error("pipeline task aborted: {0}")]
    Aborted(String),
}

impl<C, N> DocumentPipeline<C, N>
where
    C: AnalysisJobClient + 'static,
    N: WorkflowNotifier + 'static,
{
    pub fn new(client: Arc<C>, notifier: Arc<N>, poller: JobPoller, rules: ComplianceRules) -> Self {
        Self {
            client,
            notifier,
            poller,
            evaluator: Arc::new(ComplianceEvaluator::new(rules)),
        }
    }

    pub fn evaluator(&self) -> &ComplianceEvaluator {
        &self.evaluator
    }

    pub fn poller(&self) -> &JobPoller {
        &self.poller
    }

    pub async fn run(
        &self,
        document_id: &str,
        document: &DocumentRef,
    ) -> Result<PipelineReport, PipelineError> {
        self.run_cancellable(document_id, document, &PollCancellation::default())
            .await
    }

    /// Submit, poll, evaluate and notify. Remote errors propagate unchanged;
    /// notification failures are recorded on the report.
    pub async fn run_cancellable(
        &self,
        document_id: &str,
        document: &DocumentRef,
        cancellation: &PollCancellation,
    ) -> Result<PipelineReport, PipelineError> {
        let job_id = self.client.submit(document).await?;
        info!(document_id, %job_id, document = %document.describe(), "document submitted for analysis");

        let job = self
            .poller
            .wait_cancellable(self.client.as_ref(), &job_id, cancellation)
            .await?;

        let verdict = self.evaluator.evaluate_job(&job);
        let (key_values, keyword_passed, skipped_records) = match &job.result {
            Some(graph) if job.status == JobStatus::Succeeded => (
                graph.resolve_key_value_pairs(),
                self.evaluator.configured_keyword(graph),
                graph.skipped_records(),
            ),
            _ => (BTreeMap::new(), None, 0),
        };

        if skipped_records > 0 {
            warn!(document_id, %job_id, skipped_records, "malformed block records skipped");
        }

        let notification = self.deliver(document_id, &verdict).await;
        info!(
            document_id,
            %job_id,
            status = job.status.label(),
            passed = verdict.passed(),
            pairs = key_values.len(),
            "document evaluated"
        );

        Ok(PipelineReport {
            document_id: document_id.to_string(),
            job_id,
            status: job.status,
            verdict,
            key_values,
            keyword_passed,
            skipped_records,
            page_count: job.document_metadata.map(|metadata| metadata.page_count),
            notification,
        })
    }

    /// Hand a verdict to the notifier; failures are logged, not raised.
    pub async fn deliver(&self, document_id: &str, verdict: &ComplianceVerdict) -> NotificationOutcome {
        match self.notifier.notify(document_id, verdict).await {
            Ok(receipt) => NotificationOutcome::Delivered(receipt),
            Err(err) => {
                warn!(document_id, error = %err, "verdict delivery failed");
                NotificationOutcome::Failed(err.to_string())
            }
        }
    }

    /// Run several documents concurrently. Results keep input order and one
    /// document's failure does not affect the others.
    pub async fn run_batch(
        &self,
        documents: Vec<(String, DocumentRef)>,
    ) -> Vec<(String, Result<PipelineReport, PipelineError>)> {
        let handles: Vec<_> = documents
            .into_iter()
            .map(|(document_id, document)| {
                let pipeline = self.clone();
                let task_id = document_id.clone();
                let handle =
                    tokio::spawn(async move { pipeline.run(&task_id, &document).await });
                (document_id, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (document_id, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(err) => Err(PipelineError::Aborted(err.to_string())),
            };
            results.push((document_id, result));
        }
        results
    }
}
