//! Verdict delivery to a downstream workflow or notification channel.

mod http;

pub use http::{HttpNotifier, NotifyTarget};

use async_trait::async_trait;
use serde::Serialize;

use crate::compliance::ComplianceVerdict;

/// Reference handed back by the downstream system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reference", rename_all = "snake_case")]
pub enum DeliveryReceipt {
    Execution(String),
    Delivery(String),
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),
    #[error("notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("notification response undecodable: {0}")]
    Decode(String),
}

/// Accepts a verdict for one document. Implementations make at most one
/// network round trip and report failures instead of retrying.
#[async_trait]
pub trait WorkflowNotifier: Send + Sync {
    async fn notify(
        &self,
        document_id: &str,
        verdict: &ComplianceVerdict,
    ) -> Result<DeliveryReceipt, NotifyError>;
}

/// Notifier used when no downstream target is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl WorkflowNotifier for NoopNotifier {
    async fn notify(
        &self,
        _document_id: &str,
        _verdict: &ComplianceVerdict,
    ) -> Result<DeliveryReceipt, NotifyError> {
        Ok(DeliveryReceipt::Skipped)
    }
}

/// Human-readable channel message for a verdict.
pub fn channel_message(document_id: &str, verdict: &ComplianceVerdict) -> String {
    if verdict.passed() {
        format!("Document {document_id} passed compliance checks")
    } else {
        format!(
            "Document {document_id} failed compliance checks: {}",
            verdict.messages().join("; ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_message_lists_failures() {
        let verdict = ComplianceVerdict::fail(vec![
            "Date: is missing a value".to_string(),
            "Signature: is missing a value".to_string(),
        ]);
        assert_eq!(
            channel_message("mock_reports/report.pdf", &verdict),
            "Document mock_reports/report.pdf failed compliance checks: Date: is missing a value; Signature: is missing a value"
        );

        let verdict = ComplianceVerdict::pass("All values present.");
        assert_eq!(
            channel_message("doc-1", &verdict),
            "Document doc-1 passed compliance checks"
        );
    }

    #[tokio::test]
    async fn noop_notifier_skips_delivery() {
        let receipt = NoopNotifier
            .notify("doc-1", &ComplianceVerdict::pass("ok"))
            .await
            .expect("noop never fails");
        assert_eq!(receipt, DeliveryReceipt::Skipped);
    }
}
