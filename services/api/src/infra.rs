use async_trait::async_trait;
use doc_compliance::analysis::{DocumentRef, ObjectRef};
use doc_compliance::compliance::ComplianceVerdict;
use doc_compliance::config::NotifierConfig;
use doc_compliance::error::AppError;
use doc_compliance::notify::{
    DeliveryReceipt, HttpNotifier, NoopNotifier, NotifyError, WorkflowNotifier,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Notifier selected from configuration.
#[derive(Debug, Clone)]
pub(crate) enum ConfiguredNotifier {
    Http(HttpNotifier),
    Noop(NoopNotifier),
}

impl ConfiguredNotifier {
    pub(crate) fn from_config(config: &NotifierConfig) -> Result<Self, NotifyError> {
        Ok(match HttpNotifier::from_config(config)? {
            Some(notifier) => Self::Http(notifier),
            None => Self::Noop(NoopNotifier),
        })
    }
}

#[async_trait]
impl WorkflowNotifier for ConfiguredNotifier {
    async fn notify(
        &self,
        document_id: &str,
        verdict: &ComplianceVerdict,
    ) -> Result<DeliveryReceipt, NotifyError> {
        match self {
            Self::Http(notifier) => notifier.notify(document_id, verdict).await,
            Self::Noop(notifier) => notifier.notify(document_id, verdict).await,
        }
    }
}

/// A `scheme://bucket/key` locator stays remote; anything else is read from
/// disk and sent inline.
pub(crate) fn resolve_document(raw: &str) -> Result<DocumentRef, AppError> {
    if let Some(object) = ObjectRef::parse_locator(raw) {
        return Ok(DocumentRef::Location(object));
    }

    let path = Path::new(raw);
    if !path.is_file() {
        return Err(AppError::Input(format!(
            "'{raw}' is neither a bucket/key locator nor a readable file"
        )));
    }
    Ok(DocumentRef::Inline(std::fs::read(path)?))
}
