use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{channel_message, DeliveryReceipt, NotifyError, WorkflowNotifier};
use crate::compliance::ComplianceVerdict;
use crate::config::NotifierConfig;

/// Where verdicts are delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyTarget {
    /// Start a downstream workflow execution with a structured payload.
    Workflow { url: String },
    /// Publish a human-readable message.
    Channel { url: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowTrigger<'a> {
    document_id: &'a str,
    compliance_flag: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowAccepted {
    execution_ref: String,
}

#[derive(Debug, Serialize)]
struct ChannelMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelAccepted {
    delivery_ref: String,
}

#[derive(Debug, Clone)]
pub struct HttpNotifier {
    http: reqwest::Client,
    target: NotifyTarget,
}

impl HttpNotifier {
    pub fn new(target: NotifyTarget, timeout: Duration) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| NotifyError::Transport(err.to_string()))?;
        Ok(Self { http, target })
    }

    /// Notifier for the configured target; `None` when nothing is configured.
    pub fn from_config(config: &NotifierConfig) -> Result<Option<Self>, NotifyError> {
        let target = match (&config.workflow_url, &config.channel_url) {
            (Some(url), _) => NotifyTarget::Workflow { url: url.clone() },
            (None, Some(url)) => NotifyTarget::Channel { url: url.clone() },
            (None, None) => return Ok(None),
        };
        Self::new(target, config.request_timeout).map(Some)
    }

    pub fn target(&self) -> &NotifyTarget {
        &self.target
    }

    async fn post<B, R>(&self, url: &str, body: &B) -> Result<R, NotifyError>
    where
        B: Serialize + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| NotifyError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|err| NotifyError::Decode(err.to_string()))
    }
}

#[async_trait]
impl WorkflowNotifier for HttpNotifier {
    async fn notify(
        &self,
        document_id: &str,
        verdict: &ComplianceVerdict,
    ) -> Result<DeliveryReceipt, NotifyError> {
        match &self.target {
            NotifyTarget::Workflow { url } => {
                let trigger = WorkflowTrigger {
                    document_id,
                    compliance_flag: verdict.passed(),
                };
                let accepted: WorkflowAccepted = self.post(url, &trigger).await?;
                info!(document_id, execution = %accepted.execution_ref, "workflow started");
                Ok(DeliveryReceipt::Execution(accepted.execution_ref))
            }
            NotifyTarget::Channel { url } => {
                let message = ChannelMessage {
                    message: channel_message(document_id, verdict),
                };
                let accepted: ChannelAccepted = self.post(url, &message).await?;
                info!(document_id, delivery = %accepted.delivery_ref, "verdict published");
                Ok(DeliveryReceipt::Delivery(accepted.delivery_ref))
            }
        }
    }
}
