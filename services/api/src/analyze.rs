use crate::infra::{resolve_document, ConfiguredNotifier};
use clap::Args;
use doc_compliance::analysis::{
    HttpAnalysisClient, InvocationResponse, JobId, JobPoller, PollResponse,
};
use doc_compliance::compliance::{ComplianceEvaluator, ComplianceRules, ComplianceVerdict};
use doc_compliance::config::AppConfig;
use doc_compliance::error::AppError;
use doc_compliance::graph::BlockGraph;
use doc_compliance::notify::DeliveryReceipt;
use doc_compliance::pipeline::{DocumentPipeline, NotificationOutcome, PipelineReport};
use doc_compliance::telemetry;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// Analysis function or model to run
    pub(crate) target: String,
    /// Local file path, or a `scheme://bucket/key` locator
    pub(crate) document: String,
    /// Identifier forwarded to the notifier (defaults to the document argument)
    #[arg(long)]
    pub(crate) document_id: Option<String>,
    /// Invoke the analysis synchronously instead of submitting a job
    #[arg(long)]
    pub(crate) sync: bool,
    /// Require every line to mention this keyword
    #[arg(long)]
    pub(crate) keyword: Option<String>,
    /// Required label prefix; repeat to check several (overrides configuration)
    #[arg(long)]
    pub(crate) prefix: Vec<String>,
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Saved poll response, invocation envelope, or block array (JSON)
    pub(crate) file: PathBuf,
    /// Require every line to mention this keyword
    #[arg(long)]
    pub(crate) keyword: Option<String>,
    /// Required label prefix; repeat to check several (overrides configuration)
    #[arg(long)]
    pub(crate) prefix: Vec<String>,
}

/// What gets printed for one evaluated document.
#[derive(Debug, Clone)]
pub(crate) struct DocumentOutcome {
    pub(crate) summary: String,
    pub(crate) verdict: ComplianceVerdict,
    pub(crate) key_values: BTreeMap<String, String>,
    pub(crate) keyword: Option<(String, bool)>,
    pub(crate) skipped_records: usize,
    pub(crate) notification: Option<NotificationOutcome>,
}

impl DocumentOutcome {
    fn from_graph(
        summary: String,
        verdict: ComplianceVerdict,
        graph: Option<&BlockGraph>,
        evaluator: &ComplianceEvaluator,
    ) -> Self {
        let keyword = match (graph, evaluator.rules().keyword.as_deref()) {
            (Some(graph), Some(keyword)) => Some((
                keyword.to_string(),
                ComplianceEvaluator::evaluate_keyword(graph, keyword),
            )),
            _ => None,
        };

        Self {
            summary,
            verdict,
            key_values: graph
                .map(BlockGraph::resolve_key_value_pairs)
                .unwrap_or_default(),
            keyword,
            skipped_records: graph.map(BlockGraph::skipped_records).unwrap_or_default(),
            notification: None,
        }
    }

    fn from_report(report: PipelineReport, keyword: Option<&str>) -> Self {
        Self {
            summary: format!("job {} {}", report.job_id, report.status.label()),
            keyword: keyword
                .zip(report.keyword_passed)
                .map(|(keyword, passed)| (keyword.to_string(), passed)),
            verdict: report.verdict,
            key_values: report.key_values,
            skipped_records: report.skipped_records,
            notification: Some(report.notification),
        }
    }

    pub(crate) fn render(&self) -> Vec<String> {
        let mut lines = vec![format!("Result: {}", self.summary)];
        lines.extend(self.verdict.messages().iter().cloned());

        if let Some((keyword, passed)) = &self.keyword {
            let outcome = if *passed {
                "present on every line"
            } else {
                "missing from at least one line"
            };
            lines.push(format!("Keyword '{keyword}': {outcome}"));
        }
        if self.skipped_records > 0 {
            lines.push(format!(
                "Skipped {} malformed block record(s)",
                self.skipped_records
            ));
        }

        for (key, value) in &self.key_values {
            lines.push(format!("Key: {key}, Value: {value}"));
        }
        lines.push(format!(
            "Total key-value pairs detected: {}",
            self.key_values.len()
        ));

        match &self.notification {
            Some(NotificationOutcome::Delivered(DeliveryReceipt::Execution(reference))) => {
                lines.push(format!("Workflow execution started: {reference}"))
            }
            Some(NotificationOutcome::Delivered(DeliveryReceipt::Delivery(reference))) => {
                lines.push(format!("Verdict published: {reference}"))
            }
            Some(NotificationOutcome::Failed(detail)) => {
                lines.push(format!("Notification failed: {detail}"))
            }
            Some(NotificationOutcome::Delivered(DeliveryReceipt::Skipped)) | None => {}
        }
        lines
    }
}

fn rules_with_overrides(
    mut rules: ComplianceRules,
    prefixes: Vec<String>,
    keyword: Option<String>,
) -> ComplianceRules {
    if !prefixes.is_empty() {
        rules.required_prefixes = prefixes;
    }
    if keyword.is_some() {
        rules.keyword = keyword;
    }
    rules
}

/// Configuration for a one-shot command, with logging switched on.
fn command_config() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

pub(crate) async fn run_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let AnalyzeArgs {
        target,
        document,
        document_id,
        sync,
        keyword,
        prefix,
    } = args;

    let config = command_config()?;
    let rules = rules_with_overrides(config.compliance.clone(), prefix, keyword);
    let document_ref = resolve_document(&document)?;
    let document_id = document_id.unwrap_or(document);

    let client = Arc::new(HttpAnalysisClient::new(&config.analysis, target)?);
    let notifier = Arc::new(ConfiguredNotifier::from_config(&config.notifier)?);
    let pipeline = DocumentPipeline::new(
        Arc::clone(&client),
        notifier,
        JobPoller::from_config(&config.analysis),
        rules,
    );

    let outcome = if sync {
        let response = client.invoke(&document_ref).await?;
        let summary = serde_json::to_string(&response)?;
        let evaluation = pipeline.evaluator().evaluate_invocation(&response)?;
        let mut outcome = DocumentOutcome::from_graph(
            summary,
            evaluation.verdict,
            evaluation.graph.as_ref(),
            pipeline.evaluator(),
        );
        outcome.notification = Some(pipeline.deliver(&document_id, &outcome.verdict).await);
        outcome
    } else {
        let report = pipeline.run(&document_id, &document_ref).await?;
        DocumentOutcome::from_report(report, pipeline.evaluator().rules().keyword.as_deref())
    };

    for line in outcome.render() {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        file,
        keyword,
        prefix,
    } = args;

    let config = command_config()?;
    let evaluator = ComplianceEvaluator::new(rules_with_overrides(
        config.compliance,
        prefix,
        keyword,
    ));
    let raw = std::fs::read_to_string(&file)?;
    let saved: Value = serde_json::from_str(&raw)?;
    let job_label = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "saved".to_string());

    let outcome = evaluate_saved(saved, &job_label, &evaluator)?;
    for line in outcome.render() {
        println!("{line}");
    }
    Ok(())
}

/// Evaluate a saved poll response, invocation envelope, or bare block payload.
pub(crate) fn evaluate_saved(
    saved: Value,
    job_label: &str,
    evaluator: &ComplianceEvaluator,
) -> Result<DocumentOutcome, AppError> {
    let is_object_with = |field: &str| saved.get(field).is_some();

    if is_object_with("jobStatus") {
        let response: PollResponse = serde_json::from_value(saved)?;
        let job = response.into_job(JobId(job_label.to_string()));
        let verdict = evaluator.evaluate_job(&job);
        let summary = format!("job {} {}", job.job_id, job.status.label());
        return Ok(DocumentOutcome::from_graph(
            summary,
            verdict,
            job.result.as_ref(),
            evaluator,
        ));
    }

    let response = if is_object_with("statusCode") || is_object_with("errorType") {
        serde_json::from_value::<InvocationResponse>(saved)?
    } else {
        InvocationResponse {
            status_code: Some(200),
            body: Some(saved),
            ..InvocationResponse::default()
        }
    };

    let summary = serde_json::to_string(&response)?;
    let evaluation = evaluator.evaluate_invocation(&response)?;
    Ok(DocumentOutcome::from_graph(
        summary,
        evaluation.verdict,
        evaluation.graph.as_ref(),
        evaluator,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report_blocks() -> Value {
        json!([
            {"Id": "l1", "BlockType": "LINE", "Text": "Compliance Report"},
            {"Id": "l2", "BlockType": "LINE", "Text": "Date: 14/01/2025"},
            {"Id": "l3", "BlockType": "LINE", "Text": "Signature:"},
            {"Id": "k1", "BlockType": "KEY_VALUE_SET", "EntityTypes": ["KEY"], "Text": "Name",
             "Relationships": [{"Type": "VALUE", "Ids": ["v1"]}]},
            {"Id": "v1", "BlockType": "KEY_VALUE_SET", "EntityTypes": ["VALUE"], "Text": "John Doe"}
        ])
    }

    #[test]
    fn bare_block_array_renders_diagnostics_and_pairs() {
        let outcome = evaluate_saved(report_blocks(), "report", &ComplianceEvaluator::default())
            .expect("evaluates");
        let lines = outcome.render();

        assert!(lines[0].starts_with("Result: "));
        assert_eq!(
            &lines[1..],
            [
                "Signature: is missing a value",
                "Key: Name, Value: John Doe",
                "Total key-value pairs detected: 1",
            ]
        );
    }

    #[test]
    fn saved_poll_response_uses_job_status() {
        let saved = json!({
            "jobStatus": "FAILED",
            "statusMessage": "document is password protected"
        });
        let outcome =
            evaluate_saved(saved, "report", &ComplianceEvaluator::default()).expect("evaluates");

        assert_eq!(outcome.summary, "job report FAILED");
        assert_eq!(
            outcome.verdict.messages(),
            ["Error: FAILED", "Message: document is password protected"]
        );
        assert!(outcome.key_values.is_empty());
    }

    #[test]
    fn invocation_error_envelope_is_reported() {
        let saved = json!({
            "errorType": "ThrottlingException",
            "errorMessage": "Rate exceeded"
        });
        let outcome =
            evaluate_saved(saved, "report", &ComplianceEvaluator::default()).expect("evaluates");

        assert!(!outcome.verdict.passed());
        assert_eq!(
            outcome.verdict.messages(),
            ["Error: ThrottlingException", "Message: Rate exceeded"]
        );
    }

    #[test]
    fn keyword_outcome_is_rendered_when_requested() {
        let evaluator = ComplianceEvaluator::new(rules_with_overrides(
            ComplianceRules::default(),
            vec!["Date:".to_string()],
            Some("report".to_string()),
        ));
        let outcome = evaluate_saved(json!({"Blocks": report_blocks()}), "report", &evaluator)
            .expect("evaluates");
        let lines = outcome.render();

        assert_eq!(lines[1], "All values for 'Date:' are present.");
        assert_eq!(lines[2], "Keyword 'report': missing from at least one line");
    }

    #[test]
    fn scalar_payloads_are_rejected() {
        match evaluate_saved(json!(42), "report", &ComplianceEvaluator::default()) {
            Err(AppError::Compliance(_)) => {}
            other => panic!("expected compliance error, got {other:?}"),
        }
    }

    #[test]
    fn overrides_replace_configured_rules() {
        let rules = rules_with_overrides(ComplianceRules::default(), Vec::new(), None);
        assert_eq!(rules, ComplianceRules::default());

        let rules = rules_with_overrides(
            ComplianceRules::default(),
            vec!["Reviewed by:".to_string()],
            Some("confidential".to_string()),
        );
        assert_eq!(rules.required_prefixes, vec!["Reviewed by:"]);
        assert_eq!(rules.keyword.as_deref(), Some("confidential"));
    }

    #[test]
    fn one_shot_commands_switch_on_logging() {
        command_config().expect("config loads and logging starts");
        assert!(tracing::enabled!(tracing::Level::WARN));
    }
}
