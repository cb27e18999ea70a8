//! Compliance rules applied to a resolved block graph.
//!
//! The field-presence rule flags a required label that appears with nothing
//! after it; a label that never appears is not flagged. The keyword rule is
//! independent of it and requires every line to mention the keyword.

mod rules;
mod verdict;

#[cfg(test)]
mod tests;

pub use rules::ComplianceRules;
pub use verdict::ComplianceVerdict;

use tracing::debug;

use crate::analysis::{AnalysisJob, InvocationResponse, JobStatus, UnexpectedBody};
use crate::graph::{BlockGraph, BlockType};

const SUCCESS_STATUS: u16 = 200;

#[derive(Debug, thiserror::Error)]
pub enum ComplianceError {
    #[error(transparent)]
    UnexpectedBody(#[from] UnexpectedBody),
}

/// Verdict plus the graph it was computed from, when the envelope carried one.
#[derive(Debug, Clone)]
pub struct InvocationEvaluation {
    pub verdict: ComplianceVerdict,
    pub graph: Option<BlockGraph>,
}

/// Stateless evaluator that applies the configured rules.
#[derive(Debug, Clone, Default)]
pub struct ComplianceEvaluator {
    rules: ComplianceRules,
}

impl ComplianceEvaluator {
    pub fn new(rules: ComplianceRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ComplianceRules {
        &self.rules
    }

    pub fn evaluate_field_presence(&self, graph: &BlockGraph) -> ComplianceVerdict {
        let missing = graph.scan_missing_fields(&self.rules.required_prefixes);
        debug!(missing = missing.len(), "field presence evaluated");

        if missing.is_empty() {
            ComplianceVerdict::pass(self.rules.success_message())
        } else {
            ComplianceVerdict::fail(missing)
        }
    }

    /// True only if every `LINE`'s lowercased text contains the keyword as
    /// given. A line without text counts as empty; a graph without lines passes.
    pub fn evaluate_keyword(graph: &BlockGraph, keyword: &str) -> bool {
        graph.of_type(&BlockType::Line).all(|line| {
            graph
                .text_of(line)
                .unwrap_or_default()
                .to_lowercase()
                .contains(keyword)
        })
    }

    /// Keyword rule with the configured keyword, if one is set.
    pub fn configured_keyword(&self, graph: &BlockGraph) -> Option<bool> {
        self.rules
            .keyword
            .as_deref()
            .map(|keyword| Self::evaluate_keyword(graph, keyword))
    }

    /// Field presence for a succeeded job; any other status fails with the
    /// status and service message verbatim.
    pub fn evaluate_job(&self, job: &AnalysisJob) -> ComplianceVerdict {
        if job.status != JobStatus::Succeeded {
            return ComplianceVerdict::fail(vec![
                format!("Error: {}", job.status.label()),
                format!(
                    "Message: {}",
                    job.status_message.as_deref().unwrap_or_default()
                ),
            ]);
        }

        match &job.result {
            Some(graph) => self.evaluate_field_presence(graph),
            None => self.evaluate_field_presence(&BlockGraph::default()),
        }
    }

    pub fn evaluate_invocation(
        &self,
        response: &InvocationResponse,
    ) -> Result<InvocationEvaluation, ComplianceError> {
        if let Some(error_type) = &response.error_type {
            return Ok(InvocationEvaluation {
                verdict: ComplianceVerdict::fail(vec![
                    format!("Error: {error_type}"),
                    format!(
                        "Message: {}",
                        response.error_message.as_deref().unwrap_or_default()
                    ),
                ]),
                graph: None,
            });
        }

        if response.status_code != Some(SUCCESS_STATUS) {
            let status = response
                .status_code
                .map(|code| code.to_string())
                .unwrap_or_else(|| "missing status code".to_string());
            return Ok(InvocationEvaluation {
                verdict: ComplianceVerdict::fail(vec![
                    format!("Error: {status}"),
                    format!("Message: {}", response.raw_body()),
                ]),
                graph: None,
            });
        }

        let graph = BlockGraph::from_records(response.block_records()?);
        debug!(blocks = graph.len(), skipped = graph.skipped_records(), "invocation body decoded");
        let verdict = self.evaluate_field_presence(&graph);

        Ok(InvocationEvaluation {
            verdict,
            graph: Some(graph),
        })
    }
}
