use crate::analysis::{AnalysisJob, JobId};
use crate::compliance::{ComplianceEvaluator, ComplianceRules};
use crate::graph::{Block, BlockGraph, BlockType};

pub(super) fn evaluator() -> ComplianceEvaluator {
    ComplianceEvaluator::new(ComplianceRules::default())
}

pub(super) fn lines(texts: &[&str]) -> BlockGraph {
    let mut blocks = vec![Block::new("page-1", BlockType::Page)];
    blocks.extend(texts.iter().enumerate().map(|(index, text)| {
        Block::new(format!("line-{index}").as_str(), BlockType::Line).with_text(*text)
    }));
    BlockGraph::from_blocks(blocks)
}

/// Lines of the generated compliance report with a blank signature.
pub(super) fn report_with_blank_signature() -> BlockGraph {
    lines(&[
        "Compliance Report",
        "Employee ID: 4821",
        "Name: John Doe",
        "Department: Sales",
        "Date: 14/01/2025",
        "Reviewed by: Jane Smith",
        "Signature:",
    ])
}

pub(super) fn job_id() -> JobId {
    JobId("job-42".to_string())
}

pub(super) fn succeeded_job(graph: BlockGraph) -> AnalysisJob {
    AnalysisJob::succeeded(job_id(), graph)
}
