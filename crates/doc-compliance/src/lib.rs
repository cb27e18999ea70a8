//! Document analysis pipeline: submit a document for asynchronous analysis,
//! poll the job to completion, resolve the returned block graph, and turn it
//! into a compliance verdict for downstream workflows.

pub mod analysis;
pub mod compliance;
pub mod config;
pub mod error;
pub mod graph;
pub mod notify;
pub mod pipeline;
pub mod telemetry;

pub use analysis::{
    AnalysisError, AnalysisJob, AnalysisJobClient, DocumentRef, HttpAnalysisClient, JobId,
    JobPoller, JobStatus, ObjectRef, PollCancellation, PollError,
};
pub use compliance::{ComplianceEvaluator, ComplianceRules, ComplianceVerdict};
pub use graph::{Block, BlockGraph, BlockId, BlockType};
pub use notify::{DeliveryReceipt, HttpNotifier, NoopNotifier, NotifyError, WorkflowNotifier};
pub use pipeline::{DocumentPipeline, PipelineError, PipelineReport};
