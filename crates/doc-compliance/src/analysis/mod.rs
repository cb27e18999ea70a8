//! Asynchronous analysis job lifecycle: submission, status polling and the
//! synchronous invocation envelope.

pub mod client;
pub mod domain;
pub mod invocation;
pub mod poller;

pub use client::{AnalysisError, AnalysisJobClient, HttpAnalysisClient};
pub use domain::{
    AnalysisJob, DocumentMetadata, DocumentRef, JobId, JobStatus, ObjectRef, PollResponse,
};
pub use invocation::{InvocationResponse, UnexpectedBody};
pub use poller::{JobPoller, PollCancellation, PollError};
