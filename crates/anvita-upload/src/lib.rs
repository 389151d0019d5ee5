//! Anvita upload pipeline.
//!
//! [`UploadOrchestrator`] validates and runs batches of uploads over an
//! [`anvita_api_client::UploadTransport`]; [`UploadTracker`] holds the
//! per-upload progress table observers read from.

pub mod orchestrator;
pub mod task;
pub mod tracker;

pub use orchestrator::{UploadOrchestrator, UploadOutcome, DEFAULT_COMPLETION_GRACE};
pub use task::{TaskReport, UploadTask};
pub use tracker::{
    ProgressEvent, TickSchedule, UploadTracker, DIRECT_TICKS, REMOTE_TICKS, SYNTHETIC_CEILING,
};
