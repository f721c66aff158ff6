//! Engine backend: actor, background jobs and queue processing

pub mod actor;
pub mod expander;
pub mod jobs;
pub mod messages;
pub mod processor;
pub mod resolver;

pub use actor::{build_submission, EngineActor, EngineHandle, SubmitMode};
pub use expander::{expand_batch, expand_playlist, ExpansionProgress, ExpansionReport};
pub use jobs::{Job, JobContext};
pub use messages::{EngineCommand, EngineEvent, JobId, JobOutcome};
pub use processor::{ProcessorState, QueueProcessor, RunOutcome, MERGING_STATUS};
pub use resolver::{split_urls, InfoResolver};
