//! Pipeline orchestration: conversation state, stage routing, and the run loop.

pub(crate) mod engine;
mod router;
mod state;

pub use engine::{
    DEFAULT_FINDER_ITERATIONS, DEFAULT_MAX_STEPS, Limits, PipelineError, RunReport, run,
};
pub use router::{Decision, FINAL_ANSWER_MARKER, RouterError, route};
pub use state::{Conversation, Stage};
