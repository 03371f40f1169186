//! Session State: the single source of truth for one capture → infer →
//! extract workflow.
//!
//! The capture source and the vision provider are injected as trait objects,
//! so tests drive the whole state machine with stubs.

pub mod job;
pub mod session;
pub mod settings;

pub use job::{InferenceCompletion, InferenceJob, InferenceOutcome};
pub use session::Session;
pub use settings::InferenceSettings;
