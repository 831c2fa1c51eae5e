//! Durable, resumable session state.
//!
//! [`SessionState`] is the in-memory record a cleanup run mutates;
//! [`SessionStore`] handles the JSON files it is checkpointed to.

mod state;
mod store;

pub use state::{ProcessedSet, ResumePoint, SessionState, SessionStats, StatsDelta};
pub use store::{
    SessionRecord, SessionStore, SessionSummary, parse_timestamp, state_file_name,
};
