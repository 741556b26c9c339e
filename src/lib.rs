//! Compose Flux - On-device composition behavior metrics
//!
//! Flux observes a user writing a free-text answer and summarizes how it was
//! written: time spent, characters removed, peak length and final length. The
//! summary travels with the answer when it is persisted.
//!
//! ## Modules
//!
//! - **Tracker**: Per-session metrics from raw edit observations
//! - **Composer**: Host-side answer state that feeds the tracker and builds submissions
//! - **Replay**: Recompute metrics from a recorded, timestamped event log

pub mod clock;
pub mod composer;
pub mod config;
pub mod error;
pub mod replay;
pub mod tracker;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use clock::{Clock, ManualClock, SystemClock};
pub use composer::AnswerComposer;
pub use config::ComposerConfig;
pub use error::ComposeError;
pub use replay::{replay_events, replay_to_json};
pub use tracker::CompositionTracker;
pub use types::{AnswerSubmission, ComposeEvent, ComposeEventKind, SessionMetrics, SubmissionTarget};

/// Flux version embedded in replay reports
pub const FLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for replay reports
pub const PRODUCER_NAME: &str = "compose-flux";
