//! Composition data types
//!
//! This module defines the metrics record produced by the tracker, the
//! recorded events consumed by replay, and the answer payload handed to the
//! external data store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ComposeError;

/// Summary of one composition session, attached to the persisted answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionMetrics {
    /// Seconds between tracking start and finish, rounded
    pub writing_duration_sec: u64,
    /// Characters removed across all edits
    pub backspace_count: u64,
    /// Longest content observed during the session
    pub max_char_count: u64,
    /// Content length at finish
    pub final_char_count: u64,
}

/// Recorded composition event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposeEventKind {
    Start,
    Change,
    Finish,
    Reset,
}

/// A timestamped composition event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeEvent {
    /// When the host observed the event
    pub timestamp: DateTime<Utc>,
    /// Event kind
    pub kind: ComposeEventKind,
    /// Content after the edit (change) or at submission (finish)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Content before the edit; inferred from the previous change when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
}

/// A recorded composition log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    /// Identifier of the recording
    #[serde(default = "default_session_id")]
    pub session_id: String,
    /// Events in the log
    pub events: Vec<ComposeEvent>,
}

fn default_session_id() -> String {
    "unknown".to_string()
}

/// Where a submission lands in the answers table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SubmissionTarget {
    /// First answer to the question
    Insert { question_id: String },
    /// Edit of an answer the user already posted
    Update { answer_id: String },
}

/// Answer record ready to hand to the data store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSubmission {
    /// Client-side idempotency key
    pub submission_id: Uuid,
    pub target: SubmissionTarget,
    pub answer_text: String,
    pub is_public: bool,
    /// Behavior metrics, stored as columns of the answer row
    #[serde(flatten)]
    pub metrics: SessionMetrics,
}

impl AnswerSubmission {
    pub fn to_json(&self) -> Result<String, ComposeError> {
        serde_json::to_string(self).map_err(|e| ComposeError::EncodingError(e.to_string()))
    }
}

/// Producer information embedded in replay output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
}

impl Default for Producer {
    fn default() -> Self {
        Self {
            name: crate::PRODUCER_NAME.to_string(),
            version: crate::FLUX_VERSION.to_string(),
        }
    }
}

/// Output of replaying one event log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    pub producer: Producer,
    pub session_id: String,
    /// One entry per finished session, in log order
    pub sessions: Vec<SessionMetrics>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_flattens_metrics() {
        let submission = AnswerSubmission {
            submission_id: Uuid::nil(),
            target: SubmissionTarget::Insert {
                question_id: "q-1".to_string(),
            },
            answer_text: "hello".to_string(),
            is_public: true,
            metrics: SessionMetrics {
                writing_duration_sec: 12,
                backspace_count: 3,
                max_char_count: 8,
                final_char_count: 5,
            },
        };

        let value: serde_json::Value = serde_json::from_str(&submission.to_json().unwrap()).unwrap();
        assert_eq!(value["target"]["op"], "insert");
        assert_eq!(value["target"]["question_id"], "q-1");
        assert_eq!(value["writing_duration_sec"], 12);
        assert_eq!(value["backspace_count"], 3);
        assert_eq!(value["max_char_count"], 8);
        assert_eq!(value["final_char_count"], 5);
        assert!(value.get("metrics").is_none());
    }

    #[test]
    fn test_event_defaults() {
        let log: EventLog = serde_json::from_str(
            r#"{"events":[{"timestamp":"2024-01-15T14:00:00Z","kind":"start"}]}"#,
        )
        .unwrap();

        assert_eq!(log.session_id, "unknown");
        assert_eq!(log.events[0].kind, ComposeEventKind::Start);
        assert!(log.events[0].content.is_none());
        assert!(log.events[0].previous.is_none());
    }
}
