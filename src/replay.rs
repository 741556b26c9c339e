//! Event log replay
//!
//! Recomputes session metrics offline from a recorded composition log. The
//! tracker runs on a [`ManualClock`] pinned to each event's timestamp, so the
//! result depends only on the log.
//!
//! Pipeline: Event log JSON → parse → sort → tracker → ReplayReport JSON

use crate::clock::ManualClock;
use crate::config::ComposerConfig;
use crate::error::ComposeError;
use crate::tracker::CompositionTracker;
use crate::types::{ComposeEvent, ComposeEventKind, EventLog, Producer, ReplayReport, SessionMetrics};

/// Parse an event log JSON document
pub fn parse_event_log(json: &str) -> Result<EventLog, ComposeError> {
    serde_json::from_str(json).map_err(|e| ComposeError::ParseError(e.to_string()))
}

/// Parse newline-delimited events, skipping blank lines
pub fn parse_ndjson_events(input: &str) -> Result<Vec<ComposeEvent>, ComposeError> {
    let mut events = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event = serde_json::from_str(line)
            .map_err(|e| ComposeError::ParseError(format!("line {}: {}", index + 1, e)))?;
        events.push(event);
    }
    Ok(events)
}

/// Drive a tracker through the events and collect one record per `finish`
pub fn replay_events(events: &[ComposeEvent]) -> Result<Vec<SessionMetrics>, ComposeError> {
    replay_with_limit(events, None)
}

/// Replay as if the input field capped answers at `config.max_answer_chars`.
///
/// Every recorded content is clamped before it reaches the tracker.
pub fn replay_events_with_config(
    events: &[ComposeEvent],
    config: &ComposerConfig,
) -> Result<Vec<SessionMetrics>, ComposeError> {
    config.validate()?;
    replay_with_limit(events, Some(config))
}

fn replay_with_limit(
    events: &[ComposeEvent],
    limit: Option<&ComposerConfig>,
) -> Result<Vec<SessionMetrics>, ComposeError> {
    let clamp = |text: &str| match limit {
        Some(config) => config.clamp_answer(text),
        None => text.to_string(),
    };

    let mut ordered = events.to_vec();
    ordered.sort_by_key(|e| e.timestamp);

    let clock = match ordered.first() {
        Some(first) => ManualClock::new(first.timestamp),
        None => return Ok(Vec::new()),
    };
    let mut tracker = CompositionTracker::with_clock(clock.clone());
    let mut shadow = String::new();
    let mut sessions = Vec::new();

    for (index, event) in ordered.iter().enumerate() {
        clock.set(event.timestamp);
        match event.kind {
            ComposeEventKind::Start => {
                tracker.start();
                shadow.clear();
            }
            ComposeEventKind::Change => {
                let content = clamp(required_content(event, index)?);
                let previous = match event.previous.as_deref() {
                    Some(previous) => clamp(previous),
                    None => shadow.clone(),
                };
                tracker.record_change(&content, &previous);
                shadow = content;
            }
            ComposeEventKind::Finish => {
                let content = clamp(required_content(event, index)?);
                sessions.push(tracker.finish(&content));
            }
            ComposeEventKind::Reset => {
                tracker.reset();
                shadow.clear();
            }
        }
    }

    tracing::debug!(
        events = ordered.len(),
        sessions = sessions.len(),
        "replayed composition events"
    );
    Ok(sessions)
}

/// Replay an event log JSON document into report JSON (stateless, one-shot)
pub fn replay_to_json(json: &str) -> Result<String, ComposeError> {
    let log = parse_event_log(json)?;
    let report = replay_log(&log)?;
    serde_json::to_string(&report).map_err(|e| ComposeError::EncodingError(e.to_string()))
}

/// Replay a parsed log into a report
pub fn replay_log(log: &EventLog) -> Result<ReplayReport, ComposeError> {
    Ok(ReplayReport {
        producer: Producer::default(),
        session_id: log.session_id.clone(),
        sessions: replay_events(&log.events)?,
    })
}

fn required_content(event: &ComposeEvent, index: usize) -> Result<&str, ComposeError> {
    event
        .content
        .as_deref()
        .ok_or_else(|| ComposeError::MissingField(format!("content (event {})", index)))
}
