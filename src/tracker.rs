//! Composition behavior tracking
//!
//! Observes a single free-text input session and derives [`SessionMetrics`]:
//! how long the user wrote, how many characters they removed, the longest the
//! text ever got, and its final length.
//!
//! Lengths are counted in Unicode scalar values. Every net shrinkage between
//! two observed contents is counted as correction, whether it came from a
//! single backspace, a word deletion or a shorter paste.

use chrono::{DateTime, Utc};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::clock::{Clock, SystemClock};
use crate::types::SessionMetrics;

/// Tracks one composition session at a time
#[derive(Debug, Clone)]
pub struct CompositionTracker<C: Clock = SystemClock> {
    clock: C,
    start_time: Option<DateTime<Utc>>,
    backspace_count: u64,
    max_char_count: u64,
    /// Fingerprint of the last `record_change` inputs
    last_edit: Option<u64>,
}

impl Default for CompositionTracker<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositionTracker<SystemClock> {
    /// Create a tracker on the wall clock
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> CompositionTracker<C> {
    /// Create a tracker on a custom clock
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            start_time: None,
            backspace_count: 0,
            max_char_count: 0,
            last_edit: None,
        }
    }

    /// Begin a new session, discarding any session in progress
    pub fn start(&mut self) {
        let now = self.clock.now();
        if self.start_time.is_some() {
            tracing::debug!("restarting composition session in progress");
        }
        self.start_time = Some(now);
        self.backspace_count = 0;
        self.max_char_count = 0;
        self.last_edit = None;
        tracing::debug!(started_at = %now, "composition session started");
    }

    /// Observe one edit of the content.
    ///
    /// `previous_content` is empty on the first edit of a session. Delivering
    /// the same pair twice in a row counts it once.
    pub fn record_change(&mut self, new_content: &str, previous_content: &str) {
        let fingerprint = edit_fingerprint(new_content, previous_content);
        if self.last_edit == Some(fingerprint) {
            return;
        }
        self.last_edit = Some(fingerprint);

        let new_len = char_len(new_content);
        self.max_char_count = self.max_char_count.max(new_len);

        let previous_len = char_len(previous_content);
        if new_len < previous_len {
            self.backspace_count += previous_len - new_len;
        }
    }

    /// Summarize the session. State is left intact until [`reset`](Self::reset).
    pub fn finish(&self, final_content: &str) -> SessionMetrics {
        let writing_duration_sec = match self.start_time {
            Some(start) => rounded_seconds(self.clock.now(), start),
            None => 0,
        };

        SessionMetrics {
            writing_duration_sec,
            backspace_count: self.backspace_count,
            max_char_count: self.max_char_count,
            final_char_count: char_len(final_content),
        }
    }

    /// Abandon the session without producing metrics
    pub fn reset(&mut self) {
        self.start_time = None;
        self.backspace_count = 0;
        self.max_char_count = 0;
        self.last_edit = None;
        tracing::debug!("composition session reset");
    }

    pub fn is_started(&self) -> bool {
        self.start_time.is_some()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn backspace_count(&self) -> u64 {
        self.backspace_count
    }

    pub fn max_char_count(&self) -> u64 {
        self.max_char_count
    }
}

fn char_len(content: &str) -> u64 {
    content.chars().count() as u64
}

fn edit_fingerprint(new_content: &str, previous_content: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    new_content.hash(&mut hasher);
    previous_content.hash(&mut hasher);
    hasher.finish()
}

/// Elapsed whole seconds, rounded half up. A clock that ran backwards gives 0.
fn rounded_seconds(now: DateTime<Utc>, start: DateTime<Utc>) -> u64 {
    let elapsed_ms = (now - start).num_milliseconds();
    if elapsed_ms <= 0 {
        return 0;
    }
    (elapsed_ms as u64 + 500) / 1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn manual_tracker() -> (CompositionTracker<ManualClock>, ManualClock) {
        let clock = ManualClock::new("2024-01-15T14:00:00Z".parse().unwrap());
        (CompositionTracker::with_clock(clock.clone()), clock)
    }

    #[test]
    fn test_type_then_delete_scenario() {
        let (mut tracker, _clock) = manual_tracker();

        tracker.start();
        tracker.record_change("a", "");
        tracker.record_change("ab", "a");
        tracker.record_change("a", "ab");
        let metrics = tracker.finish("a");

        assert_eq!(metrics.backspace_count, 1);
        assert_eq!(metrics.max_char_count, 2);
        assert_eq!(metrics.final_char_count, 1);
    }

    #[test]
    fn test_finish_right_after_start() {
        let (mut tracker, _clock) = manual_tracker();

        tracker.start();
        let metrics = tracker.finish("hello");

        assert_eq!(
            metrics,
            SessionMetrics {
                writing_duration_sec: 0,
                backspace_count: 0,
                max_char_count: 0,
                final_char_count: 5,
            }
        );
    }

    #[test]
    fn test_duration_rounds_to_nearest_second() {
        let (mut tracker, clock) = manual_tracker();

        tracker.start();
        clock.advance(Duration::milliseconds(42_499));
        assert_eq!(tracker.finish("").writing_duration_sec, 42);

        clock.advance(Duration::milliseconds(1));
        assert_eq!(tracker.finish("").writing_duration_sec, 43);
    }

    #[test]
    fn test_clock_running_backwards_gives_zero_duration() {
        let (mut tracker, clock) = manual_tracker();

        tracker.start();
        clock.advance(Duration::seconds(-30));
        assert_eq!(tracker.finish("x").writing_duration_sec, 0);
    }

    #[test]
    fn test_changes_before_start_still_count() {
        let (mut tracker, clock) = manual_tracker();

        tracker.record_change("abc", "");
        tracker.record_change("a", "abc");
        clock.advance(Duration::seconds(60));
        let metrics = tracker.finish("a");

        assert_eq!(metrics.writing_duration_sec, 0);
        assert_eq!(metrics.backspace_count, 2);
        assert_eq!(metrics.max_char_count, 3);
        assert!(!tracker.is_started());
    }

    #[test]
    fn test_reset_behaves_like_no_session() {
        let (mut tracker, clock) = manual_tracker();

        tracker.start();
        tracker.record_change("hello", "");
        tracker.record_change("he", "hello");
        clock.advance(Duration::seconds(20));
        tracker.reset();

        assert_eq!(
            tracker.finish("xyz"),
            SessionMetrics {
                writing_duration_sec: 0,
                backspace_count: 0,
                max_char_count: 0,
                final_char_count: 3,
            }
        );
        assert!(tracker.started_at().is_none());
    }

    #[test]
    fn test_finish_does_not_clear_state() {
        let (mut tracker, clock) = manual_tracker();

        tracker.start();
        tracker.record_change("abcd", "");
        tracker.record_change("ab", "abcd");
        clock.advance(Duration::seconds(5));

        let first = tracker.finish("ab");
        let second = tracker.finish("ab");
        assert_eq!(first, second);
        assert_eq!(tracker.backspace_count(), 2);
        assert_eq!(tracker.max_char_count(), 4);
    }

    #[test]
    fn test_restart_discards_counters_and_restarts_clock() {
        let (mut tracker, clock) = manual_tracker();

        tracker.start();
        tracker.record_change("draft", "");
        tracker.record_change("", "draft");
        clock.advance(Duration::seconds(100));

        tracker.start();
        clock.advance(Duration::seconds(3));
        let metrics = tracker.finish("");

        assert_eq!(metrics.writing_duration_sec, 3);
        assert_eq!(metrics.backspace_count, 0);
        assert_eq!(metrics.max_char_count, 0);
    }

    #[test]
    fn test_redelivered_edit_counted_once() {
        let (mut tracker, _clock) = manual_tracker();

        tracker.start();
        tracker.record_change("hello", "");
        tracker.record_change("hel", "hello");
        tracker.record_change("hel", "hello");

        assert_eq!(tracker.backspace_count(), 2);
    }

    #[test]
    fn test_multi_character_shrink_counts_fully() {
        let (mut tracker, _clock) = manual_tracker();

        tracker.start();
        tracker.record_change("a long sentence", "");
        tracker.record_change("short", "a long sentence");

        assert_eq!(tracker.backspace_count(), 10);
        assert_eq!(tracker.max_char_count(), 15);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let (mut tracker, _clock) = manual_tracker();

        tracker.start();
        tracker.record_change("こんにちは", "");
        tracker.record_change("こん", "こんにちは");
        let metrics = tracker.finish("こん");

        assert_eq!(metrics.max_char_count, 5);
        assert_eq!(metrics.backspace_count, 3);
        assert_eq!(metrics.final_char_count, 2);
    }

    #[test]
    fn test_counters_match_observed_sequence() {
        let contents = ["", "h", "he", "hel", "he", "help", "h", "", "hi", "hi there", "hi"];
        let (mut tracker, _clock) = manual_tracker();

        tracker.start();
        for pair in contents.windows(2) {
            tracker.record_change(pair[1], pair[0]);
        }

        let expected_max = contents.iter().map(|c| c.chars().count() as u64).max().unwrap();
        let expected_backspaces: u64 = contents
            .windows(2)
            .map(|p| {
                let (prev, next) = (p[0].chars().count() as u64, p[1].chars().count() as u64);
                prev.saturating_sub(next)
            })
            .sum();

        assert_eq!(tracker.max_char_count(), expected_max);
        assert_eq!(tracker.backspace_count(), expected_backspaces);
    }
}
