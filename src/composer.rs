//! Answer composition
//!
//! [`AnswerComposer`] is the host side of the tracker for the daily question:
//! it owns the answer text and the copy of the previous content that every
//! edit is compared against, starts tracking on the first focus of a new
//! answer, and turns a submit into an [`AnswerSubmission`] for the data store.

use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::ComposerConfig;
use crate::error::ComposeError;
use crate::tracker::CompositionTracker;
use crate::types::{AnswerSubmission, SubmissionTarget};

/// Composer for one user's answer to one question
#[derive(Debug)]
pub struct AnswerComposer<C: Clock = SystemClock> {
    question_id: String,
    config: ComposerConfig,
    tracker: CompositionTracker<C>,
    text: String,
    /// Content as of the previous edit
    previous: String,
    is_public: bool,
    existing_answer_id: Option<String>,
}

impl AnswerComposer<SystemClock> {
    pub fn new(question_id: impl Into<String>, config: ComposerConfig) -> Result<Self, ComposeError> {
        Self::with_clock(question_id, config, SystemClock)
    }
}

impl<C: Clock> AnswerComposer<C> {
    pub fn with_clock(
        question_id: impl Into<String>,
        config: ComposerConfig,
        clock: C,
    ) -> Result<Self, ComposeError> {
        config.validate()?;
        Ok(Self {
            question_id: question_id.into(),
            config,
            tracker: CompositionTracker::with_clock(clock),
            text: String::new(),
            previous: String::new(),
            is_public: true,
            existing_answer_id: None,
        })
    }

    /// Load the answer the user already posted for this question
    pub fn load_existing(&mut self, answer_id: impl Into<String>, text: impl Into<String>, is_public: bool) {
        let text = text.into();
        self.existing_answer_id = Some(answer_id.into());
        self.previous = text.clone();
        self.text = text;
        self.is_public = is_public;
    }

    /// Input focus. Only the first focus of a new answer starts a session.
    pub fn focus(&mut self) {
        if self.existing_answer_id.is_none() && !self.tracker.is_started() {
            self.tracker.start();
        }
    }

    /// Apply an edit and return the text actually accepted
    pub fn input(&mut self, new_text: &str) -> &str {
        let accepted = self.config.clamp_answer(new_text);
        self.tracker.record_change(&accepted, &self.previous);
        self.previous = accepted.clone();
        self.text = accepted;
        &self.text
    }

    pub fn set_public(&mut self, is_public: bool) {
        self.is_public = is_public;
    }

    /// Finalize the session into a submission and prepare for the next one.
    ///
    /// Blank answers are rejected and leave the session untouched. After a
    /// first answer is inserted the composer edits that answer, keyed by the
    /// submission id until [`confirm_inserted`](Self::confirm_inserted).
    pub fn submit(&mut self) -> Result<AnswerSubmission, ComposeError> {
        if self.text.trim().is_empty() {
            return Err(ComposeError::EmptyAnswer);
        }

        let metrics = self.tracker.finish(&self.text);
        let target = match &self.existing_answer_id {
            Some(answer_id) => SubmissionTarget::Update {
                answer_id: answer_id.clone(),
            },
            None => SubmissionTarget::Insert {
                question_id: self.question_id.clone(),
            },
        };

        let submission = AnswerSubmission {
            submission_id: Uuid::new_v4(),
            target,
            answer_text: self.text.clone(),
            is_public: self.is_public,
            metrics,
        };

        tracing::info!(
            question_id = %self.question_id,
            writing_duration_sec = metrics.writing_duration_sec,
            backspace_count = metrics.backspace_count,
            max_char_count = metrics.max_char_count,
            final_char_count = metrics.final_char_count,
            "answer submitted"
        );

        if self.existing_answer_id.is_none() {
            self.existing_answer_id = Some(submission.submission_id.to_string());
        }
        self.tracker.reset();
        self.previous = self.text.clone();
        Ok(submission)
    }

    /// Replace the provisional answer id with the one assigned by the data store
    pub fn confirm_inserted(&mut self, answer_id: impl Into<String>) {
        self.existing_answer_id = Some(answer_id.into());
    }

    /// Drop the session without producing metrics
    pub fn abandon(&mut self) {
        self.tracker.reset();
        self.previous.clear();
    }

    pub fn question_id(&self) -> &str {
        &self.question_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn existing_answer_id(&self) -> Option<&str> {
        self.existing_answer_id.as_deref()
    }

    pub fn tracker(&self) -> &CompositionTracker<C> {
        &self.tracker
    }
}
