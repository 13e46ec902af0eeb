//! Leaves backed by a blocking collaborator (geocoding, distance services).

use std::sync::Arc;

use chatflow_core::retry::{retry_bounded, RetryError};
use thiserror::Error;
use tracing::warn;

use crate::outcome::{with_prompt, Outcome};
use crate::processor::{CancelWords, Processor, Prompt};

pub const LOOKUP_UNAVAILABLE: &str =
    "The service could not resolve that right now. Please try again.";

#[derive(Debug, Error)]
pub enum LookupError {
    /// The service failed in a way that may go away (timeout, 5xx, …).
    #[error("lookup service unavailable: {0}")]
    Unavailable(String),

    /// The service understood the query and refused it. The text is shown
    /// to the user.
    #[error("{0}")]
    Rejected(String),
}

impl LookupError {
    pub fn is_transient(&self) -> bool {
        matches!(self, LookupError::Unavailable(_))
    }
}

/// A synchronous query against an external service.
///
/// Implementations own their own timeout; the processor owns the retry cap.
pub trait Lookup: Send + Sync {
    type Output;

    fn lookup(&self, query: &str) -> Result<Self::Output, LookupError>;
}

/// Resolves the user's text through a [`Lookup`], retrying transient
/// failures up to an injected number of attempts.
pub struct LookupProcessor<L: Lookup + ?Sized> {
    prompt: Prompt,
    service: Arc<L>,
    max_attempts: u32,
    cancel: CancelWords,
}

impl<L: Lookup + ?Sized> LookupProcessor<L> {
    pub fn new(prompt: impl Into<Prompt>, service: Arc<L>, max_attempts: u32) -> Self {
        Self {
            prompt: prompt.into(),
            service,
            max_attempts,
            cancel: CancelWords::default(),
        }
    }

    pub fn cancel_on(mut self, cancel: CancelWords) -> Self {
        self.cancel = cancel;
        self
    }
}

impl<L: Lookup + ?Sized> Processor for LookupProcessor<L> {
    type Output = L::Output;

    fn process_input(&mut self, input: &str) -> Outcome<L::Output> {
        if self.cancel.matches(input) {
            return Outcome::Cancel;
        }
        let query = input.trim();
        if query.is_empty() {
            return Outcome::Retry(self.prompt.render());
        }

        let service = &self.service;
        match retry_bounded(self.max_attempts, LookupError::is_transient, |_| {
            service.lookup(query)
        }) {
            Ok(value) => Outcome::Success(value),
            Err(RetryError::Permanent(LookupError::Rejected(reason))) => {
                Outcome::Retry(with_prompt(&reason, &self.prompt.render()))
            }
            Err(e) => {
                warn!(error = %e, "lookup failed");
                Outcome::Retry(with_prompt(LOOKUP_UNAVAILABLE, &self.prompt.render()))
            }
        }
    }

    fn default_response(&self) -> String {
        self.prompt.render()
    }

    fn reset(&mut self) {}
}
