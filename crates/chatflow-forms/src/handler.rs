use tracing::debug;

use crate::outcome::{with_prompt, Outcome};
use crate::processor::Processor;

type CommitFn<C, T> = Box<dyn FnMut(&mut C, &T) -> Option<String> + Send>;

/// Puts a business-rule commit step behind a processor.
///
/// Structural completion (the processor produced a value) and acceptance
/// (the commit callback agreed) are separate phases. When the commit rejects
/// the value, the rejection text is shown with the current prompt and the
/// processor is left untouched, so the user stays on the last step instead
/// of re-entering every field.
///
/// `C` is whatever context the commit needs, e.g. the session being served.
pub struct Handler<P: Processor, C> {
    processor: P,
    commit: CommitFn<C, P::Output>,
}

impl<P: Processor, C> Handler<P, C> {
    /// `commit` returns `None` to accept the value or `Some(reason)` to reject it.
    pub fn new(
        processor: P,
        commit: impl FnMut(&mut C, &P::Output) -> Option<String> + Send + 'static,
    ) -> Self {
        Self {
            processor,
            commit: Box::new(commit),
        }
    }

    /// A handler whose commit always accepts.
    pub fn infallible(processor: P) -> Self {
        Self::new(processor, |_, _| None)
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Feed one message through the processor and, once it completes, the commit.
    ///
    /// An accepted value resets the processor so the handler can run again;
    /// so does a cancel.
    pub fn process_input(&mut self, ctx: &mut C, input: &str) -> Outcome<P::Output> {
        match self.processor.process_input(input) {
            Outcome::Success(value) => match (self.commit)(ctx, &value) {
                None => {
                    self.processor.reset();
                    Outcome::Success(value)
                }
                Some(reason) => {
                    debug!(%reason, "commit rejected completed input");
                    Outcome::Retry(with_prompt(&reason, &self.processor.default_response()))
                }
            },
            Outcome::Retry(msg) => Outcome::Retry(msg),
            Outcome::Cancel => {
                self.processor.reset();
                Outcome::Cancel
            }
        }
    }

    pub fn default_response(&self) -> String {
        self.processor.default_response()
    }

    pub fn reset(&mut self) {
        self.processor.reset();
    }
}
