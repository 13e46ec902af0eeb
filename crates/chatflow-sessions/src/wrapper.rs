use chatflow_forms::outcome::with_prompt;
use tracing::debug;

use crate::context::SessionContext;
use crate::state::{Reply, State};

/// A named state that delegates to another one.
///
/// Lets a flow expose a pre-built menu or pipeline under its own name,
/// optionally with a header shown above the inner prompt. Once the inner
/// state moves on, the wrapper is gone with it.
pub struct WrapperState {
    label: String,
    header: Option<String>,
    inner: State,
}

impl WrapperState {
    pub fn new(label: impl Into<String>, inner: impl Into<State>) -> Self {
        Self {
            label: label.into(),
            header: None,
            inner: inner.into(),
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn inner(&self) -> &State {
        &self.inner
    }

    pub fn process_message(&mut self, ctx: &mut SessionContext, text: &str) -> Reply {
        debug!(principal = %ctx.id, state = %self.label, "delegating message");
        self.inner.process_message(ctx, text)
    }

    pub fn default_response(&self) -> String {
        let prompt = self.inner.default_response();
        match &self.header {
            Some(header) => with_prompt(header, &prompt),
            None => prompt,
        }
    }
}
