use std::fmt;
use std::sync::Arc;

use crate::outcome::Outcome;
use crate::pipe::Pipe;

/// Converts text messages, one at a time, into a value of type `Output`.
///
/// Implementations must be `Send` so the state holding them can live in a
/// session shared across worker threads.
pub trait Processor: Send {
    type Output;

    /// Consume one message.
    fn process_input(&mut self, input: &str) -> Outcome<Self::Output>;

    /// The prompt describing the input currently expected.
    fn default_response(&self) -> String;

    /// Return to the initial state so the instance can be used again.
    fn reset(&mut self);

    /// Validate or transform the value this processor produces.
    fn pipe<B, F>(self, f: F) -> Pipe<Self, B>
    where
        Self: Sized,
        F: FnMut(Self::Output) -> Result<B, String> + Send + 'static,
    {
        Pipe::new(self, f)
    }
}

impl<P: Processor + ?Sized> Processor for Box<P> {
    type Output = P::Output;

    fn process_input(&mut self, input: &str) -> Outcome<Self::Output> {
        (**self).process_input(input)
    }

    fn default_response(&self) -> String {
        (**self).default_response()
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// A prompt, either fixed or computed each time it is shown.
#[derive(Clone)]
pub struct Prompt(Arc<dyn Fn() -> String + Send + Sync>);

impl Prompt {
    pub fn fixed(text: impl Into<String>) -> Self {
        let text = text.into();
        Self(Arc::new(move || text.clone()))
    }

    pub fn dynamic(f: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn render(&self) -> String {
        (self.0)()
    }
}

impl From<&str> for Prompt {
    fn from(s: &str) -> Self {
        Prompt::fixed(s)
    }
}

impl From<String> for Prompt {
    fn from(s: String) -> Self {
        Prompt::fixed(s)
    }
}

impl fmt::Debug for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Prompt").field(&self.render()).finish()
    }
}

/// The keyword family that abandons a flow from any step.
#[derive(Debug, Clone)]
pub struct CancelWords(Arc<[String]>);

impl CancelWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.into().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self(words.into())
    }

    /// True when the whole message is one of the keywords.
    pub fn matches(&self, input: &str) -> bool {
        let input = input.trim();
        self.0.iter().any(|w| w.eq_ignore_ascii_case(input))
    }

    pub fn words(&self) -> &[String] {
        &self.0
    }
}

impl Default for CancelWords {
    fn default() -> Self {
        Self::new(chatflow_core::config::EngineConfig::default().cancel_keywords)
    }
}

impl From<&chatflow_core::config::EngineConfig> for CancelWords {
    fn from(config: &chatflow_core::config::EngineConfig) -> Self {
        Self::new(config.cancel_keywords.iter().cloned())
    }
}
