//! Single-value processors.
//!
//! Every leaf checks the cancel keywords before parsing, so a user can leave
//! a flow from any step. Leaves hold no accumulated input; `reset` is a no-op.

use std::sync::Arc;

use chatflow_core::config::EngineConfig;

use crate::list::ListProcessor;
use crate::lookup::{Lookup, LookupProcessor};
use crate::outcome::{with_prompt, Outcome};
use crate::pipe::Pipe;
use crate::processor::{CancelWords, Processor, Prompt};
use crate::validate;

type ParseFn<T> = Box<dyn FnMut(&str) -> Result<T, String> + Send>;

/// A processor that parses one trimmed message into a `T`.
pub struct Leaf<T> {
    prompt: Prompt,
    parse: ParseFn<T>,
    cancel: CancelWords,
}

impl<T> Leaf<T> {
    /// Build a leaf from a parse function. `Err(msg)` re-prompts with `msg`.
    pub fn new(
        prompt: impl Into<Prompt>,
        parse: impl FnMut(&str) -> Result<T, String> + Send + 'static,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            parse: Box::new(parse),
            cancel: CancelWords::default(),
        }
    }

    pub fn cancel_on(mut self, cancel: CancelWords) -> Self {
        self.cancel = cancel;
        self
    }
}

impl<T> Processor for Leaf<T> {
    type Output = T;

    fn process_input(&mut self, input: &str) -> Outcome<T> {
        if self.cancel.matches(input) {
            return Outcome::Cancel;
        }
        match (self.parse)(input.trim()) {
            Ok(value) => Outcome::Success(value),
            Err(explanation) => Outcome::Retry(with_prompt(&explanation, &self.prompt.render())),
        }
    }

    fn default_response(&self) -> String {
        self.prompt.render()
    }

    fn reset(&mut self) {}
}

pub const BLANK_TEXT: &str = "Please send some text.";
pub const NOT_UNSIGNED_INT: &str = "Please enter a non-negative whole number.";
pub const NOT_UNSIGNED_FLOAT: &str = "Please enter a non-negative number.";
pub const NOT_YES_NO: &str = "Please answer \"yes\" or \"no\".";
pub const INVALID_EMAIL: &str = "The given text is not a valid email.";
pub const INVALID_LINK: &str = "The given link is invalid.";
pub const INVALID_PHONE: &str = "The given text is not a valid phone number.";
pub const UNKNOWN_OPTION: &str = "Unknown option.";

/// Processor constructors sharing the engine settings: the cancel keywords,
/// the list cap and the lookup attempt cap.
///
/// The free functions in this module use the defaults; flows built from
/// configuration keep a `Leaves` around instead.
#[derive(Debug, Clone)]
pub struct Leaves {
    cancel: CancelWords,
    max_list_items: usize,
    lookup_attempts: u32,
}

impl Leaves {
    /// Default caps with custom cancel keywords.
    pub fn new(cancel: CancelWords) -> Self {
        Self {
            cancel,
            ..Self::default()
        }
    }

    /// Any non-blank text.
    pub fn text(&self, prompt: impl Into<Prompt>) -> Leaf<String> {
        Leaf::new(prompt, |s| {
            if s.is_empty() {
                Err(BLANK_TEXT.to_string())
            } else {
                Ok(s.to_string())
            }
        })
        .cancel_on(self.cancel.clone())
    }

    pub fn unsigned_int(&self, prompt: impl Into<Prompt>) -> Leaf<u32> {
        Leaf::new(prompt, |s| s.parse::<u32>().map_err(|_| NOT_UNSIGNED_INT.to_string()))
            .cancel_on(self.cancel.clone())
    }

    pub fn unsigned_float(&self, prompt: impl Into<Prompt>) -> Leaf<f64> {
        Leaf::new(prompt, |s| match s.replace(',', ".").parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
            _ => Err(NOT_UNSIGNED_FLOAT.to_string()),
        })
        .cancel_on(self.cancel.clone())
    }

    pub fn yes_no(&self, prompt: impl Into<Prompt>) -> Leaf<bool> {
        Leaf::new(prompt, |s| match s.to_lowercase().as_str() {
            "sí" | "si" | "s" | "yes" | "y" => Ok(true),
            "no" | "n" => Ok(false),
            _ => Err(NOT_YES_NO.to_string()),
        })
        .cancel_on(self.cancel.clone())
    }

    /// One of a fixed set of commands, e.g. `/normal`, `/scheduled`.
    ///
    /// The option commands are matched exactly after trimming.
    pub fn choice<T>(&self, prompt: impl Into<Prompt>, options: Vec<(String, T)>) -> Leaf<T>
    where
        T: Clone + Send + 'static,
    {
        Leaf::new(prompt, move |s| {
            options
                .iter()
                .find(|(command, _)| command == s)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| UNKNOWN_OPTION.to_string())
        })
        .cancel_on(self.cancel.clone())
    }

    /// Text that must look like an email address.
    pub fn email(&self, prompt: impl Into<Prompt>) -> Pipe<Leaf<String>, String> {
        self.text(prompt).pipe(|s| {
            if validate::is_valid_email(&s) {
                Ok(s)
            } else {
                Err(INVALID_EMAIL.to_string())
            }
        })
    }

    /// Text that must be an http(s) link.
    pub fn link(&self, prompt: impl Into<Prompt>) -> Pipe<Leaf<String>, String> {
        self.text(prompt).pipe(|s| {
            if validate::is_valid_link(&s) {
                Ok(s)
            } else {
                Err(INVALID_LINK.to_string())
            }
        })
    }

    /// A phone number, kept as typed.
    pub fn phone(&self, prompt: impl Into<Prompt>) -> Pipe<Leaf<String>, String> {
        self.text(prompt).pipe(|s| {
            if validate::is_valid_phone(&s) {
                Ok(s)
            } else {
                Err(INVALID_PHONE.to_string())
            }
        })
    }

    /// Repeat `item` until the user finishes the list or the cap is reached.
    pub fn list<P: Processor>(&self, header: impl Into<Prompt>, item: P) -> ListProcessor<P> {
        ListProcessor::new(header, item).with_max_items(self.max_list_items)
    }

    /// Resolve the user's text through `service`, within the attempt cap.
    pub fn lookup<L>(&self, prompt: impl Into<Prompt>, service: Arc<L>) -> LookupProcessor<L>
    where
        L: Lookup + ?Sized,
    {
        LookupProcessor::new(prompt, service, self.lookup_attempts).cancel_on(self.cancel.clone())
    }
}

impl Default for Leaves {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for Leaves {
    fn from(config: &EngineConfig) -> Self {
        Self {
            cancel: CancelWords::from(config),
            max_list_items: config.max_list_items,
            lookup_attempts: config.lookup_attempts,
        }
    }
}

pub fn text(prompt: impl Into<Prompt>) -> Leaf<String> {
    Leaves::default().text(prompt)
}

pub fn unsigned_int(prompt: impl Into<Prompt>) -> Leaf<u32> {
    Leaves::default().unsigned_int(prompt)
}

pub fn unsigned_float(prompt: impl Into<Prompt>) -> Leaf<f64> {
    Leaves::default().unsigned_float(prompt)
}

pub fn yes_no(prompt: impl Into<Prompt>) -> Leaf<bool> {
    Leaves::default().yes_no(prompt)
}

pub fn choice<T: Clone + Send + 'static>(
    prompt: impl Into<Prompt>,
    options: Vec<(String, T)>,
) -> Leaf<T> {
    Leaves::default().choice(prompt, options)
}

pub fn email(prompt: impl Into<Prompt>) -> Pipe<Leaf<String>, String> {
    Leaves::default().email(prompt)
}

pub fn link(prompt: impl Into<Prompt>) -> Pipe<Leaf<String>, String> {
    Leaves::default().link(prompt)
}

pub fn phone(prompt: impl Into<Prompt>) -> Pipe<Leaf<String>, String> {
    Leaves::default().phone(prompt)
}
