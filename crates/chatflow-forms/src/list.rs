use crate::outcome::{with_prompt, Outcome};
use crate::processor::{Processor, Prompt};

/// Sent alone, finishes a list. A blank message does too, where the chat
/// platform can deliver one.
pub const FINISH_COMMAND: &str = "/done";

/// Collects values from an item processor, one per message, until the user
/// sends an empty message (or [`FINISH_COMMAND`]).
///
/// The item processor is reset after every accepted item, so a single
/// instance is cycled through the whole list.
pub struct ListProcessor<P: Processor> {
    header: Prompt,
    item: P,
    items: Vec<P::Output>,
    max_items: usize,
}

impl<P: Processor> ListProcessor<P> {
    pub fn new(header: impl Into<Prompt>, item: P) -> Self {
        Self {
            header: header.into(),
            item,
            items: Vec::new(),
            max_items: chatflow_core::config::DEFAULT_MAX_LIST_ITEMS,
        }
    }

    /// Finish automatically once `max_items` values were collected.
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items.max(1);
        self
    }

    pub fn collected(&self) -> &[P::Output] {
        &self.items
    }

    fn finish(&mut self) -> Outcome<Vec<P::Output>> {
        self.item.reset();
        Outcome::Success(std::mem::take(&mut self.items))
    }
}

impl<P> Processor for ListProcessor<P>
where
    P: Processor,
    P::Output: Send,
{
    type Output = Vec<P::Output>;

    fn process_input(&mut self, input: &str) -> Outcome<Self::Output> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(FINISH_COMMAND) {
            return self.finish();
        }

        match self.item.process_input(input) {
            Outcome::Success(value) => {
                self.items.push(value);
                self.item.reset();
                if self.items.len() >= self.max_items {
                    return self.finish();
                }
                Outcome::Retry(with_prompt(
                    &format!(
                        "Added ({} so far). Send an empty message or {} to finish.",
                        self.items.len(),
                        FINISH_COMMAND
                    ),
                    &self.item.default_response(),
                ))
            }
            Outcome::Retry(msg) => Outcome::Retry(msg),
            Outcome::Cancel => Outcome::Cancel,
        }
    }

    fn default_response(&self) -> String {
        if self.items.is_empty() {
            with_prompt(&self.header.render(), &self.item.default_response())
        } else {
            self.item.default_response()
        }
    }

    fn reset(&mut self) {
        self.items.clear();
        self.item.reset();
    }
}
