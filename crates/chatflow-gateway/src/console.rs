//! Line protocol of the stdin adapter.
//!
//! Every line is one inbound message. A line starting with `@<id>` switches
//! the current principal first; whatever follows the id is sent as that
//! principal. `@<id>` alone only switches.

use chatflow_core::PrincipalId;
use chatflow_dispatch::Message;

pub struct Console {
    current: PrincipalId,
}

impl Console {
    pub fn new(principal: impl Into<PrincipalId>) -> Self {
        Self {
            current: principal.into(),
        }
    }

    pub fn current(&self) -> &PrincipalId {
        &self.current
    }

    /// Turn one input line into the message to dispatch, if any.
    pub fn read_line(&mut self, line: &str) -> Option<Message> {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some(rest) = line.strip_prefix('@') else {
            return Some(Message::new(self.current.clone(), line));
        };

        let (id, text) = match rest.split_once(' ') {
            Some((id, text)) => (id, Some(text)),
            None => (rest, None),
        };
        if id.is_empty() {
            return Some(Message::new(self.current.clone(), line));
        }
        self.current = PrincipalId::new(id);
        text.map(|text| Message::new(self.current.clone(), text))
    }
}
