/// What a processor made of one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// Input accepted and the processor produced its value.
    Success(T),
    /// Input consumed without producing a value; reply with this text and
    /// wait for the next message.
    ///
    /// Covers rejected input (explanation followed by the standing prompt)
    /// and forward progress inside composites (the next field's prompt).
    Retry(String),
    /// The user asked to abandon the whole flow.
    Cancel,
}

impl<T> Outcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(v) => Outcome::Success(f(v)),
            Outcome::Retry(msg) => Outcome::Retry(msg),
            Outcome::Cancel => Outcome::Cancel,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, Outcome::Cancel)
    }

    /// The value, if the processor finished.
    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success(v) => Some(v),
            _ => None,
        }
    }

    /// The reply text, if the processor wants another message.
    pub fn retry_message(&self) -> Option<&str> {
        match self {
            Outcome::Retry(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Join an explanation and the standing prompt into one reply.
pub fn with_prompt(explanation: &str, prompt: &str) -> String {
    match (explanation.is_empty(), prompt.is_empty()) {
        (true, _) => prompt.to_string(),
        (false, true) => explanation.to_string(),
        (false, false) => format!("{}\n{}", explanation, prompt),
    }
}
