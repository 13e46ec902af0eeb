use chatflow_forms::outcome::with_prompt;

use crate::context::SessionContext;
use crate::menu::MenuState;
use crate::pipeline::PipelineState;
use crate::wrapper::WrapperState;

/// A node of a session's conversation.
///
/// Every session is in exactly one state. A state answers a message either
/// by staying put with a reply, or by handing the session to another state.
pub enum State {
    Menu(MenuState),
    Pipeline(PipelineState),
    Wrapper(Box<WrapperState>),
}

impl State {
    /// Handle one message on behalf of the session in `ctx`.
    pub fn process_message(&mut self, ctx: &mut SessionContext, text: &str) -> Reply {
        match self {
            State::Menu(menu) => menu.process_message(ctx, text),
            State::Pipeline(pipeline) => pipeline.process_message(ctx, text),
            State::Wrapper(wrapper) => wrapper.process_message(ctx, text),
        }
    }

    /// What the state says when the session lands on it.
    pub fn default_response(&self) -> String {
        match self {
            State::Menu(menu) => menu.default_response(),
            State::Pipeline(pipeline) => pipeline.default_response(),
            State::Wrapper(wrapper) => wrapper.default_response(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            State::Menu(_) => "menu",
            State::Pipeline(_) => "pipeline",
            State::Wrapper(_) => "wrapper",
        }
    }
}

impl From<MenuState> for State {
    fn from(menu: MenuState) -> Self {
        State::Menu(menu)
    }
}

impl From<PipelineState> for State {
    fn from(pipeline: PipelineState) -> Self {
        State::Pipeline(pipeline)
    }
}

impl From<WrapperState> for State {
    fn from(wrapper: WrapperState) -> Self {
        State::Wrapper(Box::new(wrapper))
    }
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("State").field(&self.kind()).finish()
    }
}

/// How a state answered one message.
#[derive(Debug)]
pub enum Reply {
    /// Keep the current state and send this text.
    Stay(String),
    /// Move the session to `next`. The user is sent `notice` (if any)
    /// followed by the new state's default response.
    Goto { next: State, notice: Option<String> },
}

impl Reply {
    pub fn goto(next: impl Into<State>) -> Self {
        Reply::Goto {
            next: next.into(),
            notice: None,
        }
    }
}

/// What an action (a menu command, a pipeline's completion or cancel path)
/// decided: optionally a new state, optionally a message for the user.
#[derive(Debug, Default)]
pub struct Transition {
    pub next: Option<State>,
    pub notice: Option<String>,
}

impl Transition {
    /// Stay in the current state.
    pub fn stay() -> Self {
        Self::default()
    }

    pub fn to(next: impl Into<State>) -> Self {
        Self {
            next: Some(next.into()),
            notice: None,
        }
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }

    /// Turn the transition into a reply from the state that produced it.
    ///
    /// Staying always re-sends the current prompt so the reply is never empty.
    pub fn into_reply(self, current_prompt: impl FnOnce() -> String) -> Reply {
        match self.next {
            Some(next) => Reply::Goto {
                next,
                notice: self.notice,
            },
            None => Reply::Stay(with_prompt(
                self.notice.as_deref().unwrap_or_default(),
                &current_prompt(),
            )),
        }
    }
}
