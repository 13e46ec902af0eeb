use tracing::debug;

use crate::context::SessionContext;
use crate::state::{Reply, Transition};

type Action = Box<dyn FnMut(&mut SessionContext) -> Transition + Send>;

/// One entry of a [`MenuState`].
pub struct MenuCommand {
    command: String,
    description: String,
    action: Action,
}

impl MenuCommand {
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// A fixed list of slash commands.
///
/// Input is trimmed and compared literally against each command. Anything
/// else gets the error text followed by the full listing, so the menu is its
/// own help page.
pub struct MenuState {
    title: String,
    error: String,
    commands: Vec<MenuCommand>,
}

impl MenuState {
    pub const DEFAULT_TITLE: &'static str = "What do you want to do?";
    pub const DEFAULT_ERROR: &'static str = "Unknown command.";

    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            error: Self::DEFAULT_ERROR.to_string(),
            commands: Vec::new(),
        }
    }

    /// Text shown before the listing when a command is not recognised.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = error.into();
        self
    }

    pub fn command(
        mut self,
        command: impl Into<String>,
        description: impl Into<String>,
        action: impl FnMut(&mut SessionContext) -> Transition + Send + 'static,
    ) -> Self {
        self.commands.push(MenuCommand {
            command: command.into(),
            description: description.into(),
            action: Box::new(action),
        });
        self
    }

    pub fn commands(&self) -> &[MenuCommand] {
        &self.commands
    }

    pub fn process_message(&mut self, ctx: &mut SessionContext, text: &str) -> Reply {
        let input = text.trim();
        let Some(entry) = self.commands.iter_mut().find(|c| c.command == input) else {
            debug!(principal = %ctx.id, input, "unknown menu command");
            return Reply::Stay(format!("{}\n{}", self.error, self.default_response()));
        };

        debug!(principal = %ctx.id, command = %entry.command, "menu command");
        let transition = (entry.action)(ctx);
        transition.into_reply(|| self.default_response())
    }

    pub fn default_response(&self) -> String {
        let mut out = self.title.clone();
        for c in &self.commands {
            out.push_str(&format!("\n        {}: {}", c.command, c.description));
        }
        out
    }
}

impl Default for MenuState {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TITLE)
    }
}
