use chatflow_core::config::{BootstrapConfig, START_COMMAND};
use chatflow_core::{PrincipalId, UserData};
use chatflow_sessions::State;

/// Builds the first session of a principal who used a reserved token.
pub trait Onboarding: Send + Sync {
    /// `token` is the reserved token that was sent, so several tokens can
    /// select different starting points.
    fn enroll(&self, id: &PrincipalId, token: &str) -> (UserData, State);
}

/// Redeems invitation codes sent by unknown principals.
pub trait InvitationValidator: Send + Sync {
    /// On success the validator has registered the principal and returns the
    /// reply to send. `None` means the code is not valid.
    fn validate(&self, code: &str, id: &PrincipalId) -> Option<String>;
}

/// A well-formed `/start <token>` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartCommand<'a> {
    /// A reserved token selecting the registration path that needs no invitation.
    Reserved(&'a str),
    Invitation(&'a str),
}

/// Parse the bootstrap grammar.
///
/// The text must split on single spaces into exactly `/start` and one
/// non-blank argument. Anything else is `None`.
pub fn parse_start<'a>(text: &'a str, config: &BootstrapConfig) -> Option<StartCommand<'a>> {
    let args: Vec<&str> = text.split(' ').collect();
    let [command, arg] = args.as_slice() else {
        return None;
    };
    if *command != START_COMMAND || arg.trim().is_empty() {
        return None;
    }

    let arg = arg.trim();
    if config.is_reserved(arg) {
        Some(StartCommand::Reserved(arg))
    } else {
        Some(StartCommand::Invitation(arg))
    }
}
