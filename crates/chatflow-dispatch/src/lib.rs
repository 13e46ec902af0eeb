//! The single entry point for inbound text.
//!
//! [`MessageDispatcher`] routes a message to its principal's session, or
//! through the `/start` bootstrap grammar when the principal is unknown.

pub mod bootstrap;
pub mod dispatcher;

pub use bootstrap::{parse_start, InvitationValidator, Onboarding, StartCommand};
pub use dispatcher::{Message, MessageDispatcher, ALREADY_REGISTERED};
