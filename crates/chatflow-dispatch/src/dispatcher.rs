use std::sync::Arc;

use chatflow_core::config::BootstrapConfig;
use chatflow_core::PrincipalId;
use chatflow_sessions::SessionRegistry;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::bootstrap::{parse_start, InvitationValidator, Onboarding, StartCommand};

pub const ALREADY_REGISTERED: &str = "You are already registered.";

/// One inbound text message, as handed over by a transport adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: PrincipalId,
    pub text: String,
}

impl Message {
    pub fn new(id: impl Into<PrincipalId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Turns `(principal, text)` into a reply.
///
/// Known principals go to their session, which is locked for the duration
/// of the message. Unknown principals go through the `/start` grammar.
pub struct MessageDispatcher {
    registry: Arc<SessionRegistry>,
    invitations: Arc<dyn InvitationValidator>,
    onboarding: Arc<dyn Onboarding>,
    bootstrap: BootstrapConfig,
}

impl MessageDispatcher {
    pub fn new(
        registry: Arc<SessionRegistry>,
        invitations: Arc<dyn InvitationValidator>,
        onboarding: Arc<dyn Onboarding>,
        bootstrap: BootstrapConfig,
    ) -> Self {
        Self {
            registry,
            invitations,
            onboarding,
            bootstrap,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn handle(&self, message: &Message) -> String {
        self.process_message(&message.id, &message.text)
    }

    #[instrument(skip(self, text), fields(principal = %id))]
    pub fn process_message(&self, id: &PrincipalId, text: &str) -> String {
        if let Some(handle) = self.registry.get_by_id(id) {
            let mut session = handle.lock().expect("session poisoned");
            debug!(state = session.state().kind(), "routing to session");
            return session.process_message(text);
        }
        self.process_unknown(id, text)
    }

    fn process_unknown(&self, id: &PrincipalId, text: &str) -> String {
        match parse_start(text, &self.bootstrap) {
            Some(StartCommand::Reserved(token)) => {
                let (data, state) = self.onboarding.enroll(id, token);
                let prompt = state.default_response();
                match self.registry.new_user(id.clone(), data, state) {
                    Some(_) => {
                        info!(token, "principal enrolled");
                        prompt
                    }
                    None => ALREADY_REGISTERED.to_string(),
                }
            }
            Some(StartCommand::Invitation(code)) => match self.invitations.validate(code, id) {
                Some(reply) => {
                    info!("invitation redeemed");
                    reply
                }
                None => {
                    debug!("invalid invitation code");
                    self.bootstrap.invalid_invitation.clone()
                }
            },
            None => {
                debug!("message from unknown principal outside the bootstrap grammar");
                self.bootstrap.usage.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chatflow_core::config::{DEFAULT_INVALID_INVITATION, DEFAULT_USAGE};
    use chatflow_core::UserData;
    use chatflow_sessions::{MenuState, State, Transition};

    use super::*;

    struct FixedOnboarding {
        name: String,
    }

    impl Onboarding for FixedOnboarding {
        fn enroll(&self, _id: &PrincipalId, token: &str) -> (UserData, State) {
            let data = UserData {
                name: self.name.clone(),
                ..UserData::default()
            };
            let menu = MenuState::new(format!("Welcome ({token})"))
                .command("/ping", "Ping", |_| Transition::stay().with_notice("pong"));
            (data, menu.into())
        }
    }

    /// Accepts one code and records who redeemed it.
    struct OneCode {
        code: &'static str,
        redeemed: Mutex<Vec<PrincipalId>>,
    }

    impl InvitationValidator for OneCode {
        fn validate(&self, code: &str, id: &PrincipalId) -> Option<String> {
            (code == self.code).then(|| {
                self.redeemed.lock().unwrap().push(id.clone());
                "Invitation accepted.".to_string()
            })
        }
    }

    fn dispatcher(name: &str) -> (MessageDispatcher, Arc<OneCode>) {
        let invitations = Arc::new(OneCode {
            code: "abc123",
            redeemed: Mutex::new(Vec::new()),
        });
        let dispatcher = MessageDispatcher::new(
            Arc::new(SessionRegistry::new()),
            Arc::clone(&invitations) as Arc<dyn InvitationValidator>,
            Arc::new(FixedOnboarding {
                name: name.to_string(),
            }),
            BootstrapConfig::default(),
        );
        (dispatcher, invitations)
    }

    #[test]
    fn unknown_principal_gets_usage() {
        let (d, _) = dispatcher("");
        assert_eq!(d.process_message(&"1".into(), "hello"), DEFAULT_USAGE);
        assert_eq!(d.process_message(&"1".into(), "/start"), DEFAULT_USAGE);
        assert!(d.registry().is_empty());
    }

    #[test]
    fn reserved_token_enrolls_and_routes_later_messages() {
        let (d, _) = dispatcher("");
        let id = PrincipalId::new("1");
        assert_eq!(
            d.process_message(&id, "/start -e"),
            "Welcome (-e)\n        /ping: Ping"
        );
        assert_eq!(d.registry().len(), 1);
        assert!(d.process_message(&id, "/ping").starts_with("pong\nWelcome (-e)"));
        // A registered principal's /start goes to their session.
        assert!(d
            .process_message(&id, "/start -e")
            .starts_with(MenuState::DEFAULT_ERROR));
    }

    #[test]
    fn identity_conflict_reports_already_registered() {
        let (d, _) = dispatcher("ana");
        assert!(d.process_message(&"1".into(), "/start -e").starts_with("Welcome"));
        assert_eq!(d.process_message(&"2".into(), "/start -e"), ALREADY_REGISTERED);
        assert_eq!(d.registry().len(), 1);
    }

    #[test]
    fn invitation_codes_go_to_the_validator() {
        let (d, invitations) = dispatcher("");
        assert_eq!(
            d.process_message(&"1".into(), "/start nope"),
            DEFAULT_INVALID_INVITATION
        );
        assert_eq!(
            d.handle(&Message::new("2", "/start abc123")),
            "Invitation accepted."
        );
        assert_eq!(
            *invitations.redeemed.lock().unwrap(),
            vec![PrincipalId::new("2")]
        );
    }
}
