use std::sync::Arc;

use chatflow_core::config::{BootstrapConfig, EngineConfig};
use chatflow_core::{PrincipalId, Role, UserData};
use chatflow_dispatch::{InvitationValidator, MessageDispatcher, Onboarding, ALREADY_REGISTERED};
use chatflow_forms::Leaves;
use chatflow_sessions::{Remover, SessionRegistry, State};
use tracing::{info, instrument};

use crate::admin::admin_menu;
use crate::companies::CompanyDirectory;
use crate::geo::Geocoder;
use crate::invitations::{InvitationKind, InvitationManager};
use crate::members::{entrepreneur_menu, representative_menu};
use crate::registration::{entrepreneur_signup, representative_signup, signup_for};
use crate::shared::Shared;

/// Composition root: the registry plus every collaborator the flows use.
///
/// Built once at startup and handed to the dispatcher as both its
/// onboarding and invitation collaborator.
pub struct Services {
    registry: Arc<SessionRegistry>,
    shared: Shared,
}

impl Services {
    /// `geocoder` resolves the addresses typed into publications and zone
    /// searches.
    pub fn new(
        registry: Arc<SessionRegistry>,
        engine: &EngineConfig,
        geocoder: Arc<Geocoder>,
    ) -> Arc<Self> {
        let companies = Arc::new(CompanyDirectory::new());
        registry.add_remover(Arc::clone(&companies) as Arc<dyn Remover>);

        let shared = Shared::new(
            &registry,
            companies,
            Arc::new(InvitationManager::new()),
            geocoder,
            Leaves::from(engine),
        );
        Arc::new(Self { registry, shared })
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn shared(&self) -> &Shared {
        &self.shared
    }

    pub fn dispatcher(self: &Arc<Self>, bootstrap: BootstrapConfig) -> MessageDispatcher {
        MessageDispatcher::new(
            Arc::clone(&self.registry),
            Arc::clone(self) as Arc<dyn InvitationValidator>,
            Arc::clone(self) as Arc<dyn Onboarding>,
            bootstrap,
        )
    }

    /// Rebuild a stored principal's state: their home menu once registered,
    /// their sign-up otherwise.
    pub fn restore(&self, _id: &PrincipalId, data: &UserData) -> State {
        match data.role {
            Role::Admin => admin_menu(&self.shared),
            Role::Entrepreneur if data.is_registered() => entrepreneur_menu(&self.shared),
            Role::Representative if data.is_registered() => representative_menu(&self.shared),
            role => signup_for(&self.shared, role),
        }
    }

    /// Give each listed principal an admin session unless they already have
    /// one. Returns how many were created.
    pub fn seed_admins(&self, admins: &[String]) -> usize {
        let mut created = 0;
        for id in admins {
            let id = PrincipalId::new(id.as_str());
            if self.registry.get_by_id(&id).is_some() {
                continue;
            }
            if self
                .registry
                .new_user(id.clone(), UserData::with_role(Role::Admin), admin_menu(&self.shared))
                .is_some()
            {
                info!(principal = %id, "admin seeded");
                created += 1;
            }
        }
        created
    }
}

impl Onboarding for Services {
    fn enroll(&self, _id: &PrincipalId, _token: &str) -> (UserData, State) {
        (
            UserData::with_role(Role::Entrepreneur),
            entrepreneur_signup(&self.shared),
        )
    }
}

impl InvitationValidator for Services {
    #[instrument(skip(self, code), fields(principal = %id))]
    fn validate(&self, code: &str, id: &PrincipalId) -> Option<String> {
        let invitation = self.shared.invitations().redeem(code)?;
        let (data, state) = match invitation.kind {
            InvitationKind::Company => (
                UserData::with_role(Role::Representative),
                representative_signup(&self.shared),
            ),
        };

        let prompt = state.default_response();
        if self.registry.new_user(id.clone(), data, state).is_none() {
            self.shared.invitations().reinstate(invitation);
            return Some(ALREADY_REGISTERED.to_string());
        }
        info!(invited_by = %invitation.created_by, "representative enrolled");
        Some(prompt)
    }
}
