use std::sync::{Arc, Weak};

use chatflow_core::{ContactInfo, PrincipalId};
use chatflow_forms::Leaves;
use chatflow_sessions::SessionRegistry;

use crate::catalogue::Catalogue;
use crate::companies::{CompanyDirectory, Membership};
use crate::geo::Geocoder;
use crate::invitations::InvitationManager;

/// What the closures inside states need from the rest of the system.
///
/// Sessions live in the registry, so the registry is held weakly here to
/// avoid a reference cycle through the states.
#[derive(Clone)]
pub struct Shared {
    registry: Weak<SessionRegistry>,
    companies: Arc<CompanyDirectory>,
    invitations: Arc<InvitationManager>,
    catalogue: Arc<Catalogue>,
    geocoder: Arc<Geocoder>,
    leaves: Leaves,
}

impl Shared {
    pub(crate) fn new(
        registry: &Arc<SessionRegistry>,
        companies: Arc<CompanyDirectory>,
        invitations: Arc<InvitationManager>,
        geocoder: Arc<Geocoder>,
        leaves: Leaves,
    ) -> Self {
        Self {
            registry: Arc::downgrade(registry),
            companies,
            invitations,
            catalogue: Arc::new(Catalogue::new()),
            geocoder,
            leaves,
        }
    }

    pub fn companies(&self) -> &CompanyDirectory {
        &self.companies
    }

    pub fn invitations(&self) -> &InvitationManager {
        &self.invitations
    }

    pub fn catalogue(&self) -> &Arc<Catalogue> {
        &self.catalogue
    }

    pub fn geocoder(&self) -> &Arc<Geocoder> {
        &self.geocoder
    }

    pub fn leaves(&self) -> &Leaves {
        &self.leaves
    }

    pub(crate) fn claim_name(&self, id: &PrincipalId, name: &str) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.claim_name(id, name))
    }

    /// Put `id` in the company called `company`, unless their session is
    /// already gone.
    pub(crate) fn join_company(
        &self,
        id: &PrincipalId,
        company: &str,
        contact: ContactInfo,
    ) -> Option<Membership> {
        let registry = self.registry.upgrade()?;
        self.companies
            .join_or_create(company, id, contact, |id| registry.contains(id))
    }

    pub(crate) fn remove_user(&self, id: &PrincipalId) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.remove_user(id))
    }

    pub(crate) fn directory(&self) -> Vec<(PrincipalId, Option<String>)> {
        self.registry
            .upgrade()
            .map(|registry| registry.directory())
            .unwrap_or_default()
    }
}
