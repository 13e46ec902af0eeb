use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

use chatflow_core::PrincipalId;

const CODE_LEN: usize = 8;

/// What redeeming an invitation makes of the principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvitationKind {
    /// Join (or create) a company as its representative.
    Company,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    pub code: String,
    pub kind: InvitationKind,
    pub created_by: PrincipalId,
    /// RFC3339 creation timestamp.
    pub created_at: String,
}

/// Pending single-use invitation codes.
#[derive(Default)]
pub struct InvitationManager {
    pending: DashMap<String, Invitation>,
}

impl InvitationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an invitation and return its code.
    pub fn create(&self, kind: InvitationKind, created_by: &PrincipalId) -> String {
        loop {
            let code = Uuid::new_v4().simple().to_string()[..CODE_LEN].to_string();
            if let Entry::Vacant(slot) = self.pending.entry(code.clone()) {
                slot.insert(Invitation {
                    code: code.clone(),
                    kind: kind.clone(),
                    created_by: created_by.clone(),
                    created_at: chrono::Utc::now().to_rfc3339(),
                });
                info!(%created_by, "invitation created");
                return code;
            }
        }
    }

    /// Consume an invitation. Each code can be redeemed once.
    pub fn redeem(&self, code: &str) -> Option<Invitation> {
        let (_, invitation) = self.pending.remove(code)?;
        debug!(code, "invitation redeemed");
        Some(invitation)
    }

    /// Put back an invitation whose redemption could not complete.
    pub fn reinstate(&self, invitation: Invitation) {
        self.pending.insert(invitation.code.clone(), invitation);
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
