use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use chatflow_core::{ContactInfo, PrincipalId};
use chatflow_sessions::Remover;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    pub name: String,
    pub contact: ContactInfo,
    pub members: BTreeSet<PrincipalId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Created,
    Joined,
}

/// Companies keyed by their unique name, with the principals representing
/// each one.
///
/// Registered as a [`Remover`] so removed principals leave every company.
#[derive(Default)]
pub struct CompanyDirectory {
    companies: RwLock<BTreeMap<String, Company>>,
}

impl CompanyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `member` to the company called `name`, creating it with
    /// `contact` if it does not exist yet.
    ///
    /// `is_live` is asked under the write lock that removal also takes; a
    /// `false` answer refuses the join with `None`.
    pub fn join_or_create(
        &self,
        name: &str,
        member: &PrincipalId,
        contact: ContactInfo,
        is_live: impl FnOnce(&PrincipalId) -> bool,
    ) -> Option<Membership> {
        let mut companies = self.companies.write().expect("company directory poisoned");
        if !is_live(member) {
            debug!(company = name, %member, "join refused, principal is gone");
            return None;
        }
        let membership = match companies.get_mut(name) {
            Some(company) => {
                company.members.insert(member.clone());
                debug!(company = name, %member, "joined company");
                Membership::Joined
            }
            None => {
                companies.insert(
                    name.to_string(),
                    Company {
                        name: name.to_string(),
                        contact,
                        members: BTreeSet::from([member.clone()]),
                    },
                );
                info!(company = name, %member, "company created");
                Membership::Created
            }
        };
        Some(membership)
    }

    pub fn get(&self, name: &str) -> Option<Company> {
        let companies = self.companies.read().expect("company directory poisoned");
        companies.get(name).cloned()
    }

    /// The company `member` represents, if any.
    pub fn company_of(&self, member: &PrincipalId) -> Option<Company> {
        let companies = self.companies.read().expect("company directory poisoned");
        companies.values().find(|c| c.members.contains(member)).cloned()
    }

    /// Every company, sorted by name.
    pub fn list(&self) -> Vec<Company> {
        let companies = self.companies.read().expect("company directory poisoned");
        companies.values().cloned().collect()
    }
}

impl Remover for CompanyDirectory {
    fn remove(&self, id: &PrincipalId) {
        let mut companies = self.companies.write().expect("company directory poisoned");
        for company in companies.values_mut() {
            if company.members.remove(id) {
                debug!(company = %company.name, member = %id, "member removed");
            }
        }
    }
}
