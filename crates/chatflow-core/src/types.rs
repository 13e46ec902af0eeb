use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform-issued identifier of a principal (one chat user).
///
/// Opaque to the engine: the transport adapter decides its shape
/// (e.g. `telegram:1883636472`). It is the unique key of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrincipalId(pub String);

impl PrincipalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PrincipalId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PrincipalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Which part of the platform a principal uses.
///
/// Chosen at bootstrap time (reserved token, invitation, or admin seed) and
/// used to pick the home menu when sessions are restored from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Entrepreneur,
    Representative,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Entrepreneur => write!(f, "entrepreneur"),
            Role::Representative => write!(f, "representative"),
        }
    }
}

/// Contact information attached to a user, a company, or any other entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContactInfo {
    pub email: Option<String>,
    /// As typed by the user, so leading zeros and `+` prefixes survive.
    pub phone: Option<String>,
}

impl fmt::Display for ContactInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let email = self.email.as_deref().unwrap_or("-");
        let phone = self.phone.as_deref().unwrap_or("-");
        write!(f, "{} / {}", email, phone)
    }
}

/// The per-session user record owned by business logic.
///
/// `name` is the registry's secondary unique key; it stays empty until a
/// registration flow claims one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UserData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub role: Role,
}

impl UserData {
    pub fn with_role(role: Role) -> Self {
        Self {
            role,
            ..Self::default()
        }
    }

    /// True once a registration flow has stored a name.
    pub fn is_registered(&self) -> bool {
        !self.name.is_empty()
    }
}
