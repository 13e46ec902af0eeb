use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

// Bootstrap grammar defaults
pub const START_COMMAND: &str = "/start";
pub const DEFAULT_USAGE: &str =
    "Send the message /start ( <invitation-code> | -e | --entrepreneur ) to register to the platform.";
pub const DEFAULT_INVALID_INVITATION: &str = "Invalid invitation code";

pub const DEFAULT_LOOKUP_ATTEMPTS: u32 = 10; // fixed cap used for flaky lookups
pub const DEFAULT_MAX_LIST_ITEMS: usize = 32;

/// Top-level config (chatflow.toml + CHATFLOW_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatflowConfig {
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Principals seeded as administrators on startup.
    #[serde(default)]
    pub admins: Vec<String>,
    /// Addresses the built-in gazetteer resolves.
    #[serde(default)]
    pub places: Vec<PlaceConfig>,
}

/// One known address and its coordinates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceConfig {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// How unknown principals are greeted and enrolled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Tokens after `/start` that select the no-invitation registration path.
    #[serde(default = "default_reserved_tokens")]
    pub reserved_tokens: Vec<String>,
    /// Reply to any message that does not follow the bootstrap grammar.
    #[serde(default = "default_usage")]
    pub usage: String,
    /// Reply when the invitation collaborator rejects a code.
    #[serde(default = "default_invalid_invitation")]
    pub invalid_invitation: String,
}

impl BootstrapConfig {
    /// True when `token` (already trimmed) selects the reserved registration path.
    pub fn is_reserved(&self, token: &str) -> bool {
        self.reserved_tokens.iter().any(|t| t == token)
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            reserved_tokens: default_reserved_tokens(),
            usage: default_usage(),
            invalid_invitation: default_invalid_invitation(),
        }
    }
}

/// Knobs of the input-collection pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Messages that abandon the current flow. Compared trimmed and
    /// case-insensitively.
    #[serde(default = "default_cancel_keywords")]
    pub cancel_keywords: Vec<String>,
    /// Attempt cap for lookups against blocking collaborators (geocoding, …).
    #[serde(default = "default_lookup_attempts")]
    pub lookup_attempts: u32,
    /// A list prompt finishes on its own once this many items were collected.
    #[serde(default = "default_max_list_items")]
    pub max_list_items: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cancel_keywords: default_cancel_keywords(),
            lookup_attempts: DEFAULT_LOOKUP_ATTEMPTS,
            max_list_items: DEFAULT_MAX_LIST_ITEMS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_reserved_tokens() -> Vec<String> {
    vec!["-e".to_string(), "--entrepreneur".to_string()]
}
fn default_usage() -> String {
    DEFAULT_USAGE.to_string()
}
fn default_invalid_invitation() -> String {
    DEFAULT_INVALID_INVITATION.to_string()
}
fn default_cancel_keywords() -> Vec<String> {
    vec!["/stop".to_string(), "/cancel".to_string(), "/exit".to_string()]
}
fn default_lookup_attempts() -> u32 {
    DEFAULT_LOOKUP_ATTEMPTS
}
fn default_max_list_items() -> usize {
    DEFAULT_MAX_LIST_ITEMS
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.chatflow/sessions.db", home)
}

impl ChatflowConfig {
    /// Load config from a TOML file with CHATFLOW_* env var overrides.
    ///
    /// Nested keys use a double underscore, e.g.
    /// `CHATFLOW_ENGINE__LOOKUP_ATTEMPTS=3`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        Self::from_figment(
            Figment::new()
                .merge(Toml::file(&path))
                .merge(Env::prefixed("CHATFLOW_").split("__")),
        )
    }

    /// Parse config from an in-memory TOML document.
    pub fn from_toml_str(toml: &str) -> crate::error::Result<Self> {
        Self::from_figment(Figment::new().merge(Toml::string(toml)))
    }

    fn from_figment(figment: Figment) -> crate::error::Result<Self> {
        figment
            .extract()
            .map_err(|e| crate::error::ChatflowError::Config(e.to_string()))
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.chatflow/chatflow.toml", home)
}
