pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use config::ChatflowConfig;
pub use error::{ChatflowError, Result};
pub use types::{ContactInfo, PrincipalId, Role, UserData};
