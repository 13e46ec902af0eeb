use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatflowError {
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ChatflowError {
    /// Short error code string, used in log fields.
    pub fn code(&self) -> &'static str {
        match self {
            ChatflowError::Config(_) => "CONFIG_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, ChatflowError>;
