use chatflow_core::{PrincipalId, UserData};

/// What a state sees of the session it is serving while it handles one
/// message: who is talking, and their user record.
///
/// The record is moved in for the duration of the message and written back
/// afterwards, so commit callbacks and menu actions can update it without
/// reaching back into the registry.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub id: PrincipalId,
    pub data: UserData,
}

impl SessionContext {
    pub fn new(id: PrincipalId, data: UserData) -> Self {
        Self { id, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_is_anonymous_and_blank() {
        let ctx = SessionContext::default();
        assert_eq!(ctx.id.as_str(), "");
        assert!(!ctx.data.is_registered());
    }
}
