use std::mem;

use chatflow_core::{PrincipalId, UserData};
use chatflow_forms::outcome::with_prompt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::SessionContext;
use crate::state::{Reply, State};

/// One principal's conversation: who they are, their user record and the
/// state their next message goes to.
pub struct Session {
    id: PrincipalId,
    pub data: UserData,
    state: State,
    /// RFC3339 creation timestamp.
    pub created_at: String,
}

impl Session {
    pub fn new(id: PrincipalId, data: UserData, state: State) -> Self {
        Self {
            id,
            data,
            state,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Rebuild a stored session around a freshly restored state.
    pub fn from_record(record: SessionRecord, state: State) -> Self {
        Self {
            id: record.id,
            data: record.data,
            state,
            created_at: record.created_at,
        }
    }

    pub fn id(&self) -> &PrincipalId {
        &self.id
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Replace the current state without going through a message.
    pub fn set_state(&mut self, state: State) {
        self.state = state;
    }

    /// Advance the conversation by one message and return the reply.
    ///
    /// On a transition the reply is the state's notice (if any) followed by
    /// the new state's default prompt.
    pub fn process_message(&mut self, text: &str) -> String {
        let mut ctx = SessionContext::new(self.id.clone(), mem::take(&mut self.data));
        let reply = self.state.process_message(&mut ctx, text);
        self.data = ctx.data;

        match reply {
            Reply::Stay(text) => text,
            Reply::Goto { next, notice } => {
                debug!(
                    principal = %self.id,
                    from = self.state.kind(),
                    to = next.kind(),
                    "state transition"
                );
                let prompt = next.default_response();
                self.state = next;
                match notice {
                    Some(notice) => with_prompt(&notice, &prompt),
                    None => prompt,
                }
            }
        }
    }

    pub fn default_response(&self) -> String {
        self.state.default_response()
    }

    pub fn record(&self) -> SessionRecord {
        SessionRecord {
            id: self.id.clone(),
            data: self.data.clone(),
            created_at: self.created_at.clone(),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("data", &self.data)
            .field("state", &self.state)
            .finish()
    }
}

/// The persisted part of a session. States hold closures and are rebuilt
/// from the record on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: PrincipalId,
    pub data: UserData,
    pub created_at: String,
}
