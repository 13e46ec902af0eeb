pub mod context;
pub mod db;
pub mod error;
pub mod menu;
pub mod pipeline;
pub mod registry;
pub mod state;
pub mod types;
pub mod wrapper;

pub use context::SessionContext;
pub use error::SessionError;
pub use menu::{MenuCommand, MenuState};
pub use pipeline::PipelineState;
pub use registry::{Remover, SessionHandle, SessionRegistry};
pub use state::{Reply, State, Transition};
pub use types::{Session, SessionRecord};
pub use wrapper::WrapperState;
