//! In-memory conversation sessions.

mod store;

pub use store::{
    Conversation, DEFAULT_SESSION_ID, SessionHandle, SessionLimits, SessionStore,
    spawn_eviction_task,
};
