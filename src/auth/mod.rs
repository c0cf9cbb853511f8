//! Password handling, session lifecycle and authorization guards.

pub mod guard;
pub mod password;
pub mod session;

pub use session::SessionStore;
