//! Data models shared by repositories and route handlers.

pub mod admin;
pub mod message;
pub mod session;

pub use admin::Admin;
pub use message::Message;
pub use session::{AdminSession, session_keys};
