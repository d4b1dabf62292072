//! Core types for the portfolio backend.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod message_id;
pub mod status;

pub use email::{EmailAddress, EmailAddressError};
pub use id::*;
pub use message_id::{MessageId, MessageIdError};
pub use status::MessageStatus;
