//! Portfolio Core - Shared types library.
//!
//! This crate provides common types used across all portfolio backend
//! components:
//! - `api` - Contact form, admin dashboard, and webhook HTTP API
//! - `cli` - Command-line tools for migrations and admin management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe ids, email addresses,
//!   correlation ids, and message statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
