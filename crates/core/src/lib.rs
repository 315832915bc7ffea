//! Client Registry Core - Shared domain types.
//!
//! This crate provides the types used across all client registry components:
//! - `server` - JSON API and server-rendered UI
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure validation - no I/O, no database
//! access, no HTTP. Rules that need the store (uniqueness) live in the server's
//! service layer.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, tax documents, phones and enums
//! - [`validation`] - Field-level checks that turn a [`ClientInput`] into a [`ValidClient`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::{FieldError, UniqueField, ValidationErrors, ValidationMode};
