//! Core types for the client registry.
//!
//! This module provides type-safe wrappers for the client domain.

pub mod client;
pub mod email;
pub mod id;
pub mod phone;
pub mod query;
pub mod status;
pub mod tax_document;

pub use client::{Client, ClientInput, NewClient, NewPassword, ValidClient};
pub use email::{Email, EmailError};
pub use id::*;
pub use phone::{Phone, PhoneError};
pub use query::ListClientsQuery;
pub use status::*;
pub use tax_document::{TaxDocument, TaxDocumentError};
