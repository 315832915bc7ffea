//! Business logic services for the client registry.
//!
//! # Services
//!
//! - `clients` - Client CRUD: validation, uniqueness, password hashing and
//!   optimistic concurrency over a [`crate::db::ClientStore`]

pub mod clients;

pub use clients::{ClientError, ClientService};
