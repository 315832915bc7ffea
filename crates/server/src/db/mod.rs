//! Database operations for the client registry.
//!
//! # Tables
//!
//! - `clients` - Registered clients (see `migrations/`)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p client-registry-cli -- migrate
//! ```

pub mod clients;
#[cfg(test)]
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use client_registry_core::{
    Client, ClientId, Email, ListClientsQuery, NewClient, TaxDocument, UniqueField,
};

pub use clients::ClientRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// The row changed since it was read.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A unique index rejected the write.
    #[error("unique violation on {0}")]
    UniqueViolation(UniqueField),
}

/// Values that must not collide with another client.
#[derive(Debug, Clone, Copy)]
pub struct UniqueKeys<'a> {
    pub email: &'a Email,
    pub tax_document: &'a TaxDocument,
    /// Only checked when present; callers pass `None` for exempt clients.
    pub state_registration: Option<&'a str>,
}

/// Persistence port for clients.
///
/// Implemented by [`ClientRepository`] over `PostgreSQL`; tests use an
/// in-memory implementation.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// One page of clients ordered by id, optionally filtered by a substring.
    async fn list(&self, query: &ListClientsQuery) -> Result<Vec<Client>, RepositoryError>;

    /// Fetch a client by id. Returns `None` if it doesn't exist.
    async fn get(&self, id: ClientId) -> Result<Option<Client>, RepositoryError>;

    /// Which of `keys` already belong to a client other than `exclude`.
    async fn find_taken(
        &self,
        keys: UniqueKeys<'_>,
        exclude: Option<ClientId>,
    ) -> Result<Vec<UniqueField>, RepositoryError>;

    /// Insert a client and return exactly what was stored.
    async fn insert(&self, client: &NewClient) -> Result<Client, RepositoryError>;

    /// Overwrite a client if its stored version still equals `client.version`.
    ///
    /// Returns the stored record with the bumped version, `NotFound` if the
    /// row is gone, or `Conflict` if another write got there first.
    async fn update(&self, client: &Client) -> Result<Client, RepositoryError>;

    /// Delete by id. Returns true if a row was deleted.
    async fn delete(&self, id: ClientId) -> Result<bool, RepositoryError>;

    /// Check the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
