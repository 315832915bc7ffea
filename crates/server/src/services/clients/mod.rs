//! Client CRUD service.
//!
//! Format rules come from [`ClientInput::validate`]; this layer adds the
//! rules that need the store (uniqueness), hashes passwords and guards
//! updates with the record version.

mod error;
mod password;

pub use error::ClientError;

use chrono::Utc;
use tracing::instrument;

use client_registry_core::{
    Client, ClientId, ClientInput, FieldError, ListClientsQuery, ValidClient, ValidationErrors,
    ValidationMode,
};

use crate::db::{ClientStore, UniqueKeys};

/// Client service.
///
/// Borrows the store for the duration of a request.
pub struct ClientService<'a> {
    clients: &'a dyn ClientStore,
}

impl<'a> ClientService<'a> {
    /// Create a new client service.
    #[must_use]
    pub const fn new(clients: &'a dyn ClientStore) -> Self {
        Self { clients }
    }

    /// List one page of clients.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Repository` if the query fails.
    #[instrument(skip(self), fields(page = query.page()))]
    pub async fn list(&self, query: &ListClientsQuery) -> Result<Vec<Client>, ClientError> {
        Ok(self.clients.list(query).await?)
    }

    /// Get a client by id.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if no client has this id.
    #[instrument(skip(self))]
    pub async fn get(&self, id: ClientId) -> Result<Client, ClientError> {
        self.clients.get(id).await?.ok_or(ClientError::NotFound)
    }

    /// Register a new client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if a field rule fails or a unique
    /// value is already taken.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: ClientInput) -> Result<Client, ClientError> {
        let mut valid = input.validate(ValidationMode::Create)?;
        self.ensure_unique(&valid, None).await?;

        let Some(plaintext) = valid.password.take() else {
            return Err(ValidationErrors::single(FieldError::new(
                "password",
                "password is required",
            ))
            .into());
        };
        let password_hash = password::hash_password(&plaintext)?;

        let client = self
            .clients
            .insert(&valid.into_new_client(password_hash, Utc::now()))
            .await?;

        tracing::info!(client_id = %client.id, "Client created");
        Ok(client)
    }

    /// Overwrite a client's mutable fields.
    ///
    /// The password is re-hashed only when a new one is supplied. The write
    /// succeeds only if nobody else updated the client since it was loaded.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::IdMismatch` if `input.id` is not `id`.
    /// Returns `ClientError::NotFound` if the client does not exist.
    /// Returns `ClientError::Validation` if a field rule fails.
    /// Returns `ClientError::Conflict` if the client changed concurrently.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: ClientId, input: ClientInput) -> Result<Client, ClientError> {
        if input.id != Some(id) {
            return Err(ClientError::IdMismatch);
        }

        let existing = self.get(id).await?;

        let mut valid = input.validate(ValidationMode::Update)?;
        self.ensure_unique(&valid, Some(id)).await?;

        let password_hash = valid
            .password
            .take()
            .map(|plaintext| password::hash_password(&plaintext))
            .transpose()?;

        let client = self
            .clients
            .update(&valid.apply_to(&existing, password_hash))
            .await?;

        tracing::info!(client_id = %client.id, version = client.version, "Client updated");
        Ok(client)
    }

    /// Delete a client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the client does not exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ClientId) -> Result<(), ClientError> {
        if !self.clients.delete(id).await? {
            return Err(ClientError::NotFound);
        }

        tracing::info!(client_id = %id, "Client deleted");
        Ok(())
    }

    /// Reject values already held by another client.
    async fn ensure_unique(
        &self,
        valid: &ValidClient,
        exclude: Option<ClientId>,
    ) -> Result<(), ClientError> {
        let keys = UniqueKeys {
            email: &valid.email,
            tax_document: &valid.tax_document,
            state_registration: valid.state_registration.as_deref(),
        };

        let taken = self.clients.find_taken(keys, exclude).await?;
        match ValidationErrors::from_vec(taken.into_iter().map(FieldError::from).collect()) {
            Some(errors) => Err(errors.into()),
            None => Ok(()),
        }
    }
}
