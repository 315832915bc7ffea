//! In-memory [`ClientStore`] for service and route tests.

use std::sync::Mutex;

use async_trait::async_trait;

use client_registry_core::{Client, ClientId, ListClientsQuery, NewClient, UniqueField};

use super::{ClientStore, RepositoryError, UniqueKeys};

#[derive(Debug, Default)]
struct Inner {
    next_id: i32,
    clients: Vec<Client>,
}

/// A `Vec`-backed store that mimics the `PostgreSQL` repository, unique
/// indexes and version guard included.
#[derive(Debug, Default)]
pub struct MemoryClientStore {
    inner: Mutex<Inner>,
    unreachable: bool,
}

impl MemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `ping` fails, for readiness checks.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Snapshot of a stored client.
    #[allow(clippy::unwrap_used)]
    pub fn stored(&self, id: ClientId) -> Option<Client> {
        let inner = self.inner.lock().unwrap();
        inner.clients.iter().find(|c| c.id == id).cloned()
    }

    /// Bump a client's version behind the service's back, as a concurrent
    /// writer would.
    #[allow(clippy::unwrap_used)]
    pub fn touch(&self, id: ClientId) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(client) = inner.clients.iter_mut().find(|c| c.id == id) {
            client.version += 1;
        }
    }
}

fn collisions(
    clients: &[Client],
    keys: UniqueKeys<'_>,
    exclude: Option<ClientId>,
) -> Vec<UniqueField> {
    let others = || clients.iter().filter(move |c| Some(c.id) != exclude);
    let mut taken = Vec::new();
    if others().any(|c| &c.email == keys.email) {
        taken.push(UniqueField::Email);
    }
    if others().any(|c| &c.tax_document == keys.tax_document) {
        taken.push(UniqueField::TaxDocument);
    }
    if let Some(registration) = keys.state_registration
        && others().any(|c| {
            !c.state_registration_exempt && c.state_registration.as_deref() == Some(registration)
        })
    {
        taken.push(UniqueField::StateRegistration);
    }
    taken
}

fn keys_of(client: &Client) -> UniqueKeys<'_> {
    UniqueKeys {
        email: &client.email,
        tax_document: &client.tax_document,
        state_registration: client
            .state_registration
            .as_deref()
            .filter(|_| !client.state_registration_exempt),
    }
}

fn matches_search(client: &Client, term: &str) -> bool {
    client.name.contains(term)
        || client.email.as_str().contains(term)
        || client.tax_document.as_str().contains(term)
        || client
            .state_registration
            .as_deref()
            .is_some_and(|s| s.contains(term))
}

#[async_trait]
#[allow(clippy::unwrap_used)]
impl ClientStore for MemoryClientStore {
    async fn list(&self, query: &ListClientsQuery) -> Result<Vec<Client>, RepositoryError> {
        let inner = self.inner.lock().unwrap();
        let mut matching: Vec<Client> = inner
            .clients
            .iter()
            .filter(|c| query.search().is_none_or(|term| matches_search(c, term)))
            .cloned()
            .collect();
        matching.sort_by_key(|c| c.id);

        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(ListClientsQuery::PAGE_SIZE).unwrap_or(usize::MAX);
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }

    async fn get(&self, id: ClientId) -> Result<Option<Client>, RepositoryError> {
        Ok(self.stored(id))
    }

    async fn find_taken(
        &self,
        keys: UniqueKeys<'_>,
        exclude: Option<ClientId>,
    ) -> Result<Vec<UniqueField>, RepositoryError> {
        let inner = self.inner.lock().unwrap();
        Ok(collisions(&inner.clients, keys, exclude))
    }

    async fn insert(&self, client: &NewClient) -> Result<Client, RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let stored = client.clone().into_client(ClientId::new(inner.next_id));

        if let Some(field) = collisions(&inner.clients, keys_of(&stored), None).first() {
            return Err(RepositoryError::UniqueViolation(*field));
        }

        inner.clients.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, client: &Client) -> Result<Client, RepositoryError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(field) = collisions(&inner.clients, keys_of(client), Some(client.id)).first() {
            return Err(RepositoryError::UniqueViolation(*field));
        }

        let slot = inner
            .clients
            .iter_mut()
            .find(|c| c.id == client.id)
            .ok_or(RepositoryError::NotFound)?;

        if slot.version != client.version {
            return Err(RepositoryError::Conflict(format!(
                "client {} was modified concurrently",
                client.id
            )));
        }

        *slot = Client {
            version: client.version + 1,
            ..client.clone()
        };
        Ok(slot.clone())
    }

    async fn delete(&self, id: ClientId) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.clients.len();
        inner.clients.retain(|c| c.id != id);
        Ok(inner.clients.len() < before)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        if self.unreachable {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}
