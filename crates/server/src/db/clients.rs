//! Client repository for database operations.
//!
//! Queries run through `sqlx::query_as` with `FromRow` row types, so the
//! crate builds without a live database or an offline query cache.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use client_registry_core::{
    Client, ClientId, ClientStatus, Email, Gender, ListClientsQuery, NewClient, PersonType, Phone,
    TaxDocument, UniqueField,
};

use super::{ClientStore, RepositoryError, UniqueKeys};

/// Unique index names, as created by the migrations.
const EMAIL_INDEX: &str = "clients_email_unique";
const TAX_DOCUMENT_INDEX: &str = "clients_tax_document_unique";
const STATE_REGISTRATION_INDEX: &str = "clients_state_registration_unique";

// =============================================================================
// Queries
// =============================================================================

const LIST_CLIENTS: &str = r"
        SELECT
            id, name, tax_document, email, person_type, phone,
            state_registration, state_registration_exempt, gender, birth_date,
            created_at, status, version, password_hash
        FROM clients
        WHERE $1::text IS NULL
           OR strpos(name, $1) > 0
           OR strpos(email, $1) > 0
           OR strpos(tax_document, $1) > 0
           OR strpos(COALESCE(state_registration, ''), $1) > 0
        ORDER BY id
        LIMIT $2 OFFSET $3
        ";

const GET_CLIENT: &str = r"
        SELECT
            id, name, tax_document, email, person_type, phone,
            state_registration, state_registration_exempt, gender, birth_date,
            created_at, status, version, password_hash
        FROM clients
        WHERE id = $1
        ";

const INSERT_CLIENT: &str = r"
        INSERT INTO clients (
            name, tax_document, email, person_type, phone,
            state_registration, state_registration_exempt, gender, birth_date,
            created_at, status, password_hash
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING
            id, name, tax_document, email, person_type, phone,
            state_registration, state_registration_exempt, gender, birth_date,
            created_at, status, version, password_hash
        ";

const UPDATE_CLIENT: &str = r"
        UPDATE clients SET
            name = $3,
            tax_document = $4,
            email = $5,
            person_type = $6,
            phone = $7,
            state_registration = $8,
            state_registration_exempt = $9,
            gender = $10,
            birth_date = $11,
            status = $12,
            password_hash = $13,
            version = version + 1
        WHERE id = $1 AND version = $2
        RETURNING
            id, name, tax_document, email, person_type, phone,
            state_registration, state_registration_exempt, gender, birth_date,
            created_at, status, version, password_hash
        ";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` client queries.
#[derive(Debug, sqlx::FromRow)]
struct ClientRow {
    id: i32,
    name: String,
    tax_document: String,
    email: String,
    person_type: PersonType,
    phone: String,
    state_registration: Option<String>,
    state_registration_exempt: bool,
    gender: Option<Gender>,
    birth_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    status: ClientStatus,
    version: i32,
    password_hash: String,
}

impl TryFrom<ClientRow> for Client {
    type Error = RepositoryError;

    fn try_from(row: ClientRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let tax_document = TaxDocument::parse(&row.tax_document).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid tax document in database: {e}"))
        })?;
        let phone = Phone::parse(&row.phone).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
        })?;

        Ok(Self {
            id: ClientId::new(row.id),
            name: row.name,
            tax_document,
            email,
            person_type: row.person_type,
            phone,
            state_registration: row.state_registration,
            state_registration_exempt: row.state_registration_exempt,
            gender: row.gender,
            birth_date: row.birth_date,
            created_at: row.created_at,
            status: row.status,
            version: row.version,
            password_hash: row.password_hash,
        })
    }
}

/// Result of the uniqueness check.
#[derive(Debug, sqlx::FromRow)]
#[allow(clippy::struct_field_names)]
struct TakenRow {
    email_taken: bool,
    tax_document_taken: bool,
    state_registration_taken: bool,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    /// Create a new client repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: ClientId) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM clients WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl ClientStore for ClientRepository {
    async fn list(&self, query: &ListClientsQuery) -> Result<Vec<Client>, RepositoryError> {
        let rows = sqlx::query_as::<_, ClientRow>(LIST_CLIENTS)
            .bind(query.search())
            .bind(ListClientsQuery::PAGE_SIZE)
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get(&self, id: ClientId) -> Result<Option<Client>, RepositoryError> {
        let row = sqlx::query_as::<_, ClientRow>(GET_CLIENT)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_taken(
        &self,
        keys: UniqueKeys<'_>,
        exclude: Option<ClientId>,
    ) -> Result<Vec<UniqueField>, RepositoryError> {
        let row = sqlx::query_as::<_, TakenRow>(
            r"
            SELECT
                COALESCE(bool_or(email = $1), false) AS email_taken,
                COALESCE(bool_or(tax_document = $2), false) AS tax_document_taken,
                COALESCE(bool_or(
                    $3::text IS NOT NULL
                    AND state_registration = $3
                    AND NOT state_registration_exempt
                ), false) AS state_registration_taken
            FROM clients
            WHERE ($4::int IS NULL OR id <> $4)
              AND (
                  email = $1
                  OR tax_document = $2
                  OR ($3::text IS NOT NULL AND state_registration = $3 AND NOT state_registration_exempt)
              )
            ",
        )
        .bind(keys.email.as_str())
        .bind(keys.tax_document.as_str())
        .bind(keys.state_registration)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;

        let mut taken = Vec::new();
        if row.email_taken {
            taken.push(UniqueField::Email);
        }
        if row.tax_document_taken {
            taken.push(UniqueField::TaxDocument);
        }
        if row.state_registration_taken {
            taken.push(UniqueField::StateRegistration);
        }
        Ok(taken)
    }

    async fn insert(&self, client: &NewClient) -> Result<Client, RepositoryError> {
        let row = sqlx::query_as::<_, ClientRow>(INSERT_CLIENT)
            .bind(&client.name)
            .bind(&client.tax_document)
            .bind(&client.email)
            .bind(client.person_type)
            .bind(&client.phone)
            .bind(client.state_registration.as_deref())
            .bind(client.state_registration_exempt)
            .bind(client.gender)
            .bind(client.birth_date)
            .bind(client.created_at)
            .bind(client.status)
            .bind(&client.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;

        row.try_into()
    }

    async fn update(&self, client: &Client) -> Result<Client, RepositoryError> {
        let row = sqlx::query_as::<_, ClientRow>(UPDATE_CLIENT)
            .bind(client.id)
            .bind(client.version)
            .bind(&client.name)
            .bind(&client.tax_document)
            .bind(&client.email)
            .bind(client.person_type)
            .bind(&client.phone)
            .bind(client.state_registration.as_deref())
            .bind(client.state_registration_exempt)
            .bind(client.gender)
            .bind(client.birth_date)
            .bind(client.status)
            .bind(&client.password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;

        match row {
            Some(row) => row.try_into(),
            None if self.exists(client.id).await? => Err(RepositoryError::Conflict(format!(
                "client {} was modified concurrently",
                client.id
            ))),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn delete(&self, id: ClientId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Map a write failure, turning unique index violations into the field they guard.
fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return match db_err.constraint().and_then(unique_field_for_index) {
            Some(field) => RepositoryError::UniqueViolation(field),
            None => RepositoryError::Conflict(db_err.message().to_string()),
        };
    }
    RepositoryError::Database(e)
}

fn unique_field_for_index(index: &str) -> Option<UniqueField> {
    match index {
        EMAIL_INDEX => Some(UniqueField::Email),
        TAX_DOCUMENT_INDEX => Some(UniqueField::TaxDocument),
        STATE_REGISTRATION_INDEX => Some(UniqueField::StateRegistration),
        _ => None,
    }
}
