//! Client record types.
//!
//! - [`ClientInput`] - untrusted payload from the API or the UI form
//! - [`ValidClient`] - payload that passed every format rule
//! - [`NewClient`] - what the store inserts (password already hashed)
//! - [`Client`] - a stored record

use core::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{ClientId, ClientStatus, Email, Gender, PersonType, Phone, TaxDocument};

/// A registered client as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub tax_document: TaxDocument,
    pub email: Email,
    pub person_type: PersonType,
    pub phone: Phone,
    pub state_registration: Option<String>,
    pub state_registration_exempt: bool,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub status: ClientStatus,
    /// Optimistic concurrency token, bumped by every update.
    pub version: i32,
    /// Argon2 PHC string. Never the plaintext.
    pub password_hash: String,
}

/// Client payload as submitted by a caller.
///
/// Every field is defaulted so that a missing field surfaces as a validation
/// message instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientInput {
    /// Must match the path id on update. Ignored on create.
    pub id: Option<ClientId>,
    pub name: String,
    pub tax_document: String,
    pub email: String,
    pub person_type: Option<PersonType>,
    pub phone: String,
    pub state_registration: Option<String>,
    pub state_registration_exempt: bool,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    pub status: Option<ClientStatus>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

/// A plaintext password that passed the length and confirmation rules.
///
/// `Debug` is redacted so it never reaches logs.
#[derive(Clone, PartialEq, Eq)]
pub struct NewPassword(String);

impl NewPassword {
    pub(crate) const fn new(password: String) -> Self {
        Self(password)
    }

    /// The plaintext, for hashing.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NewPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NewPassword([REDACTED])")
    }
}

/// A client payload that passed all format rules.
///
/// Uniqueness has not been checked yet; that needs the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidClient {
    pub name: String,
    pub tax_document: TaxDocument,
    pub email: Email,
    pub person_type: PersonType,
    pub phone: Phone,
    pub state_registration: Option<String>,
    pub state_registration_exempt: bool,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    pub status: ClientStatus,
    /// `None` on update means "keep the current password".
    pub password: Option<NewPassword>,
}

/// A client ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    pub name: String,
    pub tax_document: TaxDocument,
    pub email: Email,
    pub person_type: PersonType,
    pub phone: Phone,
    pub state_registration: Option<String>,
    pub state_registration_exempt: bool,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    pub status: ClientStatus,
    pub created_at: DateTime<Utc>,
    pub password_hash: String,
}

impl ValidClient {
    /// Build the insert payload from a validated create request.
    #[must_use]
    pub fn into_new_client(self, password_hash: String, created_at: DateTime<Utc>) -> NewClient {
        NewClient {
            name: self.name,
            tax_document: self.tax_document,
            email: self.email,
            person_type: self.person_type,
            phone: self.phone,
            state_registration: self.state_registration,
            state_registration_exempt: self.state_registration_exempt,
            gender: self.gender,
            birth_date: self.birth_date,
            status: self.status,
            created_at,
            password_hash,
        }
    }

    /// Produce the updated record: every mutable field comes from `self`,
    /// identity, creation time and version come from `existing`.
    ///
    /// `password_hash` replaces the stored hash only when `Some`.
    #[must_use]
    pub fn apply_to(self, existing: &Client, password_hash: Option<String>) -> Client {
        Client {
            id: existing.id,
            name: self.name,
            tax_document: self.tax_document,
            email: self.email,
            person_type: self.person_type,
            phone: self.phone,
            state_registration: self.state_registration,
            state_registration_exempt: self.state_registration_exempt,
            gender: self.gender,
            birth_date: self.birth_date,
            created_at: existing.created_at,
            status: self.status,
            version: existing.version,
            password_hash: password_hash.unwrap_or_else(|| existing.password_hash.clone()),
        }
    }
}

impl NewClient {
    /// Turn the insert payload into a stored record once the store assigned an id.
    #[must_use]
    pub fn into_client(self, id: ClientId) -> Client {
        Client {
            id,
            name: self.name,
            tax_document: self.tax_document,
            email: self.email,
            person_type: self.person_type,
            phone: self.phone,
            state_registration: self.state_registration,
            state_registration_exempt: self.state_registration_exempt,
            gender: self.gender,
            birth_date: self.birth_date,
            created_at: self.created_at,
            status: self.status,
            version: 1,
            password_hash: self.password_hash,
        }
    }
}
