//! Password hashing.

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};

use client_registry_core::NewPassword;

use super::ClientError;

/// Hash a password using Argon2id with a random salt.
pub(super) fn hash_password(password: &NewPassword) -> Result<String, ClientError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.expose().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| ClientError::PasswordHash)
}
