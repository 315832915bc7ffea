//! Integration tests for the client registry.
//!
//! These drive a running server over HTTP and are `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! # Apply migrations and start the server
//! cargo run -p client-registry-cli -- migrate
//! cargo run -p client-registry-server
//!
//! # Run integration tests
//! cargo test -p client-registry-integration-tests -- --ignored
//! ```
//!
//! `REGISTRY_BASE_URL` points the tests at another server.

use serde_json::{Value, json};

/// Server used when `REGISTRY_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5050";

/// HTTP client and base URL for one test.
pub struct TestContext {
    pub client: reqwest::Client,
    pub base_url: String,
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        let base_url = std::env::var("REGISTRY_BASE_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_default();

        Self { client, base_url }
    }

    /// Absolute URL for a path on the server under test.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A per-run suffix so repeated runs never collide on unique columns.
#[must_use]
pub fn unique_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Digits derived from `suffix`, for CPF/CNPJ values that stay unique per run.
#[must_use]
pub fn unique_digits(suffix: &str, len: usize) -> String {
    suffix
        .bytes()
        .map(|b| char::from(b'0' + b % 10))
        .cycle()
        .take(len)
        .collect()
}

/// A valid company payload.
#[must_use]
pub fn company_payload(suffix: &str) -> Value {
    json!({
        "name": format!("Acme {suffix}"),
        "email": format!("a.{suffix}@acme.com"),
        "taxDocument": unique_digits(suffix, 14),
        "personType": "company",
        "phone": "11999999999",
        "stateRegistrationExempt": true,
        "password": "abcdefgh",
        "passwordConfirmation": "abcdefgh"
    })
}

/// A valid individual payload.
#[must_use]
pub fn individual_payload(suffix: &str) -> Value {
    json!({
        "name": format!("Maria {suffix}"),
        "email": format!("maria.{suffix}@example.com"),
        "taxDocument": unique_digits(suffix, 11),
        "personType": "individual",
        "phone": "(11) 98888-7777",
        "stateRegistrationExempt": true,
        "gender": "female",
        "birthDate": "1990-05-17",
        "password": "abcdefgh",
        "passwordConfirmation": "abcdefgh"
    })
}
