//! Seed the registry with generated clients.
//!
//! Records go through [`ClientService`], so they are validated, hashed and
//! uniqueness-checked exactly like API traffic. Collisions with existing
//! rows are logged and skipped.

use chrono::NaiveDate;
use rand::{Rng, seq::IndexedRandom};
use tracing::{info, warn};

use client_registry_core::{ClientInput, ClientStatus, Gender, PersonType};
use client_registry_server::db::clients::ClientRepository;
use client_registry_server::services::{ClientError, ClientService};

use super::connect;

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Carla", "Diego", "Elisa", "Fabio", "Gabriela", "Heitor", "Isabela", "Joao",
];
const LAST_NAMES: &[&str] = &[
    "Almeida", "Barbosa", "Costa", "Ferreira", "Gomes", "Lima", "Oliveira", "Pereira", "Santos",
];
const COMPANY_SUFFIXES: &[&str] = &["Comércio", "Serviços", "Indústria", "Tecnologia"];

/// Password given to every seeded client.
const SEED_PASSWORD: &str = "changeme1";

/// Create `count` generated clients.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a store call fails
/// for a reason other than a rejected record.
pub async fn clients(count: usize) -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;
    let repository = ClientRepository::new(pool);
    let service = ClientService::new(&repository);

    let inputs: Vec<ClientInput> = {
        let mut rng = rand::rng();
        (0..count).map(|_| fake_client(&mut rng)).collect()
    };

    let mut created = 0_usize;
    for input in inputs {
        match service.create(input).await {
            Ok(client) => {
                created += 1;
                info!(id = %client.id, name = %client.name, "Seeded client");
            }
            Err(ClientError::Validation(errors)) => {
                warn!(%errors, "Skipped generated client");
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(created, requested = count, "Seeding complete");
    Ok(())
}

fn digits(rng: &mut impl Rng, len: usize) -> String {
    (0..len)
        .map(|_| char::from(b'0' + rng.random_range(0..10_u8)))
        .collect()
}

fn pick<'a>(rng: &mut impl Rng, options: &[&'a str]) -> &'a str {
    options.choose(rng).copied().unwrap_or_default()
}

/// A random client that passes every field rule.
fn fake_client(rng: &mut impl Rng) -> ClientInput {
    let first = pick(rng, FIRST_NAMES);
    let last = pick(rng, LAST_NAMES);
    let tag = digits(rng, 6);
    let is_company = rng.random_bool(0.3);

    let mut input = ClientInput {
        phone: format!("11{}", digits(rng, 9)),
        status: Some(if rng.random_bool(0.9) {
            ClientStatus::Active
        } else {
            ClientStatus::Blocked
        }),
        password: Some(SEED_PASSWORD.to_string()),
        password_confirmation: Some(SEED_PASSWORD.to_string()),
        ..ClientInput::default()
    };

    if is_company {
        input.name = format!("{last} {}", pick(rng, COMPANY_SUFFIXES));
        input.email = format!("contato.{tag}@{}.example.com", last.to_lowercase());
        input.tax_document = digits(rng, 14);
        input.person_type = Some(PersonType::Company);
        if rng.random_bool(0.5) {
            input.state_registration = Some(digits(rng, 12));
        } else {
            input.state_registration_exempt = true;
        }
    } else {
        input.name = format!("{first} {last}");
        input.email = format!(
            "{}.{}.{tag}@example.com",
            first.to_lowercase(),
            last.to_lowercase()
        );
        input.tax_document = digits(rng, 11);
        input.person_type = Some(PersonType::Individual);
        input.state_registration_exempt = true;
        input.gender = [Gender::Male, Gender::Female, Gender::Other].choose(rng).copied();
        input.birth_date = NaiveDate::from_ymd_opt(
            rng.random_range(1950..2005),
            rng.random_range(1..=12),
            rng.random_range(1..=28),
        );
    }

    input
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use client_registry_core::ValidationMode;

    use super::*;

    #[test]
    fn test_fake_clients_pass_validation() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let input = fake_client(&mut rng);
            assert!(
                input.clone().validate(ValidationMode::Create).is_ok(),
                "generated client rejected: {input:?}"
            );
        }
    }

    #[test]
    fn test_digits_length() {
        let mut rng = rand::rng();
        let value = digits(&mut rng, 14);
        assert_eq!(value.len(), 14);
        assert!(value.chars().all(|c| c.is_ascii_digit()));
    }
}
