//! Format validation for client payloads.
//!
//! [`ClientInput::validate`] checks every rule that can be decided from the
//! payload alone and reports all violations at once. Uniqueness needs the
//! store and is checked by the server after this step succeeds.

use core::fmt;

use serde::Serialize;

use crate::types::{
    ClientInput, Email, NewPassword, PersonType, Phone, TaxDocument, ValidClient,
};

/// Maximum length of a client name.
pub const NAME_MAX_LENGTH: usize = 150;
/// Maximum length of a state registration.
pub const STATE_REGISTRATION_MAX_LENGTH: usize = 12;
/// Minimum password length.
pub const PASSWORD_MIN_LENGTH: usize = 8;
/// Maximum password length.
pub const PASSWORD_MAX_LENGTH: usize = 15;

/// Whether a payload creates a new client or updates an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Password is required.
    Create,
    /// Password may be omitted to keep the current one.
    Update,
}

/// A single violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Wire name of the offending field (camelCase).
    pub field: String,
    /// Human-readable message.
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Fields that must be unique across clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueField {
    Email,
    TaxDocument,
    /// Only among clients that are not exempt.
    StateRegistration,
}

impl UniqueField {
    /// Wire name of the field.
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::TaxDocument => "taxDocument",
            Self::StateRegistration => "stateRegistration",
        }
    }

    /// Message reported when the value is already taken.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Email => "email is already registered",
            Self::TaxDocument => "CPF/CNPJ is already registered",
            Self::StateRegistration => "state registration is already registered",
        }
    }
}

impl From<UniqueField> for FieldError {
    fn from(field: UniqueField) -> Self {
        Self::new(field.field(), field.message())
    }
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

/// One or more violated rules. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Wrap a list of errors. Returns `None` if the list is empty.
    #[must_use]
    pub fn from_vec(errors: Vec<FieldError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    /// A single error.
    #[must_use]
    pub fn single(error: FieldError) -> Self {
        Self(vec![error])
    }

    /// The violated rules, in field order.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether any error concerns `field`.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Messages for a single field.
    pub fn messages_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl From<UniqueField> for ValidationErrors {
    fn from(field: UniqueField) -> Self {
        Self::single(field.into())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        write!(f, "validation failed: {}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl ClientInput {
    /// Check every format rule and build a [`ValidClient`].
    ///
    /// - Name is trimmed, required and at most 150 characters.
    /// - Tax document, email and phone are normalized through their newtypes.
    /// - State registration is trimmed, blank means absent, at most 12
    ///   characters, and dropped for exempt clients.
    /// - Birth date is required for individuals; birth date and gender are
    ///   dropped for companies.
    /// - Password must be 8-15 characters and equal its confirmation. On
    ///   update, empty password and confirmation keep the current password.
    ///
    /// # Errors
    ///
    /// Returns every violated rule.
    pub fn validate(self, mode: ValidationMode) -> Result<ValidClient, ValidationErrors> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(FieldError::new("name", "name is required"));
        } else if name.chars().count() > NAME_MAX_LENGTH {
            errors.push(FieldError::new(
                "name",
                format!("name must be at most {NAME_MAX_LENGTH} characters"),
            ));
        }

        let tax_document = TaxDocument::parse(&self.tax_document)
            .map_err(|e| errors.push(FieldError::new("taxDocument", e.to_string())))
            .ok();

        let email = Email::parse(&self.email)
            .map_err(|e| errors.push(FieldError::new("email", e.to_string())))
            .ok();

        if self.person_type.is_none() {
            errors.push(FieldError::new("personType", "person type is required"));
        }

        let phone = Phone::parse(&self.phone)
            .map_err(|e| errors.push(FieldError::new("phone", e.to_string())))
            .ok();

        let state_registration = self
            .state_registration
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && !self.state_registration_exempt);
        if let Some(registration) = state_registration
            && registration.chars().count() > STATE_REGISTRATION_MAX_LENGTH
        {
            errors.push(FieldError::new(
                "stateRegistration",
                format!(
                    "state registration must be at most {STATE_REGISTRATION_MAX_LENGTH} characters"
                ),
            ));
        }

        let (gender, birth_date) = match self.person_type {
            Some(PersonType::Individual) => {
                if self.birth_date.is_none() {
                    errors.push(FieldError::new(
                        "birthDate",
                        "birth date is required for individuals",
                    ));
                }
                (self.gender, self.birth_date)
            }
            Some(PersonType::Company) | None => (None, None),
        };

        let password = check_password(
            self.password.as_deref(),
            self.password_confirmation.as_deref(),
            mode,
            &mut errors,
        );

        match (tax_document, email, phone, self.person_type) {
            (Some(tax_document), Some(email), Some(phone), Some(person_type))
                if errors.is_empty() =>
            {
                Ok(ValidClient {
                    name: name.to_owned(),
                    tax_document,
                    email,
                    person_type,
                    phone,
                    state_registration: state_registration.map(ToOwned::to_owned),
                    state_registration_exempt: self.state_registration_exempt,
                    gender,
                    birth_date,
                    status: self.status.unwrap_or_default(),
                    password,
                })
            }
            _ => Err(ValidationErrors(errors)),
        }
    }
}

fn check_password(
    password: Option<&str>,
    confirmation: Option<&str>,
    mode: ValidationMode,
    errors: &mut Vec<FieldError>,
) -> Option<NewPassword> {
    let password = password.unwrap_or_default();
    let confirmation = confirmation.unwrap_or_default();

    // On update a blank password keeps the stored hash; a stray
    // confirmation is ignored.
    if password.is_empty() {
        if mode == ValidationMode::Create {
            errors.push(FieldError::new("password", "password is required"));
        }
        return None;
    }

    let length = password.chars().count();
    if !(PASSWORD_MIN_LENGTH..=PASSWORD_MAX_LENGTH).contains(&length) {
        errors.push(FieldError::new(
            "password",
            format!(
                "password must be between {PASSWORD_MIN_LENGTH} and {PASSWORD_MAX_LENGTH} characters"
            ),
        ));
        return None;
    }

    if password != confirmation {
        errors.push(FieldError::new(
            "passwordConfirmation",
            "password confirmation does not match",
        ));
        return None;
    }

    Some(NewPassword::new(password.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::types::{ClientStatus, Gender};

    fn company() -> ClientInput {
        ClientInput {
            name: "Acme".to_string(),
            email: "a@acme.com".to_string(),
            tax_document: "12345678901234".to_string(),
            person_type: Some(PersonType::Company),
            phone: "11999999999".to_string(),
            state_registration_exempt: true,
            password: Some("abcdefgh".to_string()),
            password_confirmation: Some("abcdefgh".to_string()),
            ..ClientInput::default()
        }
    }

    fn individual() -> ClientInput {
        ClientInput {
            name: "Maria Souza".to_string(),
            email: "maria@example.com".to_string(),
            tax_document: "123.456.789-01".to_string(),
            person_type: Some(PersonType::Individual),
            phone: "(11) 98888-7777".to_string(),
            gender: Some(Gender::Female),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 17),
            password: Some("s3cretpass".to_string()),
            password_confirmation: Some("s3cretpass".to_string()),
            ..ClientInput::default()
        }
    }

    #[test]
    fn test_valid_company() {
        let valid = company().validate(ValidationMode::Create).unwrap();
        assert_eq!(valid.name, "Acme");
        assert_eq!(valid.tax_document.as_str(), "12345678901234");
        assert_eq!(valid.status, ClientStatus::Active);
        assert_eq!(valid.password.unwrap().expose(), "abcdefgh");
    }

    #[test]
    fn test_valid_individual_normalizes_documents() {
        let valid = individual().validate(ValidationMode::Create).unwrap();
        assert_eq!(valid.tax_document.as_str(), "12345678901");
        assert_eq!(valid.phone.as_str(), "11988887777");
        assert_eq!(valid.gender, Some(Gender::Female));
    }

    #[test]
    fn test_individual_requires_birth_date() {
        let input = ClientInput {
            birth_date: None,
            ..individual()
        };
        let errors = input.validate(ValidationMode::Create).unwrap_err();
        assert!(errors.has_field("birthDate"));
    }

    #[test]
    fn test_company_ignores_birth_date_and_gender() {
        let input = ClientInput {
            birth_date: NaiveDate::from_ymd_opt(2000, 1, 1),
            gender: Some(Gender::Other),
            ..company()
        };
        let valid = input.validate(ValidationMode::Create).unwrap();
        assert!(valid.birth_date.is_none());
        assert!(valid.gender.is_none());
    }

    #[test]
    fn test_collects_all_format_errors() {
        let input = ClientInput {
            name: "   ".to_string(),
            email: "not-an-email".to_string(),
            tax_document: "123".to_string(),
            phone: String::new(),
            person_type: None,
            ..ClientInput::default()
        };
        let errors = input.validate(ValidationMode::Create).unwrap_err();
        for field in ["name", "email", "taxDocument", "phone", "personType", "password"] {
            assert!(errors.has_field(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_name_length_limit() {
        let input = ClientInput {
            name: "x".repeat(151),
            ..company()
        };
        assert!(input
            .validate(ValidationMode::Create)
            .unwrap_err()
            .has_field("name"));

        let input = ClientInput {
            name: "x".repeat(150),
            ..company()
        };
        assert!(input.validate(ValidationMode::Create).is_ok());
    }

    #[test]
    fn test_state_registration_rules() {
        let input = ClientInput {
            state_registration: Some("1234567890123".to_string()),
            state_registration_exempt: false,
            ..company()
        };
        assert!(input
            .validate(ValidationMode::Create)
            .unwrap_err()
            .has_field("stateRegistration"));

        let input = ClientInput {
            state_registration: Some("  ".to_string()),
            state_registration_exempt: false,
            ..company()
        };
        assert!(input
            .validate(ValidationMode::Create)
            .unwrap()
            .state_registration
            .is_none());

        let input = ClientInput {
            state_registration: Some("110042490114".to_string()),
            state_registration_exempt: true,
            ..company()
        };
        assert!(input
            .validate(ValidationMode::Create)
            .unwrap()
            .state_registration
            .is_none());
    }

    #[test]
    fn test_password_required_on_create() {
        let input = ClientInput {
            password: None,
            password_confirmation: None,
            ..company()
        };
        let errors = input.validate(ValidationMode::Create).unwrap_err();
        assert_eq!(
            errors.messages_for("password").collect::<Vec<_>>(),
            vec!["password is required"]
        );
    }

    #[test]
    fn test_password_length_bounds() {
        for password in ["short", "sixteen-chars-xx"] {
            let input = ClientInput {
                password: Some(password.to_string()),
                password_confirmation: Some(password.to_string()),
                ..company()
            };
            assert!(input
                .validate(ValidationMode::Create)
                .unwrap_err()
                .has_field("password"));
        }
    }

    #[test]
    fn test_password_must_match_confirmation() {
        let input = ClientInput {
            password_confirmation: Some("abcdefgX".to_string()),
            ..company()
        };
        let errors = input.validate(ValidationMode::Create).unwrap_err();
        assert!(errors.has_field("passwordConfirmation"));
    }

    #[test]
    fn test_update_without_password_keeps_current() {
        let input = ClientInput {
            password: None,
            password_confirmation: Some(String::new()),
            ..company()
        };
        let valid = input.validate(ValidationMode::Update).unwrap();
        assert!(valid.password.is_none());
    }

    #[test]
    fn test_update_with_only_confirmation_keeps_password() {
        let input = ClientInput {
            password: None,
            password_confirmation: Some("abcdefgh".to_string()),
            ..company()
        };
        let valid = input.validate(ValidationMode::Update).unwrap();
        assert!(valid.password.is_none());

        let blank = ClientInput {
            password: Some(String::new()),
            password_confirmation: Some("something-else".to_string()),
            ..company()
        };
        assert!(blank.validate(ValidationMode::Update).unwrap().password.is_none());
    }

    #[test]
    fn test_update_with_password_without_confirmation_is_rejected() {
        let input = ClientInput {
            password_confirmation: None,
            ..company()
        };
        assert!(input.validate(ValidationMode::Update).is_err());
    }

    #[test]
    fn test_unique_field_error() {
        let errors = ValidationErrors::from(UniqueField::Email);
        assert_eq!(errors.errors().len(), 1);
        assert!(errors.has_field("email"));
        assert_eq!(
            errors.to_string(),
            "validation failed: email is already registered"
        );
    }
}
