//! CPF/CNPJ tax document type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`TaxDocument`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TaxDocumentError {
    /// No digits were supplied.
    #[error("CPF/CNPJ is required")]
    Empty,
    /// The input contains something other than digits and punctuation.
    #[error("CPF/CNPJ must contain only numbers")]
    InvalidCharacter,
    /// Fewer than 11 digits.
    #[error("CPF/CNPJ must have at least {min} digits")]
    TooShort {
        /// Minimum digit count.
        min: usize,
    },
    /// More than 14 digits.
    #[error("CPF/CNPJ must have at most {max} digits")]
    TooLong {
        /// Maximum digit count.
        max: usize,
    },
}

/// A Brazilian tax document number (CPF for individuals, CNPJ for companies).
///
/// Stored digits-only. Formatting punctuation (`.`, `-`, `/` and spaces) is
/// stripped during parsing, so `123.456.789-01` and `12345678901` are the same
/// document. Check digits are not verified.
///
/// ```
/// use client_registry_core::TaxDocument;
///
/// let cnpj = TaxDocument::parse("12.345.678/9012-34").unwrap();
/// assert_eq!(cnpj.as_str(), "12345678901234");
/// assert!(TaxDocument::parse("1234567890").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TaxDocument(String);

impl TaxDocument {
    /// Digits in a CPF.
    pub const MIN_DIGITS: usize = 11;
    /// Digits in a CNPJ.
    pub const MAX_DIGITS: usize = 14;

    /// Parse and normalize a tax document.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains letters or other
    /// symbols, or does not normalize to 11-14 digits.
    pub fn parse(s: &str) -> Result<Self, TaxDocumentError> {
        let mut digits = String::with_capacity(Self::MAX_DIGITS);
        for c in s.chars() {
            match c {
                '0'..='9' => digits.push(c),
                '.' | '-' | '/' | ' ' => {}
                _ => return Err(TaxDocumentError::InvalidCharacter),
            }
        }

        match digits.len() {
            0 => Err(TaxDocumentError::Empty),
            n if n < Self::MIN_DIGITS => Err(TaxDocumentError::TooShort {
                min: Self::MIN_DIGITS,
            }),
            n if n > Self::MAX_DIGITS => Err(TaxDocumentError::TooLong {
                max: Self::MAX_DIGITS,
            }),
            _ => Ok(Self(digits)),
        }
    }

    /// Returns the normalized digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the document and returns its digits.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TaxDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TaxDocument {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for TaxDocument {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for TaxDocument {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for TaxDocument {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cpf_and_cnpj() {
        let cpf = TaxDocument::parse("12345678901").unwrap();
        assert_eq!(cpf.as_str().len(), 11);

        let cnpj = TaxDocument::parse("12345678901234").unwrap();
        assert_eq!(cnpj.as_str().len(), 14);
    }

    #[test]
    fn test_parse_strips_punctuation() {
        let cpf = TaxDocument::parse("123.456.789-01").unwrap();
        assert_eq!(cpf.as_str(), "12345678901");
    }

    #[test]
    fn test_parse_rejects_letters() {
        assert_eq!(
            TaxDocument::parse("123abc45678901"),
            Err(TaxDocumentError::InvalidCharacter)
        );
    }

    #[test]
    fn test_parse_length_bounds() {
        assert_eq!(TaxDocument::parse(""), Err(TaxDocumentError::Empty));
        assert_eq!(TaxDocument::parse("..-"), Err(TaxDocumentError::Empty));
        assert_eq!(
            TaxDocument::parse("1234567890"),
            Err(TaxDocumentError::TooShort { min: 11 })
        );
        assert_eq!(
            TaxDocument::parse("123456789012345"),
            Err(TaxDocumentError::TooLong { max: 14 })
        );
        assert!(TaxDocument::parse("1234567890123").is_ok());
    }
}
