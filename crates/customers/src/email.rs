use serde::{Deserialize, Serialize};

use ecommerce_core::{DomainError, DomainResult, ValueObject};

/// A syntactically valid e-mail address (trimmed, `local@domain.tld`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: impl AsRef<str>) -> DomainResult<Self> {
        let value = raw.as_ref().trim();
        if value.is_empty() {
            return Err(DomainError::validation("email cannot be empty"));
        }

        let mut parts = value.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(DomainError::validation(format!(
                "email '{value}' must contain exactly one '@'"
            )));
        };

        if local.is_empty() || domain.is_empty() {
            return Err(DomainError::validation(format!(
                "email '{value}' has an empty local or domain part"
            )));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(DomainError::validation(format!(
                "email '{value}' cannot contain whitespace"
            )));
        }
        if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
            return Err(DomainError::validation(format!(
                "email '{value}' has an invalid domain"
            )));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for EmailAddress {}

impl core::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_and_trims_valid_address() {
        let email = EmailAddress::parse("  jane.doe@example.com ").unwrap();
        assert_eq!(email.as_str(), "jane.doe@example.com");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for raw in [
            "",
            "   ",
            "no-at-sign",
            "two@@example.com",
            "a@b@c.com",
            "@example.com",
            "jane@",
            "jane@localhost",
            "jane@.com",
            "jane doe@example.com",
        ] {
            assert!(
                matches!(EmailAddress::parse(raw), Err(DomainError::Validation(_))),
                "expected '{raw}' to be rejected"
            );
        }
    }

    #[test]
    fn deserialization_validates() {
        let ok: EmailAddress = serde_json::from_str("\"a@b.io\"").unwrap();
        assert_eq!(ok.as_str(), "a@b.io");
        assert!(serde_json::from_str::<EmailAddress>("\"nope\"").is_err());
    }
}
