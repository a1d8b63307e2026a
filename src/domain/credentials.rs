//! Credentials
//!
//! Login secrets are stored as SHA-256 hex digests; PINs are validated
//! four-digit codes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use super::DomainError;

/// SHA-256 hex digest of a login credential
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialHash(String);

impl CredentialHash {
    pub fn from_secret(secret: &str) -> Self {
        Self(hex::encode(Sha256::digest(secret.as_bytes())))
    }

    pub fn matches(&self, secret: &str) -> bool {
        *self == Self::from_secret(secret)
    }
}

// Never print the digest
impl fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialHash(..)")
    }
}

/// A four-digit PIN
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pin(String);

impl Pin {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(****)")
    }
}

impl FromStr for Pin {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(DomainError::InvalidPin)
        }
    }
}

impl TryFrom<String> for Pin {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Pin> for String {
    fn from(pin: Pin) -> Self {
        pin.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_hash_matches() {
        let hash = CredentialHash::from_secret("hunter22");
        assert!(hash.matches("hunter22"));
        assert!(!hash.matches("hunter23"));
        assert_eq!(format!("{:?}", hash), "CredentialHash(..)");
    }

    #[test]
    fn test_pin_format() {
        assert!("0420".parse::<Pin>().is_ok());
        assert_eq!("123".parse::<Pin>(), Err(DomainError::InvalidPin));
        assert_eq!("12345".parse::<Pin>(), Err(DomainError::InvalidPin));
        assert_eq!("12a4".parse::<Pin>(), Err(DomainError::InvalidPin));
        // Non-ASCII digits are rejected even though they are numeric
        assert_eq!("١٢٣٤".parse::<Pin>(), Err(DomainError::InvalidPin));
    }
}
