//! Bank link details
//!
//! Validation of the bank-link onboarding form. No real bank is contacted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DomainError;

/// Supported banks and their IFSC prefixes
pub const SUPPORTED_BANKS: [(&str, &str); 6] = [
    ("SBI", "SBIN"),
    ("HDFC", "HDFC"),
    ("ICICI", "ICIC"),
    ("Axis", "UTIB"),
    ("PNB", "PUNB"),
    ("Canara", "CNRB"),
];

/// Look up the IFSC prefix for a bank name
pub fn ifsc_prefix(bank: &str) -> Option<&'static str> {
    SUPPORTED_BANKS
        .iter()
        .find(|(name, _)| *name == bank)
        .map(|(_, prefix)| *prefix)
}

/// Raw bank-link form as submitted by the user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BankLinkRequest {
    pub bank: String,
    pub account_holder: String,
    pub phone: String,
    pub email: String,
    pub account_number: String,
    pub branch: String,
    /// Last six digits of the IFSC; the prefix comes from the bank
    pub ifsc_suffix: String,
}

/// Validated bank metadata stored on a linked account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    pub bank: String,
    pub ifsc: String,
    pub account_number: String,
    pub account_holder: String,
    pub branch: String,
    pub linked_at: DateTime<Utc>,
}

/// Bank link state of an account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BankLink {
    #[default]
    Unlinked,
    Linked(BankDetails),
}

impl BankLink {
    pub fn is_linked(&self) -> bool {
        matches!(self, BankLink::Linked(_))
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl BankLinkRequest {
    /// Validate the form and build the stored details.
    ///
    /// Contact fields (`phone`, `email`) are validated here and applied to the
    /// account by the caller.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<BankDetails, DomainError> {
        let fields = [
            &self.bank,
            &self.account_holder,
            &self.phone,
            &self.email,
            &self.account_number,
            &self.branch,
            &self.ifsc_suffix,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(DomainError::InvalidBankDetails(
                "All fields are required".to_string(),
            ));
        }

        let prefix = ifsc_prefix(self.bank.trim()).ok_or_else(|| {
            DomainError::InvalidBankDetails(format!("Unsupported bank: {}", self.bank))
        })?;

        let ifsc_suffix = self.ifsc_suffix.trim();
        if !all_digits(ifsc_suffix) || ifsc_suffix.len() != 6 {
            return Err(DomainError::InvalidBankDetails(
                "IFSC last 6 digits must be numeric".to_string(),
            ));
        }

        let account_number = self.account_number.trim();
        if !all_digits(account_number) || !(9..=12).contains(&account_number.len()) {
            return Err(DomainError::InvalidBankDetails(
                "Account number must be 9-12 digits".to_string(),
            ));
        }

        let phone = self.phone.trim();
        if !all_digits(phone) || phone.len() != 10 {
            return Err(DomainError::InvalidBankDetails(
                "Phone number must be 10 digits".to_string(),
            ));
        }

        Ok(BankDetails {
            bank: self.bank.trim().to_string(),
            ifsc: format!("{}{}", prefix, ifsc_suffix),
            account_number: account_number.to_string(),
            account_holder: self.account_holder.trim().to_string(),
            branch: self.branch.trim().to_string(),
            linked_at: now,
        })
    }
}
