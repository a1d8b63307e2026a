//! Account Aggregate
//!
//! Account is the core aggregate holding a balance, login credential, PIN,
//! face template and bank link. All balance changes go through `debit` and
//! `credit`, which enforce the non-negative balance invariant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    is_merchant_id, Amount, Balance, BankDetails, BankLink, CredentialHash, DomainError, Pin,
};

/// Account role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    #[default]
    Personal,
    Merchant,
}

/// Everything needed to open an account except its identifier
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub display_name: String,
    pub email: String,
    pub phone: String,
    pub credential: String,
    pub role: AccountRole,
}

impl NewAccount {
    pub fn new(
        display_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            email: email.into(),
            phone: phone.into(),
            credential: credential.into(),
            role: AccountRole::Personal,
        }
    }

    pub fn merchant(mut self) -> Self {
        self.role = AccountRole::Merchant;
        self
    }

    /// Reject blank fields before an identifier is spent on the draft
    pub fn validate(&self) -> Result<(), DomainError> {
        let blank = [
            ("display_name", &self.display_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("credential", &self.credential),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());

        match blank {
            Some((field, _)) => Err(DomainError::BusinessRuleViolation(format!(
                "{} is required",
                field
            ))),
            None => Ok(()),
        }
    }
}

/// Account Aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Shareable account id (merchant ids carry the `M` prefix)
    id: String,

    display_name: String,

    email: String,

    phone: String,

    /// SHA-256 digest of the login credential
    credential: CredentialHash,

    /// Current balance, never negative
    balance: Balance,

    #[serde(default)]
    pin: Option<Pin>,

    /// Face embedding enrolled by the owner
    #[serde(default)]
    biometric_template: Option<Vec<f32>>,

    #[serde(default)]
    bank_link: BankLink,

    role: AccountRole,

    created_at: DateTime<Utc>,
}

impl Account {
    // =========================================================================
    // Account::create()
    // =========================================================================

    /// Open an account with a zero balance
    pub fn create(id: String, draft: NewAccount, now: DateTime<Utc>) -> Self {
        Self {
            id,
            display_name: draft.display_name.trim().to_string(),
            email: draft.email.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            credential: CredentialHash::from_secret(&draft.credential),
            balance: Balance::zero(),
            pin: None,
            biometric_template: None,
            bank_link: BankLink::Unlinked,
            role: draft.role,
            created_at: now,
        }
    }

    // =========================================================================
    // Account::debit()
    // =========================================================================

    /// Withdraw money, failing if the balance would go negative
    pub fn debit(&mut self, amount: &Amount) -> Result<(), DomainError> {
        if !self.balance.is_sufficient_for(amount) {
            return Err(DomainError::insufficient_balance(
                amount.value(),
                self.balance.value(),
            ));
        }

        self.balance = self
            .balance
            .debit(amount)
            .map_err(|e| DomainError::BusinessRuleViolation(e.to_string()))?;
        Ok(())
    }

    // =========================================================================
    // Account::credit()
    // =========================================================================

    /// Deposit money
    pub fn credit(&mut self, amount: &Amount) -> Result<(), DomainError> {
        self.balance = self
            .balance
            .credit(amount)
            .map_err(|e| DomainError::BusinessRuleViolation(e.to_string()))?;
        Ok(())
    }

    pub fn verify_credential(&self, secret: &str) -> bool {
        self.credential.matches(secret)
    }

    pub fn set_pin(&mut self, pin: Pin) {
        self.pin = Some(pin);
    }

    pub fn set_biometric_template(&mut self, embedding: Vec<f32>) {
        self.biometric_template = Some(embedding);
    }

    /// Mark the account linked and adopt the contact details from the form
    pub fn link_bank(&mut self, details: BankDetails, phone: String, email: String) {
        self.bank_link = BankLink::Linked(details);
        self.phone = phone;
        self.email = email;
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn balance(&self) -> &Balance {
        &self.balance
    }

    pub fn pin(&self) -> Option<&Pin> {
        self.pin.as_ref()
    }

    pub fn biometric_template(&self) -> Option<&[f32]> {
        self.biometric_template.as_deref()
    }

    pub fn bank_link(&self) -> &BankLink {
        &self.bank_link
    }

    pub fn role(&self) -> AccountRole {
        self.role
    }

    pub fn is_merchant(&self) -> bool {
        self.role == AccountRole::Merchant || is_merchant_id(&self.id)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// =========================================================================
// Account unit tests
// =========================================================================
