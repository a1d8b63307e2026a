//! Identifier generation
//!
//! Short, human-shareable alphanumeric identifiers for accounts and
//! transactions. Uniqueness is enforced by the caller-supplied `is_taken`
//! predicate; generation retries until a free identifier is found.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Reserved first character of every merchant account id
pub const MERCHANT_PREFIX: char = 'M';

const PERSONAL_ID_LEN: usize = 6;
const MERCHANT_SUFFIX_LEN: usize = 5;
const TRANSACTION_ID_LEN: usize = 10;

/// What an identifier is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    /// 6 characters, never starting with the merchant prefix
    Personal,
    /// Merchant prefix followed by 5 characters
    Merchant,
    /// 10 characters
    Transaction,
}

/// Check whether an account id belongs to a merchant.
pub fn is_merchant_id(id: &str) -> bool {
    id.starts_with(MERCHANT_PREFIX)
}

fn random_chars<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

fn candidate<R: Rng + ?Sized>(kind: IdKind, rng: &mut R) -> String {
    match kind {
        IdKind::Personal => random_chars(rng, PERSONAL_ID_LEN),
        IdKind::Merchant => {
            let mut id = String::with_capacity(MERCHANT_SUFFIX_LEN + 1);
            id.push(MERCHANT_PREFIX);
            id.push_str(&random_chars(rng, MERCHANT_SUFFIX_LEN));
            id
        }
        IdKind::Transaction => random_chars(rng, TRANSACTION_ID_LEN),
    }
}

/// Generate an identifier of the given kind that `is_taken` rejects nowhere.
///
/// Loops until a free identifier is drawn; with 62^5 or more combinations the
/// expected number of retries is negligible at this scale.
pub fn generate_id<R, F>(kind: IdKind, rng: &mut R, is_taken: F) -> String
where
    R: Rng + ?Sized,
    F: Fn(&str) -> bool,
{
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let id = candidate(kind, rng);

        if kind == IdKind::Personal && is_merchant_id(&id) {
            continue;
        }
        if is_taken(&id) {
            tracing::debug!(attempts, kind = ?kind, "Identifier collision, retrying");
            continue;
        }
        return id;
    }
}
