//! Authentication module
//!
//! PIN lockout state machine, login sessions, and face matching.

pub mod biometric;
pub mod lockout;
mod session;

pub use biometric::{cosine_similarity, BiometricMatcher, FaceMatch, DEFAULT_MATCH_THRESHOLD};
pub use lockout::{LockState, LockoutPolicy, PinCheck, PinLockout};
pub use session::{Session, SessionRegistry};
