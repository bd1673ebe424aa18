//! Error types for keychain operations.
//!
//! The canonicalization and decoding routines never fail; everything that
//! talks to the vault surfaces errors through [`KeychainError`].

use crate::status;

/// Unified error type for keychaineditor.
#[derive(Debug, thiserror::Error)]
pub enum KeychainError {
    // -- Vault errors -------------------------------------------------------
    /// The vault returned a non-success `OSStatus`.
    #[error("{}", describe(.code))]
    Status { code: i32 },

    /// No vault backend exists for the current platform.
    #[error("keychain unavailable: this platform has no SecItem API")]
    UnsupportedPlatform,

    // -- Underlying errors --------------------------------------------------
    /// Catch-all for unexpected internal errors.
    #[error("internal keychain error: {0}")]
    Internal(String),
}

impl KeychainError {
    /// The vault status code carried by this error, if any.
    pub fn status_code(&self) -> Option<i32> {
        match self {
            Self::Status { code } => Some(*code),
            _ => None,
        }
    }
}

fn describe(code: &i32) -> String {
    status::status_message(*code)
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KeychainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_displays_vault_message() {
        let err = KeychainError::Status { code: -25300 };
        assert_eq!(err.to_string(), "Item not found.");
        assert_eq!(err.status_code(), Some(-25300));
    }

    #[test]
    fn non_status_errors_have_no_code() {
        let err = KeychainError::UnsupportedPlatform;
        assert_eq!(err.status_code(), None);
        assert!(err.to_string().starts_with("keychain unavailable"));
    }
}
