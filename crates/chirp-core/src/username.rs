//! Username format rules.
//!
//! These checks run synchronously on the client and gate the remote
//! availability check: an input that fails here is never sent over the
//! wire. The remote applies the same rules again; the client copy exists
//! so feedback is immediate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shortest username the remote will check.
pub const USERNAME_MIN_LEN: usize = 3;
/// Longest accepted username.
pub const USERNAME_MAX_LEN: usize = 30;

/// Why a username fails the client-side format check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum UsernameFormatError {
    #[error("username must be at least {USERNAME_MIN_LEN} characters")]
    TooShort { len: usize },

    #[error("username must be at most {USERNAME_MAX_LEN} characters")]
    TooLong { len: usize },

    #[error("username may only contain letters, digits, '_' and '-'")]
    InvalidCharacter { ch: char },

    #[error("username may not start or end with '_' or '-'")]
    EdgeSeparator,
}

/// Normalize raw input the way the profile form does: trim surrounding
/// whitespace and lowercase.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Validate the username format: 3-30 characters from `[a-zA-Z0-9_-]`,
/// with no leading or trailing separator.
pub fn validate_username_format(username: &str) -> Result<(), UsernameFormatError> {
    let len = username.chars().count();
    if len < USERNAME_MIN_LEN {
        return Err(UsernameFormatError::TooShort { len });
    }
    if len > USERNAME_MAX_LEN {
        return Err(UsernameFormatError::TooLong { len });
    }
    if let Some(ch) = username
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(UsernameFormatError::InvalidCharacter { ch });
    }
    let edges = [username.chars().next(), username.chars().last()];
    if edges
        .into_iter()
        .flatten()
        .any(|c| c == '_' || c == '-')
    {
        return Err(UsernameFormatError::EdgeSeparator);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_usernames() {
        for name in ["abc", "wren_42", "a-b-c", "ThreeWordName", "x".repeat(30).as_str()] {
            assert!(validate_username_format(name).is_ok(), "{name} should pass");
        }
    }

    #[test]
    fn rejects_length_violations() {
        assert_eq!(
            validate_username_format("ab"),
            Err(UsernameFormatError::TooShort { len: 2 })
        );
        let long = "y".repeat(31);
        assert_eq!(
            validate_username_format(&long),
            Err(UsernameFormatError::TooLong { len: 31 })
        );
    }

    #[test]
    fn rejects_bad_characters_and_edges() {
        assert_eq!(
            validate_username_format("wren bird"),
            Err(UsernameFormatError::InvalidCharacter { ch: ' ' })
        );
        assert_eq!(
            validate_username_format("wren!"),
            Err(UsernameFormatError::InvalidCharacter { ch: '!' })
        );
        assert_eq!(
            validate_username_format("_wren"),
            Err(UsernameFormatError::EdgeSeparator)
        );
        assert_eq!(
            validate_username_format("wren-"),
            Err(UsernameFormatError::EdgeSeparator)
        );
    }

    #[test]
    fn normalization_trims_and_lowercases() {
        assert_eq!(normalize_username("  Wren_42 "), "wren_42");
    }
}
