//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::{errors::SessionError, roster::validate_name};

/// Validates a player display name with the same rules the roster applies.
///
/// # Examples
///
/// ```ignore
/// validate_player_name("Ana")       // Ok
/// validate_player_name("   ")       // Err - blank
/// validate_player_name("a\u{7}b")   // Err - control character
/// ```
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    match validate_name(name) {
        Ok(_) => Ok(()),
        Err(SessionError::InvalidName(reason)) => {
            let mut err = ValidationError::new("player_name");
            err.message = Some(reason.into());
            Err(err)
        }
        Err(_) => Err(ValidationError::new("player_name")),
    }
}

/// Validates that an identifier is not blank once trimmed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_player_name_valid() {
        assert!(validate_player_name("Ana").is_ok());
        assert!(validate_player_name("  Ben  ").is_ok());
        assert!(validate_player_name(&"x".repeat(32)).is_ok());
    }

    #[test]
    fn test_validate_player_name_invalid() {
        assert!(validate_player_name("").is_err());
        assert!(validate_player_name("   ").is_err());
        assert!(validate_player_name(&"x".repeat(33)).is_err());
        assert!(validate_player_name("a\u{7}b").is_err());
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("general").is_ok());
        assert!(validate_not_blank(" \t").is_err());
    }
}
