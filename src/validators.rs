use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

/// Input validation utilities for the identity core

// Compiled once at startup; the pattern is a hardcoded constant.
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("hardcoded email regex is invalid - fix source code")
});

/// Validate email format (RFC 5322 simplified)
pub fn validate_email(email: &str) -> bool {
    !email.is_empty() && email.len() <= 254 && EMAIL_REGEX.is_match(email)
}

/// Validate a display/full name: 1-120 chars, not all whitespace.
pub fn validate_full_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && name.len() <= 120
}

/// validator crate compatible adapter for full-name shape
pub fn validate_full_name_validator(name: &str) -> Result<(), ValidationError> {
    if validate_full_name(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_full_name"))
    }
}

/// Validate password composition:
/// - Minimum 8 characters
/// - At least one uppercase letter
/// - At least one lowercase letter
/// - At least one digit
pub fn validate_password_composition(password: &str) -> bool {
    if password.len() < 8 {
        return false;
    }

    let has_uppercase = password.chars().any(|c| c.is_uppercase());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    has_uppercase && has_lowercase && has_digit
}

/// Entropy-based strength check; passes at zxcvbn score >= 3.
pub fn validate_password_entropy(password: &str) -> bool {
    match zxcvbn::zxcvbn(password, &[]) {
        Ok(result) => result.score() >= 3,
        Err(_) => false,
    }
}

/// Validate a supplied verification code shape: numeric, human-typable.
pub fn validate_code_shape(code: &str) -> bool {
    !code.is_empty() && code.len() <= 16 && code.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("test.user+tag@sub.example.co.uk"));
    }

    #[test]
    fn test_invalid_email() {
        assert!(!validate_email("invalid"));
        assert!(!validate_email("@example.com"));
        assert!(!validate_email("user@"));
    }

    #[test]
    fn test_full_name() {
        assert!(validate_full_name("Amara Perera"));
        assert!(!validate_full_name("   "));
        assert!(!validate_full_name(&"a".repeat(121)));
    }

    #[test]
    fn test_password_composition() {
        assert!(validate_password_composition("SecurePass123"));
        assert!(!validate_password_composition("short1A")); // Too short
        assert!(!validate_password_composition("nouppercase123")); // No uppercase
        assert!(!validate_password_composition("NOLOWERCASE123")); // No lowercase
        assert!(!validate_password_composition("NoDigitsHere")); // No digits
    }

    #[test]
    fn test_password_entropy() {
        assert!(validate_password_entropy("correct-horse-battery-staple"));
        assert!(!validate_password_entropy("password"));
    }

    #[test]
    fn test_code_shape() {
        assert!(validate_code_shape("560001"));
        assert!(!validate_code_shape(""));
        assert!(!validate_code_shape("56 0001"));
        assert!(!validate_code_shape("abc123"));
    }
}
