//! Lexical validation for vocabulary tokens.

use once_cell::sync::Lazy;
use regex::Regex;

/// Full token shape: starts with a letter, lowercase alphanumerics and
/// single underscores only.
static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9]*(_[a-z0-9]+)*$").expect("valid token regex"));

/// Check whether a token satisfies the lexical pattern.
pub fn is_valid_token(token: &str) -> bool {
    validate_token(token).is_ok()
}

/// Validate a token against the vocabulary lexical rules.
///
/// Rules: non-empty, lowercase `[a-z0-9_]` only, starts with a letter, no
/// leading/trailing/double underscore, and no underscore-delimited segment
/// that is purely numeric.
pub fn validate_token(token: &str) -> Result<(), String> {
    if token.is_empty() {
        return Err("token must not be empty".to_string());
    }
    if token.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(format!("token '{token}' must be lowercase"));
    }
    if token.starts_with('_') || token.ends_with('_') {
        return Err(format!(
            "token '{token}' must not start or end with an underscore"
        ));
    }
    if token.contains("__") {
        return Err(format!(
            "token '{token}' must not contain a double underscore"
        ));
    }
    if !TOKEN_RE.is_match(token) {
        return Err(format!(
            "token '{token}' must start with a letter and contain only [a-z0-9_]"
        ));
    }
    if token
        .split('_')
        .any(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(format!(
            "token '{token}' must not contain a purely numeric segment"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_tokens() {
        assert!(is_valid_token("radial"));
        assert!(is_valid_token("flux_surface"));
        assert!(is_valid_token("b0"));
        assert!(is_valid_token("second_harmonic"));
    }

    #[test]
    fn test_uppercase_rejected() {
        assert!(!is_valid_token("Radial"));
        assert!(!is_valid_token("rADIAL"));
    }

    #[test]
    fn test_underscore_placement() {
        assert!(!is_valid_token("_radial"));
        assert!(!is_valid_token("radial_"));
        assert!(!is_valid_token("radial__field"));
    }

    #[test]
    fn test_leading_digit_rejected() {
        assert!(!is_valid_token("1radial"));
    }

    #[test]
    fn test_numeric_segment_rejected() {
        assert!(!is_valid_token("test_123_token"));
        assert!(!is_valid_token("coil_42"));
    }

    #[test]
    fn test_empty_and_bad_chars() {
        assert!(!is_valid_token(""));
        assert!(!is_valid_token("flux-surface"));
        assert!(!is_valid_token("flux surface"));
    }

    #[test]
    fn test_error_messages_name_the_token() {
        let err = validate_token("Radial").unwrap_err();
        assert!(err.contains("Radial"));
        assert!(err.contains("lowercase"));
    }
}
