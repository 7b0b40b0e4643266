//! Validation rules for version strings.
//!
//! Pure functions with no I/O or side effects.

use crate::error::{Result, UpdateError};

const MAX_VERSION_LENGTH: usize = 256;

/// Validates a stemcell version before it is written.
///
/// Versions are opaque tokens. They only have to fit on the single line
/// that holds the field.
///
/// ## Rules
/// - Not empty, at most 256 bytes
/// - No line breaks or other control characters
/// - No leading or trailing whitespace
///
/// ## Warnings (non-fatal)
/// - Characters outside `[A-Za-z0-9._+-]` (will usually be quoted)
pub fn validate_version(version: &str) -> Result<()> {
    if version.is_empty() {
        return Err(UpdateError::InvalidVersion(
            version.to_string(),
            "cannot be empty".to_string(),
        ));
    }

    if version.len() > MAX_VERSION_LENGTH {
        return Err(UpdateError::InvalidVersion(
            version.to_string(),
            format!(
                "exceeds {} bytes (has {})",
                MAX_VERSION_LENGTH,
                version.len()
            ),
        ));
    }

    if let Some((idx, ch)) = version.char_indices().find(|(_, c)| c.is_control()) {
        let what = if matches!(ch, '\n' | '\r') {
            "line break"
        } else {
            "control character"
        };
        return Err(UpdateError::InvalidVersion(
            version.escape_debug().to_string(),
            format!("{} at position {}", what, idx),
        ));
    }

    if version.trim() != version {
        return Err(UpdateError::InvalidVersion(
            version.to_string(),
            "cannot start or end with whitespace".to_string(),
        ));
    }

    if !version
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-'))
    {
        log::warn!("'{}' has unusual characters for a stemcell version", version);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_common_versions() {
        assert!(validate_version("new-stemcell-version").is_ok());
        assert!(validate_version("621.74").is_ok());
        assert!(validate_version("latest").is_ok());
        assert!(validate_version("3586.100+dev.1").is_ok());
    }

    #[test]
    fn test_validate_opaque_tokens() {
        // Quoted on write, but still a single scalar
        assert!(validate_version("a: b").is_ok());
        assert!(validate_version("it's").is_ok());
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(matches!(
            validate_version(""),
            Err(UpdateError::InvalidVersion(..))
        ));
    }

    #[test]
    fn test_validate_rejects_line_breaks() {
        let err = validate_version("1.0\nstemcells: []").unwrap_err();
        assert!(err.to_string().contains("line break"));
        assert!(validate_version("1.0\r").is_err());
        assert!(validate_version("1\t0").is_err());
    }

    #[test]
    fn test_validate_rejects_surrounding_whitespace() {
        assert!(validate_version(" 1.0").is_err());
        assert!(validate_version("1.0 ").is_err());
    }

    #[test]
    fn test_validate_length_limit() {
        assert!(validate_version(&"1".repeat(MAX_VERSION_LENGTH)).is_ok());
        assert!(validate_version(&"1".repeat(MAX_VERSION_LENGTH + 1)).is_err());
    }
}
