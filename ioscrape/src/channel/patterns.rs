//! Patterns for the ssh login handshake and prompt-line matching.

use regex::bytes::Regex;

/// OpenSSH asking to trust an unknown host key.
pub const HOST_CONFIRM_PATTERN: &str = r"(?i)are you sure you want to continue connecting";

/// Password prompt from ssh or the device.
pub const PASSWORD_PATTERN: &str = r"(?i)password:";

/// Authentication rejected.
pub const PERMISSION_DENIED_PATTERN: &str = r"(?i)permission denied";

/// Compiled set of the device-independent login patterns.
#[derive(Debug, Clone)]
pub struct LoginPatterns {
    pub host_confirm: Regex,
    pub password: Regex,
    pub permission_denied: Regex,
}

impl LoginPatterns {
    /// Compile a custom set of login patterns.
    pub fn new(
        host_confirm: &str,
        password: &str,
        permission_denied: &str,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            host_confirm: Regex::new(host_confirm)?,
            password: Regex::new(password)?,
            permission_denied: Regex::new(permission_denied)?,
        })
    }
}

impl Default for LoginPatterns {
    fn default() -> Self {
        Self::new(
            HOST_CONFIRM_PATTERN,
            PASSWORD_PATTERN,
            PERMISSION_DENIED_PATTERN,
        )
        .expect("built-in login patterns are valid")
    }
}

/// Check whether `pattern` covers the whole of `line`.
///
/// The pattern is applied as-is to the single line; it is never spliced into
/// a larger expression, since prompt patterns may carry inline flags such as
/// `(?m)` that would change meaning inside a composite.
pub fn matches_full_line(pattern: &Regex, line: &str) -> bool {
    pattern
        .find(line.as_bytes())
        .is_some_and(|m| m.start() == 0 && m.end() == line.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_patterns_case_insensitive() {
        let p = LoginPatterns::default();
        assert!(p.password.is_match(b"user@switch's Password: "));
        assert!(p.permission_denied.is_match(b"Permission denied, please try again."));
        assert!(p.host_confirm.is_match(
            b"Are you sure you want to continue connecting (yes/no/[fingerprint])?"
        ));
    }

    #[test]
    fn test_full_line_match() {
        let prompt = Regex::new(r"(?m)^Cat_3560-PoE[>#]\s*$").unwrap();
        assert!(matches_full_line(&prompt, "Cat_3560-PoE#"));
        assert!(matches_full_line(&prompt, "Cat_3560-PoE> "));
        assert!(!matches_full_line(&prompt, "Cat_3560-PoE#show version"));
    }

    #[test]
    fn test_partial_match_is_not_full_line() {
        let prompt = Regex::new(r"[>#]\s*$").unwrap();
        assert!(!matches_full_line(&prompt, "Switch#"));
        assert!(matches_full_line(&prompt, "#"));
    }

    #[test]
    fn test_custom_patterns_reject_bad_regex() {
        assert!(LoginPatterns::new("(", PASSWORD_PATTERN, PERMISSION_DENIED_PATTERN).is_err());
    }
}
