//! Per-device connection profile.

use std::sync::LazyLock;

use regex::bytes::Regex;

/// Prompt used when a profile does not name its own: one word followed by
/// `>` (user EXEC) or `#` (privileged EXEC) on a line of its own.
pub const DEFAULT_PROMPT_PATTERN: &str = r"(?m)^\S+[>#]\s*$";

static DEFAULT_PROMPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_PROMPT_PATTERN).expect("default prompt pattern is valid"));

/// Everything needed to reach and drive one device.
///
/// `platform` and `role` are descriptive only; they are echoed back in tool
/// results and never change how the session is driven.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    /// Caller-facing identifier (e.g., "Cisco-3560-PoE-switch").
    pub display_id: String,

    /// Host alias resolved by the ssh client config.
    pub connection_alias: String,

    /// Platform tag (default: "ios").
    pub platform: String,

    /// Role tag (default: "switch").
    pub role: String,

    /// Matches one full prompt line in either EXEC mode.
    pub prompt: Regex,
}

impl DeviceProfile {
    /// Create a profile with the default tags and prompt.
    pub fn new(display_id: impl Into<String>, connection_alias: impl Into<String>) -> Self {
        Self {
            display_id: display_id.into(),
            connection_alias: connection_alias.into(),
            platform: "ios".to_string(),
            role: "switch".to_string(),
            prompt: DEFAULT_PROMPT.clone(),
        }
    }

    /// Set the platform tag.
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Set the role tag.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    /// Set the prompt pattern.
    pub fn with_prompt(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.prompt = Regex::new(pattern)?;
        Ok(self)
    }

    /// Source text of the prompt pattern.
    pub fn prompt_pattern(&self) -> &str {
        self.prompt.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let profile = DeviceProfile::new("Dev-A", "dev-a");
        assert_eq!(profile.platform, "ios");
        assert_eq!(profile.role, "switch");
        assert_eq!(profile.prompt_pattern(), DEFAULT_PROMPT_PATTERN);
    }

    #[test]
    fn test_default_prompt_matches_both_modes() {
        let profile = DeviceProfile::new("Dev-A", "dev-a");
        assert!(profile.prompt.is_match(b"output\r\nSwitch>"));
        assert!(profile.prompt.is_match(b"output\r\nSwitch#"));
        assert!(!profile.prompt.is_match(b"Switch(config)# interface"));
    }

    #[test]
    fn test_with_prompt_rejects_bad_regex() {
        assert!(DeviceProfile::new("Dev-A", "dev-a").with_prompt("[").is_err());
    }
}
