//! Cleanup of captured command output.

use log::debug;
use regex::bytes::Regex;

use crate::channel::patterns::matches_full_line;

/// Drop the first line of a capture: the device's echo of the command.
///
/// The line is removed even when it does not look like the command; a
/// mismatch is only logged.
pub fn strip_echo<'a>(raw: &'a str, command: &str) -> &'a str {
    let (echo, rest) = match memchr::memchr(b'\n', raw.as_bytes()) {
        Some(newline) => (&raw[..newline], &raw[newline + 1..]),
        None => (raw, ""),
    };
    if !echo.contains(command.trim()) {
        debug!("first captured line {:?} is not an echo of {:?}", echo, command);
    }
    rest
}

/// Strip trailing blank lines and a trailing prompt line.
///
/// Lines are split on `\n` with any `\r` before it dropped, then trailing
/// whitespace-only lines are removed. If the last remaining line is a full
/// match of `prompt`, it goes too. The result has no trailing whitespace.
pub fn normalize(text: &str, prompt: &Regex) -> String {
    let mut lines: Vec<&str> = text.lines().map(|l| l.trim_end_matches('\r')).collect();

    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    if lines.last().is_some_and(|l| matches_full_line(prompt, l)) {
        lines.pop();
    }

    lines.join("\n").trim_end().to_string()
}

/// Join command outputs with one blank line, skipping empty ones.
pub fn join_outputs<'a>(outputs: impl IntoIterator<Item = &'a str>) -> String {
    outputs
        .into_iter()
        .filter(|o| !o.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt() -> Regex {
        Regex::new(r"(?m)^Cat_3560-PoE[>#]\s*$").unwrap()
    }

    #[test]
    fn test_removes_trailing_prompt_line() {
        let text = "Cisco IOS Software\r\nuptime is 3 weeks\r\nCat_3560-PoE#";
        assert_eq!(
            normalize(text, &prompt()),
            "Cisco IOS Software\nuptime is 3 weeks"
        );
    }

    #[test]
    fn test_removes_exactly_one_prompt_line() {
        let text = "Cat_3560-PoE#\r\nCat_3560-PoE#\r\n";
        assert_eq!(normalize(text, &prompt()), "Cat_3560-PoE#");
    }

    #[test]
    fn test_prompt_after_blank_lines() {
        let text = "line one\r\n\r\n   \r\nCat_3560-PoE>\r\n\r\n";
        assert_eq!(normalize(text, &prompt()), "line one");
    }

    #[test]
    fn test_keeps_last_line_that_is_not_a_prompt() {
        let text = "Configuration register is 0xF\r\n\r\n";
        assert_eq!(
            normalize(text, &prompt()),
            "Configuration register is 0xF"
        );
    }

    #[test]
    fn test_prompt_with_trailing_text_is_output() {
        let text = "Cat_3560-PoE#show clock";
        assert_eq!(normalize(text, &prompt()), text);
    }

    #[test]
    fn test_inline_flags_in_prompt_pattern() {
        let prompt = Regex::new(r"(?mi)^switch-[0-9]+[>#]\s*$").unwrap();
        assert_eq!(normalize("ok\r\nSWITCH-12#", &prompt), "ok");
    }

    #[test]
    fn test_idempotent() {
        let prompt = prompt();
        for text in [
            "",
            "\r\n\r\n",
            "Cat_3560-PoE#",
            "a\r\nb  \r\n\r\nCat_3560-PoE#  \r\n",
            "  leading space kept\r\nlast\t\r\n",
            "Cisco IOS\r\n\r\nModel number : WS-C3560-8PC-S\r\n",
        ] {
            let once = normalize(text, &prompt);
            assert_eq!(normalize(&once, &prompt), once, "input {text:?}");
        }
    }

    #[test]
    fn test_strip_echo() {
        assert_eq!(
            strip_echo("show version\r\nCisco IOS\r\n", "show version"),
            "Cisco IOS\r\n"
        );
        // Removed even when empty.
        assert_eq!(strip_echo("\r\nreal output", "show version"), "real output");
        assert_eq!(strip_echo("show version", "show version"), "");
    }

    #[test]
    fn test_strip_echo_without_echo_still_drops_first_line() {
        assert_eq!(strip_echo("Cisco IOS\r\nmore\r\n", "show version"), "more\r\n");
    }

    #[test]
    fn test_join_outputs() {
        assert_eq!(join_outputs(["first", "second"]), "first\n\nsecond");
        assert_eq!(join_outputs(["first", "", "second"]), "first\n\nsecond");
        assert_eq!(join_outputs(["", ""]), "");
    }
}
