//! Demo-code extraction from message bodies.
//!
//! Pure function over the body text; no side effects. The code is a run of
//! 12 to 15 decimal digits after a fixed literal marker. Longer digit runs
//! are rejected so a truncated prefix of some other number is never relayed.

use regex::Regex;
use std::sync::OnceLock;

/// Case-insensitive marker, optional whitespace (newlines included), then the
/// digit run. The trailing `\D|$` refuses runs longer than 15 digits.
const CODE_PATTERN: &str = r"(?i)Ваш тестовый код:\s*(\d{12,15})(?:\D|$)";

fn code_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(CODE_PATTERN).expect("valid demo-code pattern"))
}

/// Extract the first demo code from a message body, if present.
pub fn extract_demo_code(body: &str) -> Option<&str> {
    code_regex()
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_from_real_body() {
        let body = "Ваша ссылка https://example.invalid/demo \
                    Ваш тестовый код: 34241999578662 действует 24 часа";
        assert_eq!(extract_demo_code(body), Some("34241999578662"));
    }

    #[test]
    fn test_tolerates_newlines_after_marker() {
        let body = "Здравствуйте!\nВаш тестовый код:\n\n  123456789012345\nСпасибо";
        assert_eq!(extract_demo_code(body), Some("123456789012345"));
    }

    #[test]
    fn test_case_insensitive_marker() {
        let body = "ВАШ ТЕСТОВЫЙ КОД: 123456789012";
        assert_eq!(extract_demo_code(body), Some("123456789012"));
    }

    #[test]
    fn test_code_at_end_of_body() {
        assert_eq!(
            extract_demo_code("Ваш тестовый код: 123456789012"),
            Some("123456789012")
        );
    }

    #[test]
    fn test_no_marker_no_match() {
        assert_eq!(extract_demo_code("Ваш код: 123456789012345"), None);
        assert_eq!(extract_demo_code("random text 34241999578662"), None);
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(extract_demo_code(""), None);
    }

    #[test]
    fn test_eleven_digits_too_short() {
        assert_eq!(extract_demo_code("Ваш тестовый код: 12345678901"), None);
    }

    #[test]
    fn test_sixteen_digits_too_long() {
        assert_eq!(
            extract_demo_code("Ваш тестовый код: 1234567890123456 действует"),
            None
        );
    }

    #[test]
    fn test_first_match_wins() {
        let body = "Ваш тестовый код: 111111111111 и ещё раз \
                    Ваш тестовый код: 222222222222";
        assert_eq!(extract_demo_code(body), Some("111111111111"));
    }

    #[test]
    fn test_non_digit_after_marker() {
        assert_eq!(extract_demo_code("Ваш тестовый код: abc123"), None);
    }
}
