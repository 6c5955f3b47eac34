//! String utilities for the domain layer.

/// First `max_chars` characters of `s` (counted in chars, not bytes).
pub fn take_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Lowercase, whitespace-collapsed form used to compare free-text statements.
pub fn normalize_statement(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_chars_counts_characters() {
        // 'é' is 2 bytes but one character
        assert_eq!(take_chars("héllo", 2), "hé");
        assert_eq!(take_chars("abc", 10), "abc");
        assert_eq!(take_chars("", 3), "");
    }

    #[test]
    fn test_normalize_statement() {
        assert_eq!(
            normalize_statement("  Test   Coverage is\nLOW "),
            "test coverage is low"
        );
    }
}
