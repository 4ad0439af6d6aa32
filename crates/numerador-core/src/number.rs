//! Protocol number formatting.
//!
//! A protocol number is the counter value zero-padded to a fixed width,
//! a slash, and the four-digit year: `003/2025`. Some desks put a fixed
//! organizational prefix in front: `466-003/2025`. Which one applies is a
//! deployment decision, so the policy is a value and not a constant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Default zero-padding width for the counter component.
pub const DEFAULT_WIDTH: usize = 3;

/// Deterministic numbering policy.
///
/// `format` is a pure function of `(value, doc_type, year)`. Values wider
/// than `width` are printed in full, never truncated, so distinct values
/// for the same type and year always produce distinct numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberFormat {
    /// Prefix applied to every type without an override.
    pub prefix: Option<String>,
    /// Per-type prefix overrides.
    pub type_prefixes: BTreeMap<String, String>,
    /// Minimum number of digits in the counter component.
    pub width: usize,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            prefix: None,
            type_prefixes: BTreeMap::new(),
            width: DEFAULT_WIDTH,
        }
    }
}

impl NumberFormat {
    /// Plain `NNN/YYYY` numbers.
    pub fn plain() -> Self {
        Self::default()
    }

    /// `PREFIX-NNN/YYYY` numbers for every type.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    /// Override the prefix for a single type.
    pub fn type_prefix(mut self, doc_type: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.type_prefixes.insert(doc_type.into(), prefix.into());
        self
    }

    /// Set the minimum digit count.
    pub fn width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Prefix in effect for a type.
    pub fn prefix_for(&self, doc_type: &str) -> Option<&str> {
        self.type_prefixes
            .get(doc_type)
            .map(String::as_str)
            .or(self.prefix.as_deref())
            .filter(|p| !p.is_empty())
    }

    /// Format a counter value into a protocol number.
    pub fn format(&self, value: u64, doc_type: &str, year: i32) -> String {
        let width = self.width;
        match self.prefix_for(doc_type) {
            Some(prefix) => format!("{prefix}-{value:0width$}/{year}"),
            None => format!("{value:0width$}/{year}"),
        }
    }

    /// Recover `(value, year)` from a formatted number.
    ///
    /// Accepts both prefixed and plain numbers regardless of the policy in
    /// effect, so history written under an older policy still parses.
    pub fn parse_sequence(number: &str) -> Result<(u64, i32), ValidationError> {
        let malformed = || ValidationError::MalformedNumber(number.to_string());

        let (head, year) = number.rsplit_once('/').ok_or_else(malformed)?;
        let digits = head.rsplit_once('-').map_or(head, |(_, d)| d);

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        let value = digits.parse::<u64>().map_err(|_| malformed())?;
        let year = year.parse::<i32>().map_err(|_| malformed())?;
        Ok((value, year))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plain_format() {
        let fmt = NumberFormat::plain();
        assert_eq!(fmt.format(1, "Oficio", 2025), "001/2025");
        assert_eq!(fmt.format(42, "Oficio", 2025), "042/2025");
        assert_eq!(fmt.format(1234, "Oficio", 2025), "1234/2025");
    }

    #[test]
    fn test_prefixed_format() {
        let fmt = NumberFormat::with_prefix("466");
        assert_eq!(fmt.format(3, "Oficio", 2025), "466-003/2025");
    }

    #[test]
    fn test_type_prefix_override() {
        let fmt = NumberFormat::plain().type_prefix("Intimação", "466");
        assert_eq!(fmt.format(3, "Intimação", 2025), "466-003/2025");
        assert_eq!(fmt.format(3, "Oficio", 2025), "003/2025");
    }

    #[test]
    fn test_empty_prefix_is_plain() {
        let fmt = NumberFormat::with_prefix("");
        assert_eq!(fmt.format(9, "Despacho", 2024), "009/2024");
    }

    #[test]
    fn test_custom_width() {
        let fmt = NumberFormat::plain().width(5);
        assert_eq!(fmt.format(12, "Oficio", 2025), "00012/2025");
    }

    #[test]
    fn test_parse_sequence() {
        assert_eq!(NumberFormat::parse_sequence("003/2025").unwrap(), (3, 2025));
        assert_eq!(NumberFormat::parse_sequence("466-017/2024").unwrap(), (17, 2024));
        assert!(NumberFormat::parse_sequence("abc").is_err());
        assert!(NumberFormat::parse_sequence("466-/2024").is_err());
        assert!(NumberFormat::parse_sequence("x1/2024").is_err());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let fmt: NumberFormat = serde_json::from_str(r#"{"prefix":"466"}"#).unwrap();
        assert_eq!(fmt.width, DEFAULT_WIDTH);
        assert_eq!(fmt.format(1, "Oficio", 2026), "466-001/2026");
    }

    proptest! {
        #[test]
        fn test_format_is_deterministic(value in 0u64..1_000_000, year in 1900i32..2200) {
            let fmt = NumberFormat::with_prefix("466");
            prop_assert_eq!(fmt.format(value, "Oficio", year), fmt.format(value, "Oficio", year));
        }

        #[test]
        fn test_distinct_values_never_collide(
            a in 0u64..1_000_000,
            b in 0u64..1_000_000,
            year in 1900i32..2200,
        ) {
            prop_assume!(a != b);
            let fmt = NumberFormat::plain();
            prop_assert_ne!(fmt.format(a, "Oficio", year), fmt.format(b, "Oficio", year));
        }

        #[test]
        fn test_parse_recovers_formatted_value(value in 0u64..1_000_000, year in 1900i32..2200) {
            let fmt = NumberFormat::with_prefix("466");
            let number = fmt.format(value, "Protocolo", year);
            prop_assert_eq!(NumberFormat::parse_sequence(&number).unwrap(), (value, year));
        }
    }
}
