//! Telemetry line parsing
//!
//! A telemetry line is a comma-separated list of `name:value` pairs:
//! ```text
//! ct1:0,ct2:0,ct3:0,ct4:0,vrms:524,pulse:0
//! ```
//!
//! Every token is judged on its own. A bad token never affects its
//! neighbours; the caller decides what to keep from the per-field outcomes.

/// Separator between fields
pub const FIELD_SEPARATOR: char = ',';

/// Separator between a field name and its value
pub const VALUE_SEPARATOR: char = ':';

/// Banner lines the node prints during startup, never telemetry
pub const SENTINELS: [&str; 2] = ["Settings:", "Calibration:"];

/// Result of parsing a single `name:value` token
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldOutcome<'a> {
    /// Well-formed field
    Valid { name: &'a str, value: f64 },
    /// Valid name but the value is not numeric; the field reads as zero
    ZeroSubstituted { name: &'a str, raw: &'a str },
    /// Name contains characters outside `[A-Za-z0-9_-]` (field dropped)
    InvalidName { name: &'a str },
    /// Token is not exactly `name:value` (field dropped)
    Malformed { token: &'a str },
}

impl<'a> FieldOutcome<'a> {
    /// The field as it should be recorded, if it survives
    pub fn field(&self) -> Option<(&'a str, f64)> {
        match *self {
            FieldOutcome::Valid { name, value } => Some((name, value)),
            FieldOutcome::ZeroSubstituted { name, .. } => Some((name, 0.0)),
            FieldOutcome::InvalidName { .. } | FieldOutcome::Malformed { .. } => None,
        }
    }
}

/// Check whether a trimmed line is one of the node's banner lines
pub fn is_sentinel(line: &str) -> bool {
    SENTINELS.contains(&line.trim())
}

/// Check a field name against `[A-Za-z0-9_-]+`
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Parse one `name:value` token
pub fn parse_field(token: &str) -> FieldOutcome<'_> {
    let mut parts = token.split(VALUE_SEPARATOR);
    let (Some(name), Some(raw), None) = (parts.next(), parts.next(), parts.next()) else {
        return FieldOutcome::Malformed { token };
    };

    if !is_valid_name(name) {
        return FieldOutcome::InvalidName { name };
    }

    match raw.trim().parse::<f64>() {
        Ok(value) => FieldOutcome::Valid { name, value },
        Err(_) => FieldOutcome::ZeroSubstituted { name, raw },
    }
}

/// Parse every token of a line, in order
///
/// Sentinel detection is the caller's job: run [`is_sentinel`] first.
pub fn fields(line: &str) -> impl Iterator<Item = FieldOutcome<'_>> {
    line.split(FIELD_SEPARATOR).map(parse_field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn surviving(line: &str) -> std::vec::Vec<(&str, f64)> {
        fields(line).filter_map(|f| f.field()).collect()
    }

    #[test]
    fn test_typical_line() {
        let parsed = surviving("ct1:0,ct2:0,ct3:0,ct4:0,vrms:524,pulse:0");
        assert_eq!(
            parsed,
            [
                ("ct1", 0.0),
                ("ct2", 0.0),
                ("ct3", 0.0),
                ("ct4", 0.0),
                ("vrms", 524.0),
                ("pulse", 0.0),
            ]
        );
    }

    #[test]
    fn test_non_numeric_value_becomes_zero() {
        assert_eq!(
            parse_field("ct1:abc"),
            FieldOutcome::ZeroSubstituted {
                name: "ct1",
                raw: "abc"
            }
        );
        assert_eq!(surviving("ct1:abc"), [("ct1", 0.0)]);
    }

    #[test]
    fn test_empty_value_becomes_zero() {
        assert_eq!(surviving("ct1:"), [("ct1", 0.0)]);
    }

    #[test]
    fn test_decimal_and_negative_values() {
        assert_eq!(surviving("P1:-12.5,E1:3e2"), [("P1", -12.5), ("E1", 300.0)]);
    }

    #[test]
    fn test_invalid_name_is_dropped() {
        assert_eq!(
            parse_field("bad-name!:5"),
            FieldOutcome::InvalidName { name: "bad-name!" }
        );
        assert_eq!(surviving("bad-name!:5,ok1:10"), [("ok1", 10.0)]);
    }

    #[test]
    fn test_hyphen_and_underscore_names() {
        assert!(is_valid_name("ct_1"));
        assert!(is_valid_name("T-ext"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("ct 1"));
        assert!(!is_valid_name("vrms."));
    }

    #[test]
    fn test_malformed_tokens_are_dropped() {
        assert_eq!(parse_field("ct1"), FieldOutcome::Malformed { token: "ct1" });
        assert_eq!(parse_field("a:1:2"), FieldOutcome::Malformed { token: "a:1:2" });
        assert_eq!(parse_field(""), FieldOutcome::Malformed { token: "" });
        assert_eq!(surviving("ct1:1,,ct2,ct3:3"), [("ct1", 1.0), ("ct3", 3.0)]);
    }

    #[test]
    fn test_empty_line_has_no_fields() {
        assert!(surviving("").is_empty());
    }

    #[test]
    fn test_sentinels() {
        assert!(is_sentinel("Settings:"));
        assert!(is_sentinel("Calibration:"));
        assert!(is_sentinel("Calibration:\r\n"));
        assert!(!is_sentinel("Settings"));
        assert!(!is_sentinel("ct1:0"));
    }

    proptest! {
        #[test]
        fn prop_one_bad_token_never_hides_others(
            values in proptest::collection::vec(-10_000i32..10_000, 1..12),
            bad in prop_oneof![
                Just("bad name:1"),
                Just("x!:2"),
                Just("novalue"),
                Just("a:b:c"),
                Just(""),
            ],
            position in 0usize..12,
        ) {
            let mut tokens: std::vec::Vec<std::string::String> = values
                .iter()
                .enumerate()
                .map(|(i, v)| format!("f{}:{}", i, v))
                .collect();
            tokens.insert(position.min(tokens.len()), bad.to_string());
            let line = tokens.join(",");

            let parsed = surviving(&line);
            prop_assert_eq!(parsed.len(), values.len());
            for (i, (name, value)) in parsed.iter().enumerate() {
                let expected = format!("f{}", i);
                prop_assert_eq!(*name, expected.as_str());
                prop_assert_eq!(*value, values[i] as f64);
            }
        }
    }
}
