//! Record names.

use crate::error::{CoreError, CoreResult};
use crate::layout::RECORD_NAME_SIZE;
use std::fmt;

/// A validated record name in its on-disk encoding.
///
/// Names may contain ASCII letters, digits, `_`, `.` and space, and must
/// encode to at most [`RECORD_NAME_SIZE`] bytes. The encoding is zero-padded
/// to the full field width; a name that fills the field has no terminator.
#[derive(Clone, PartialEq, Eq)]
pub struct RecordName {
    text: String,
    bytes: [u8; RECORD_NAME_SIZE],
}

impl RecordName {
    /// Validates and encodes a name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidName`] if the name contains a character
    /// outside the whitelist or is too long. The empty name is valid and
    /// encodes as an all-zero field.
    pub fn parse(name: &str) -> CoreResult<Self> {
        if !name.chars().all(is_valid_char) {
            return Err(CoreError::invalid_name(
                name,
                "only letters, digits, '_', '.' and space are allowed",
            ));
        }
        if name.len() > RECORD_NAME_SIZE {
            return Err(CoreError::invalid_name(name, "name is too long"));
        }

        let mut bytes = [0u8; RECORD_NAME_SIZE];
        bytes[..name.len()].copy_from_slice(name.as_bytes());
        Ok(Self {
            text: name.to_owned(),
            bytes,
        })
    }

    /// Returns the name as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the zero-padded field encoding.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; RECORD_NAME_SIZE] {
        &self.bytes
    }

    /// Compares against a stored name field, up to the first zero byte.
    #[must_use]
    pub fn matches(&self, stored: &[u8]) -> bool {
        until_nul(&self.bytes) == until_nul(stored)
    }

    /// Decodes a stored name field.
    #[must_use]
    pub fn decode(stored: &[u8]) -> String {
        String::from_utf8_lossy(until_nul(stored)).into_owned()
    }
}

impl fmt::Debug for RecordName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecordName").field(&self.text).finish()
    }
}

impl fmt::Display for RecordName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn is_valid_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ' ')
}

fn until_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_whitelisted_characters() {
        for name in ["record", "Record_1", "data.bin", "two words", "0"] {
            assert!(RecordName::parse(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_forbidden_characters() {
        for name in ["a/b", "semi;colon", "tab\t", "ümlaut", "dash-name"] {
            let err = RecordName::parse(name).unwrap_err();
            assert!(matches!(err, CoreError::InvalidName { .. }), "{name}");
        }
    }

    #[test]
    fn empty_name_is_valid() {
        let name = RecordName::parse("").unwrap();
        assert_eq!(name.as_str(), "");
        assert!(name.as_bytes().iter().all(|&b| b == 0));
        assert!(name.matches(&[0u8; RECORD_NAME_SIZE]));
        assert!(!name.matches(b"a"));
    }

    #[test]
    fn length_limit_is_the_field_width() {
        let max = "a".repeat(RECORD_NAME_SIZE);
        let name = RecordName::parse(&max).unwrap();
        assert!(name.as_bytes().iter().all(|&b| b == b'a'));

        let too_long = "a".repeat(RECORD_NAME_SIZE + 1);
        assert!(matches!(
            RecordName::parse(&too_long),
            Err(CoreError::InvalidName { .. })
        ));
    }

    #[test]
    fn encoding_is_zero_padded() {
        let name = RecordName::parse("abc").unwrap();
        assert_eq!(&name.as_bytes()[..3], b"abc");
        assert!(name.as_bytes()[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn matching_stops_at_first_zero() {
        let name = RecordName::parse("abc").unwrap();

        let mut stored = [0u8; RECORD_NAME_SIZE];
        stored[..3].copy_from_slice(b"abc");
        assert!(name.matches(&stored));

        // Garbage after the terminator is ignored.
        stored[10] = b'z';
        assert!(name.matches(&stored));

        stored[3] = b'd';
        assert!(!name.matches(&stored));
        assert!(!RecordName::parse("ab").unwrap().matches(&stored));
    }

    #[test]
    fn full_width_names_match_without_terminator() {
        let text = "n".repeat(RECORD_NAME_SIZE);
        let name = RecordName::parse(&text).unwrap();
        assert!(name.matches(name.as_bytes()));
        assert_eq!(RecordName::decode(name.as_bytes()), text);
    }

    #[test]
    fn decode_round_trips_text() {
        let name = RecordName::parse("my record.txt").unwrap();
        assert_eq!(RecordName::decode(name.as_bytes()), "my record.txt");
        assert_eq!(name.to_string(), "my record.txt");
    }

    proptest::proptest! {
        #[test]
        fn valid_names_survive_encoding(text in "[A-Za-z0-9_. ]{1,256}") {
            let name = RecordName::parse(&text).unwrap();
            proptest::prop_assert!(name.matches(name.as_bytes()));
            proptest::prop_assert_eq!(RecordName::decode(name.as_bytes()), text);
        }
    }
}
