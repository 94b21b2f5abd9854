//! Password policy
//!
//! Staff passwords are six-digit PINs. A PIN made of one repeated digit is
//! refused.

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static SIX_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{6}$").expect("six digit pattern is valid"));

/// A plaintext password that satisfies the policy
#[derive(Clone, PartialEq, Eq)]
pub struct NewPassword(String);

impl NewPassword {
    pub fn parse(candidate: &str) -> Result<Self> {
        if !SIX_DIGITS.is_match(candidate) {
            return Err(Error::validation("password must be exactly 6 digits"));
        }
        let mut chars = candidate.chars();
        let first = chars.next();
        if chars.all(|c| Some(c) == first) {
            return Err(Error::validation(
                "password must not repeat a single digit",
            ));
        }
        Ok(Self(candidate.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NewPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NewPassword(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("020304", true)]
    #[case("123456", true)]
    #[case("111111", false)]
    #[case("12345", false)]
    #[case("1234567", false)]
    #[case("12a456", false)]
    #[case("", false)]
    #[case("١٢٣٤٥٦", false)]
    fn policy(#[case] candidate: &str, #[case] accepted: bool) {
        assert_eq!(NewPassword::parse(candidate).is_ok(), accepted);
    }

    #[test]
    fn debug_is_redacted() {
        let password = NewPassword::parse("020304").unwrap();
        assert_eq!(format!("{password:?}"), "NewPassword(***)");
    }

    proptest! {
        #[test]
        fn repeated_digits_are_always_rejected(digit in 0u8..10) {
            let candidate = digit.to_string().repeat(6);
            prop_assert!(NewPassword::parse(&candidate).is_err());
        }

        #[test]
        fn non_repeating_pins_are_accepted(pin in "[0-9]{6}") {
            let repeated = pin.chars().all(|c| Some(c) == pin.chars().next());
            prop_assert_eq!(NewPassword::parse(&pin).is_ok(), !repeated);
        }
    }
}
