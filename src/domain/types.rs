//! Validated value types
//!
//! Free text coming from forms is trimmed and length-checked here, once,
//! before it reaches the store.

use nutype::nutype;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Login name of a staff account
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 50),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct Username(String);

/// Person name, used for staff and students alike
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 150),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct FullName(String);

#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 150),
    derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, AsRef, Display)
)]
pub struct FacultyName(String);

/// Short faculty code, always stored upper-case
#[nutype(
    sanitize(trim, uppercase),
    validate(not_empty, len_char_max = 20),
    derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, AsRef, Display)
)]
pub struct FacultyCode(String);

#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 50),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct GroupNumber(String);

#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 50),
    derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, AsRef, Display)
)]
pub struct StudentCode(String);

#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 20),
    derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, AsRef, Display)
)]
pub struct AcademicYearName(String);

#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 100, regex = r"^[A-Za-z0-9_.-]+$"),
    derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, AsRef, Display)
)]
pub struct SettingKey(String);

/// Hours of absence recorded for one student on one day
///
/// A working day has at most eight academic hours.
#[nutype(
    validate(greater_or_equal = 0, less_or_equal = 8),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct NbHours(i32);

impl NbHours {
    pub const MAX: i32 = 8;

    pub fn is_absent(&self) -> bool {
        self.into_inner() > 0
    }
}

/// Teaching shift of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum Shift {
    First,
    Second,
}

impl Shift {
    pub fn number(self) -> i16 {
        match self {
            Shift::First => 1,
            Shift::Second => 2,
        }
    }
}

impl TryFrom<i16> for Shift {
    type Error = InvalidShift;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Shift::First),
            2 => Ok(Shift::Second),
            other => Err(InvalidShift(other)),
        }
    }
}

impl From<Shift> for i16 {
    fn from(shift: Shift) -> Self {
        shift.number()
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("shift must be 1 or 2, got {0}")]
pub struct InvalidShift(pub i16);

/// Bcrypt hash of an account password
#[nutype(validate(not_empty), derive(Clone, PartialEq, AsRef))]
pub struct PasswordHash(String);

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PasswordHash(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn faculty_code_is_upper_cased_and_trimmed() {
        let code = FacultyCode::try_new("  mm ".to_string()).unwrap();
        assert_eq!(code.as_ref(), "MM");
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(FullName::try_new("   ".to_string()).is_err());
        assert!(Username::try_new(String::new()).is_err());
    }

    #[test]
    fn overlong_username_is_rejected() {
        assert!(Username::try_new("u".repeat(51)).is_err());
        assert!(Username::try_new("u".repeat(50)).is_ok());
    }

    #[rstest]
    #[case(-1, false)]
    #[case(0, true)]
    #[case(8, true)]
    #[case(9, false)]
    fn nb_hours_range(#[case] hours: i32, #[case] valid: bool) {
        assert_eq!(NbHours::try_new(hours).is_ok(), valid);
    }

    #[test]
    fn zero_hours_is_presence() {
        assert!(!NbHours::try_new(0).unwrap().is_absent());
        assert!(NbHours::try_new(2).unwrap().is_absent());
    }

    #[rstest]
    #[case(1, Some(Shift::First))]
    #[case(2, Some(Shift::Second))]
    #[case(0, None)]
    #[case(3, None)]
    fn shift_from_number(#[case] value: i16, #[case] expected: Option<Shift>) {
        assert_eq!(Shift::try_from(value).ok(), expected);
    }

    #[test]
    fn shift_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Shift::Second).unwrap(), "2");
        let parsed: Shift = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, Shift::First);
        assert!(serde_json::from_str::<Shift>("5").is_err());
    }

    #[test]
    fn setting_key_rejects_spaces() {
        assert!(SettingKey::try_new("NB_LIMIT_HIGH".to_string()).is_ok());
        assert!(SettingKey::try_new("NB LIMIT".to_string()).is_err());
    }

    #[test]
    fn password_hash_debug_is_redacted() {
        let hash = PasswordHash::try_new("$2b$12$abcdef".to_string()).unwrap();
        assert_eq!(format!("{hash:?}"), "PasswordHash(***)");
    }
}
