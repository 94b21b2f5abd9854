//! Entity identifiers
//!
//! Every table uses a database-assigned 64-bit key. Each key gets its own
//! newtype so a student id can never be passed where a group id is expected.

use nutype::nutype;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[nutype(derive(
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
            Display,
            FromStr,
            AsRef
        ))]
        pub struct $name(i64);
    };
}

entity_id!(
    /// Identifier of a staff account
    UserId
);
entity_id!(
    /// Identifier of a faculty
    FacultyId
);
entity_id!(CourseId);
entity_id!(AcademicYearId);
entity_id!(WeekId);
entity_id!(GroupId);
entity_id!(StudentId);
entity_id!(LessonId);
entity_id!(AttendanceId);
entity_id!(AuditEntryId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_their_inner_value() {
        let id = StudentId::new(42);
        assert_eq!(id.into_inner(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn ids_parse_from_path_segments() {
        let id: GroupId = "17".parse().unwrap();
        assert_eq!(id, GroupId::new(17));
        assert!("abc".parse::<GroupId>().is_err());
    }

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&UserId::new(7)).unwrap();
        assert_eq!(json, "7");
    }
}
