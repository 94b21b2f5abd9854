//! Attendance arithmetic shared by every dashboard.

use crate::domain::attendance::{Attendance, AttendanceStatus};
use serde::Serialize;

/// Present/absent counts over some set of journal cells
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceTally {
    pub present: u64,
    pub absent: u64,
}

impl AttendanceTally {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Attendance>) -> Self {
        records.into_iter().fold(Self::default(), |mut tally, record| {
            tally.add(record.status);
            tally
        })
    }

    pub fn add(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
        }
    }

    pub fn recorded(&self) -> u64 {
        self.present + self.absent
    }

    /// Share of present marks, in percent with one decimal; 0.0 when empty.
    pub fn attendance_pct(&self) -> f64 {
        percent(self.present, self.recorded())
    }

    pub fn absence_pct(&self) -> f64 {
        percent(self.absent, self.recorded())
    }
}

pub fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round1(part as f64 / whole as f64 * 100.0)
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Buckets of accumulated absence hours. Anything at or above the limit
/// lands in the last bucket, so lower buckets empty out when the limit is
/// set below 21.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NbBuckets {
    limit: i32,
}

impl NbBuckets {
    pub fn new(limit: i32) -> Self {
        Self { limit }
    }

    pub fn labels(&self) -> [String; 5] {
        [
            "0".to_string(),
            "1-10".to_string(),
            "11-20".to_string(),
            format!("21-{}", self.limit - 1),
            format!("{}+", self.limit),
        ]
    }

    pub fn index(&self, hours: i32) -> usize {
        match hours {
            h if h >= self.limit => 4,
            h if h <= 0 => 0,
            1..=10 => 1,
            11..=20 => 2,
            _ => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn empty_tally_is_zero_percent() {
        assert_eq!(AttendanceTally::default().attendance_pct(), 0.0);
    }

    #[test]
    fn percentages_round_to_one_decimal() {
        let tally = AttendanceTally {
            present: 2,
            absent: 1,
        };
        assert_eq!(tally.attendance_pct(), 66.7);
        assert_eq!(tally.absence_pct(), 33.3);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(10, 1)]
    #[case(11, 2)]
    #[case(20, 2)]
    #[case(21, 3)]
    #[case(34, 3)]
    #[case(35, 4)]
    #[case(120, 4)]
    fn nb_bucket_for_default_limit(#[case] hours: i32, #[case] bucket: usize) {
        assert_eq!(NbBuckets::new(35).index(hours), bucket);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(10, 1)]
    #[case(14, 2)]
    #[case(15, 4)]
    #[case(21, 4)]
    fn low_limit_takes_over_the_lower_buckets(#[case] hours: i32, #[case] bucket: usize) {
        let buckets = NbBuckets::new(15);
        assert_eq!(buckets.index(hours), bucket);
        assert_eq!(buckets.labels()[4], "15+");
    }

    #[test]
    fn bucket_labels_follow_the_limit() {
        let labels = NbBuckets::new(40).labels();
        assert_eq!(labels[3], "21-39");
        assert_eq!(labels[4], "40+");
    }
}
