use serde::Serialize;

/// A tunable stored in the `system_settings` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemSetting {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
}

/// Accumulated absence hours at which a student counts as high risk.
pub const NB_LIMIT_HIGH: &str = "NB_LIMIT_HIGH";
pub const NB_LIMIT_MEDIUM: &str = "NB_LIMIT_MEDIUM";
pub const CONSECUTIVE_ABSENCE_DAYS: &str = "CONSECUTIVE_ABSENCE_DAYS";
pub const ATTENDANCE_THRESHOLD: &str = "ATTENDANCE_THRESHOLD";

pub const DEFAULT_NB_LIMIT_HIGH: i32 = 35;

/// Settings seeded on first start: key, value, description.
pub const DEFAULTS: [(&str, &str, &str); 4] = [
    (NB_LIMIT_HIGH, "35", "Absence hours marking a student as high risk"),
    (NB_LIMIT_MEDIUM, "15", "Absence hours marking a student for attention"),
    (
        CONSECUTIVE_ABSENCE_DAYS,
        "5",
        "Consecutive absent days before an alert",
    ),
    (ATTENDANCE_THRESHOLD, "75", "Minimum acceptable attendance percent"),
];

/// Parses a numeric setting, falling back when missing or malformed.
pub fn numeric_or(value: Option<&str>, fallback: i32) -> i32 {
    value
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_settings_fall_back() {
        assert_eq!(numeric_or(Some("40"), 35), 40);
        assert_eq!(numeric_or(Some(" 12 "), 35), 12);
        assert_eq!(numeric_or(Some("many"), 35), 35);
        assert_eq!(numeric_or(None, 35), 35);
    }

    #[test]
    fn defaults_include_the_nb_limit() {
        assert!(DEFAULTS
            .iter()
            .any(|(key, value, _)| *key == NB_LIMIT_HIGH && *value == "35"));
    }
}
