use chrono::NaiveDateTime;

/// Device clock format, e.g. `14:05:09 2024-03-18`.
pub const CAPTURED_AT_FORMAT: &str = "%H:%M:%S %Y-%m-%d";

pub fn parse_captured_at(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), CAPTURED_AT_FORMAT).ok()
}

pub fn format_captured_at(value: &NaiveDateTime) -> String {
    value.format(CAPTURED_AT_FORMAT).to_string()
}

pub(crate) mod captured_at_serde {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_captured_at(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_captured_at(&raw).ok_or_else(|| {
            de::Error::custom(format!(
                "invalid capturedAt '{}', expected HH:MM:SS YYYY-MM-DD",
                raw
            ))
        })
    }
}
