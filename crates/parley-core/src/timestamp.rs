//! Wall-clock stamps for statuses and messages.
//!
//! Stored as text in local time at second precision with no timezone,
//! e.g. `2026-10-19 14:03:59`. Lexicographic order of the text equals
//! chronological order, which the store relies on for `ORDER BY`.

use chrono::{Local, NaiveDateTime, SubsecRound};

pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time truncated to whole seconds.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

pub fn format(ts: &NaiveDateTime) -> String {
    ts.format(FORMAT).to_string()
}

pub fn parse(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, FORMAT)
}

/// `#[serde(with = "parley_core::timestamp::serde_format")]` for fields that
/// should serialize in the storage format instead of ISO 8601.
pub mod serde_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use serde::{Deserialize, Serialize};

    fn sample() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 1)
            .unwrap()
    }

    #[test]
    fn now_has_no_subseconds() {
        assert_eq!(now().nanosecond(), 0);
    }

    #[test]
    fn format_is_zero_padded() {
        assert_eq!(format(&sample()), "2026-03-07 09:05:01");
    }

    #[test]
    fn parse_reads_storage_format() {
        assert_eq!(parse("2026-03-07 09:05:01").unwrap(), sample());
    }

    #[test]
    fn parse_rejects_iso_with_t() {
        assert!(parse("2026-03-07T09:05:01").is_err());
    }

    #[test]
    fn text_order_matches_time_order() {
        let earlier = format(&sample());
        let later = format(&(sample() + chrono::Duration::seconds(59)));
        assert!(earlier < later);
    }

    #[derive(Serialize, Deserialize)]
    struct Stamped {
        #[serde(with = "serde_format")]
        at: NaiveDateTime,
    }

    #[test]
    fn serde_uses_storage_format() {
        let json = serde_json::to_string(&Stamped { at: sample() }).unwrap();
        assert_eq!(json, r#"{"at":"2026-03-07 09:05:01"}"#);
        let back: Stamped = serde_json::from_str(&json).unwrap();
        assert_eq!(back.at, sample());
    }
}
