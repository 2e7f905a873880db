//! Instants as stored in records.
//!
//! Instants are kept as RFC 3339 UTC strings with millisecond precision, the
//! same form the core uses for `DateTime<Utc>` values, so range filters on
//! stored instants compare chronologically.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// The current instant, truncated to what a record can hold.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub fn format(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse<E: serde::de::Error>(text: &str) -> Result<DateTime<Utc>, E> {
    DateTime::parse_from_rfc3339(text)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(E::custom)
}

pub fn serialize<S: Serializer>(instant: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(instant))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let text = String::deserialize(deserializer)?;
    parse(&text)
}

/// The same encoding for optional instants.
pub mod optional {
    use super::*;

    pub fn serialize<S: Serializer>(
        instant: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match instant {
            Some(instant) => serializer.serialize_some(&format(instant)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => parse(&text).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use stockroom::common::Value;

    #[test]
    fn matches_core_encoding() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
        assert_eq!(format(&instant), "2024-03-05T10:00:00.000Z");
        assert_eq!(Value::from(instant), Value::from(format(&instant)));
    }

    #[test]
    fn now_has_millisecond_precision() {
        let instant = now();
        assert_eq!(instant.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn optional_round_trip_through_json() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Stamp {
            #[serde(default, with = "optional", skip_serializing_if = "Option::is_none")]
            at: Option<DateTime<Utc>>,
        }

        let stamp = Stamp {
            at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        };
        let json = serde_json::to_string(&stamp).unwrap();
        assert_eq!(json, r#"{"at":"2024-01-01T00:00:00.000Z"}"#);
        assert_eq!(serde_json::from_str::<Stamp>(&json).unwrap(), stamp);
        assert_eq!(serde_json::from_str::<Stamp>("{}").unwrap(), Stamp { at: None });
    }
}
