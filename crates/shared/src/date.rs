use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use time::OffsetDateTime;

/// The seven fixed day labels of the weekly meal plan.
#[derive(
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
    EnumIter,
    EnumString,
    Display,
    AsRefStr,
)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// Milliseconds since the unix epoch, used as the server-assigned creation time.
pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_seven_labels_in_order() {
        let labels: Vec<String> = Weekday::iter().map(|d| d.to_string()).collect();
        assert_eq!(
            labels,
            vec![
                "Monday",
                "Tuesday",
                "Wednesday",
                "Thursday",
                "Friday",
                "Saturday",
                "Sunday"
            ]
        );
    }

    #[test]
    fn test_parse_label() {
        assert_eq!(Weekday::from_str("Friday").unwrap(), Weekday::Friday);
        assert!(Weekday::from_str("Funday").is_err());
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&Weekday::Sunday).unwrap();
        assert_eq!(json, "\"Sunday\"");
    }
}
