use chrono::{DateTime, Utc};
use mongodb::bson::DateTime as BsonDateTime;

pub fn to_utc(dt: BsonDateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or_default()
}

pub fn to_bson(dt: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}

pub fn iso(dt: BsonDateTime) -> String {
    to_utc(dt).to_rfc3339()
}

pub fn iso_opt(dt: Option<BsonDateTime>) -> Option<String> {
    dt.map(iso)
}

/// Timestamp suffix used in export filenames, e.g. `20250314_091500`
pub fn file_stamp() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_round_trip_keeps_millis() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 15, 0).unwrap();
        assert_eq!(to_utc(to_bson(now)), now);
        assert_eq!(iso(to_bson(now)), "2025-03-14T09:15:00+00:00");
    }
}
