//! Input record model and lenient decoding of positional CSV rows.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use csv::ByteRecord;
use geo::{point, Point};

/// Field positions of the input rows
mod col {
    pub const TIMESTAMP: usize = 0;
    pub const SPORT: usize = 1;
    pub const FILENAME: usize = 2;
    pub const LATITUDE: usize = 3;
    pub const LONGITUDE: usize = 4;
    pub const ELEVATION: usize = 5;
    pub const CADENCE: usize = 6;
    pub const HEARTRATE: usize = 7;
    pub const POWER: usize = 8;
}

/// One sensor sample
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Timestamp exactly as it appeared in the input
    pub timestamp: String,
    /// Parsed instant; the Unix epoch when the text is not RFC3339
    pub time: DateTime<Utc>,
    pub timestamp_valid: bool,
    pub sport: String,
    pub filename: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub cadence: f64,
    pub heartrate: f64,
    pub power: f64,
}

impl Record {
    /// Decode a positional row. Missing or malformed numbers become 0.0,
    /// an unparseable timestamp becomes the epoch and invalid UTF-8 is
    /// replaced with U+FFFD; nothing here fails.
    pub fn from_csv(row: &ByteRecord) -> Self {
        let text = |i: usize| row.get(i).map(String::from_utf8_lossy).unwrap_or(Cow::Borrowed(""));
        let number = |i: usize| parse_lenient(&text(i));

        let timestamp = text(col::TIMESTAMP).into_owned();
        let (time, timestamp_valid) = match parse_timestamp(&timestamp) {
            Some(t) => (t, true),
            None => (DateTime::<Utc>::default(), false),
        };

        Record {
            timestamp,
            time,
            timestamp_valid,
            sport: text(col::SPORT).into_owned(),
            filename: text(col::FILENAME).into_owned(),
            latitude: number(col::LATITUDE),
            longitude: number(col::LONGITUDE),
            elevation: number(col::ELEVATION),
            cadence: number(col::CADENCE),
            heartrate: number(col::HEARTRATE),
            power: number(col::POWER),
        }
    }

    /// The GPS fix, or `None` when either coordinate carries the 0.0
    /// "no fix" marker.
    pub fn fix(&self) -> Option<Point<f64>> {
        if self.latitude == 0.0 || self.longitude == 0.0 {
            None
        } else {
            Some(point!(x: self.longitude, y: self.latitude))
        }
    }
}

pub fn parse_lenient(field: &str) -> f64 {
    field.trim().parse::<f64>().unwrap_or(0.0)
}

pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> ByteRecord {
        ByteRecord::from(fields.to_vec())
    }

    #[test]
    fn test_full_row() {
        let r = Record::from_csv(&row(&[
            "2024-05-01T08:00:00Z", "cycling", "ride.fit", "47.3769", "8.5417", "408.2", "85", "142", "210",
        ]));
        assert_eq!(r.filename, "ride.fit");
        assert_eq!(r.sport, "cycling");
        assert!(r.timestamp_valid);
        assert_eq!(r.latitude, 47.3769);
        assert_eq!(r.heartrate, 142.0);
        assert_eq!(r.power, 210.0);
        assert_eq!(r.fix(), Some(point!(x: 8.5417, y: 47.3769)));
    }

    #[test]
    fn test_malformed_numbers_become_zero() {
        let r = Record::from_csv(&row(&[
            "2024-05-01T08:00:00Z", "running", "run.fit", "", "abc", "1e3", "-", "150", "",
        ]));
        assert_eq!(r.latitude, 0.0);
        assert_eq!(r.longitude, 0.0);
        assert_eq!(r.elevation, 1000.0);
        assert_eq!(r.cadence, 0.0);
        assert_eq!(r.power, 0.0);
        assert_eq!(r.fix(), None);
    }

    #[test]
    fn test_short_row() {
        let r = Record::from_csv(&row(&["2024-05-01T08:00:00Z", "running", "run.fit"]));
        assert_eq!(r.filename, "run.fit");
        assert_eq!(r.heartrate, 0.0);
        assert_eq!(r.fix(), None);
    }

    #[test]
    fn test_bad_timestamp_is_epoch() {
        let r = Record::from_csv(&row(&["yesterday", "running", "run.fit"]));
        assert!(!r.timestamp_valid);
        assert_eq!(r.time, DateTime::<Utc>::default());
        assert_eq!(r.timestamp, "yesterday");
    }

    #[test]
    fn test_invalid_utf8_replaced() {
        let mut raw = ByteRecord::new();
        let fields: [&[u8]; 9] = [
            b"2024-05-01T08:00:00Z", b"run\xffning", b"a\xfe.fit", b"10", b"10", b"1\xff", b"", b"150", b"",
        ];
        for field in fields {
            raw.push_field(field);
        }
        let r = Record::from_csv(&raw);
        assert_eq!(r.sport, "run\u{fffd}ning");
        assert_eq!(r.filename, "a\u{fffd}.fit");
        assert!(r.timestamp_valid);
        assert_eq!(r.elevation, 0.0);
        assert_eq!(r.heartrate, 150.0);
    }

    #[test]
    fn test_offset_timestamp_normalised() {
        let a = parse_timestamp("2024-05-01T10:00:00+02:00").unwrap();
        let b = parse_timestamp("2024-05-01T08:00:00Z").unwrap();
        assert_eq!(a, b);
    }
}
