//! Local-time stamps for stored records and access logs.
//!
//! Every record carries a `YYYY-MM-DD HH:MM:SS` string in one named
//! timezone. The zone is configured as a name plus a fixed UTC offset;
//! the default (Asia/Bangkok) observes no daylight saving.

use chrono::{DateTime, FixedOffset, Utc};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct LocalClock {
    name: String,
    offset: FixedOffset,
}

impl LocalClock {
    /// Returns `None` if the offset is outside ±24h.
    pub fn new(name: impl Into<String>, offset_minutes: i32) -> Option<Self> {
        let offset = FixedOffset::east_opt(offset_minutes * 60)?;
        Some(Self {
            name: name.into(),
            offset,
        })
    }

    pub fn zone_name(&self) -> &str {
        &self.name
    }

    /// Current local time, formatted for storage.
    pub fn stamp(&self) -> String {
        self.stamp_at(Utc::now())
    }

    pub fn stamp_at(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.offset)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn bangkok_is_seven_hours_ahead() {
        let clock = LocalClock::new("Asia/Bangkok", 420).unwrap();
        let instant = Utc.with_ymd_and_hms(2026, 3, 1, 20, 5, 9).unwrap();
        assert_eq!(clock.stamp_at(instant), "2026-03-02 03:05:09");
    }

    #[test]
    fn stamp_has_fixed_width() {
        let clock = LocalClock::new("UTC", 0).unwrap();
        let stamp = clock.stamp();
        assert_eq!(stamp.len(), 19);
        assert!(chrono::NaiveDateTime::parse_from_str(&stamp, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn rejects_absurd_offset() {
        assert!(LocalClock::new("Nowhere", 24 * 60).is_none());
    }
}
