//! Business calendar
//!
//! Day boundaries ("today", trend buckets, date-only filters) are evaluated in
//! the site's fixed UTC offset, not in UTC.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

#[derive(Debug, Clone, Copy)]
pub struct BusinessCalendar {
    offset: FixedOffset,
}

impl BusinessCalendar {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Calendar from an offset in minutes east of UTC; out-of-range values fall back to UTC
    pub fn from_offset_minutes(minutes: i32) -> Self {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        Self { offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Local calendar date of an instant
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// First instant of `date` in local time
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let local = date.and_time(NaiveTime::MIN);
        match self.offset.from_local_datetime(&local).single() {
            Some(dt) => dt.with_timezone(&Utc),
            None => Utc.from_utc_datetime(&local),
        }
    }

    /// First instant of the day after `date`
    pub fn start_of_next_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
        self.start_of_day(next)
    }

    /// Start of the current local day
    pub fn start_of_today(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.start_of_day(self.local_date(now))
    }
}

impl Default for BusinessCalendar {
    /// WITA (UTC+08:00)
    fn default() -> Self {
        Self::from_offset_minutes(8 * 60)
    }
}
