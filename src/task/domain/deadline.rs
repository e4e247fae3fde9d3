//! Business calendar arithmetic for deadlines and reminder windows.
//!
//! Deadlines are supplied as calendar dates and stored as the last
//! millisecond of that date in the fixed business offset. "Today" for
//! reminders is midnight to midnight in the same offset, never the client's
//! local time.

use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, SubsecRound, TimeZone, Utc,
};

/// Truncates a timestamp to whole seconds.
#[must_use]
pub fn to_seconds(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp.trunc_subsecs(0)
}

/// A half-open `[start, end)` interval of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    /// Inclusive start (local midnight).
    pub start: DateTime<Utc>,
    /// Exclusive end (next local midnight).
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// Returns `true` when `instant` falls inside the window.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// Calendar bound to the fixed business offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessCalendar {
    offset: FixedOffset,
}

impl BusinessCalendar {
    /// Creates a calendar for the given offset.
    #[must_use]
    pub const fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Creates a calendar on UTC.
    #[must_use]
    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// Returns the business offset.
    #[must_use]
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Normalises a deadline date to `23:59:59.999` local time.
    #[must_use]
    pub fn end_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let last_millisecond =
            NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
        self.local_to_utc(date, last_millisecond)
    }

    /// Returns local midnight at the start of `date`.
    #[must_use]
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        self.local_to_utc(date, NaiveTime::MIN)
    }

    /// Returns the business date containing `instant`.
    #[must_use]
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Returns the business day containing `now`.
    #[must_use]
    pub fn today(&self, now: DateTime<Utc>) -> DayWindow {
        let start = self.start_of_day(self.date_of(now));
        DayWindow {
            start,
            end: start + Duration::days(1),
        }
    }

    fn local_to_utc(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let naive = date.and_time(time);
        // A fixed offset has exactly one mapping for every local time.
        self.offset
            .from_local_datetime(&naive)
            .single()
            .map_or_else(|| naive.and_utc(), |local| local.with_timezone(&Utc))
    }
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self::utc()
    }
}
