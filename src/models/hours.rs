//! Structured weekly opening hours with timezone-local evaluation

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A single day's opening span, in minutes since local midnight.
///
/// A span whose close minute is less than or equal to its open minute crosses
/// midnight and spills into the following day (e.g. 22:00-02:00). A span with
/// `open_minute == close_minute` means open all day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub open_minute: u16,
    pub close_minute: u16,
}

impl DayHours {
    pub fn new(open_minute: u16, close_minute: u16) -> Self {
        Self {
            open_minute,
            close_minute,
        }
    }

    /// Build a span from hour/minute pairs
    pub fn from_hm(open_hour: u16, open_min: u16, close_hour: u16, close_min: u16) -> Self {
        Self::new(open_hour * 60 + open_min, close_hour * 60 + close_min)
    }

    /// Whether the span crosses midnight into the next day
    pub fn crosses_midnight(&self) -> bool {
        self.close_minute < self.open_minute
    }

    fn covers_same_day(&self, minute: u16) -> bool {
        if self.open_minute == self.close_minute {
            return true;
        }
        if self.crosses_midnight() {
            minute >= self.open_minute
        } else {
            minute >= self.open_minute && minute < self.close_minute
        }
    }

    /// Whether the overnight portion of this span covers a minute of the
    /// following day
    fn covers_next_day(&self, minute: u16) -> bool {
        self.crosses_midnight() && minute < self.close_minute
    }
}

/// Opening hours for each weekday; `None` means closed that day.
/// Indexed Monday through Sunday.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyHours {
    pub days: [Option<DayHours>; 7],
}

impl WeeklyHours {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the span for one weekday
    pub fn set(&mut self, weekday: Weekday, hours: DayHours) {
        self.days[weekday.num_days_from_monday() as usize] = Some(hours);
    }

    /// Builder-style variant of [`set`](Self::set)
    pub fn with(mut self, weekday: Weekday, hours: DayHours) -> Self {
        self.set(weekday, hours);
        self
    }

    /// Same span every day of the week
    pub fn every_day(hours: DayHours) -> Self {
        Self {
            days: [Some(hours); 7],
        }
    }

    fn day(&self, weekday: Weekday) -> Option<DayHours> {
        self.days[weekday.num_days_from_monday() as usize]
    }

    /// Evaluate the hours at a UTC instant, in the given local timezone.
    ///
    /// Checks the current weekday's span and the previous day's overnight
    /// spill, so 22:00-02:00 reports open at 01:00 the next morning.
    pub fn is_open_at(&self, now: DateTime<Utc>, tz: &Tz) -> bool {
        let local = now.with_timezone(tz);
        let weekday = local.weekday();
        let minute = (local.hour() * 60 + local.minute()) as u16;

        if let Some(span) = self.day(weekday) {
            if span.covers_same_day(minute) {
                return true;
            }
        }

        if let Some(prev_span) = self.day(weekday.pred()) {
            if prev_span.covers_next_day(minute) {
                return true;
            }
        }

        false
    }
}
