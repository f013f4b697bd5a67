//! Source of the library's logical "today". Due dates, return dates and fines
//! are all calendar-day arithmetic against this value.

use std::sync::{Mutex, PoisonError};

use anyhow::{anyhow, Result};
use chrono::{Days, FixedOffset, NaiveDate, Utc};

/// Injected into circulation so tests can pin the date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock pinned to one canonical UTC offset, so every server in a
/// deployment agrees on the date regardless of host timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Clock for a library whose local time is `utc_offset_minutes` east of UTC.
    pub fn new(utc_offset_minutes: i32) -> Result<Self> {
        let offset = FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60))
            .ok_or_else(|| anyhow!("UTC offset of {utc_offset_minutes} minutes is out of range"))?;
        Ok(Self { offset })
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    today: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    /// Move the clock to `today`.
    pub fn set(&self, today: NaiveDate) {
        *self.today.lock().unwrap_or_else(PoisonError::into_inner) = today;
    }

    /// Move the clock forward by `days` calendar days.
    pub fn advance_days(&self, days: u64) {
        let mut today = self.today.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(next) = today.checked_add_days(Days::new(days)) {
            *today = next;
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_can_be_moved() {
        let clock = FixedClock::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        clock.advance_days(14);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        clock.set(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn offsets_beyond_a_day_are_rejected() {
        assert!(SystemClock::new(24 * 60).is_err());
        assert!(SystemClock::new(-5 * 60).is_ok());
    }
}
