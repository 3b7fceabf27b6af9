//! Moving holiday offsets and window flags
//!
//! A holiday is anchored on a fixed Hijri month and day, so its Gregorian date
//! drifts by roughly 11 days every year. Each Gregorian date is measured
//! against the holiday of the Hijri year it falls in.

use crate::date::HijriDate;
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Membership of a date in the days around a holiday
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayFlags {
    /// Date falls in the week leading up to the holiday
    pub before: bool,
    /// Date is the holiday itself
    pub on: bool,
    /// Date falls in the days following the holiday
    pub after: bool,
}

impl HolidayFlags {
    /// True when any of the three windows is set
    pub fn any(&self) -> bool {
        self.before || self.on || self.after
    }
}

/// Calendar for a holiday fixed on a Hijri month and day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayCalendar {
    /// Hijri month of the holiday
    month: u32,
    /// Hijri day of the holiday
    day: u32,
    /// Days before the holiday flagged as `before`
    before_days: i64,
    /// Days after the holiday flagged as `after`
    after_days: i64,
    /// Observed Gregorian dates keyed by Hijri year
    observed: BTreeMap<i32, NaiveDate>,
}

impl Default for HolidayCalendar {
    fn default() -> Self {
        Self::eid_al_fitr()
    }
}

impl HolidayCalendar {
    /// Eid al-Fitr (1 Shawwal): seven days before, six days after
    pub fn eid_al_fitr() -> Self {
        Self {
            month: 10,
            day: 1,
            before_days: 7,
            after_days: 6,
            observed: BTreeMap::new(),
        }
    }

    /// Pin the holiday of a Hijri year to an observed Gregorian date
    pub fn with_observed(mut self, hijri_year: i32, date: NaiveDate) -> Self {
        self.observed.insert(hijri_year, date);
        self
    }

    /// Pin several observed dates at once
    pub fn with_observed_dates<I>(mut self, dates: I) -> Self
    where
        I: IntoIterator<Item = (i32, NaiveDate)>,
    {
        self.observed.extend(dates);
        self
    }

    /// Gregorian date of the holiday in the given Hijri year
    pub fn holiday_for_year(&self, hijri_year: i32) -> Result<NaiveDate> {
        if let Some(date) = self.observed.get(&hijri_year) {
            return Ok(*date);
        }
        HijriDate::new(hijri_year, self.month, self.day)?.to_gregorian()
    }

    /// Signed day difference between `date` and the holiday of its Hijri year
    pub fn offset(&self, date: NaiveDate) -> Result<i64> {
        let hijri = HijriDate::from_gregorian(date)?;
        let holiday = self.holiday_for_year(hijri.year())?;
        Ok((date - holiday).num_days())
    }

    /// Window flags for `date`
    pub fn flags(&self, date: NaiveDate) -> Result<HolidayFlags> {
        Ok(self.classify(self.offset(date)?))
    }

    /// Window flags for a precomputed offset
    pub fn classify(&self, offset: i64) -> HolidayFlags {
        HolidayFlags {
            before: (-self.before_days..=-1).contains(&offset),
            on: offset == 0,
            after: (1..=self.after_days).contains(&offset),
        }
    }
}
