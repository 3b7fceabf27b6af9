//! Hijri date representation and Gregorian conversion
//!
//! Years covered by the [`crate::umm_al_qura`] table follow the Umm al-Qura
//! calendar. Other years use the arithmetical (tabular) Islamic calendar with
//! the civil epoch (1 Muharram 1 AH = 16 July 622 Julian) and the common
//! 11-in-30 leap year cycle. Local sighting can still differ by a day; see
//! [`crate::HolidayCalendar::with_observed`] for pinning observed dates.

use crate::{umm_al_qura, CalendarError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Days-from-CE ordinal of 1 Muharram 1 AH (proleptic Gregorian 0622-07-19)
const EPOCH_ORDINAL: i64 = 227_015;

/// A date in the Hijri calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HijriDate {
    year: i32,
    month: u32,
    day: u32,
}

impl HijriDate {
    /// Create a validated Hijri date
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self> {
        if year < 1 {
            return Err(CalendarError::OutOfRange(format!(
                "Hijri year {} precedes the calendar epoch",
                year
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(CalendarError::InvalidDate(format!(
                "month {} is not between 1 and 12",
                month
            )));
        }
        let length = month_length(year, month);
        if day == 0 || day > length {
            return Err(CalendarError::InvalidDate(format!(
                "day {} is outside month {} of year {} ({} days)",
                day, month, year, length
            )));
        }

        Ok(Self { year, month, day })
    }

    /// Convert a Gregorian date to the Hijri calendar
    pub fn from_gregorian(date: NaiveDate) -> Result<Self> {
        let ordinal = i64::from(date.num_days_from_ce());
        if ordinal < EPOCH_ORDINAL {
            return Err(CalendarError::OutOfRange(format!(
                "{} precedes the Hijri epoch",
                date
            )));
        }

        if let Some((year, month, day)) = umm_al_qura::from_ordinal(ordinal) {
            return Ok(Self { year, month, day });
        }

        let year = (30 * (ordinal - EPOCH_ORDINAL) + 10_646).div_euclid(10_631);
        let days_into_year = ordinal - 29 - tabular_ordinal(year, 1, 1);
        let month = (ceil_div(2 * days_into_year, 59) + 1).min(12);
        let day = ordinal - tabular_ordinal(year, month as u32, 1) + 1;

        Ok(Self {
            year: year as i32,
            month: month as u32,
            day: day as u32,
        })
    }

    /// Convert back to a Gregorian date
    pub fn to_gregorian(&self) -> Result<NaiveDate> {
        let ordinal = umm_al_qura::to_ordinal(self.year, self.month, self.day)
            .unwrap_or_else(|| tabular_ordinal(i64::from(self.year), self.month, self.day));
        i32::try_from(ordinal)
            .ok()
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .ok_or_else(|| {
                CalendarError::OutOfRange(format!("{} has no Gregorian equivalent", self))
            })
    }

    /// Hijri year
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Hijri month (1 = Muharram, 9 = Ramadan, 10 = Shawwal)
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Day of the month
    pub fn day(&self) -> u32 {
        self.day
    }
}

impl fmt::Display for HijriDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02} AH", self.year, self.month, self.day)
    }
}

/// Whether a Hijri year has 355 days
pub fn is_leap_year(year: i32) -> bool {
    year_length(year) == 355
}

/// Number of days in a Hijri year
pub fn year_length(year: i32) -> u32 {
    match umm_al_qura::year_length(year) {
        Some(length) => length,
        None if is_tabular_leap_year(year) => 355,
        None => 354,
    }
}

/// Number of days in a Hijri month
pub fn month_length(year: i32, month: u32) -> u32 {
    if let Some(length) = umm_al_qura::month_length(year, month) {
        return length;
    }
    if month % 2 == 1 || (month == 12 && is_tabular_leap_year(year)) {
        30
    } else {
        29
    }
}

/// Leap year of the 11-in-30 arithmetical cycle
pub fn is_tabular_leap_year(year: i32) -> bool {
    (14 + 11 * i64::from(year)).rem_euclid(30) < 11
}

fn tabular_ordinal(year: i64, month: u32, day: u32) -> i64 {
    let month = i64::from(month);
    i64::from(day)
        + (59 * (month - 1) + 1) / 2
        + (year - 1) * 354
        + (3 + 11 * year).div_euclid(30)
        + EPOCH_ORDINAL
        - 1
}

fn ceil_div(numerator: i64, denominator: i64) -> i64 {
    -(-numerator).div_euclid(denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_epoch() {
        let epoch = HijriDate::from_gregorian(ymd(622, 7, 19)).unwrap();
        assert_eq!(epoch, HijriDate::new(1, 1, 1).unwrap());
        assert!(HijriDate::from_gregorian(ymd(622, 7, 18)).is_err());
    }

    #[test]
    fn test_round_trip_over_decades() {
        let mut date = ymd(1990, 1, 1);
        let end = ymd(2040, 12, 31);
        while date <= end {
            let hijri = HijriDate::from_gregorian(date).unwrap();
            assert_eq!(hijri.to_gregorian().unwrap(), date, "{}", hijri);
            date = date.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_round_trip_across_table_edges() {
        let edges = [
            (ymd(2001, 12, 1), ymd(2002, 6, 30)),
            (ymd(2077, 8, 1), ymd(2078, 2, 28)),
        ];
        for (start, end) in edges {
            let mut date = start;
            while date <= end {
                let hijri = HijriDate::from_gregorian(date).unwrap();
                assert_eq!(hijri.to_gregorian().unwrap(), date, "{}", hijri);
                date = date.succ_opt().unwrap();
            }
        }
    }

    #[test]
    fn test_umm_al_qura_month_starts() {
        let cases = [
            (ymd(2002, 3, 14), (1422, 12, 29)),
            (ymd(2002, 3, 15), (1423, 1, 1)),
            (ymd(2022, 5, 2), (1443, 10, 1)),
            (ymd(2023, 3, 23), (1444, 9, 1)),
            (ymd(2023, 4, 21), (1444, 10, 1)),
            (ymd(2024, 7, 6), (1445, 12, 30)),
            (ymd(2024, 7, 7), (1446, 1, 1)),
            (ymd(2025, 3, 30), (1446, 10, 1)),
            (ymd(2077, 11, 16), (1500, 12, 30)),
            (ymd(2077, 11, 17), (1501, 1, 1)),
        ];
        for (date, (y, m, d)) in cases {
            assert_eq!(
                HijriDate::from_gregorian(date).unwrap(),
                HijriDate::new(y, m, d).unwrap(),
                "{}",
                date
            );
        }
    }

    #[test]
    fn test_month_lengths() {
        assert_eq!(month_length(1445, 9), 30);
        assert_eq!(month_length(1445, 10), 29);
        assert_eq!(month_length(1445, 12), 30);
        assert_eq!(year_length(1445), 354);
        assert!(!is_leap_year(1445));
        assert_eq!(month_length(1446, 9), 29);
        assert_eq!(month_length(1446, 12), 29);

        // outside the table
        assert!(is_leap_year(1600));
        assert_eq!(month_length(1600, 12), 30);
        assert!(!is_leap_year(1601));
        assert_eq!(month_length(1601, 12), 29);
        assert!(is_tabular_leap_year(1445));
    }

    #[test]
    fn test_invalid_dates() {
        assert!(HijriDate::new(1446, 13, 1).is_err());
        assert!(HijriDate::new(1446, 12, 30).is_err());
        assert!(HijriDate::new(0, 1, 1).is_err());
        assert!(HijriDate::new(1445, 12, 30).is_ok());
    }
}
