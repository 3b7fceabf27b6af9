//! # Hijri Calendar
//!
//! Calendar arithmetic for moving holidays that follow the Islamic lunar year.
//! This crate provides conversion between Gregorian dates and the Hijri
//! calendar, Umm al-Qura where its table reaches and tabular (arithmetical)
//! elsewhere, and the holiday windows derived from it.

use thiserror::Error;

pub mod date;
pub mod holiday;
pub mod umm_al_qura;

pub use crate::date::HijriDate;
pub use crate::holiday::{HolidayCalendar, HolidayFlags};

/// Errors that can occur in calendar calculations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Date out of range: {0}")]
    OutOfRange(String),

    #[error("Invalid Hijri date: {0}")]
    InvalidDate(String),
}

/// Result type for calendar operations
pub type Result<T> = std::result::Result<T, CalendarError>;
