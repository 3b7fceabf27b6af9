//! # Price Forecast Workspace
//!
//! Umbrella crate for the workspace members:
//!
//! - [`hijri_calendar`]: Umm al-Qura Hijri calendar and Eid al-Fitr windows
//! - [`price_forecast`]: cleaning, features, training and forecasting
//!
//! ## Example
//!
//! ```
//! use price_forecast_workspace::hijri_calendar::HolidayCalendar;
//! use chrono::NaiveDate;
//!
//! let calendar = HolidayCalendar::eid_al_fitr();
//! let eid = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
//! assert!(calendar.flags(eid).unwrap().on);
//! ```

pub use hijri_calendar;
pub use price_forecast;
