//! Umm al-Qura month lengths
//!
//! The Umm al-Qura calendar starts a month on the day after the first evening
//! in Mecca where the conjunction falls before sunset and the moon sets after
//! the sun. This module holds the resulting month lengths for the years
//! [`FIRST_YEAR`] to [`LAST_YEAR`]; [`crate::HijriDate`] uses them inside that
//! range and the tabular rule outside it.

/// First Hijri year covered by the table
pub const FIRST_YEAR: i32 = 1423;

/// Last Hijri year covered by the table
pub const LAST_YEAR: i32 = 1500;

/// Days-from-CE ordinal of 1 Muharram 1423 (2002-03-15)
const FIRST_YEAR_START: i64 = 730_924;

/// One entry per year from 1423 AH; bit `m - 1` is set when month `m` has 30 days
const MONTH_LENGTHS: [u16; 78] = [
    0xa95, 0x52d, 0x5ad, 0xb6a, 0x6e4, 0xdc9, 0xd92, 0xaa6,
    0x956, 0x2ae, 0x56d, 0x36a, 0xb55, 0xaaa, 0x94d, 0x49d,
    0x95d, 0x2ba, 0x5b5, 0x5aa, 0xd55, 0xa9a, 0x92e, 0x25e,
    0x55d, 0xada, 0x6d4, 0x6a5, 0x54b, 0xa97, 0x54e, 0xaae,
    0x5ac, 0xba9, 0xd92, 0xb25, 0x64b, 0xcab, 0x55a, 0xb55,
    0x6d2, 0xea5, 0xe4a, 0xa95, 0x52d, 0xaad, 0x36c, 0x759,
    0x6d2, 0x695, 0x52d, 0xa5b, 0x4ba, 0x9ba, 0x3b4, 0xb69,
    0xb52, 0xaa6, 0x4b6, 0x96d, 0x2ec, 0x6d9, 0xdb2, 0xd54,
    0xd2a, 0xa56, 0x4ae, 0x96d, 0xd6a, 0xb54, 0xb29, 0xa93,
    0x52b, 0xa57, 0x536, 0xab5, 0x6aa, 0xe93,
];

/// Whether `year` is covered by the table
pub fn covers(year: i32) -> bool {
    (FIRST_YEAR..=LAST_YEAR).contains(&year)
}

fn year_mask(year: i32) -> Option<u16> {
    if !covers(year) {
        return None;
    }
    MONTH_LENGTHS.get((year - FIRST_YEAR) as usize).copied()
}

fn days_in(mask: u16, month: u32) -> u32 {
    29 + u32::from((mask >> (month - 1)) & 1)
}

fn days_in_year(mask: u16) -> u32 {
    29 * 12 + mask.count_ones()
}

/// Days in `month` of `year`, or `None` outside the table
pub fn month_length(year: i32, month: u32) -> Option<u32> {
    if !(1..=12).contains(&month) {
        return None;
    }
    year_mask(year).map(|mask| days_in(mask, month))
}

/// Days in `year`, or `None` outside the table
pub fn year_length(year: i32) -> Option<u32> {
    year_mask(year).map(days_in_year)
}

/// Days-from-CE ordinal of a Hijri date covered by the table
pub(crate) fn to_ordinal(year: i32, month: u32, day: u32) -> Option<i64> {
    let mask = year_mask(year)?;
    let year_start: i64 = MONTH_LENGTHS[..(year - FIRST_YEAR) as usize]
        .iter()
        .map(|&mask| i64::from(days_in_year(mask)))
        .sum();
    let month_start: i64 = (1..month).map(|m| i64::from(days_in(mask, m))).sum();
    Some(FIRST_YEAR_START + year_start + month_start + i64::from(day) - 1)
}

/// Hijri year, month and day of a days-from-CE ordinal covered by the table
pub(crate) fn from_ordinal(ordinal: i64) -> Option<(i32, u32, u32)> {
    if ordinal < FIRST_YEAR_START {
        return None;
    }

    let mut start = FIRST_YEAR_START;
    for (year, &mask) in (FIRST_YEAR..).zip(MONTH_LENGTHS.iter()) {
        let length = i64::from(days_in_year(mask));
        if ordinal >= start + length {
            start += length;
            continue;
        }
        for month in 1..=12 {
            let length = i64::from(days_in(mask, month));
            if ordinal < start + length {
                return Some((year, month, (ordinal - start + 1) as u32));
            }
            start += length;
        }
    }
    None
}
