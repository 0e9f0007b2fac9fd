//! Calendar helpers: partial dates, inclusive time slices and CF time decoding

use crate::errors::{GridError, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use std::fmt;
use std::str::FromStr;

/// A date given at year, month or day resolution, e.g. `2040`, `2040-06`, `2040-06-30`
///
/// As the start of a range it stands for the first instant of its period; as
/// the end, for the whole period (so `2040` as an end bound includes all of 2040).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartialDate {
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl PartialDate {
    pub fn year(year: i32) -> Self {
        Self {
            year,
            month: None,
            day: None,
        }
    }

    /// First instant covered by this date, `None` when it is outside the calendar
    pub fn first_instant(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month.unwrap_or(1), self.day.unwrap_or(1))
            .map(|d| d.and_time(NaiveTime::MIN))
    }

    /// First instant after the period this date covers, `None` when it is outside the calendar
    pub fn period_end(&self) -> Option<NaiveDateTime> {
        let january_after = |year: i32| {
            year.checked_add(1).and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
        };
        let next = match (self.month, self.day) {
            (None, _) => january_after(self.year),
            (Some(m), None) => NaiveDate::from_ymd_opt(self.year, m, 1).and_then(|_| match m {
                12 => january_after(self.year),
                _ => NaiveDate::from_ymd_opt(self.year, m + 1, 1),
            }),
            (Some(m), Some(d)) => {
                NaiveDate::from_ymd_opt(self.year, m, d).and_then(|d| d.succ_opt())
            }
        };
        next.map(|d| d.and_time(NaiveTime::MIN))
    }
}

impl FromStr for PartialDate {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || GridError::InvalidDate(s.to_string());
        let parts: Vec<&str> = s.trim().split('-').collect();
        let number = |p: &str| p.parse::<u32>().map_err(|_| invalid());

        let date = match parts.as_slice() {
            [y] => Self {
                year: y.parse().map_err(|_| invalid())?,
                month: None,
                day: None,
            },
            [y, m] => Self {
                year: y.parse().map_err(|_| invalid())?,
                month: Some(number(m)?),
                day: None,
            },
            [y, m, d] => Self {
                year: y.parse().map_err(|_| invalid())?,
                month: Some(number(m)?),
                day: Some(number(d)?),
            },
            _ => return Err(invalid()),
        };

        // Reject impossible months and days up front
        NaiveDate::from_ymd_opt(date.year, date.month.unwrap_or(1), date.day.unwrap_or(1))
            .ok_or_else(invalid)?;
        Ok(date)
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.year)?;
        if let Some(m) = self.month {
            write!(f, "-{:02}", m)?;
        }
        if let Some(d) = self.day {
            write!(f, "-{:02}", d)?;
        }
        Ok(())
    }
}

/// Inclusive date range used to select part of a time axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlice {
    pub start: PartialDate,
    pub end: PartialDate,
}

impl TimeSlice {
    pub fn new(start: PartialDate, end: PartialDate) -> Self {
        Self { start, end }
    }

    /// Build a slice from two date strings
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDate`] if either bound does not parse.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(start.parse()?, end.parse()?))
    }

    /// Whole-year slice `start..=end`
    pub fn years(start: i32, end: i32) -> Self {
        Self::new(PartialDate::year(start), PartialDate::year(end))
    }

    /// The four twenty-year periods 2020-2040, 2040-2060, 2060-2080 and 2080-2100
    pub fn default_slices() -> Vec<Self> {
        vec![
            Self::years(2020, 2040),
            Self::years(2040, 2060),
            Self::years(2060, 2080),
            Self::years(2080, 2100),
        ]
    }

    /// Whether `t` falls in the slice; a bound outside the calendar selects nothing
    pub fn contains(&self, t: &NaiveDateTime) -> bool {
        match (self.start.first_instant(), self.end.period_end()) {
            (Some(start), Some(end)) => *t >= start && *t < end,
            _ => false,
        }
    }

    /// `"<start>_<end>"`, e.g. `"2020_2040"`
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TimeSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.start, self.end)
    }
}

/// Parses `start:end`, as used on the command line
impl FromStr for TimeSlice {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((start, end)) => Self::parse(start, end),
            None => Err(GridError::InvalidDate(s.to_string())),
        }
    }
}

/// Midnight on January 1st of `year`
pub fn year_start(year: i32) -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .map(|d| d.and_time(NaiveTime::MIN))
        .ok_or_else(|| GridError::InvalidDate(year.to_string()))
}

/// `n` consecutive daily timestamps starting at midnight on `start`
pub fn daily_axis(start: NaiveDate, n: usize) -> Vec<NaiveDateTime> {
    start
        .iter_days()
        .take(n)
        .map(|d| d.and_time(NaiveTime::MIN))
        .collect()
}

/// Position of `t` on a continuous year axis, e.g. 2000-07-02 ≈ 2000.5
pub fn fractional_year(t: &NaiveDateTime) -> f64 {
    let year = t.year();
    let days_in_year = if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366.0
    } else {
        365.0
    };
    let seconds = f64::from(t.num_seconds_from_midnight()) / 86_400.0;
    f64::from(year) + (f64::from(t.ordinal0()) + seconds) / days_in_year
}

const NOLEAP_MONTH_STARTS: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// Decode CF time offsets (`"<unit> since <reference>"`) into timestamps
///
/// Supported calendars: `standard`, `gregorian`, `proleptic_gregorian`
/// (all treated as proleptic Gregorian), `noleap` and `365_day`.
///
/// # Errors
///
/// Returns [`GridError::InvalidTimeUnits`] for malformed units and
/// [`GridError::UnsupportedCalendar`] for any other calendar.
pub fn decode_cf_time(
    offsets: &[f64],
    units: &str,
    calendar: Option<&str>,
) -> Result<Vec<NaiveDateTime>> {
    let invalid = || GridError::InvalidTimeUnits(units.to_string());
    let (unit, reference) = units.split_once(" since ").ok_or_else(invalid)?;

    let unit_seconds = match unit.trim().to_lowercase().as_str() {
        "days" | "day" | "d" => 86_400.0,
        "hours" | "hour" | "h" => 3_600.0,
        "minutes" | "minute" | "min" => 60.0,
        "seconds" | "second" | "s" => 1.0,
        _ => return Err(invalid()),
    };
    let reference = parse_reference(reference).ok_or_else(invalid)?;

    let calendar = calendar.unwrap_or("standard").trim().to_lowercase();
    match calendar.as_str() {
        "standard" | "gregorian" | "proleptic_gregorian" => offsets
            .iter()
            .map(|&offset| {
                let millis = (offset * unit_seconds * 1000.0).round() as i64;
                TimeDelta::try_milliseconds(millis)
                    .and_then(|delta| reference.checked_add_signed(delta))
                    .ok_or_else(invalid)
            })
            .collect(),
        "noleap" | "365_day" => {
            let base = noleap_seconds(&reference).ok_or_else(invalid)?;
            offsets
                .iter()
                .map(|&offset| {
                    let total = base + (offset * unit_seconds).round() as i64;
                    from_noleap_seconds(total).ok_or_else(invalid)
                })
                .collect()
        }
        other => Err(GridError::UnsupportedCalendar(other.to_string())),
    }
}

fn parse_reference(reference: &str) -> Option<NaiveDateTime> {
    let reference = reference.trim().trim_end_matches('Z').trim_end_matches(" UTC");
    let (date, time) = match reference.split_once(|c: char| c == ' ' || c == 'T') {
        Some((d, t)) => (d, Some(t.trim())),
        None => (reference, None),
    };

    let mut fields = date.split('-');
    let year = fields.next()?.parse::<i32>().ok()?;
    let month = fields.next().map_or(Ok(1), |p| p.parse::<u32>()).ok()?;
    let day = fields.next().map_or(Ok(1), |p| p.parse::<u32>()).ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let time = match time {
        None | Some("") => NaiveTime::MIN,
        Some(t) => NaiveTime::parse_from_str(t, "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
            .ok()?,
    };
    Some(date.and_time(time))
}

fn noleap_seconds(t: &NaiveDateTime) -> Option<i64> {
    if t.month() == 2 && t.day() == 29 {
        return None;
    }
    let days = i64::from(t.year()) * 365
        + NOLEAP_MONTH_STARTS[t.month0() as usize]
        + i64::from(t.day0());
    Some(days * 86_400 + i64::from(t.num_seconds_from_midnight()))
}

fn from_noleap_seconds(total: i64) -> Option<NaiveDateTime> {
    let days = total.div_euclid(86_400);
    let seconds = total.rem_euclid(86_400) as u32;
    let year = i32::try_from(days.div_euclid(365)).ok()?;
    let day_of_year = days.rem_euclid(365);
    let month0 = NOLEAP_MONTH_STARTS
        .iter()
        .rposition(|&start| start <= day_of_year)?;
    let day = (day_of_year - NOLEAP_MONTH_STARTS[month0]) as u32 + 1;
    let date = NaiveDate::from_ymd_opt(year, month0 as u32 + 1, day)?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)?;
    Some(date.and_time(time))
}
