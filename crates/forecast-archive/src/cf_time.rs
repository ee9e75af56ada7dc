//! Decoding of CF-convention time coordinates.
//!
//! Time variables carry a `units` attribute of the form
//! `"<unit> since <epoch>"` and an optional `calendar` attribute. GrADS
//! OPeNDAP servers use `days since 1-1-1 00:00:0.0` on the default
//! (mixed Julian/Gregorian) calendar, so epochs before the Gregorian reform
//! are read as Julian dates.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::error::{ArchiveError, ArchiveResult};

const MS_PER_SECOND: f64 = 1_000.0;
const MS_PER_MINUTE: f64 = 60_000.0;
const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_DAY: f64 = 86_400_000.0;

/// Calendars with a Gregorian year length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calendar {
    /// Julian before 1582-10-15, Gregorian after (CF default)
    Standard,
    ProlepticGregorian,
    Julian,
}

impl Calendar {
    pub fn parse(name: Option<&str>) -> ArchiveResult<Self> {
        match name.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("standard") | Some("gregorian") => Ok(Calendar::Standard),
            Some("proleptic_gregorian") => Ok(Calendar::ProlepticGregorian),
            Some("julian") => Ok(Calendar::Julian),
            Some(other) => Err(ArchiveError::TimeEncoding(format!(
                "calendar '{}' is not supported",
                other
            ))),
        }
    }
}

/// A parsed `"<unit> since <epoch>"` reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeUnits {
    pub unit_ms: f64,
    pub epoch: DateTime<Utc>,
}

impl TimeUnits {
    pub fn parse(units: &str, calendar: Calendar) -> ArchiveResult<Self> {
        let invalid = || ArchiveError::TimeEncoding(format!("cannot parse units '{}'", units));

        let lower = units.trim().to_ascii_lowercase();
        let (unit, epoch) = lower.split_once(" since ").ok_or_else(invalid)?;
        let unit_ms = match unit.trim() {
            "days" | "day" | "d" => MS_PER_DAY,
            "hours" | "hour" | "hr" | "hrs" | "h" => MS_PER_HOUR,
            "minutes" | "minute" | "min" | "mins" => MS_PER_MINUTE,
            "seconds" | "second" | "sec" | "secs" | "s" => MS_PER_SECOND,
            _ => return Err(invalid()),
        };

        let naive = parse_epoch(epoch.trim()).ok_or_else(invalid)?;
        let shift = calendar_shift_days(naive.date(), calendar);
        let epoch = Utc.from_utc_datetime(&(naive + Duration::days(shift)));

        Ok(Self { unit_ms, epoch })
    }

    /// Timestamp of one encoded value, rounded to the millisecond.
    pub fn decode(&self, value: f64) -> ArchiveResult<DateTime<Utc>> {
        if !value.is_finite() {
            return Err(ArchiveError::TimeEncoding(format!(
                "non-finite time value {}",
                value
            )));
        }
        let ms = (value * self.unit_ms).round() as i64;
        Ok(self.epoch + Duration::milliseconds(ms))
    }
}

/// Decode a whole time coordinate.
pub fn decode_times(
    values: &[f64],
    units: &str,
    calendar: Option<&str>,
) -> ArchiveResult<Vec<DateTime<Utc>>> {
    let units = TimeUnits::parse(units, Calendar::parse(calendar)?)?;
    values.iter().map(|&v| units.decode(v)).collect()
}

/// Days to add to a Julian date, read as proleptic Gregorian, to land on the
/// same instant.
fn calendar_shift_days(date: NaiveDate, calendar: Calendar) -> i64 {
    let julian = match calendar {
        Calendar::ProlepticGregorian => false,
        Calendar::Julian => true,
        Calendar::Standard => NaiveDate::from_ymd_opt(1582, 10, 15).map_or(false, |reform| date < reform),
    };
    if !julian {
        return 0;
    }
    let year = date.year() as i64;
    year.div_euclid(100) - year.div_euclid(400) - 2
}

/// Parse `Y-M-D`, `Y-M-D H:M:S[.f]` or `Y-M-DTH:M:S[Z]`.
fn parse_epoch(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim_end_matches('z').trim_end_matches(" utc");
    let (date_part, time_part) = match s.split_once(['t', ' ']) {
        Some((d, t)) => (d, Some(t.trim())),
        None => (s, None),
    };

    let mut ymd = date_part.splitn(3, '-');
    let year: i32 = ymd.next()?.parse().ok()?;
    let month: u32 = ymd.next()?.parse().ok()?;
    let day: u32 = ymd.next()?.parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let time = match time_part {
        None | Some("") => NaiveTime::MIN,
        Some(t) => {
            let mut hms = t.splitn(3, ':');
            let hour: u32 = hms.next()?.parse().ok()?;
            let minute: u32 = hms.next().unwrap_or("0").parse().ok()?;
            let seconds: f64 = hms.next().unwrap_or("0").parse().ok()?;
            let whole = seconds.trunc() as u32;
            let millis = ((seconds - seconds.trunc()) * 1000.0).round() as u32;
            NaiveTime::from_hms_milli_opt(hour, minute, whole, millis)?
        }
    };

    Some(date.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hours_since_iso_epoch() {
        let times = decode_times(&[0.0, 3.0, 6.0], "hours since 2025-01-01 00:00:00", None).unwrap();
        assert_eq!(times[0], Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(times[2], Utc.with_ymd_and_hms(2025, 1, 1, 6, 0, 0).unwrap());
    }

    #[test]
    fn test_grads_days_since_year_one() {
        // GrADS encodes 2025-01-01 00Z as 739253 days since 1-1-1 (Julian epoch)
        let times = decode_times(&[739253.0, 739253.125], "days since 1-1-1 00:00:0.0", None).unwrap();
        assert_eq!(times[0], Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(times[1], Utc.with_ymd_and_hms(2025, 1, 1, 3, 0, 0).unwrap());
    }

    #[test]
    fn test_proleptic_gregorian_has_no_shift() {
        let units = TimeUnits::parse("days since 1-1-1", Calendar::ProlepticGregorian).unwrap();
        let expected = Utc.from_utc_datetime(&NaiveDate::from_ymd_opt(1, 1, 1).unwrap().and_time(NaiveTime::MIN));
        assert_eq!(units.epoch, expected);
    }

    #[test]
    fn test_iso_t_separator() {
        let units = TimeUnits::parse("seconds since 1970-01-01T00:00:00Z", Calendar::Standard).unwrap();
        assert_eq!(units.decode(86400.0).unwrap(), Utc.with_ymd_and_hms(1970, 1, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_rejects_bad_units() {
        assert!(decode_times(&[0.0], "fortnights since 2025-01-01", None).is_err());
        assert!(decode_times(&[0.0], "hours", None).is_err());
        assert!(decode_times(&[0.0], "hours since 2025-01-01", Some("360_day")).is_err());
        assert!(decode_times(&[f64::NAN], "hours since 2025-01-01", None).is_err());
    }
}
