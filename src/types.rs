use core::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

/// Calendar fields as they are stored in MS-DOS date and time words.
///
/// The archive keeps timestamps in UTC with a 2 second resolution, years 1980 through 2107.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DateTimeCS {
    year: u16,
    month: u16,
    day: u16,
    hour: u16,
    minute: u16,
    second: u16,
}

impl Default for DateTimeCS {
    /// 1980, January 1st, midnight: the smallest representable DOS date.
    fn default() -> Self {
        Self {
            year: 1980,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }
}

impl DateTimeCS {
    const MAX_YEAR: i32 = 1980 + 127;

    pub fn new(year: u16, month: u16, day: u16, hour: u16, minute: u16, second: u16) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Instants before 1980 are floored to 1980-01-01T00:00:00Z, instants past 2107 are capped.
    pub fn from_chrono_datetime<Tz: TimeZone>(datetime: DateTime<Tz>) -> Self {
        let datetime = datetime.with_timezone(&Utc);

        if datetime.year() < 1980 {
            return Self::default();
        }
        if datetime.year() > Self::MAX_YEAR {
            return Self::new(Self::MAX_YEAR as u16, 12, 31, 23, 59, 58);
        }

        Self {
            year: datetime.year() as u16,
            month: datetime.month() as u16,
            day: datetime.day() as u16,
            hour: datetime.hour() as u16,
            minute: datetime.minute() as u16,
            second: datetime.second() as u16,
        }
    }

    pub fn now() -> Self {
        Self::from_chrono_datetime(Utc::now())
    }

    pub fn from_msdos(datepart: u16, timepart: u16) -> Self {
        let seconds = (timepart & 0b0000000000011111) << 1;
        let minutes = (timepart & 0b0000011111100000) >> 5;
        let hours = (timepart & 0b1111100000000000) >> 11;
        let days = datepart & 0b0000000000011111;
        let months = (datepart & 0b0000000111100000) >> 5;
        let years = (datepart & 0b1111111000000000) >> 9;

        Self {
            year: years + 1980,
            month: months,
            day: days,
            hour: hours,
            minute: minutes,
            second: seconds,
        }
    }

    /// Returns `(date, time)` DOS words.
    pub fn ms_dos(&self) -> (u16, u16) {
        let date = self.day | (self.month << 5) | self.year.saturating_sub(1980) << 9;
        let time = (self.second / 2) | (self.minute << 5) | self.hour << 11;
        (date, time)
    }

    fn naive(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)?.and_hms_opt(
            self.hour as u32,
            self.minute as u32,
            self.second as u32,
        )
    }

    /// True when the fields name a real calendar instant inside the DOS range.
    pub fn is_valid(&self) -> bool {
        (1980..=Self::MAX_YEAR).contains(&(self.year as i32)) && self.naive().is_some()
    }

    /// Invalid dates decoded from an archive fall back to 1980-01-01.
    pub fn to_time(&self) -> NaiveDateTime {
        self.naive()
            .unwrap_or_else(|| DateTimeCS::default().naive().unwrap_or_default())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.to_time())
    }
}

impl fmt::Display for DateTimeCS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date_time = self.to_time();
        write!(f, "{:}", date_time)
    }
}

/// The modification time that will be written alongside an entry.
///
/// Use `FileDateTime::Zero` if the date and time are insignificant (1980, January 1st).
/// Use `FileDateTime::Custom` for a given instant, and `FileDateTime::Now` for the current time.
/// A `Custom` value that does not name a valid date is replaced by the current time.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum FileDateTime {
    Zero,
    Custom(DateTimeCS),
    #[default]
    Now,
}

impl FileDateTime {
    /// Parses an RFC 3339 timestamp. Unparseable input becomes `Now`.
    pub fn parse(value: &str) -> Self {
        match DateTime::parse_from_rfc3339(value) {
            Ok(datetime) => datetime.into(),
            Err(e) => {
                log::warn!("invalid modification time {:?} ({}), using now", value, e);
                FileDateTime::Now
            }
        }
    }

    /// Resolves to concrete DOS fields, applying the 1980 floor and the invalid-date fallback.
    pub fn resolve(&self) -> DateTimeCS {
        match self {
            FileDateTime::Zero => DateTimeCS::default(),
            FileDateTime::Custom(date_time) if date_time.is_valid() => *date_time,
            FileDateTime::Custom(date_time) if date_time.year < 1980 => DateTimeCS::default(),
            FileDateTime::Custom(date_time) => {
                log::warn!("invalid modification time {:?}, using now", date_time);
                DateTimeCS::now()
            }
            FileDateTime::Now => DateTimeCS::now(),
        }
    }

    pub fn ms_dos(&self) -> (u16, u16) {
        self.resolve().ms_dos()
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for FileDateTime {
    fn from(datetime: DateTime<Tz>) -> Self {
        FileDateTime::Custom(DateTimeCS::from_chrono_datetime(datetime))
    }
}
