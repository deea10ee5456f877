use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Debug, Display},
    sync::OnceLock,
};
use time::{
    Date as CalendarDate, OffsetDateTime, UtcOffset,
    format_description::{FormatItem, well_known::Rfc3339},
};

static DATE_ONLY: OnceLock<Vec<FormatItem<'static>>> = OnceLock::new();

fn date_only_format() -> &'static [FormatItem<'static>] {
    DATE_ONLY.get_or_init(|| {
        time::format_description::parse("[year]-[month]-[day]").unwrap()
    })
}

///
/// Date
/// Point-in-time value carried by date-typed fields.
///
/// Parses RFC 3339 timestamps as well as bare `YYYY-MM-DD` dates; a bare
/// date is taken as midnight UTC. Serialized as the string it was parsed
/// from would render: RFC 3339, or the bare date when the time is midnight
/// UTC.
///

#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Date(OffsetDateTime);

impl Date {
    /// Parse an RFC 3339 timestamp or a `YYYY-MM-DD` date.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
            return Some(Self(dt));
        }

        CalendarDate::parse(s, date_only_format())
            .ok()
            .map(|d| Self(d.midnight().assume_utc()))
    }

    #[must_use]
    pub fn new(y: i32, m: u8, d: u8) -> Option<Self> {
        let month = time::Month::try_from(m).ok()?;
        let date = CalendarDate::from_calendar_date(y, month, d).ok()?;

        Some(Self(date.midnight().assume_utc()))
    }

    #[must_use]
    pub const fn get(self) -> OffsetDateTime {
        self.0
    }

    /// True when the value carries no time-of-day component.
    #[must_use]
    fn is_bare_date(self) -> bool {
        self.0.offset() == UtcOffset::UTC && self.0.time() == time::Time::MIDNIGHT
    }
}

impl Debug for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Date({self})")
    }
}

impl Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bare_date() {
            let date = self.0.date();
            let month: u8 = date.month().into();
            return write!(f, "{:04}-{:02}-{:02}", date.year(), month, date.day());
        }

        let rendered = self.0.format(&Rfc3339).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

impl From<OffsetDateTime> for Date {
    fn from(dt: OffsetDateTime) -> Self {
        Self(dt)
    }
}

impl Serialize for Date {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {s}")))
    }
}

///
/// TESTS
///
