use chrono::{Datelike, Duration, NaiveDate};
use clap::ValueEnum;
use std::fmt;

/// Named ranges relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Period {
    #[default]
    Today,
    /// Monday through Sunday of the current week
    Week,
    Month,
    Year,
}

/// An inclusive range of calendar dates. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if start > end {
            return Err(DateRangeError::StartAfterEnd(start, end));
        }
        Ok(Self { start, end })
    }

    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn for_period(period: Period, today: NaiveDate) -> Self {
        match period {
            Period::Today => Self::single(today),
            Period::Week => {
                let start =
                    today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
                Self {
                    start,
                    end: start + Duration::days(6),
                }
            }
            Period::Month => {
                let start = today.with_day(1).unwrap_or(today);
                let next_month = if today.month() == 12 {
                    NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
                };
                let end = next_month
                    .and_then(|d| d.pred_opt())
                    .unwrap_or(today);
                Self { start, end }
            }
            Period::Year => Self {
                start: NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
                end: NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today),
            },
        }
    }

    /// Resolve command-line input: explicit bounds win over the period shorthand.
    pub fn from_args(
        start: Option<&str>,
        end: Option<&str>,
        period: Period,
        today: NaiveDate,
    ) -> Result<Self, DateRangeError> {
        match (start, end) {
            (Some(start), Some(end)) => Self::new(parse_date(start)?, parse_date(end)?),
            (None, None) => Ok(Self::for_period(period, today)),
            _ => Err(DateRangeError::MissingBound),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{} to {}", self.start, self.end)
        }
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate, DateRangeError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| DateRangeError::InvalidDate(s.to_string()))
}

#[derive(Debug, Clone, PartialEq)]
pub enum DateRangeError {
    InvalidDate(String),
    StartAfterEnd(NaiveDate, NaiveDate),
    MissingBound,
}

impl fmt::Display for DateRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateRangeError::InvalidDate(s) => {
                write!(f, "Invalid date format '{}'. Use YYYY-MM-DD.", s)
            }
            DateRangeError::StartAfterEnd(start, end) => {
                write!(f, "Start date {} must not be after end date {}", start, end)
            }
            DateRangeError::MissingBound => {
                write!(f, "Both --start and --end must be given together")
            }
        }
    }
}

impl std::error::Error for DateRangeError {}
