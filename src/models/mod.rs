use std::fmt;

use async_graphql::{InputValueError, InputValueResult, Scalar, ScalarType, Value};
use serde::{Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time};

pub mod analytics;
pub mod club;
pub mod event;
pub mod permissions;
pub mod profile;
pub mod session;

pub const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
pub const TIME_FORMAT: &[FormatItem<'static>] = format_description!("[hour]:[minute]");

/// A calendar date, formatted as `YYYY-MM-DD`
#[derive(sqlx::Type, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[sqlx(transparent)]
pub struct DateScalar(pub Date);

impl DateScalar {
    pub fn parse_str(date_str: &str) -> Option<Self> {
        Date::parse(date_str, DATE_FORMAT).ok().map(DateScalar)
    }
}

impl fmt::Display for DateScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.format(DATE_FORMAT) {
            Ok(formatted) => f.write_str(&formatted),
            Err(_) => write!(f, "{}", self.0),
        }
    }
}

#[Scalar(name = "Date")]
impl ScalarType for DateScalar {
    fn parse(value: Value) -> InputValueResult<Self> {
        if let Value::String(date_str) = &value {
            if let Some(date) = DateScalar::parse_str(date_str) {
                return Ok(date);
            }
        }

        Err(InputValueError::expected_type(value))
    }

    fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl Serialize for DateScalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A time of day, formatted as `HH:MM`
#[derive(sqlx::Type, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[sqlx(transparent)]
pub struct TimeScalar(pub Time);

impl TimeScalar {
    pub fn parse_str(time_str: &str) -> Option<Self> {
        Time::parse(time_str, TIME_FORMAT).ok().map(TimeScalar)
    }
}

impl fmt::Display for TimeScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.format(TIME_FORMAT) {
            Ok(formatted) => f.write_str(&formatted),
            Err(_) => write!(f, "{}", self.0),
        }
    }
}

#[Scalar(name = "Time")]
impl ScalarType for TimeScalar {
    fn parse(value: Value) -> InputValueResult<Self> {
        if let Value::String(time_str) = &value {
            if let Some(time) = TimeScalar::parse_str(time_str) {
                return Ok(time);
            }
        }

        Err(InputValueError::expected_type(value))
    }

    fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl Serialize for TimeScalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A point in time, formatted as RFC 3339
#[derive(sqlx::Type, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[sqlx(transparent)]
pub struct DateTimeScalar(pub OffsetDateTime);

#[Scalar(name = "DateTime")]
impl ScalarType for DateTimeScalar {
    fn parse(value: Value) -> InputValueResult<Self> {
        if let Value::String(date_str) = &value {
            if let Ok(datetime) = OffsetDateTime::parse(date_str, &Rfc3339) {
                return Ok(DateTimeScalar(datetime));
            }
        }

        Err(InputValueError::expected_type(value))
    }

    fn to_value(&self) -> Value {
        match self.0.format(&Rfc3339) {
            Ok(formatted) => Value::String(formatted),
            Err(_) => Value::Null,
        }
    }
}
