use crate::error::Error;
use serde::Serialize;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use time::macros::format_description;
use time::{Date, Time};

pub(crate) const FLOORS: RangeInclusive<u8> = 3..=27;
pub(crate) const ROOMS: RangeInclusive<u8> = 1..=10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub(crate) enum Tower {
    A,
    B,
}

impl Tower {
    pub const ALL: [Tower; 2] = [Tower::A, Tower::B];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tower::A => "A",
            Tower::B => "B",
        }
    }

    /// Label shown in the select; towers are lettered in Cyrillic on site.
    pub fn label(&self) -> &'static str {
        match self {
            Tower::A => "А",
            Tower::B => "Б",
        }
    }
}

impl FromStr for Tower {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Tower::A),
            "B" => Ok(Tower::B),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub(crate) struct Floor(u8);

impl Floor {
    pub fn new(number: u8) -> Option<Self> {
        FLOORS.contains(&number).then_some(Self(number))
    }

    pub fn number(&self) -> u8 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub(crate) struct Room(u8);

impl Room {
    pub fn new(number: u8) -> Option<Self> {
        ROOMS.contains(&number).then_some(Self(number))
    }

    pub fn number(&self) -> u8 {
        self.0
    }
}

/// Field identifiers as they cross the presentation boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Field {
    Tower,
    Floor,
    Room,
    Date,
    StartTime,
    EndTime,
    Comment,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Tower,
        Field::Floor,
        Field::Room,
        Field::Date,
        Field::StartTime,
        Field::EndTime,
        Field::Comment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Tower => "tower",
            Field::Floor => "floor",
            Field::Room => "room",
            Field::Date => "date",
            Field::StartTime => "startTime",
            Field::EndTime => "endTime",
            Field::Comment => "comment",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| Error::UnknownField(s.to_string()))
    }
}

pub(crate) fn parse_date(value: &str) -> Option<Date> {
    Date::parse(value, format_description!("[year]-[month]-[day]")).ok()
}

pub(crate) fn format_date(date: Date) -> Result<String, Error> {
    Ok(date.format(format_description!("[year]-[month]-[day]"))?)
}

pub(crate) fn parse_time(value: &str) -> Option<Time> {
    Time::parse(
        value,
        format_description!("[hour]:[minute][optional [:[second]]]"),
    )
    .ok()
}

pub(crate) fn format_time(time: Time) -> Result<String, Error> {
    Ok(time.format(format_description!("[hour]:[minute]"))?)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct BookingForm {
    pub tower: Option<Tower>,
    pub floor: Option<Floor>,
    pub room: Option<Room>,
    pub date: Date,
    pub start_time: Time,
    pub end_time: Time,
    pub comment: String,
}

impl BookingForm {
    /// Empty selections, both times set to `time`.
    pub fn new(date: Date, time: Time) -> Self {
        Self {
            tower: None,
            floor: None,
            room: None,
            date,
            start_time: time,
            end_time: time,
            comment: String::new(),
        }
    }

    /// Returns the form with one field replaced. An empty string unsets a
    /// selection and leaves a date or time as it was; anything else that does
    /// not parse into the field's type is rejected with [`Error::InvalidValue`].
    pub fn with_field(self, field: Field, value: &str) -> Result<Self, Error> {
        if value.is_empty() && matches!(field, Field::Date | Field::StartTime | Field::EndTime) {
            return Ok(self);
        }

        let invalid = || Error::InvalidValue {
            field: field.as_str(),
            value: value.to_string(),
        };

        let form = match field {
            Field::Tower => Self {
                tower: selection(value, |v| v.parse::<Tower>().ok()).ok_or_else(invalid)?,
                ..self
            },
            Field::Floor => Self {
                floor: selection(value, |v| v.parse::<u8>().ok().and_then(Floor::new))
                    .ok_or_else(invalid)?,
                ..self
            },
            Field::Room => Self {
                room: selection(value, |v| v.parse::<u8>().ok().and_then(Room::new))
                    .ok_or_else(invalid)?,
                ..self
            },
            Field::Date => Self {
                date: parse_date(value).ok_or_else(invalid)?,
                ..self
            },
            Field::StartTime => Self {
                start_time: parse_time(value).ok_or_else(invalid)?,
                ..self
            },
            Field::EndTime => Self {
                end_time: parse_time(value).ok_or_else(invalid)?,
                ..self
            },
            Field::Comment => Self {
                comment: value.to_string(),
                ..self
            },
        };

        Ok(form)
    }

    pub fn missing_required(&self) -> Vec<Field> {
        let mut missing = Vec::new();

        if self.tower.is_none() {
            missing.push(Field::Tower);
        }
        if self.floor.is_none() {
            missing.push(Field::Floor);
        }
        if self.room.is_none() {
            missing.push(Field::Room);
        }

        missing
    }

    pub fn has_ordered_times(&self) -> bool {
        self.start_time <= self.end_time
    }

    /// Snapshot for emission, `None` while a required selection is unset.
    pub fn record(&self) -> Result<Option<BookingRecord>, Error> {
        let (Some(tower), Some(floor), Some(room)) = (self.tower, self.floor, self.room) else {
            return Ok(None);
        };

        Ok(Some(BookingRecord {
            tower,
            floor,
            room,
            date: format_date(self.date)?,
            start_time: format_time(self.start_time)?,
            end_time: format_time(self.end_time)?,
            comment: self.comment.clone(),
        }))
    }

    pub fn view(&self) -> Result<FormView, Error> {
        Ok(FormView {
            tower: self.tower.map(|t| t.as_str().to_string()).unwrap_or_default(),
            floor: self.floor.map(|f| f.number().to_string()).unwrap_or_default(),
            room: self.room.map(|r| r.number().to_string()).unwrap_or_default(),
            date: format_date(self.date)?,
            start_time: format_time(self.start_time)?,
            end_time: format_time(self.end_time)?,
            comment: self.comment.clone(),
        })
    }
}

/// `Some(None)` for the empty string, `None` when the value does not parse.
fn selection<T>(value: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<Option<T>> {
    if value.is_empty() {
        Some(None)
    } else {
        parse(value).map(Some)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BookingRecord {
    pub tower: Tower,
    pub floor: Floor,
    pub room: Room,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub comment: String,
}

/// Field values as the presentation layer shows them; unset selections are
/// empty strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FormView {
    pub tower: String,
    pub floor: String,
    pub room: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub comment: String,
}
