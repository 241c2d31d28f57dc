// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use jiff::{SignedDuration, Timestamp};

/// A calendar event parsed from one `BEGIN`…`END` block.
///
/// Fields that never appeared in the block keep their defaults: empty strings, no start time
/// and a zero duration.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Event {
    /// Unique identifier, the key of the event in the index.
    pub uid: String,

    /// Title of the event, kept verbatim.
    pub summary: String,

    /// Description with the enclosing `<p>` markup removed.
    pub description: String,

    /// Common name of the attendee.
    pub speaker: String,

    /// Room or venue.
    pub location: String,

    /// Track or category.
    pub category: String,

    /// Link to the event page.
    pub url: String,

    /// Start time, interpreted as UTC.
    pub start: Option<Timestamp>,

    /// Length of the event in minutes, fractional minutes allowed.
    pub duration: f64,
}

impl Event {
    /// The start time formatted as RFC 3339, or an empty string if unknown.
    pub fn start_rfc3339(&self) -> String {
        self.start.map(|a| a.to_string()).unwrap_or_default()
    }

    /// The value of the given field, formatted for display.
    pub fn field(&self, field: Field) -> Cow<'_, str> {
        match field {
            Field::Uid => (&self.uid).into(),
            Field::Summary => (&self.summary).into(),
            Field::Description => (&self.description).into(),
            Field::Speaker => (&self.speaker).into(),
            Field::Location => (&self.location).into(),
            Field::Category => (&self.category).into(),
            Field::Url => (&self.url).into(),
            Field::Start => self.start_rfc3339().into(),
            Field::Duration => self.duration.to_string().into(),
        }
    }
}

/// Converts a span of time into minutes, keeping fractions of a minute.
pub(crate) fn duration_minutes(duration: SignedDuration) -> f64 {
    duration.as_secs_f64() / 60.0
}

/// A named field of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Field {
    /// Unique identifier.
    Uid,

    /// Event title.
    Summary,

    /// Event description.
    Description,

    /// Attendee common name.
    Speaker,

    /// Room or venue.
    Location,

    /// Track or category.
    Category,

    /// Event page.
    Url,

    /// Start time.
    Start,

    /// Length in minutes.
    Duration,
}

impl Field {
    /// All fields, in declaration order.
    pub const ALL: [Field; 9] = [
        Field::Uid,
        Field::Summary,
        Field::Description,
        Field::Speaker,
        Field::Location,
        Field::Category,
        Field::Url,
        Field::Start,
        Field::Duration,
    ];

    /// The serialized name of the field.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Field::Uid => "uid",
            Field::Summary => "summary",
            Field::Description => "description",
            Field::Speaker => "speaker",
            Field::Location => "location",
            Field::Category => "category",
            Field::Url => "url",
            Field::Start => "start",
            Field::Duration => "duration",
        }
    }

    /// Fields analyzed as English text by the full-text index.
    pub const fn is_full_text(&self) -> bool {
        matches!(
            self,
            Field::Summary | Field::Description | Field::Speaker | Field::Location
        )
    }

    /// Fields matched as a single exact keyword.
    pub const fn is_keyword(&self) -> bool {
        matches!(self, Field::Uid | Field::Category | Field::Url)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown field: {s}"))
    }
}
