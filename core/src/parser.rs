// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Line-oriented parser for calendar event exports.
//!
//! Every line is matched against a fixed table of key prefixes. `BEGIN` opens a new event,
//! `END` hands it out, and field lines overwrite the corresponding field of the open event.
//! Lines the table does not know, and field lines outside an event, are skipped.
//!
//! ```text
//! BEGIN:VEVENT
//! UID:2839@FOSDEM15@fosdem.org
//! DTSTART:20150201T173000
//! DTEND:20150201T175500
//! SUMMARY:Bleve - text indexing for Go
//! ATTENDEE;ROLE=REQ-PARTICIPANT;CN="Marty Schoch":invalid:nomail
//! END:VEVENT
//! ```

use std::io::{BufRead, Cursor};

use jiff::Timestamp;

use crate::datetime::parse_compact;
use crate::event::duration_minutes;
use crate::{Error, Event};

/// Creates a parser yielding the events of `reader` in source order.
pub fn parse_events<R: BufRead>(reader: R) -> EventParser<R> {
    EventParser::new(reader)
}

/// Parses all complete events in `src`.
pub fn parse_str(src: &str) -> Vec<Event> {
    // reading from memory cannot fail
    parse_events(Cursor::new(src)).filter_map(Result::ok).collect()
}

/// A single-pass iterator over the events of a calendar export.
///
/// Yields one item per `BEGIN`…`END` block. An event still open when the input ends is
/// dropped. A read error is yielded once, after which the iterator is exhausted.
#[derive(Debug)]
pub struct EventParser<R> {
    reader: R,
    buf: Vec<u8>,
    current: Option<EventDraft>,
    done: bool,
}

impl<R: BufRead> EventParser<R> {
    /// Wraps a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            current: None,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for EventParser<R> {
    type Item = Result<Event, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    if let Some(draft) = self.current.take() {
                        tracing::debug!(uid = %draft.event.uid, "dropping event without END");
                    }
                }
                Ok(_) => {
                    let line = String::from_utf8_lossy(&self.buf);
                    if let Some(event) = feed_line(&mut self.current, strip_newline(&line)) {
                        return Some(Ok(event));
                    }
                }
                Err(e) => {
                    self.done = true;
                    self.current = None;
                    return Some(Err(Error::Read(e)));
                }
            }
        }
        None
    }
}

impl<R: BufRead> std::iter::FusedIterator for EventParser<R> {}

fn strip_newline(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Applies one line to the parser state, returning the event it completes, if any.
fn feed_line(current: &mut Option<EventDraft>, line: &str) -> Option<Event> {
    let (_, rule) = LINE_RULES
        .iter()
        .find(|(prefix, _)| line.starts_with(prefix))?;

    match rule {
        LineRule::Begin => {
            if let Some(draft) = current.replace(EventDraft::default()) {
                tracing::debug!(uid = %draft.event.uid, "nested BEGIN, dropping open event");
            }
            None
        }
        LineRule::End => current.take().map(EventDraft::finish),
        LineRule::Ignore => None,
        LineRule::Field(apply) => {
            if let Some(draft) = current.as_mut() {
                apply(draft, line);
            }
            None
        }
    }
}

/// How a recognized line prefix is handled.
#[derive(Clone, Copy)]
enum LineRule {
    Begin,
    End,
    Ignore,
    Field(fn(&mut EventDraft, &str)),
}

/// Recognized key prefixes; the first prefix a line starts with decides its rule.
static LINE_RULES: &[(&str, LineRule)] = &[
    ("BEGIN", LineRule::Begin),
    ("END", LineRule::End),
    ("SUMMARY", LineRule::Field(apply_summary)),
    ("DESCRIPTION", LineRule::Field(apply_description)),
    ("LOCATION", LineRule::Field(apply_location)),
    ("STATUS", LineRule::Ignore),
    ("CLASS", LineRule::Ignore),
    ("TZID", LineRule::Ignore),
    ("CATEGORIES", LineRule::Field(apply_category)),
    ("URL", LineRule::Field(apply_url)),
    ("METHOD", LineRule::Ignore),
    ("UID", LineRule::Field(apply_uid)),
    ("DTSTART", LineRule::Field(apply_start)),
    ("DTEND", LineRule::Field(apply_end)),
    ("ATTENDEE", LineRule::Field(apply_attendee)),
];

/// An event under construction.
#[derive(Debug, Default)]
struct EventDraft {
    event: Event,
    end: Option<Timestamp>,
}

impl EventDraft {
    fn finish(self) -> Event {
        let mut event = self.event;
        if let (Some(start), Some(end)) = (event.start, self.end) {
            event.duration = duration_minutes(end.duration_since(start));
        }
        event
    }
}

/// The text after the first colon, if the line has a key before it.
fn value_of(line: &str) -> Option<&str> {
    line.split_once(':')
        .filter(|(key, _)| !key.is_empty())
        .map(|(_, value)| value)
}

fn apply_summary(draft: &mut EventDraft, line: &str) {
    if let Some(value) = value_of(line) {
        draft.event.summary = value.to_string();
    }
}

fn apply_description(draft: &mut EventDraft, line: &str) {
    if let Some(value) = value_of(line) {
        let value = value.trim();
        let value = value.strip_prefix("<p>").unwrap_or(value);
        let value = value.strip_suffix("</p>").unwrap_or(value);
        if !value.is_empty() {
            draft.event.description = value.to_string();
        }
    }
}

fn apply_location(draft: &mut EventDraft, line: &str) {
    if let Some(value) = value_of(line) {
        draft.event.location = value.trim().to_string();
    }
}

fn apply_category(draft: &mut EventDraft, line: &str) {
    if let Some(value) = value_of(line) {
        draft.event.category = value.trim().to_string();
    }
}

fn apply_url(draft: &mut EventDraft, line: &str) {
    if let Some(value) = value_of(line) {
        draft.event.url = value.trim().to_string();
    }
}

fn apply_uid(draft: &mut EventDraft, line: &str) {
    if let Some(value) = value_of(line) {
        draft.event.uid = value.trim().to_string();
    }
}

fn apply_start(draft: &mut EventDraft, line: &str) {
    match value_of(line).map(str::trim).map(|a| (a, parse_compact(a))) {
        Some((_, Some(start))) => draft.event.start = Some(start),
        Some((value, None)) => tracing::trace!(value, "ignoring unparsable DTSTART"),
        None => {}
    }
}

fn apply_end(draft: &mut EventDraft, line: &str) {
    match value_of(line).map(str::trim).map(|a| (a, parse_compact(a))) {
        Some((_, Some(end))) => draft.end = Some(end),
        Some((value, None)) => tracing::trace!(value, "ignoring unparsable DTEND"),
        None => {}
    }
}

/// Suffix left behind on attendee names that carry no mail address.
const NO_MAIL_SUFFIX: &str = "\":invalid:nomail";

fn apply_attendee(draft: &mut EventDraft, line: &str) {
    for part in line.split(';').filter(|a| a.starts_with("CN")) {
        let Some((_, name)) = part.split_once('=') else {
            continue;
        };

        let name = name.trim();
        let name = name.strip_suffix(NO_MAIL_SUFFIX).unwrap_or(name);
        let name = name.strip_prefix('"').unwrap_or(name);
        draft.event.speaker = name.to_string();
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Read};

    use super::*;

    fn parse_one(body: &str) -> Event {
        let src = format!("BEGIN:VEVENT\n{body}\nEND:VEVENT\n");
        let mut events = parse_str(&src);
        assert_eq!(events.len(), 1);
        events.remove(0)
    }

    #[test]
    fn summary_is_kept_verbatim() {
        let event = parse_one("SUMMARY: Bleve: text indexing ");
        assert_eq!(event.summary, " Bleve: text indexing ");
    }

    #[test]
    fn description_unwraps_paragraph() {
        let event = parse_one("DESCRIPTION:  <p>Hello world</p>  ");
        assert_eq!(event.description, "Hello world");
    }

    #[test]
    fn description_never_assigned_empty() {
        let event = parse_one("DESCRIPTION:<p>first</p>\nDESCRIPTION:<p></p>\nDESCRIPTION:   ");
        assert_eq!(event.description, "first");
    }

    #[test]
    fn trimmed_fields() {
        let event = parse_one(
            "\
LOCATION: K.4.201 \r
CATEGORIES: Go \r
URL: https://fosdem.org/2015/schedule/event/bleve/ \r
UID: 2839@FOSDEM15@fosdem.org \r",
        );
        assert_eq!(event.location, "K.4.201");
        assert_eq!(event.category, "Go");
        assert_eq!(event.url, "https://fosdem.org/2015/schedule/event/bleve/");
        assert_eq!(event.uid, "2839@FOSDEM15@fosdem.org");
    }

    #[test]
    fn url_keeps_colons_after_the_first() {
        let event = parse_one("URL:http://example.org:8080/a");
        assert_eq!(event.url, "http://example.org:8080/a");
    }

    #[test]
    fn missing_colon_leaves_field_unchanged() {
        let event = parse_one("LOCATION:Janson\nLOCATION Janson 2\nSUMMARY");
        assert_eq!(event.location, "Janson");
        assert_eq!(event.summary, "");
    }

    #[test]
    fn last_line_wins() {
        let event = parse_one("UID:a\nUID:b\nSUMMARY:one\nSUMMARY:two");
        assert_eq!(event.uid, "b");
        assert_eq!(event.summary, "two");
    }

    #[test]
    fn duration_in_minutes() {
        let event = parse_one("DTSTART:20150201T173000\nDTEND:20150201T175500");
        assert_eq!(event.start_rfc3339(), "2015-02-01T17:30:00Z");
        assert_eq!(event.duration, 25.0);
    }

    #[test]
    fn duration_keeps_fractional_minutes() {
        let event = parse_one("DTSTART:20150201T173000\nDTEND:20150201T173130");
        assert_eq!(event.duration, 1.5);
    }

    #[test]
    fn duration_with_end_before_start_line() {
        let event = parse_one("DTEND:20150201T180000\nDTSTART:20150201T170000");
        assert_eq!(event.duration, 60.0);
    }

    #[test]
    fn duration_zero_without_valid_end() {
        let event = parse_one("DTSTART:20150201T173000");
        assert_eq!(event.duration, 0.0);

        let event = parse_one("DTSTART:20150201T173000\nDTEND:tomorrow");
        assert!(event.start.is_some());
        assert_eq!(event.duration, 0.0);
    }

    #[test]
    fn duration_zero_without_start() {
        let event = parse_one("DTEND:20150201T175500");
        assert!(event.start.is_none());
        assert_eq!(event.duration, 0.0);

        let event = parse_one("DTSTART:2015-02-01 17:30\nDTEND:20150201T175500");
        assert!(event.start.is_none());
        assert_eq!(event.duration, 0.0);
    }

    #[test]
    fn unparsable_start_keeps_previous() {
        let event = parse_one("DTSTART:20150201T173000\nDTSTART:soon");
        assert_eq!(event.start_rfc3339(), "2015-02-01T17:30:00Z");
    }

    #[test]
    fn dtstart_with_parameters() {
        let event = parse_one("DTSTART;TZID=Europe-Brussels:20150201T090000");
        assert_eq!(event.start_rfc3339(), "2015-02-01T09:00:00Z");
    }

    #[test]
    fn attendee_common_name() {
        let event = parse_one(r#"ATTENDEE;CN="Jane Doe":invalid:nomail;ROLE=REQ"#);
        assert_eq!(event.speaker, "Jane Doe");
    }

    #[test]
    fn attendee_last_common_name_wins() {
        let event = parse_one(r#"ATTENDEE;CN=Alice;ROLE=REQ;CN="Bob":invalid:nomail"#);
        assert_eq!(event.speaker, "Bob");

        let event = parse_one("ATTENDEE;CN=Alice\nATTENDEE;CN= Carol ");
        assert_eq!(event.speaker, "Carol");
    }

    #[test]
    fn attendee_without_common_name() {
        let event = parse_one("ATTENDEE;ROLE=REQ-PARTICIPANT:mailto:a@b.c\nATTENDEE;CN");
        assert_eq!(event.speaker, "");
    }

    #[test]
    fn ignored_and_unknown_keys() {
        let event = parse_one(
            "\
UID:x
STATUS:CONFIRMED
CLASS:PUBLIC
TZID:Europe-Brussels
METHOD:PUBLISH
X-CUSTOM:foo
 continuation of something

summary:lowercase",
        );
        assert_eq!(
            event,
            Event {
                uid: "x".to_string(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn one_event_per_block_in_order() {
        let src = "\
BEGIN:VEVENT
UID:1
END:VEVENT
BEGIN:VEVENT
END:VEVENT
BEGIN:VEVENT
UID:3
END:VEVENT
";
        let uids: Vec<_> = parse_str(src).into_iter().map(|a| a.uid).collect();
        assert_eq!(uids, vec!["1", "", "3"]);
    }

    #[test]
    fn unterminated_block_is_dropped() {
        let src = "BEGIN:VEVENT\nUID:1\nEND:VEVENT\nBEGIN:VEVENT\nUID:2\n";
        let events = parse_str(src);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].uid, "1");
    }

    #[test]
    fn calendar_wrapper_yields_only_events() {
        let src = "\
BEGIN:VCALENDAR
METHOD:PUBLISH
BEGIN:VEVENT
UID:1
END:VEVENT
END:VCALENDAR
";
        let events = parse_str(src);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].uid, "1");
    }

    #[test]
    fn fields_outside_block_are_ignored() {
        let src = "UID:outside\nEND:VEVENT\nBEGIN:VEVENT\nSUMMARY:inside\nEND:VEVENT\n";
        let events = parse_str(src);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].uid, "");
        assert_eq!(events[0].summary, "inside");
    }

    #[test]
    fn long_lines_are_read_whole() {
        let long = "x".repeat(200_000);
        let event = parse_one(&format!("SUMMARY:{long}"));
        assert_eq!(event.summary.len(), long.len());
    }

    #[test]
    fn last_line_without_newline() {
        let events = parse_str("BEGIN:VEVENT\nUID:1\nEND:VEVENT");
        assert_eq!(events.len(), 1);
    }

    struct FailingReader {
        remaining: &'static [u8],
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.remaining.is_empty() {
                return Err(io::Error::other("disk on fire"));
            }
            let n = buf.len().min(self.remaining.len());
            buf[..n].copy_from_slice(&self.remaining[..n]);
            self.remaining = &self.remaining[n..];
            Ok(n)
        }
    }

    #[test]
    fn read_error_is_yielded_once() {
        let reader = io::BufReader::new(FailingReader {
            remaining: b"BEGIN:VEVENT\nUID:1\nEND:VEVENT\nBEGIN:VEVENT\n",
        });
        let mut parser = parse_events(reader);
        assert_eq!(parser.next().unwrap().unwrap().uid, "1");
        assert!(matches!(parser.next(), Some(Err(Error::Read(_)))));
        assert!(parser.next().is_none());
    }
}
