// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use jiff::Timestamp;

use crate::{Error, Field};

/// A query against the event index.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// A single term, in one field or in every full-text field.
    ///
    /// Keyword fields (`uid`, `category`, `url`) must equal the term exactly.
    Term {
        /// The term to look for.
        term: String,
        /// Restricts the match to one field.
        field: Option<Field>,
    },

    /// Terms appearing next to each other, in order.
    Phrase {
        /// The words of the phrase.
        terms: Vec<String>,
        /// Restricts the match to one full-text field.
        field: Option<Field>,
    },

    /// Every sub-query must match.
    Conjunction(Vec<Query>),

    /// A numeric field within `[min, max)`.
    NumericRange {
        /// The numeric field, only `duration` for now.
        field: Field,
        /// Inclusive lower bound.
        min: Option<f64>,
        /// Exclusive upper bound.
        max: Option<f64>,
    },

    /// A date field within `[start, end)`.
    DateRange {
        /// The date field, only `start` for now.
        field: Field,
        /// Inclusive lower bound.
        start: Option<Timestamp>,
        /// Exclusive upper bound.
        end: Option<Timestamp>,
    },

    /// A raw FTS5 query expression, passed to the index as is.
    QueryString(String),
}

impl Query {
    /// A term query over all full-text fields.
    pub fn term(term: impl Into<String>) -> Self {
        Query::Term {
            term: term.into(),
            field: None,
        }
    }

    /// A phrase query over all full-text fields.
    pub fn phrase<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Query::Phrase {
            terms: terms.into_iter().map(Into::into).collect(),
            field: None,
        }
    }

    /// Restricts a term or phrase query to one field, other queries are returned unchanged.
    #[must_use]
    pub fn in_field(self, field: Field) -> Self {
        match self {
            Query::Term { term, .. } => Query::Term {
                term,
                field: Some(field),
            },
            Query::Phrase { terms, .. } => Query::Phrase {
                terms,
                field: Some(field),
            },
            other => other,
        }
    }

    /// Events lasting at least `min` minutes and less than `max` minutes.
    pub fn duration_range(min: Option<f64>, max: Option<f64>) -> Self {
        Query::NumericRange {
            field: Field::Duration,
            min,
            max,
        }
    }

    /// Events starting at or after `start` and before `end`.
    pub fn start_range(start: Option<Timestamp>, end: Option<Timestamp>) -> Self {
        Query::DateRange {
            field: Field::Start,
            start,
            end,
        }
    }

    pub(crate) fn compile(&self) -> Result<CompiledQuery, Error> {
        let mut compiled = CompiledQuery::default();
        compile_into(self, &mut compiled)?;
        Ok(compiled)
    }
}

/// Pagination with a limit and an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    /// The maximum number of items to return.
    pub limit: i64,

    /// The number of items to skip before starting to collect the result set.
    pub offset: i64,
}

impl Default for Pager {
    fn default() -> Self {
        Pager {
            limit: 10,
            offset: 0,
        }
    }
}

impl From<(i64, i64)> for Pager {
    fn from((limit, offset): (i64, i64)) -> Self {
        Pager { limit, offset }
    }
}

/// A query together with what to return.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// The query to run.
    pub query: Query,

    /// Fields shown for every hit.
    pub fields: Vec<Field>,

    /// The page of hits to return.
    pub pager: Pager,

    /// Whether to mark matched terms in `summary` and `description`.
    pub highlight: bool,
}

impl SearchRequest {
    /// A request for the first page, returning summary and speaker.
    pub fn new(query: Query) -> Self {
        Self {
            query,
            fields: vec![Field::Summary, Field::Speaker],
            pager: Pager::default(),
            highlight: false,
        }
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub fn with_pager(mut self, pager: Pager) -> Self {
        self.pager = pager;
        self
    }

    #[must_use]
    pub fn with_highlight(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }
}

/// A value bound to a placeholder of a compiled filter.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Bind {
    Text(String),
    Real(f64),
    Integer(i64),
}

/// The SQL form of a query: an optional FTS5 expression and column filters.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct CompiledQuery {
    /// Expressions for `events_fts MATCH ?`, all of which must match.
    pub matches: Vec<String>,

    /// `WHERE` conditions with one `?` each, all of which must hold.
    pub filters: Vec<(&'static str, Bind)>,
}

impl CompiledQuery {
    /// The combined FTS5 expression, if any part of the query is full-text.
    pub fn match_expr(&self) -> Option<String> {
        match self.matches.as_slice() {
            [] => None,
            [single] => Some(single.clone()),
            many => Some(
                many.iter()
                    .map(|a| format!("({a})"))
                    .collect::<Vec<_>>()
                    .join(" AND "),
            ),
        }
    }
}

fn compile_into(query: &Query, out: &mut CompiledQuery) -> Result<(), Error> {
    match query {
        Query::Term { term, field } => {
            let term = term.trim();
            if term.is_empty() {
                return Err(invalid("empty term"));
            }

            match field {
                Some(field) if field.is_keyword() => {
                    out.filters
                        .push((keyword_filter(*field)?, Bind::Text(term.to_string())));
                }
                Some(field) => out.matches.push(column_match(*field, &quote(term))?),
                None => out.matches.push(quote(term)),
            }
        }

        Query::Phrase { terms, field } => {
            let terms: Vec<_> = terms
                .iter()
                .map(|a| a.trim())
                .filter(|a| !a.is_empty())
                .collect();
            if terms.is_empty() {
                return Err(invalid("empty phrase"));
            }

            let phrase = quote(&terms.join(" "));
            match field {
                Some(field) => out.matches.push(column_match(*field, &phrase)?),
                None => out.matches.push(phrase),
            }
        }

        Query::Conjunction(queries) => {
            if queries.is_empty() {
                return Err(invalid("empty conjunction"));
            }
            for query in queries {
                compile_into(query, out)?;
            }
        }

        Query::NumericRange { field, min, max } => {
            if *field != Field::Duration {
                return Err(invalid(format!("{field} is not a numeric field")));
            }
            if min.is_none() && max.is_none() {
                return Err(invalid("numeric range without bounds"));
            }
            if let Some(min) = min {
                out.filters.push(("events.duration >= ?", Bind::Real(*min)));
            }
            if let Some(max) = max {
                out.filters.push(("events.duration < ?", Bind::Real(*max)));
            }
        }

        Query::DateRange { field, start, end } => {
            if *field != Field::Start {
                return Err(invalid(format!("{field} is not a date field")));
            }
            if start.is_none() && end.is_none() {
                return Err(invalid("date range without bounds"));
            }
            // starts are stored in whole seconds, so sub-second bounds round up
            if let Some(start) = start {
                out.filters
                    .push(("events.start >= ?", Bind::Integer(ceil_second(start))));
            }
            if let Some(end) = end {
                out.filters
                    .push(("events.start < ?", Bind::Integer(ceil_second(end))));
            }
        }

        Query::QueryString(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Err(invalid("empty query string"));
            }
            out.matches.push(s.to_string());
        }
    }

    Ok(())
}

fn ceil_second(ts: &Timestamp) -> i64 {
    ts.as_second() + i64::from(ts.subsec_nanosecond() > 0)
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidQuery(msg.into())
}

/// Quotes a string as an FTS5 string literal.
fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn column_match(field: Field, expr: &str) -> Result<String, Error> {
    if field.is_full_text() {
        Ok(format!("{} : {expr}", field.as_str()))
    } else {
        Err(invalid(format!("{field} is not a full-text field")))
    }
}

fn keyword_filter(field: Field) -> Result<&'static str, Error> {
    match field {
        Field::Uid => Ok("events.uid = ?"),
        Field::Category => Ok("events.category = ?"),
        Field::Url => Ok("events.url = ?"),
        _ => Err(invalid(format!("{field} is not a keyword field"))),
    }
}
