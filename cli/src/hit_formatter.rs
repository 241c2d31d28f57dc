// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{borrow::Cow, fmt};

use calsearch_core::{Field, SearchHit, SearchResult};
use colored::Colorize;

use crate::table::{PaddingDirection, Table, TableColumn, TableStyleBasic, TableStyleJson};
use crate::util::OutputFormat;

const MARK_OPEN: &str = "<mark>";
const MARK_CLOSE: &str = "</mark>";

#[derive(Debug)]
pub struct HitFormatter {
    columns: Vec<HitColumn>,
    format: OutputFormat,
}

impl HitFormatter {
    pub fn new(fields: &[Field]) -> Self {
        let mut columns = vec![HitColumn::Uid];
        columns.extend(
            fields
                .iter()
                .filter(|a| **a != Field::Uid)
                .map(|a| HitColumn::Field(*a, true)),
        );
        Self {
            columns,
            format: OutputFormat::Table,
        }
    }

    pub fn with_score(mut self, score: bool) -> Self {
        if score {
            self.columns.push(HitColumn::Score);
        }
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        let marks = format == OutputFormat::Table;
        for col in &mut self.columns {
            if let HitColumn::Field(_, a) = col {
                *a = marks;
            }
        }
        self
    }

    pub fn format<'a>(&'a self, result: &'a SearchResult) -> Display<'a> {
        Display {
            result,
            formatter: self,
        }
    }
}

#[derive(Debug)]
pub struct Display<'a> {
    result: &'a SearchResult,
    formatter: &'a HitFormatter,
}

impl fmt::Display for Display<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = &self.formatter.columns;
        let hits = &self.result.hits;
        match self.formatter.format {
            OutputFormat::Json => write!(f, "{}", Table::new(TableStyleJson::new(), columns, hits)),
            OutputFormat::Table => {
                writeln!(f, "{}", summary_line(self.result))?;
                if !hits.is_empty() {
                    write!(f, "{}", Table::new(TableStyleBasic::new(), columns, hits))?;
                }
                Ok(())
            }
        }
    }
}

/// `N matches, showing X through Y`, with one-based positions.
fn summary_line(result: &SearchResult) -> String {
    let noun = if result.total == 1 { "match" } else { "matches" };
    if result.hits.is_empty() {
        if result.total == 0 {
            return "No matches".to_string();
        }
        return format!("{} {noun}, none on this page", result.total);
    }

    let first = result.pager.offset + 1;
    let last = result.pager.offset + result.hits.len() as i64;
    format!("{} {noun}, showing {first} through {last}", result.total)
}

#[derive(Debug, Clone, Copy)]
pub enum HitColumn {
    Uid,
    /// A stored field, with highlight marks rendered as colors when set.
    Field(Field, bool),
    Score,
}

impl TableColumn<SearchHit> for HitColumn {
    fn name(&self) -> Cow<'_, str> {
        match self {
            HitColumn::Uid => "UID".into(),
            HitColumn::Field(field, _) => capitalize(field.as_str()).into(),
            HitColumn::Score => "Score".into(),
        }
    }

    fn key(&self) -> Cow<'_, str> {
        match self {
            HitColumn::Uid => Field::Uid.as_str().into(),
            HitColumn::Field(field, _) => field.as_str().into(),
            HitColumn::Score => "score".into(),
        }
    }

    fn format<'a>(&self, hit: &'a SearchHit) -> Cow<'a, str> {
        match self {
            HitColumn::Uid => hit.event.uid.as_str().into(),
            HitColumn::Field(field, true) => strip_marks(hit.field(*field)),
            HitColumn::Field(field, false) => hit.field(*field),
            HitColumn::Score => hit
                .score
                .map(|a| format!("{a:.3}"))
                .unwrap_or_default()
                .into(),
        }
    }

    fn padding_direction(&self) -> PaddingDirection {
        match self {
            HitColumn::Score | HitColumn::Field(Field::Duration, _) => PaddingDirection::Right,
            _ => PaddingDirection::Left,
        }
    }

    fn paint<'a>(&self, hit: &'a SearchHit, text: Cow<'a, str>) -> Cow<'a, str> {
        match self {
            HitColumn::Field(field, true) => render_marks(hit.field(*field)),
            _ => text,
        }
    }

    fn json(&self, hit: &SearchHit) -> serde_json::Value {
        use serde_json::Value;

        match self {
            HitColumn::Field(Field::Duration, _) => Value::from(hit.event.duration),
            HitColumn::Field(Field::Start, _) if hit.event.start.is_none() => Value::Null,
            HitColumn::Score => hit.score.map_or(Value::Null, Value::from),
            _ => Value::String(self.format(hit).into_owned()),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Replaces `<mark>` pairs with colored text.
fn render_marks(s: Cow<'_, str>) -> Cow<'_, str> {
    map_marks(s, |a| a.yellow().bold().to_string())
}

/// Removes `<mark>` pairs, keeping the marked text.
fn strip_marks(s: Cow<'_, str>) -> Cow<'_, str> {
    map_marks(s, str::to_string)
}

fn map_marks(s: Cow<'_, str>, mark: impl Fn(&str) -> String) -> Cow<'_, str> {
    if !s.contains(MARK_OPEN) {
        return s;
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s.as_ref();
    while let Some(start) = rest.find(MARK_OPEN) {
        out.push_str(&rest[..start]);
        rest = &rest[start + MARK_OPEN.len()..];
        let end = rest.find(MARK_CLOSE).unwrap_or(rest.len());
        out.push_str(&mark(&rest[..end]));
        rest = rest.get(end + MARK_CLOSE.len()..).unwrap_or_default();
    }
    out.push_str(rest);
    out.into()
}
