// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{borrow::Cow, fmt};

use colored::Colorize;
use unicode_width::UnicodeWidthStr;

use crate::util::{pad_left, pad_right};

pub struct Table<'a, S, T, C> {
    style: S,
    columns: &'a [C],
    data: &'a [T],
}

impl<'a, S, T, C> Table<'a, S, T, C>
where
    S: TableStyle,
    C: TableColumn<T>,
{
    pub fn new(style: S, columns: &'a [C], data: &'a [T]) -> Self {
        Self {
            style,
            columns,
            data,
        }
    }
}

impl<S, T, C> fmt::Display for Table<'_, S, T, C>
where
    S: TableStyle,
    C: TableColumn<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.style.fmt_table(f, self.columns, self.data)
    }
}

pub trait TableColumn<T> {
    /// Header shown above the column.
    fn name(&self) -> Cow<'_, str>;

    /// Key of the column in JSON output.
    fn key(&self) -> Cow<'_, str>;

    fn format<'a>(&self, data: &'a T) -> Cow<'a, str>;

    fn padding_direction(&self) -> PaddingDirection {
        PaddingDirection::Left
    }

    /// Decorates the text of a cell. Widths are measured on the undecorated text.
    fn paint<'a>(&self, _data: &'a T, text: Cow<'a, str>) -> Cow<'a, str> {
        text
    }

    /// The cell in JSON output, a string unless overridden.
    fn json(&self, data: &T) -> serde_json::Value {
        serde_json::Value::String(self.format(data).into_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingDirection {
    Left,
    Right,
}

pub trait TableStyle {
    fn fmt_table<T, C: TableColumn<T>>(
        &self,
        f: &mut fmt::Formatter<'_>,
        columns: &[C],
        data: &[T],
    ) -> fmt::Result;
}

/// Aligned columns with a bold header.
#[derive(Debug, Clone)]
pub struct TableStyleBasic {
    separator: &'static str,
}

impl TableStyleBasic {
    pub fn new() -> Self {
        Self { separator: "  " }
    }
}

impl TableStyle for TableStyleBasic {
    fn fmt_table<T, C: TableColumn<T>>(
        &self,
        f: &mut fmt::Formatter<'_>,
        columns: &[C],
        data: &[T],
    ) -> fmt::Result {
        if columns.is_empty() {
            return Ok(());
        }

        let header: Vec<Cow<'_, str>> = columns.iter().map(|a| a.name()).collect();
        let rows: Vec<Vec<Cow<'_, str>>> = data
            .iter()
            .map(|row| columns.iter().map(|col| col.format(row)).collect())
            .collect();

        let mut widths: Vec<usize> = vec![0; columns.len()];
        for row in std::iter::once(&header).chain(rows.iter()) {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.width());
            }
        }

        let last = columns.len() - 1;
        let pad = |i: usize, col: &C, cell: &str| match col.padding_direction() {
            // the last left-aligned column needs no trailing spaces
            PaddingDirection::Left if i == last => cell.to_string(),
            PaddingDirection::Left => pad_right(cell, widths[i]),
            PaddingDirection::Right => pad_left(cell, widths[i]),
        };

        for (i, (col, cell)) in columns.iter().zip(&header).enumerate() {
            let cell = pad(i, col, cell);
            write!(f, "{}", cell.bold())?;
            f.write_str(if i < last { self.separator } else { "\n" })?;
        }

        for (row, cells) in data.iter().zip(&rows) {
            for (i, (col, cell)) in columns.iter().zip(cells).enumerate() {
                let fill = " ".repeat(widths[i].saturating_sub(cell.width()));
                let text = col.paint(row, cell.clone());
                match col.padding_direction() {
                    PaddingDirection::Left if i == last => write!(f, "{text}")?,
                    PaddingDirection::Left => write!(f, "{text}{fill}")?,
                    PaddingDirection::Right => write!(f, "{fill}{text}")?,
                }
                f.write_str(if i < last { self.separator } else { "\n" })?;
            }
        }
        Ok(())
    }
}

/// A pretty-printed JSON array with one object per row.
#[derive(Debug, Clone)]
pub struct TableStyleJson;

impl TableStyleJson {
    pub fn new() -> Self {
        Self
    }
}

impl TableStyle for TableStyleJson {
    fn fmt_table<T, C: TableColumn<T>>(
        &self,
        f: &mut fmt::Formatter<'_>,
        columns: &[C],
        data: &[T],
    ) -> fmt::Result {
        let rows: Vec<serde_json::Value> = data
            .iter()
            .map(|row| {
                let object = columns
                    .iter()
                    .map(|col| (col.key().into_owned(), col.json(row)))
                    .collect();
                serde_json::Value::Object(object)
            })
            .collect();

        let json = serde_json::to_string_pretty(&rows).map_err(|_| fmt::Error)?;
        writeln!(f, "{json}")
    }
}
