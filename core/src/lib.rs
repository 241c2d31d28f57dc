// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Parse calendar exports into events and search them with full-text queries.
//!
//! Events are read from an iCalendar-like export by [`parse_events`] (or [`stream_events`] on
//! a background task), bulk-loaded into an [`EventIndex`] by [`load_events`], and found
//! again with [`EventIndex::search`].

mod config;
mod datetime;
mod error;
mod event;
mod index;
mod loader;
mod parser;
mod query;
mod stream;

pub use crate::config::{APP_NAME, Config};
pub use crate::datetime::parse_compact;
pub use crate::error::Error;
pub use crate::event::{Event, Field};
pub use crate::index::{EventIndex, SearchHit, SearchResult};
pub use crate::loader::load_events;
pub use crate::parser::{EventParser, parse_events, parse_str};
pub use crate::query::{Pager, Query, SearchRequest};
pub use crate::stream::{EventStream, stream_events};
