// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Test data factories for integration tests.

use std::path::PathBuf;

use calsearch_core::{EventIndex, SearchResult, load_events, stream_events};

/// Path of the sample export shipped with the tests.
#[must_use]
pub fn fosdem_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/fosdem.ics")
}

/// An in-memory index holding every event of the sample export.
pub async fn loaded_index() -> EventIndex {
    let index = EventIndex::open_or_create(None)
        .await
        .expect("failed to open in-memory index");
    let mut stream = stream_events(&fosdem_path(), 8)
        .await
        .expect("failed to open sample export");
    load_events(&index, &mut stream, 2)
        .await
        .expect("failed to load sample export");
    index
}

/// The UIDs of the hits, in result order.
#[must_use]
pub fn uids(result: &SearchResult) -> Vec<&str> {
    result.hits.iter().map(|a| a.event.uid.as_str()).collect()
}
