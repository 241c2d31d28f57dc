// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::io::{BufRead, BufReader};
use std::path::Path;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::parser::parse_events;
use crate::{Error, Event};

/// Opens the calendar export at `path` and parses it on a blocking task.
///
/// Failing to open the file is reported here, before any event is produced.
#[tracing::instrument]
pub async fn stream_events(path: &Path, capacity: usize) -> Result<EventStream, Error> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|source| Error::Open {
            path: path.to_owned(),
            source,
        })?;

    tracing::debug!("parsing events");
    let file = file.into_std().await;
    Ok(EventStream::spawn(BufReader::new(file), capacity))
}

/// Events handed over from a parser task through a bounded channel.
///
/// Dropping the stream stops the parser at its next hand-off.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::Receiver<Result<Event, Error>>,
    producer: Option<JoinHandle<()>>,
}

impl EventStream {
    /// Parses `reader` on the blocking thread pool, buffering at most `capacity` events.
    pub fn spawn<R>(reader: R, capacity: usize) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let producer = tokio::task::spawn_blocking(move || {
            for item in parse_events(reader) {
                if tx.blocking_send(item).is_err() {
                    tracing::debug!("event stream dropped, stopping parser");
                    return;
                }
            }
        });

        Self {
            rx,
            producer: Some(producer),
        }
    }

    /// The next event, or `None` once the source is exhausted.
    pub async fn next(&mut self) -> Option<Result<Event, Error>> {
        if let Some(item) = self.rx.recv().await {
            return Some(item);
        }

        // surface a panicking parser instead of ending quietly
        match self.producer.take()?.await {
            Ok(()) => None,
            Err(e) => Some(Err(Error::Producer(e.to_string()))),
        }
    }

    /// Drains the remaining events, stopping at the first error.
    pub async fn collect(mut self) -> Result<Vec<Event>, Error> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            events.push(event?);
        }
        Ok(events)
    }
}
