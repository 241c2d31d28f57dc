// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use crate::{Error, EventIndex, EventStream};

/// Drains `stream` into `index`, writing `batch_size` events per transaction.
///
/// Returns the number of events written. A parse error stops the load; batches written
/// before it stay in the index.
pub async fn load_events(
    index: &EventIndex,
    stream: &mut EventStream,
    batch_size: usize,
) -> Result<u64, Error> {
    let batch_size = batch_size.max(1);
    let mut batch = Vec::with_capacity(batch_size);
    let mut count = 0;

    while let Some(event) = stream.next().await {
        batch.push(event?);
        if batch.len() >= batch_size {
            count += index.add_batch(&batch).await?;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        count += index.add_batch(&batch).await?;
    }

    tracing::info!(count, "finished loading events");
    Ok(count)
}
