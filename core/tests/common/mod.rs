// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Common test utilities for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - The path of the sample FOSDEM export
//! - An index preloaded with the sample events

mod fixtures;

#[allow(unused_imports)]
pub use fixtures::{fosdem_path, loaded_index, uids};
