// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Command-line interface of calsearch.

mod arg;
mod cli;
mod cmd_generate_completion;
mod cmd_index;
mod cmd_search;
mod config;
mod hit_formatter;
mod table;
mod util;

pub use crate::cli::{Cli, Commands, run};
