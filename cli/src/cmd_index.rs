// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, path::PathBuf};

use calsearch_core::{Config, EventIndex, load_events, stream_events};
use clap::{ArgMatches, Command, ValueHint, arg, value_parser};
use clap_num::number_range;

#[derive(Debug, Clone)]
pub struct CmdIndex {
    pub file: PathBuf,
    pub batch_size: Option<usize>,
    pub fresh: bool,
}

impl CmdIndex {
    pub const NAME: &str = "index";

    pub fn command() -> Command {
        fn positive(s: &str) -> Result<usize, String> {
            number_range(s, 1, usize::MAX)
        }

        Command::new(Self::NAME)
            .about("Parse a calendar export and add its events to the index")
            .arg(
                arg!(file: <FILE> "The calendar export to read")
                    .value_parser(value_parser!(PathBuf))
                    .value_hint(ValueHint::FilePath),
            )
            .arg(
                arg!(--"batch-size" <N> "Number of events written per transaction")
                    .value_parser(positive),
            )
            .arg(arg!(--fresh "Remove every indexed event before indexing"))
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            file: matches
                .get_one::<PathBuf>("file")
                .cloned()
                .unwrap_or_default(),
            batch_size: matches.get_one("batch-size").copied(),
            fresh: matches.get_flag("fresh"),
        }
    }

    pub async fn run(self, config: &Config, index: &EventIndex) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "indexing events...");
        // an unreadable source must leave the index untouched
        let mut stream = stream_events(&self.file, config.channel_capacity).await?;
        if self.fresh {
            tracing::info!("clearing the index");
            index.clear().await?;
        }

        let batch_size = self.batch_size.unwrap_or(config.batch_size);
        let count = load_events(index, &mut stream, batch_size).await?;
        println!("Indexed {count} events");
        Ok(())
    }
}
