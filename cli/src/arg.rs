// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use calsearch_core::Field;
use clap::{Arg, ArgAction, ArgMatches, arg, value_parser};
use clap_num::number_range;

use crate::util::{OutputFormat, parse_timestamp};

#[derive(Debug, Clone, Copy)]
pub struct CommonArgs;

impl CommonArgs {
    pub fn output_format() -> Arg {
        arg!(--"output-format" <FORMAT> "Output format")
            .value_parser(value_parser!(OutputFormat))
            .default_value("table")
    }

    pub fn get_output_format(matches: &ArgMatches) -> OutputFormat {
        matches
            .get_one("output-format")
            .copied()
            .unwrap_or(OutputFormat::Table)
    }
}

/// Arguments shared by every search command.
#[derive(Debug, Clone, Copy)]
pub struct SearchArgs;

impl SearchArgs {
    pub fn fields() -> Arg {
        arg!(--fields <FIELDS> "Fields to show for each match, comma separated")
            .value_parser(value_parser!(Field))
            .value_delimiter(',')
            .action(ArgAction::Append)
    }

    pub fn get_fields(matches: &ArgMatches) -> Option<Vec<Field>> {
        matches
            .get_many::<Field>("fields")
            .map(|a| a.copied().collect())
    }

    pub fn limit() -> Arg {
        fn positive(s: &str) -> Result<i64, String> {
            number_range(s, 1, i64::MAX)
        }

        arg!(-n --limit <N> "Maximum number of matches to show").value_parser(positive)
    }

    pub fn get_limit(matches: &ArgMatches) -> Option<i64> {
        matches.get_one("limit").copied()
    }

    pub fn from() -> Arg {
        fn non_negative(s: &str) -> Result<i64, String> {
            number_range(s, 0, i64::MAX)
        }

        arg!(--from <N> "Number of matches to skip")
            .value_parser(non_negative)
            .default_value("0")
    }

    pub fn get_from(matches: &ArgMatches) -> i64 {
        matches.get_one("from").copied().unwrap_or(0)
    }

    pub fn highlight() -> Arg {
        arg!(--highlight "Mark matched terms in summary and description")
    }

    pub fn get_highlight(matches: &ArgMatches) -> bool {
        matches.get_flag("highlight")
    }

    pub fn score() -> Arg {
        arg!(--score "Show the relevance score of full-text matches")
    }

    pub fn get_score(matches: &ArgMatches) -> bool {
        matches.get_flag("score")
    }

    pub fn field() -> Arg {
        arg!(-f --field <FIELD> "Restrict the match to one field").value_parser(value_parser!(Field))
    }

    pub fn get_field(matches: &ArgMatches) -> Option<Field> {
        matches.get_one("field").copied()
    }

    pub fn timestamp(name: &'static str, help: &'static str) -> Arg {
        Arg::new(name)
            .long(name)
            .value_name("TIMESTAMP")
            .help(help)
            .value_parser(parse_timestamp)
    }

    pub fn get_timestamp(matches: &ArgMatches, name: &str) -> Option<jiff::Timestamp> {
        matches.get_one(name).copied()
    }
}
