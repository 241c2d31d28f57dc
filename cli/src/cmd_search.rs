// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use calsearch_core::{Config, EventIndex, Field, Pager, Query, SearchRequest};
use clap::{ArgGroup, ArgMatches, Command, arg, value_parser};

use crate::arg::{CommonArgs, SearchArgs};
use crate::hit_formatter::HitFormatter;
use crate::util::OutputFormat;

#[derive(Debug, Clone)]
pub struct CmdSearch {
    pub query: Query,
    pub fields: Option<Vec<Field>>,
    pub limit: Option<i64>,
    pub from: i64,
    pub highlight: bool,
    pub score: bool,
    pub output_format: OutputFormat,
}

impl CmdSearch {
    pub const NAME: &str = "search";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("s")
            .about("Search the indexed events")
            .arg_required_else_help(true)
            .subcommand_required(true)
            .subcommand(
                with_search_args(Command::new("term"))
                    .about("Events containing a term")
                    .arg(arg!(term: <TERM> "The term to look for"))
                    .arg(SearchArgs::field()),
            )
            .subcommand(
                with_search_args(Command::new("phrase"))
                    .about("Events containing words next to each other, in order")
                    .arg(arg!(words: <WORD> "Words of the phrase").num_args(1..))
                    .arg(SearchArgs::field()),
            )
            .subcommand(
                with_search_args(Command::new("all"))
                    .about("Events containing every term")
                    .arg(arg!(terms: <TERM> "The terms to look for").num_args(1..)),
            )
            .subcommand(
                with_search_args(Command::new("duration"))
                    .about("Events lasting at least --min and less than --max minutes")
                    .arg(
                        arg!(--min <MINUTES> "Inclusive lower bound")
                            .value_parser(value_parser!(f64)),
                    )
                    .arg(
                        arg!(--max <MINUTES> "Exclusive upper bound")
                            .value_parser(value_parser!(f64)),
                    )
                    .group(bounds(["min", "max"])),
            )
            .subcommand(
                with_search_args(Command::new("start"))
                    .about("Events starting at or after --after and before --before")
                    .arg(SearchArgs::timestamp("after", "Inclusive lower bound, RFC 3339"))
                    .arg(SearchArgs::timestamp("before", "Exclusive upper bound, RFC 3339"))
                    .group(bounds(["after", "before"])),
            )
            .subcommand(
                with_search_args(Command::new("query"))
                    .about("Events matching an FTS5 query expression")
                    .long_about(
                        "\
Events matching an FTS5 query expression, such as
`description:text AND summary:\"text indexing\" NOT description:lucene`.
Words are joined with spaces.",
                    )
                    .arg(arg!(query: <QUERY> "The query expression").num_args(1..)),
            )
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        let (kind, matches) = matches.subcommand().ok_or("a search kind is required")?;

        let words = |id: &str| -> Vec<String> {
            matches
                .get_many::<String>(id)
                .map(|a| a.cloned().collect())
                .unwrap_or_default()
        };
        let in_field = |query: Query| match SearchArgs::get_field(matches) {
            Some(field) => query.in_field(field),
            None => query,
        };

        let (query, default_fields) = match kind {
            "term" => {
                let term = matches.get_one::<String>("term").cloned().unwrap_or_default();
                (in_field(Query::term(term)), None)
            }
            "phrase" => (in_field(Query::phrase(words("words"))), None),
            "all" => {
                let terms = words("terms").into_iter().map(Query::term).collect();
                (Query::Conjunction(terms), None)
            }
            "duration" => {
                let min = matches.get_one::<f64>("min").copied();
                let max = matches.get_one::<f64>("max").copied();
                let fields = vec![Field::Summary, Field::Speaker, Field::Duration];
                (Query::duration_range(min, max), Some(fields))
            }
            "start" => {
                let after = SearchArgs::get_timestamp(matches, "after");
                let before = SearchArgs::get_timestamp(matches, "before");
                let fields = vec![Field::Summary, Field::Speaker, Field::Start];
                (Query::start_range(after, before), Some(fields))
            }
            "query" => (Query::QueryString(words("query").join(" ")), None),
            _ => unreachable!(),
        };

        Ok(Self {
            query,
            fields: SearchArgs::get_fields(matches).or(default_fields),
            limit: SearchArgs::get_limit(matches),
            from: SearchArgs::get_from(matches),
            highlight: SearchArgs::get_highlight(matches),
            score: SearchArgs::get_score(matches),
            output_format: CommonArgs::get_output_format(matches),
        })
    }

    pub async fn run(self, config: &Config, index: &EventIndex) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "searching events...");
        let pager = Pager::from((self.limit.unwrap_or(config.default_limit), self.from));
        let mut request = SearchRequest::new(self.query)
            .with_pager(pager)
            .with_highlight(self.highlight);
        if let Some(fields) = self.fields {
            request = request.with_fields(fields);
        }

        let result = index.search(&request).await?;
        let formatter = HitFormatter::new(&result.fields)
            .with_score(self.score)
            .with_output_format(self.output_format);
        print!("{}", formatter.format(&result));
        Ok(())
    }
}

/// At least one of the two bounds of a range.
fn bounds(args: [&'static str; 2]) -> ArgGroup {
    ArgGroup::new("bounds")
        .args(args)
        .multiple(true)
        .required(true)
}

fn with_search_args(cmd: Command) -> Command {
    cmd.arg(SearchArgs::fields())
        .arg(SearchArgs::limit())
        .arg(SearchArgs::from())
        .arg(SearchArgs::highlight())
        .arg(SearchArgs::score())
        .arg(CommonArgs::output_format())
}
