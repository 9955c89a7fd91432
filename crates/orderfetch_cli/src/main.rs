//! CLI demo for the order fetch engine.
//!
//! Seeds an in-memory store with the demo orders, runs every fetch strategy
//! (or the one named in the first argument) and prints the round-trips each
//! one needed followed by the JSON projection. `--member`, `--status`,
//! `--offset` and `--limit` narrow the request; unpageable strategies are
//! skipped when a page is given.

use clap::builder::PossibleValuesParser;
use clap::{value_parser, Arg, ArgMatches, Command};
use orderfetch_core::db::open_db_in_memory;
use orderfetch_core::db::seed::seed_demo_orders;
use orderfetch_core::{
    core_version, default_log_level, init_logging, FetchStrategy, OrderFetchService, OrderFilter,
    OrderRepository, OrderStatus, Page, SqliteOrderRepository,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let matches = cli().get_matches();
    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("orderfetch: {err}");
            ExitCode::FAILURE
        }
    }
}

fn cli() -> Command {
    Command::new("orderfetch")
        .version(core_version())
        .about("Runs the order fetch strategies over the demo data set")
        .arg(
            Arg::new("strategy")
                .value_parser(PossibleValuesParser::new(
                    FetchStrategy::ALL.map(FetchStrategy::as_str),
                ))
                .help("Strategy to run (all strategies when omitted)"),
        )
        .arg(
            Arg::new("member")
                .long("member")
                .help("SQL LIKE pattern on the member name"),
        )
        .arg(
            Arg::new("status")
                .long("status")
                .value_parser(["ordered", "canceled"])
                .help("Only orders with this status"),
        )
        .arg(
            Arg::new("offset")
                .long("offset")
                .requires("limit")
                .value_parser(value_parser!(u32))
                .help("Roots to skip; needs --limit"),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .value_parser(value_parser!(u32))
                .help("Page size in orders"),
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .help("Absolute directory for rolling log files"),
        )
}

fn run(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = matches.get_one::<String>("log-dir") {
        init_logging(default_log_level(), log_dir)?;
    }

    let strategies = match matches.get_one::<String>("strategy") {
        Some(name) => {
            vec![FetchStrategy::parse(name).ok_or_else(|| format!("unknown strategy `{name}`"))?]
        }
        None => FetchStrategy::ALL.to_vec(),
    };
    let filter = filter_from(matches);
    let offset = matches.get_one::<u32>("offset").copied().unwrap_or(0);
    let page = matches
        .get_one::<u32>("limit")
        .map(|limit| Page::new(offset, *limit));

    let mut conn = open_db_in_memory()?;
    seed_demo_orders(&mut conn)?;
    println!("orderfetch_core version={}", core_version());

    for strategy in strategies {
        if page.is_some() && !strategy.supports_paging() {
            println!("strategy={strategy} skipped=not_pageable");
            continue;
        }
        let service = OrderFetchService::new(SqliteOrderRepository::new(&conn));
        let orders = service.fetch(strategy, &filter, page)?;
        println!(
            "strategy={strategy} orders={} round_trips={}",
            orders.len(),
            service.repo().round_trips()
        );
        println!("{}", serde_json::to_string_pretty(&orders)?);
    }
    Ok(())
}

fn filter_from(matches: &ArgMatches) -> OrderFilter {
    OrderFilter {
        member_name: matches.get_one::<String>("member").cloned(),
        status: matches
            .get_one::<String>("status")
            .map(|status| match status.as_str() {
                "canceled" => OrderStatus::Canceled,
                _ => OrderStatus::Ordered,
            }),
    }
}
