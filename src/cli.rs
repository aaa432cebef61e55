// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version, value_parser};

fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .action(ArgAction::SetTrue)
        .help(help)
}

fn output_args() -> [Arg; 2] {
    [
        flag("json", "Print JSON"),
        flag("jsonl", "Print one JSON object per line"),
    ]
}

fn visibility_args() -> [Arg; 2] {
    [
        flag("past", "Include accounting months before the current one"),
        flag("future", "Include accounting months after the current one"),
    ]
}

fn filter_args() -> Vec<Arg> {
    vec![
        Arg::new("from")
            .long("from")
            .value_name("YYYY-MM-DD")
            .help("Earliest date (inclusive); defaults to the oldest visible transaction"),
        Arg::new("to")
            .long("to")
            .value_name("YYYY-MM-DD")
            .help("Latest date (inclusive); defaults to the newest visible transaction"),
        Arg::new("type")
            .long("type")
            .value_name("all|income|expense")
            .default_value("all"),
        Arg::new("min")
            .long("min")
            .value_name("AMOUNT")
            .help("Minimum amount; expenses compare by magnitude"),
        Arg::new("max")
            .long("max")
            .value_name("AMOUNT")
            .help("Maximum amount; expenses compare by magnitude"),
        Arg::new("search")
            .long("search")
            .value_name("TEXT")
            .help("Case-insensitive description search"),
    ]
}

fn entry_args() -> Vec<Arg> {
    vec![
        Arg::new("amount").long("amount").value_name("AMOUNT"),
        Arg::new("type")
            .long("type")
            .value_name("income|expense"),
        Arg::new("date").long("date").value_name("YYYY-MM-DD"),
        Arg::new("description")
            .long("desc")
            .value_name("TEXT"),
    ]
}

pub fn build_cli() -> Command {
    Command::new("cashmonth")
        .about("Track income and expenses by accounting month")
        .version(crate_version!())
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .value_name("ID")
                .help("Act as this user instead of the logged-in one"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("login")
                .about("Remember a user for later commands")
                .arg(Arg::new("id").required(true).value_name("ID")),
        )
        .subcommand(Command::new("logout").about("Forget the remembered user"))
        .subcommand(Command::new("whoami").about("Show the active user"))
        .subcommand(
            Command::new("config").subcommand(
                Command::new("cutoff-day")
                    .about("Show or set the day on which the accounting month changes")
                    .arg(
                        Arg::new("day")
                            .value_name("DAY")
                            .value_parser(value_parser!(u32)),
                    ),
            ),
        )
        .subcommand(
            Command::new("tx")
                .about("Manage transactions")
                .subcommand(
                    Command::new("add")
                        .args(entry_args())
                        .arg(flag("recurring", "Repeat the transaction"))
                        .arg(
                            Arg::new("interval")
                                .long("interval")
                                .value_name("day|week|month|year")
                                .default_value("month"),
                        )
                        .arg(
                            Arg::new("every")
                                .long("every")
                                .value_name("N")
                                .value_parser(value_parser!(u32))
                                .default_value("1"),
                        )
                        .arg(
                            Arg::new("until")
                                .long("until")
                                .value_name("YYYY-MM-DD")
                                .help("Last possible occurrence; defaults to one year after --date"),
                        )
                        .arg(flag(
                            "last-day",
                            "Keep month-end anchors (day 30 or last day) on the last day of each month",
                        )),
                )
                .subcommand(
                    Command::new("edit")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .args(entry_args()),
                )
                .subcommand(
                    Command::new("rm").arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                )
                .subcommand(
                    Command::new("clear")
                        .about("Delete every transaction")
                        .arg(flag("yes", "Confirm")),
                )
                .subcommand(
                    Command::new("rm-filtered")
                        .about("Delete the transactions the same filters would list")
                        .args(filter_args())
                        .args(visibility_args())
                        .arg(flag("yes", "Confirm")),
                )
                .subcommand(
                    Command::new("list")
                        .args(filter_args())
                        .args(visibility_args())
                        .args(output_args()),
                ),
        )
        .subcommand(
            Command::new("summary")
                .about("Balances and accounting-month totals")
                .args(visibility_args())
                .args(output_args()),
        )
        .subcommand(
            Command::new("watch")
                .about("Print the summary again after every change")
                .args(visibility_args()),
        )
}
