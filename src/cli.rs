// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn month_arg(required: bool) -> Arg {
    Arg::new("month")
        .long("month")
        .required(required)
        .help("Month key, YYYY-MM")
}

fn propagate_arg() -> Arg {
    Arg::new("propagate")
        .long("propagate")
        .action(ArgAction::SetTrue)
        .help("Also apply to every later item of the same recurring family")
}

pub fn build_cli() -> Command {
    Command::new("monthbook")
        .version(crate_version!())
        .about("Month-by-month income and spending ledger with recurring items")
        .subcommand(Command::new("init").about("Create the data store"))
        .subcommand(
            Command::new("item")
                .about("Record, edit and remove items")
                .subcommand(json_flags(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .default_value("spending")
                                .help("income|spending"),
                        )
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .help("Defaults to Income for income items"),
                        )
                        .arg(Arg::new("detail").long("detail"))
                        .arg(
                            Arg::new("every")
                                .long("every")
                                .value_parser(value_parser!(i64))
                                .requires("until")
                                .help("Repeat every N units"),
                        )
                        .arg(
                            Arg::new("unit")
                                .long("unit")
                                .default_value("month")
                                .help("day|week|month"),
                        )
                        .arg(
                            Arg::new("until")
                                .long("until")
                                .requires("every")
                                .help("Stop before this date, YYYY-MM-DD"),
                        )
                        .arg(
                            Arg::new("remind")
                                .long("remind")
                                .value_parser(value_parser!(i64))
                                .help("Reminder offset in minutes before the item's date"),
                        ),
                ))
                .subcommand(json_flags(
                    Command::new("edit")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("amount").long("amount"))
                        .arg(Arg::new("detail").long("detail"))
                        .arg(Arg::new("date").long("date"))
                        .arg(propagate_arg()),
                ))
                .subcommand(json_flags(
                    Command::new("rm")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(propagate_arg()),
                ))
                .subcommand(json_flags(Command::new("list").arg(month_arg(true)))),
        )
        .subcommand(
            Command::new("category")
                .about("Manage per-month categories")
                .subcommand(
                    Command::new("add")
                        .arg(month_arg(true))
                        .arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(Command::new("list").arg(month_arg(true)))
                .subcommand(json_flags(
                    Command::new("rm")
                        .arg(month_arg(true))
                        .arg(Arg::new("name").long("name").required(true)),
                )),
        )
        .subcommand(
            Command::new("report")
                .about("Monthly and yearly totals")
                .subcommand(json_flags(Command::new("month").arg(month_arg(true))))
                .subcommand(json_flags(
                    Command::new("year").arg(
                        Arg::new("year")
                            .long("year")
                            .required(true)
                            .value_parser(value_parser!(i32)),
                    ),
                ))
                .subcommand(json_flags(Command::new("categories").arg(month_arg(true)))),
        )
        .subcommand(
            Command::new("reminders")
                .about("Reminder schedule intents")
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("sync").arg(
                        Arg::new("pending")
                            .long("pending")
                            .help("JSON file listing reminders already scheduled"),
                    ),
                ),
        )
        .subcommand(
            Command::new("widget")
                .about("Home-screen widget summary")
                .subcommand(Command::new("show"))
                .subcommand(Command::new("refresh").arg(month_arg(false))),
        )
        .subcommand(
            Command::new("export").subcommand(
                Command::new("items")
                    .arg(Arg::new("format").long("format").required(true))
                    .arg(Arg::new("out").long("out").required(true))
                    .arg(month_arg(false)),
            ),
        )
        .subcommand(
            Command::new("config")
                .about("Settings")
                .subcommand(Command::new("show"))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("currency").long("currency"))
                        .arg(
                            Arg::new("reminder_time")
                                .long("reminder-time")
                                .help("Time of day reminders are anchored to, HH:MM"),
                        ),
                ),
        )
        .subcommand(Command::new("doctor").about("Check store consistency"))
}
