use super::{validator_key_value, ARG_FILTER, ARG_ID};
use clap::{Arg, ArgAction, Command};

pub const ARG_LIMIT: &str = "limit";
pub const ARG_MONTH: &str = "month";
pub const ARG_YEAR: &str = "year";
pub const ARG_TITLE: &str = "title";
pub const ARG_DESCRIPTION: &str = "description";
pub const ARG_DATE: &str = "date";
pub const ARG_TIME: &str = "time";
pub const ARG_TYPE: &str = "type";
pub const ARG_LOCATION: &str = "location";
pub const ARG_CREATOR: &str = "creator";
pub const ARG_STATUS: &str = "status";

const DEFAULT_LIMIT: &str = "5";

fn with_event_fields(command: Command, required: bool) -> Command {
    command
        .arg(
            Arg::new(ARG_TITLE)
                .long("title")
                .help("Event title")
                .required(required),
        )
        .arg(
            Arg::new(ARG_DATE)
                .long("date")
                .help("Event date, YYYY-MM-DD")
                .required(required),
        )
        .arg(Arg::new(ARG_TIME).long("time").help("Event time, HH:MM"))
        .arg(Arg::new(ARG_DESCRIPTION).long("description").help("Event description"))
        .arg(Arg::new(ARG_TYPE).long("type").help("Event type"))
        .arg(Arg::new(ARG_LOCATION).long("location").help("Event location"))
}

#[must_use]
pub fn command() -> Command {
    Command::new("events")
        .about("Family events, RSVPs and the calendar")
        .subcommand_required(true)
        .subcommand(
            Command::new("list").about("List events").arg(
                Arg::new(ARG_FILTER)
                    .short('f')
                    .long("filter")
                    .help("Extra query filter as key=value; repeatable")
                    .action(ArgAction::Append)
                    .value_parser(validator_key_value()),
            ),
        )
        .subcommand(
            Command::new("get")
                .about("Show one event")
                .arg(Arg::new(ARG_ID).help("Event id").required(true)),
        )
        .subcommand(
            Command::new("upcoming").about("List upcoming events").arg(
                Arg::new(ARG_LIMIT)
                    .short('l')
                    .long("limit")
                    .help("Maximum number of events")
                    .default_value(DEFAULT_LIMIT)
                    .value_parser(clap::value_parser!(usize)),
            ),
        )
        .subcommand(
            Command::new("calendar")
                .about("List events of one month")
                .arg(
                    Arg::new(ARG_MONTH)
                        .long("month")
                        .help("Month, 1-12")
                        .required(true)
                        .value_parser(clap::value_parser!(u32).range(1..=12)),
                )
                .arg(
                    Arg::new(ARG_YEAR)
                        .long("year")
                        .help("Year")
                        .required(true)
                        .value_parser(clap::value_parser!(i32)),
                ),
        )
        .subcommand(
            with_event_fields(Command::new("create").about("Create an event"), true).arg(
                Arg::new(ARG_CREATOR)
                    .long("creator")
                    .help("Creator name when not signed in"),
            ),
        )
        .subcommand(with_event_fields(
            Command::new("update")
                .about("Update an event")
                .arg(Arg::new(ARG_ID).help("Event id").required(true)),
            false,
        ))
        .subcommand(
            Command::new("delete")
                .about("Delete an event")
                .arg(Arg::new(ARG_ID).help("Event id").required(true)),
        )
        .subcommand(
            Command::new("rsvp")
                .about("Answer an invitation")
                .arg(Arg::new(ARG_ID).help("Event id").required(true))
                .arg(
                    Arg::new(ARG_STATUS)
                        .help("Answer, e.g. yes, no or maybe")
                        .required(true),
                ),
        )
        .subcommand(Command::new("rsvps").about("Show RSVPs saved locally"))
}
