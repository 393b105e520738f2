use super::{validator_key_value, ARG_FILTER, ARG_ID};
use clap::{Arg, ArgAction, Command};

pub const ARG_FILE: &str = "file";
pub const ARG_FIELD: &str = "field";

#[must_use]
pub fn command() -> Command {
    Command::new("gallery")
        .about("Browse and contribute to the photo gallery")
        .subcommand_required(true)
        .subcommand(
            Command::new("list").about("List gallery items").arg(
                Arg::new(ARG_FILTER)
                    .short('f')
                    .long("filter")
                    .help("Extra query filter as key=value; repeatable")
                    .action(ArgAction::Append)
                    .value_parser(validator_key_value()),
            ),
        )
        .subcommand(
            Command::new("item")
                .about("Show one gallery item")
                .arg(Arg::new(ARG_ID).help("Item id").required(true)),
        )
        .subcommand(Command::new("stats").about("Show gallery statistics"))
        .subcommand(
            Command::new("like")
                .about("Toggle your like on an item")
                .arg(Arg::new(ARG_ID).help("Item id").required(true)),
        )
        .subcommand(
            Command::new("upload")
                .about("Upload a file to the gallery")
                .arg(Arg::new(ARG_FILE).help("Path of the file to upload").required(true))
                .arg(
                    Arg::new(ARG_FIELD)
                        .long("field")
                        .help("Extra form field as key=value; repeatable")
                        .action(ArgAction::Append)
                        .value_parser(validator_key_value()),
                ),
        )
}
