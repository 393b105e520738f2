use clap::{Arg, ArgGroup, Command};

pub const ARG_TOKEN: &str = "token";
pub const ARG_USER: &str = "user";
pub const ARG_EXPIRES_AT: &str = "expires-at";
pub const ARG_EXPIRES_EPOCH: &str = "expires-epoch";

#[must_use]
pub fn command() -> Command {
    Command::new("session")
        .about("Inspect or seed the locally stored session")
        .subcommand_required(true)
        .subcommand(Command::new("show").about("Resolve and print the stored session"))
        .subcommand(
            Command::new("seed")
                .about("Write a complete session record, as a hand-made sign-in")
                .arg(
                    Arg::new(ARG_TOKEN)
                        .short('t')
                        .long("token")
                        .help("Bearer token to store in the record")
                        .env("COUSINSVAULT_SEED_TOKEN")
                        .hide_env_values(true)
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_USER)
                        .long("user")
                        .help(r#"User object as JSON, e.g. {"id":1,"name":"Abir Rahman"}"#)
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_EXPIRES_AT)
                        .long("expires-at")
                        .help("Expiry as ISO-8601 text (default: no expiry)"),
                )
                .arg(
                    Arg::new(ARG_EXPIRES_EPOCH)
                        .long("expires-epoch")
                        .help("Expiry as Unix epoch seconds")
                        .value_parser(clap::value_parser!(i64)),
                )
                .group(
                    ArgGroup::new("expiry")
                        .args([ARG_EXPIRES_AT, ARG_EXPIRES_EPOCH])
                        .multiple(false),
                ),
        )
}
