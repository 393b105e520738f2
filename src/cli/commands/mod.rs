pub mod auth;
pub mod events;
pub mod gallery;
pub mod logging;
pub mod session;

use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub const ARG_BASE_URL: &str = "base-url";
pub const ARG_DATA_DIR: &str = "data-dir";
pub const ARG_TIMEOUT: &str = "timeout";
pub const ARG_FILTER: &str = "filter";
pub const ARG_ID: &str = "id";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_DATA_DIR: &str = ".cousinsvault";
const DEFAULT_TIMEOUT: &str = "10";

/// Parses `key=value` pairs for query filters and form fields.
#[must_use]
pub fn validator_key_value() -> ValueParser {
    ValueParser::from(
        move |pair: &str| -> std::result::Result<(String, String), String> {
            match pair.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    Ok((key.trim().to_string(), value.to_string()))
                }
                _ => Err(format!("expected key=value, got '{pair}'")),
            }
        },
    )
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("cousinsvault")
        .about("Cousins Vault family photos and events")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(ARG_BASE_URL)
                .short('b')
                .long("base-url")
                .help("Backend origin, e.g. https://cousinsvault.example")
                .env("COUSINSVAULT_BASE_URL")
                .global(true)
                .default_value(DEFAULT_BASE_URL),
        )
        .arg(
            Arg::new(ARG_DATA_DIR)
                .short('d')
                .long("data-dir")
                .help("Directory holding the local session storage")
                .env("COUSINSVAULT_DATA_DIR")
                .global(true)
                .default_value(DEFAULT_DATA_DIR),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long("timeout")
                .help("Request timeout in seconds")
                .env("COUSINSVAULT_TIMEOUT_SECONDS")
                .global(true)
                .default_value(DEFAULT_TIMEOUT)
                .value_parser(clap::value_parser!(u64).range(1..)),
        );

    let command = auth::with_subcommands(command)
        .subcommand(session::command())
        .subcommand(gallery::command())
        .subcommand(events::command());

    logging::with_args(command)
}
