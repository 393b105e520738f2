use clap::{Arg, Command};

pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_NAME: &str = "name";
pub const ARG_USERNAME: &str = "username";
pub const ARG_ROLE: &str = "role";

fn email_arg() -> Arg {
    Arg::new(ARG_EMAIL)
        .short('e')
        .long("email")
        .help("Account email address")
        .env("COUSINSVAULT_EMAIL")
        .required(true)
}

fn password_arg() -> Arg {
    Arg::new(ARG_PASSWORD)
        .short('p')
        .long("password")
        .help("Account password")
        .env("COUSINSVAULT_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

#[must_use]
pub fn login() -> Command {
    Command::new("login")
        .about("Sign in and store the session token")
        .arg(email_arg())
        .arg(password_arg())
}

#[must_use]
pub fn signup() -> Command {
    Command::new("signup")
        .about("Create an account and sign in with it")
        .arg(
            Arg::new(ARG_NAME)
                .short('n')
                .long("name")
                .help("Display name")
                .required(true),
        )
        .arg(email_arg())
        .arg(password_arg())
        .arg(
            Arg::new(ARG_USERNAME)
                .short('u')
                .long("username")
                .help("Username (default: the part of the email before @)"),
        )
        .arg(
            Arg::new(ARG_ROLE)
                .long("role")
                .help("Requested role (default: contributor)"),
        )
}

#[must_use]
pub fn logout() -> Command {
    Command::new("logout").about("Sign out and forget local credentials")
}

#[must_use]
pub fn status() -> Command {
    Command::new("status").about("Show who is signed in, confirming the token with the server")
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(login())
        .subcommand(signup())
        .subcommand(logout())
        .subcommand(status())
}
