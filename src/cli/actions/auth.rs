use crate::{
    api::SignupRequest,
    cli::{
        actions::{open_context, print_json},
        globals::GlobalArgs,
    },
    display::AuthDisplay,
};
use anyhow::Result;
use secrecy::SecretString;
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug)]
pub enum Command {
    Login {
        email: String,
        password: SecretString,
    },
    Signup(SignupRequest),
    Logout,
    Status,
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub command: Command,
}

/// Signed-in user part of an auth response; the token stays out of stdout.
fn user_of(response: &Value) -> Value {
    response
        .get("data")
        .and_then(|data| data.get("user"))
        .cloned()
        .unwrap_or(Value::Null)
}

/// # Errors
/// Returns an error if the backend rejects the request or is unreachable.
pub async fn execute(args: Args) -> Result<()> {
    let context = open_context(&args.globals).await?;

    match args.command {
        Command::Login { email, password } => {
            let response = context.api.login(&email, &password).await?;
            info!("login stored the session in {}", args.globals.data_dir.display());
            print_json(&json!({ "success": true, "user": user_of(&response) }))?;
        }
        Command::Signup(signup) => {
            let response = context.api.signup(&signup).await?;
            print_json(&json!({ "success": true, "user": user_of(&response) }))?;
        }
        Command::Logout => {
            context.api.logout().await;
            print_json(&json!({ "success": true }))?;
        }
        Command::Status => {
            let authenticated = context.api.token().is_some() && context.api.current_user().is_some();
            eprintln!("{}", context.display.last_frame());
            print_json(&json!({
                "authenticated": authenticated,
                "user": context.display.current_user(),
            }))?;
        }
    }

    Ok(())
}
