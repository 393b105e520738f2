pub mod auth;
pub mod events;
pub mod gallery;
pub mod session;

// Internal "interpreter" for `Action`.
mod run;

use crate::{cli::globals::GlobalArgs, context::AppContext};
use anyhow::{Context, Result};
use serde_json::Value;

#[derive(Debug)]
pub enum Action {
    Auth(auth::Args),
    Session(session::Args),
    Gallery(gallery::Args),
    Events(events::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}

/// Writes a response to stdout as pretty JSON.
pub(crate) fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Starts every client over the on-disk store named by the global options.
pub(crate) async fn open_context(globals: &GlobalArgs) -> Result<AppContext> {
    AppContext::open(globals.client_config()?, &globals.data_dir, None)
        .await
        .with_context(|| format!("failed to open session in {}", globals.data_dir.display()))
}
