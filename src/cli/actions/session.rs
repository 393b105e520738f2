use crate::{
    cli::{actions::print_json, globals::GlobalArgs},
    context::open_store,
    session::{ResolvedSession, SessionRecord, SessionResolver, SessionStore, UserProfile},
};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug)]
pub enum Expires {
    Never,
    At(String),
    Epoch(i64),
}

#[derive(Debug)]
pub enum Command {
    Show,
    Seed {
        token: SecretString,
        user: UserProfile,
        expires: Expires,
    },
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub command: Command,
}

/// ISO-8601 text for an expiry option; epoch seconds become UTC millisecond precision.
///
/// # Errors
/// Returns an error if the epoch is out of range.
pub fn expiry_text(expires: &Expires) -> Result<Option<String>> {
    match expires {
        Expires::Never => Ok(None),
        Expires::At(text) => Ok(Some(text.trim().to_string()).filter(|text| !text.is_empty())),
        Expires::Epoch(seconds) => DateTime::from_timestamp(*seconds, 0)
            .map(|at| Some(at.to_rfc3339_opts(SecondsFormat::Millis, true)))
            .ok_or_else(|| anyhow!("expiry epoch out of range: {seconds}")),
    }
}

fn describe(resolved: &ResolvedSession) -> Value {
    json!({
        "token_present": resolved.token.is_some(),
        "token_source": resolved.token_source.map(|source| format!("{source:?}")),
        "user": resolved.user,
        "is_valid": resolved.is_valid,
    })
}

/// Writes the record and reloads it the way a fresh start would.
///
/// # Errors
/// Returns an error if the record cannot be written or read back.
pub fn seed(store: &SessionStore, record: &SessionRecord) -> Result<ResolvedSession> {
    store
        .seed_session(record)
        .context("failed to write session record")?;
    Ok(SessionResolver::new(store.clone()).resolve())
}

/// # Errors
/// Returns an error if the local store cannot be read or written.
pub fn execute(args: Args) -> Result<()> {
    let data_dir = &args.globals.data_dir;
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;
    let store = open_store(data_dir);

    match args.command {
        Command::Show => {
            let resolved = SessionResolver::new(store).resolve();
            print_json(&describe(&resolved))?;
        }
        Command::Seed {
            token,
            user,
            expires,
        } => {
            let record = SessionRecord {
                user: Some(user),
                token: Some(token.expose_secret().to_string()),
                expires_at: expiry_text(&expires)?,
            };
            let resolved = seed(&store, &record)?;
            info!("seeded session in {}", data_dir.display());
            print_json(&describe(&resolved))?;
        }
    }

    Ok(())
}
