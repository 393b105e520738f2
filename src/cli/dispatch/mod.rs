//! Maps validated CLI matches to the action to run.

use crate::{
    api::{EventDraft, RsvpRequest, SignupRequest},
    cli::{
        actions::{auth, events, gallery, session, Action},
        commands::{
            self, auth as auth_args, events as event_args, gallery as gallery_args,
            session as session_args, ARG_FILTER, ARG_ID,
        },
        globals::GlobalArgs,
    },
    session::UserProfile,
};
use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;
use serde_json::Value;
use std::path::PathBuf;

fn string(matches: &ArgMatches, id: &str) -> Option<String> {
    matches.get_one::<String>(id).cloned()
}

fn required(matches: &ArgMatches, id: &str) -> Result<String> {
    string(matches, id).with_context(|| format!("missing required argument: {id}"))
}

fn pairs(matches: &ArgMatches, id: &str) -> Vec<(String, String)> {
    matches
        .get_many::<(String, String)>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn auth_command(name: &str, matches: &ArgMatches) -> Result<auth::Command> {
    Ok(match name {
        "login" => auth::Command::Login {
            email: required(matches, auth_args::ARG_EMAIL)?,
            password: SecretString::from(required(matches, auth_args::ARG_PASSWORD)?),
        },
        "signup" => auth::Command::Signup(SignupRequest {
            name: required(matches, auth_args::ARG_NAME)?,
            email: required(matches, auth_args::ARG_EMAIL)?,
            username: string(matches, auth_args::ARG_USERNAME),
            password: SecretString::from(required(matches, auth_args::ARG_PASSWORD)?),
            role: string(matches, auth_args::ARG_ROLE),
        }),
        "logout" => auth::Command::Logout,
        _ => auth::Command::Status,
    })
}

fn session_command(matches: &ArgMatches) -> Result<session::Command> {
    match matches.subcommand() {
        Some(("seed", seed)) => {
            let user: UserProfile = serde_json::from_str(&required(seed, session_args::ARG_USER)?)
                .context("--user must be a JSON object")?;
            let expires = if let Some(epoch) = seed.get_one::<i64>(session_args::ARG_EXPIRES_EPOCH) {
                session::Expires::Epoch(*epoch)
            } else if let Some(at) = string(seed, session_args::ARG_EXPIRES_AT) {
                session::Expires::At(at)
            } else {
                session::Expires::Never
            };

            Ok(session::Command::Seed {
                token: SecretString::from(required(seed, session_args::ARG_TOKEN)?),
                user,
                expires,
            })
        }
        Some(("show", _)) => Ok(session::Command::Show),
        _ => Err(anyhow!("unknown session command")),
    }
}

fn gallery_command(matches: &ArgMatches) -> Result<gallery::Command> {
    match matches.subcommand() {
        Some(("list", list)) => Ok(gallery::Command::List {
            filters: pairs(list, ARG_FILTER),
        }),
        Some(("item", item)) => Ok(gallery::Command::Item {
            id: required(item, ARG_ID)?,
        }),
        Some(("stats", _)) => Ok(gallery::Command::Stats),
        Some(("like", like)) => Ok(gallery::Command::Like {
            id: required(like, ARG_ID)?,
        }),
        Some(("upload", upload)) => Ok(gallery::Command::Upload {
            file: PathBuf::from(required(upload, gallery_args::ARG_FILE)?),
            fields: pairs(upload, gallery_args::ARG_FIELD),
        }),
        _ => Err(anyhow!("unknown gallery command")),
    }
}

fn event_draft(matches: &ArgMatches, id: Option<String>) -> EventDraft {
    EventDraft {
        id: id.map(|id| id.parse::<i64>().map_or_else(|_| Value::from(id), Value::from)),
        title: string(matches, event_args::ARG_TITLE),
        description: string(matches, event_args::ARG_DESCRIPTION),
        event_date: string(matches, event_args::ARG_DATE),
        event_time: string(matches, event_args::ARG_TIME),
        event_type: string(matches, event_args::ARG_TYPE),
        location: string(matches, event_args::ARG_LOCATION),
        creator_name: matches
            .try_get_one::<String>(event_args::ARG_CREATOR)
            .ok()
            .flatten()
            .cloned(),
        ..EventDraft::default()
    }
}

fn events_command(matches: &ArgMatches) -> Result<events::Command> {
    match matches.subcommand() {
        Some(("list", list)) => Ok(events::Command::List {
            filters: pairs(list, ARG_FILTER),
        }),
        Some(("get", get)) => Ok(events::Command::Get {
            id: required(get, ARG_ID)?,
        }),
        Some(("upcoming", upcoming)) => Ok(events::Command::Upcoming {
            limit: upcoming
                .get_one::<usize>(event_args::ARG_LIMIT)
                .copied()
                .unwrap_or(crate::api::DEFAULT_UPCOMING_LIMIT),
        }),
        Some(("calendar", calendar)) => Ok(events::Command::Calendar {
            month: calendar
                .get_one::<u32>(event_args::ARG_MONTH)
                .copied()
                .context("missing required argument: month")?,
            year: calendar
                .get_one::<i32>(event_args::ARG_YEAR)
                .copied()
                .context("missing required argument: year")?,
        }),
        Some(("create", create)) => Ok(events::Command::Create(event_draft(create, None))),
        Some(("update", update)) => {
            let id = required(update, ARG_ID)?;
            Ok(events::Command::Update(event_draft(update, Some(id))))
        }
        Some(("delete", delete)) => Ok(events::Command::Delete {
            id: required(delete, ARG_ID)?,
        }),
        Some(("rsvp", rsvp)) => Ok(events::Command::Rsvp(RsvpRequest {
            event_id: required(rsvp, ARG_ID)?,
            rsvp_status: required(rsvp, event_args::ARG_STATUS)?,
        })),
        Some(("rsvps", _)) => Ok(events::Command::LocalRsvps),
        _ => Err(anyhow!("unknown events command")),
    }
}

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or malformed.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let globals = GlobalArgs::parse(matches);

    let Some((name, sub)) = matches.subcommand() else {
        return Err(anyhow!("no command given, try --help"));
    };

    Ok(match name {
        "login" | "signup" | "logout" | "status" => Action::Auth(auth::Args {
            globals,
            command: auth_command(name, sub)?,
        }),
        "session" => Action::Session(session::Args {
            globals,
            command: session_command(sub)?,
        }),
        "gallery" => Action::Gallery(gallery::Args {
            globals,
            command: gallery_command(sub)?,
        }),
        "events" => Action::Events(events::Args {
            globals,
            command: events_command(sub)?,
        }),
        other => return Err(anyhow!("unknown command: {other}")),
    })
}

/// Parses `args` as a full command line and maps it to an action.
///
/// # Errors
/// Returns an error if parsing or mapping fails.
pub fn handler_from<I, T>(args: I) -> Result<Action>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = commands::new().try_get_matches_from(args)?;
    handler(&matches)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn without_env<T>(test: impl FnOnce() -> T) -> T {
        temp_env::with_vars(
            [
                ("COUSINSVAULT_BASE_URL", None::<&str>),
                ("COUSINSVAULT_DATA_DIR", None),
                ("COUSINSVAULT_TIMEOUT_SECONDS", None),
                ("COUSINSVAULT_PASSWORD", None),
                ("COUSINSVAULT_EMAIL", None),
                ("COUSINSVAULT_SEED_TOKEN", None),
            ],
            test,
        )
    }

    #[test]
    fn login_action() {
        without_env(|| {
            let action = handler_from([
                "cousinsvault",
                "--base-url",
                "https://vault.example",
                "login",
                "-e",
                "abir@example.com",
                "-p",
                "s3cret",
            ])
            .unwrap();

            let Action::Auth(args) = action else {
                panic!("expected auth action");
            };
            assert_eq!(args.globals.base_url, "https://vault.example");
            let auth::Command::Login { email, password } = args.command else {
                panic!("expected login");
            };
            assert_eq!(email, "abir@example.com");
            assert_eq!(password.expose_secret(), "s3cret");
        });
    }

    #[test]
    fn signup_action_keeps_optional_fields_empty() {
        without_env(|| {
            let action = handler_from([
                "cousinsvault", "signup", "-n", "Abir Rahman", "-e", "abir@example.com", "-p", "pw",
            ])
            .unwrap();

            let Action::Auth(auth::Args {
                command: auth::Command::Signup(signup),
                ..
            }) = action
            else {
                panic!("expected signup");
            };
            assert_eq!(signup.username(), "abir");
            assert!(signup.role.is_none());
        });
    }

    #[test]
    fn seed_action_with_epoch() {
        without_env(|| {
            let action = handler_from([
                "cousinsvault",
                "-d",
                "/tmp/cv",
                "session",
                "seed",
                "--token",
                "T1",
                "--user",
                r#"{"id":"1","name":"Abir Rahman"}"#,
                "--expires-epoch",
                "1893456000",
            ])
            .unwrap();

            let Action::Session(args) = action else {
                panic!("expected session action");
            };
            assert_eq!(args.globals.data_dir, PathBuf::from("/tmp/cv"));
            let session::Command::Seed { user, expires, .. } = args.command else {
                panic!("expected seed");
            };
            assert_eq!(user.name.as_deref(), Some("Abir Rahman"));
            assert!(matches!(expires, session::Expires::Epoch(1_893_456_000)));
        });
    }

    #[test]
    fn seed_action_rejects_bad_user_json() {
        without_env(|| {
            let result = handler_from([
                "cousinsvault", "session", "seed", "--token", "T1", "--user", "not json",
            ]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn event_update_carries_numeric_id() {
        without_env(|| {
            let action = handler_from([
                "cousinsvault", "events", "update", "17", "--location", "Lakeside",
            ])
            .unwrap();

            let Action::Events(events::Args {
                command: events::Command::Update(draft),
                ..
            }) = action
            else {
                panic!("expected update");
            };
            assert_eq!(draft.id, Some(Value::from(17)));
            assert_eq!(draft.location.as_deref(), Some("Lakeside"));
            assert!(draft.title.is_none());
        });
    }

    #[test]
    fn rsvp_and_upload_actions() {
        without_env(|| {
            let rsvp = handler_from(["cousinsvault", "events", "rsvp", "E1", "yes"]).unwrap();
            assert!(matches!(
                rsvp,
                Action::Events(events::Args {
                    command: events::Command::Rsvp(RsvpRequest { .. }),
                    ..
                })
            ));

            let upload = handler_from([
                "cousinsvault", "gallery", "upload", "photo.jpg", "--field", "title=Picnic",
            ])
            .unwrap();
            let Action::Gallery(gallery::Args {
                command: gallery::Command::Upload { file, fields },
                ..
            }) = upload
            else {
                panic!("expected upload");
            };
            assert_eq!(file, PathBuf::from("photo.jpg"));
            assert_eq!(fields, vec![("title".to_string(), "Picnic".to_string())]);
        });
    }
}
