use crate::cli::actions::{auth, events, gallery, session, Action};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Auth(args) => auth::execute(args).await,
        Action::Session(args) => session::execute(args),
        Action::Gallery(args) => gallery::execute(args).await,
        Action::Events(args) => events::execute(args).await,
    }
}
