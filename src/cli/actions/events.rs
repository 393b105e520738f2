use crate::{
    api::{EventDraft, RsvpRequest},
    cli::{
        actions::{open_context, print_json},
        globals::GlobalArgs,
    },
};
use anyhow::Result;
use serde_json::{json, Value};

#[derive(Debug)]
pub enum Command {
    List { filters: Vec<(String, String)> },
    Get { id: String },
    Upcoming { limit: usize },
    Calendar { month: u32, year: i32 },
    Create(EventDraft),
    Update(EventDraft),
    Delete { id: String },
    Rsvp(RsvpRequest),
    LocalRsvps,
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub command: Command,
}

/// List, upcoming, create and RSVP go through the events client so they keep
/// working against the simple endpoint; the rest need the full API.
///
/// # Errors
/// Returns an error if the backend rejects the request or is unreachable.
pub async fn execute(args: Args) -> Result<()> {
    let context = open_context(&args.globals).await?;
    let (api, events) = (&context.api, &context.events);

    let response: Value = match args.command {
        Command::List { filters } => events.get_events(&filters).await?,
        Command::Get { id } => api.get_event(&id).await?,
        Command::Upcoming { limit } => events.get_upcoming(limit).await?,
        Command::Calendar { month, year } => api.get_calendar_events(month, year).await?,
        Command::Create(draft) => events.create_event(&draft).await?,
        Command::Update(draft) => api.update_event(&draft).await?,
        Command::Delete { id } => api.delete_event(&id).await?,
        Command::Rsvp(rsvp) => events.submit_rsvp(&rsvp).await?,
        Command::LocalRsvps => json!({ "success": true, "data": events.local_rsvps()? }),
    };

    print_json(&response)
}
