//! # Cousins Vault client
//!
//! `cousinsvault` is the session-aware client for the Cousins Vault family
//! photo and events backend. It keeps one consistent view of "who is signed
//! in" across several independent components that share a key/value store.
//!
//! ## Session
//!
//! Credentials live under three storage keys (`cousinsvault_token`,
//! `cousinsvault_session`, `userRSVPs`) with a cookie as the last-resort copy
//! of the token. The [`session::SessionResolver`] is the only code that
//! interprets them: it picks the token, reads the optional expiry in any of
//! the formats the backend and older clients wrote, and removes a session
//! record only once it has provably expired.
//!
//! ## Clients
//!
//! - [`api::ApiClient`] talks to the full REST backend and owns the token
//!   lifecycle. Only an explicit logout clears credentials; network errors,
//!   negative auth checks and 401s leave them in place.
//! - [`events::EventsClient`] degrades to the unauthenticated simple events
//!   endpoint and local RSVP storage when the full API is unreachable.
//! - [`display::AuthDisplayManager`] renders the signed-in header.
//!
//! [`context::AppContext`] wires them together at startup.

pub mod api;
pub mod cli;
pub mod config;
pub mod context;
pub mod display;
pub mod events;
pub mod session;
pub mod sources;
pub mod storage;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
