//! Session persistence and resolution.
//!
//! A session can be spread over three places: the canonical token key, the
//! `{user, token, expires_at}` record written by login pages or by hand, and a
//! cookie kept as a last resort when local storage refuses writes. The
//! [`SessionResolver`] folds them into one view; the [`SessionStore`] is the
//! only place that writes them. Only an explicit logout clears credentials.

pub mod expiry;
pub mod model;
pub mod resolver;
pub mod store;

pub use expiry::{parse_expiry, Expiry, ExpiryFormat};
pub use model::{SessionRecord, UserId, UserProfile};
pub use resolver::{ResolvedSession, SessionResolver, TokenSource};
pub use store::{SessionStore, TokenPersistence};
