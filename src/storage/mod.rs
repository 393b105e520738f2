//! Key/value persistence shared by every client component. A `Storage` backend
//! plays the part of the browser's local storage: single-key reads and writes
//! that are atomic per key, plus a change feed so other holders of the same
//! data can refresh their caches. Backends never interpret the values they hold.

pub mod cookie;
pub mod file;
pub mod memory;

pub use cookie::CookieJar;
pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::trace;

/// Canonical key for the bearer token.
pub const TOKEN_KEY: &str = "cousinsvault_token";
/// Key holding the serialized session record.
pub const SESSION_KEY: &str = "cousinsvault_session";
/// Key holding RSVPs that could not be submitted to the server.
pub const RSVP_KEY: &str = "userRSVPs";

/// Capacity of the change feed; slow subscribers skip older notifications.
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A change notification. `new_value` is `None` when the key was removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub new_value: Option<String>,
}

pub trait Storage: Send + Sync {
    /// Reads a key.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes a key, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error if the backend rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes a key. Removing a missing key is not an error.
    ///
    /// # Errors
    /// Returns an error if the backend rejects the write.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Subscribes to writes made through this backend.
    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}

/// Fan-out of storage changes to every subscriber.
#[derive(Debug)]
pub(crate) struct Notifier {
    sender: broadcast::Sender<StorageEvent>,
}

impl Notifier {
    pub(crate) fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn notify(&self, key: &str, new_value: Option<&str>) {
        // no subscribers is fine
        if self
            .sender
            .send(StorageEvent {
                key: key.to_string(),
                new_value: new_value.map(ToString::to_string),
            })
            .is_err()
        {
            trace!("no storage subscribers for {}", key);
        }
    }
}
