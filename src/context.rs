//! Startup composition. Components are built once, in dependency order, and
//! handed to consumers explicitly: the store, the header, the API client, and
//! finally the events client seeded from the API client's settled state.

use crate::{
    api::{ApiClient, ApiError, ClientState},
    config::ClientConfig,
    display::{AuthDisplay, AuthDisplayManager},
    events::EventsClient,
    session::{SessionResolver, SessionStore},
    storage::{CookieJar, FileStorage, Storage, StorageError},
};
use std::{io::Write, path::Path, sync::Arc};
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

/// File holding the key/value store inside the data directory.
pub const STORAGE_FILE: &str = "storage.json";
/// File holding the cookie jar inside the data directory.
pub const COOKIE_FILE: &str = "cookies.json";

pub struct AppContext {
    pub api: Arc<ApiClient>,
    pub events: Arc<EventsClient>,
    pub display: Arc<AuthDisplayManager>,
    pub initial_state: ClientState,
    watcher: JoinHandle<()>,
}

impl AppContext {
    /// Builds every component over the given backends, runs the API client's
    /// startup check and starts the events client's storage watcher.
    ///
    /// # Errors
    /// Returns an error if an HTTP client cannot be built.
    #[instrument(skip_all, fields(base_url = %config.base_url()))]
    pub async fn bootstrap(
        config: ClientConfig,
        storage: Arc<dyn Storage>,
        cookies: Arc<dyn Storage>,
        output: Option<Box<dyn Write + Send>>,
    ) -> Result<Self, ApiError> {
        let store = SessionStore::new(storage, CookieJar::new(cookies));

        let resolver = SessionResolver::new(store.clone());
        let display = Arc::new(match output {
            Some(output) => AuthDisplayManager::with_output(resolver, output),
            None => AuthDisplayManager::new(resolver),
        });

        let api = Arc::new(ApiClient::new(
            config.clone(),
            store.clone(),
            Some(display.clone() as Arc<dyn AuthDisplay>),
        )?);

        let initial_state = api.init().await;

        let events = Arc::new(EventsClient::new(config, store, &initial_state)?);
        let watcher = events.watch();

        debug!(
            "application ready (signed in: {})",
            initial_state.current_user.is_some()
        );

        Ok(Self {
            api,
            events,
            display,
            initial_state,
            watcher,
        })
    }

    /// [`AppContext::bootstrap`] over file storage in `data_dir`, which is
    /// created if missing.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or an HTTP client
    /// cannot be built.
    pub async fn open(
        config: ClientConfig,
        data_dir: &Path,
        output: Option<Box<dyn Write + Send>>,
    ) -> Result<Self, ApiError> {
        std::fs::create_dir_all(data_dir).map_err(StorageError::from)?;

        let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(data_dir.join(STORAGE_FILE)));
        let cookies: Arc<dyn Storage> = Arc::new(FileStorage::new(data_dir.join(COOKIE_FILE)));

        Self::bootstrap(config, storage, cookies, output).await
    }
}

/// Session store over the files in `data_dir`, for commands that work on
/// local state without talking to the server.
#[must_use]
pub fn open_store(data_dir: &Path) -> SessionStore {
    SessionStore::new(
        Arc::new(FileStorage::new(data_dir.join(STORAGE_FILE))),
        CookieJar::new(Arc::new(FileStorage::new(data_dir.join(COOKIE_FILE)))),
    )
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("api", &self.api)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
