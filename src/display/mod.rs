//! Logged-in / logged-out header rendering. Clients never draw the header
//! themselves; they hand the current user to an [`AuthDisplay`] and ask it to
//! re-render, so only one component ever owns the markup.

use crate::session::{SessionResolver, UserProfile};
use std::{
    io::Write,
    sync::{Mutex, MutexGuard, PoisonError},
};
use tracing::{debug, info, warn};

/// Page the user is sent to after signing out from the header.
pub const LOGOUT_REDIRECT: &str = "auth.html";

const DEFAULT_ROLE: &str = "Member";

pub trait AuthDisplay: Send + Sync {
    /// Re-renders the header from the current user.
    fn update_auth_display(&self);

    /// Signs out from the header, returning the page to navigate to.
    fn logout(&self) -> &'static str;

    fn toggle_user_dropdown(&self);

    fn current_user(&self) -> Option<UserProfile>;

    fn set_current_user(&self, user: Option<UserProfile>);
}

/// Up to two upper-cased initials from a display name.
#[must_use]
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

#[derive(Default)]
struct DisplayState {
    current_user: Option<UserProfile>,
    dropdown_open: bool,
    last_frame: String,
}

/// Text rendition of the site header's auth area.
pub struct AuthDisplayManager {
    resolver: SessionResolver,
    state: Mutex<DisplayState>,
    output: Option<Mutex<Box<dyn Write + Send>>>,
}

impl AuthDisplayManager {
    /// Builds the manager, loads the user from the stored session and renders once.
    #[must_use]
    pub fn new(resolver: SessionResolver) -> Self {
        Self::build(resolver, None)
    }

    /// Like [`AuthDisplayManager::new`], also writing every frame to `output`.
    #[must_use]
    pub fn with_output(resolver: SessionResolver, output: Box<dyn Write + Send>) -> Self {
        Self::build(resolver, Some(Mutex::new(output)))
    }

    fn build(resolver: SessionResolver, output: Option<Mutex<Box<dyn Write + Send>>>) -> Self {
        let manager = Self {
            resolver,
            state: Mutex::new(DisplayState::default()),
            output,
        };
        manager.load_user_session();
        manager.update_auth_display();
        manager
    }

    fn lock(&self) -> MutexGuard<'_, DisplayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load_user_session(&self) {
        let resolved = self.resolver.resolve();
        if let Some(user) = resolved.user {
            debug!(
                "header loaded user {}",
                user.display_name().unwrap_or("(no name)")
            );
            self.lock().current_user = Some(user);
        }
    }

    /// The most recently rendered frame.
    #[must_use]
    pub fn last_frame(&self) -> String {
        self.lock().last_frame.clone()
    }

    fn render(state: &DisplayState) -> String {
        let Some(user) = state.current_user.as_ref() else {
            return format!("[ Login -> {LOGOUT_REDIRECT} ]");
        };

        let name = user.display_name().unwrap_or("Family member");
        let role = user
            .role
            .as_deref()
            .filter(|role| !role.is_empty())
            .unwrap_or(DEFAULT_ROLE);
        let marker = if state.dropdown_open { "^" } else { "v" };

        let mut frame = format!("[{}] {name} ({role}) {marker}", initials(name));
        if state.dropdown_open {
            frame.push_str("\n  Profile -> profiles.html");
            frame.push_str("\n  My Vault -> vault.html");
            frame.push_str("\n  ---");
            frame.push_str("\n  Logout");
        }
        frame
    }

    fn present(&self, frame: &str) {
        if let Some(output) = &self.output {
            let mut output = output.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(err) = writeln!(output, "{frame}").and_then(|()| output.flush()) {
                warn!("failed to write auth header: {}", err);
            }
        }
    }
}

impl AuthDisplay for AuthDisplayManager {
    fn update_auth_display(&self) {
        let frame = {
            let mut state = self.lock();
            let frame = Self::render(&state);
            state.last_frame.clone_from(&frame);
            frame
        };
        self.present(&frame);
    }

    fn logout(&self) -> &'static str {
        self.resolver.store().clear_credentials();
        {
            let mut state = self.lock();
            state.current_user = None;
            state.dropdown_open = false;
        }
        self.update_auth_display();
        info!("Logged out successfully");
        LOGOUT_REDIRECT
    }

    fn toggle_user_dropdown(&self) {
        {
            let mut state = self.lock();
            if state.current_user.is_none() {
                return;
            }
            state.dropdown_open = !state.dropdown_open;
        }
        self.update_auth_display();
    }

    fn current_user(&self) -> Option<UserProfile> {
        self.lock().current_user.clone()
    }

    fn set_current_user(&self, user: Option<UserProfile>) {
        let mut state = self.lock();
        if user.is_none() {
            state.dropdown_open = false;
        }
        state.current_user = user;
    }
}

impl std::fmt::Debug for AuthDisplayManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthDisplayManager")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}
