use super::{
    types::{error_message, is_success, AuthPayload, SignupRequest},
    ApiClient, ApiError, ApiRequest, AUTH_PATH,
};
use crate::session::UserProfile;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};

pub(crate) fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

impl ApiClient {
    /// Signs in with email and password.
    ///
    /// # Errors
    /// Returns [`ApiError::Rejected`] with the server's message when the
    /// credentials are refused, or a transport error. Cached state is left
    /// unchanged on failure.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Value, ApiError> {
        let request = ApiRequest::post(AUTH_PATH).action("login").json(json!({
            "email": email,
            "password": password.expose_secret(),
        }));

        let response = self.make_request(request).await.map_err(|err| {
            error!("Login error: {}", err);
            err
        })?;

        self.accept_auth_response(&response, "Login failed")?;

        Ok(response)
    }

    /// Registers a new account and signs in with it.
    ///
    /// # Errors
    /// Returns [`ApiError::InvalidInput`] for a malformed email,
    /// [`ApiError::Rejected`] when the server refuses, or a transport error.
    #[instrument(skip(self, signup), fields(email = %signup.email))]
    pub async fn signup(&self, signup: &SignupRequest) -> Result<Value, ApiError> {
        if !valid_email(signup.email.trim()) {
            return Err(ApiError::InvalidInput(format!(
                "invalid email address: {}",
                signup.email
            )));
        }

        let request = ApiRequest::post(AUTH_PATH)
            .action("signup")
            .json(signup.to_body());

        let response = self.make_request(request).await.map_err(|err| {
            error!("Signup error: {}", err);
            err
        })?;

        self.accept_auth_response(&response, "Signup failed")?;

        Ok(response)
    }

    fn accept_auth_response(&self, response: &Value, fallback: &str) -> Result<(), ApiError> {
        if !is_success(response) {
            let message = error_message(response).unwrap_or(fallback).to_string();
            warn!("{}: {}", fallback, message);
            return Err(ApiError::Rejected(message));
        }

        let payload: AuthPayload = response
            .get("data")
            .cloned()
            .ok_or_else(|| ApiError::Parse("auth response has no data".to_string()))
            .and_then(|data| {
                serde_json::from_value(data)
                    .map_err(|err| ApiError::Parse(format!("auth response: {err}")))
            })?;

        self.set_token(&payload.token);
        self.set_current_user(payload.user);
        self.sync_display();

        let user = self.current_user();
        info!(
            "signed in as {}",
            user.as_ref()
                .and_then(UserProfile::display_name)
                .unwrap_or("(no name)")
        );

        Ok(())
    }

    /// Signs out. The server call is best effort; local credentials are
    /// cleared and state reloaded whether or not it succeeds.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if self.token().is_some() {
            if let Err(err) = self
                .make_request(ApiRequest::post(AUTH_PATH).action("logout"))
                .await
            {
                warn!("server logout failed, clearing local session anyway: {}", err);
            }
        }

        self.clear_token();
        self.set_current_user(None);
        self.update_auth_display();
        self.reload();
    }

    /// Asks the server whether the cached token is still accepted and, if so,
    /// refreshes the cached profile.
    ///
    /// A negative answer or an error returns `false` but never touches stored
    /// credentials; only [`ApiClient::logout`] clears them.
    #[instrument(skip(self))]
    pub async fn check_auth_status(&self) -> bool {
        if self.token().is_none() {
            self.update_auth_display();
            return false;
        }

        match self
            .make_request(ApiRequest::get(AUTH_PATH).action("check"))
            .await
        {
            Ok(response) if is_success(&response) && is_authenticated(&response) => {
                match self.get_profile().await {
                    Ok(profile) if is_success(&profile) => {
                        if let Some(user) = profile_user(&profile) {
                            debug!(
                                "user authenticated: {}",
                                user.display_name().unwrap_or("(no name)")
                            );
                            self.set_current_user(Some(user));
                            self.update_auth_display();
                            return true;
                        }
                        warn!("profile response has no usable profile");
                    }
                    Ok(_) => warn!("profile request was refused"),
                    Err(err) => warn!("profile request failed: {}", err),
                }
            }
            Ok(_) => {
                warn!("authentication check returned not-authenticated; keeping local session");
            }
            Err(err) => {
                error!("auth check error (retaining local session): {}", err);
            }
        }

        self.update_auth_display();
        false
    }

    /// Fetches the signed-in user's profile.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_profile(&self) -> Result<Value, ApiError> {
        self.make_request(ApiRequest::get(AUTH_PATH).action("profile"))
            .await
    }
}

fn is_authenticated(response: &Value) -> bool {
    response
        .get("data")
        .and_then(|data| data.get("authenticated"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn profile_user(response: &Value) -> Option<UserProfile> {
    let profile = response.get("data")?.get("profile")?;
    serde_json::from_value(profile.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(valid_email("abir@example.com"));
        assert!(!valid_email("abir"));
        assert!(!valid_email("abir@example"));
        assert!(!valid_email("a b@example.com"));
    }

    #[test]
    fn authenticated_flag() {
        assert!(is_authenticated(&json!({"data": {"authenticated": true}})));
        assert!(!is_authenticated(&json!({"data": {"authenticated": "yes"}})));
        assert!(!is_authenticated(&json!({"success": true})));
    }

    #[test]
    fn profile_user_parses() {
        let user = profile_user(&json!({"data": {"profile": {"id": 1, "name": "Abir"}}}));
        assert_eq!(user.and_then(|u| u.name), Some("Abir".to_string()));
        assert!(profile_user(&json!({"data": {}})).is_none());
    }
}
