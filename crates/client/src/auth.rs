//! Login and registration.
//!
//! [`AuthFlow`] exchanges credentials for a [`Session`] and saves it in the
//! [`SessionStore`]. It tracks whether a request is pending and keeps the
//! last failure message around for display until the user edits an input.

use std::sync::{Arc, Mutex, PoisonError};

use portfolio_core::{Email, UserSummary, require, validate_password};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{AuthError, StorageError};
use crate::http::ApiClient;
use crate::session::{Session, SessionStore};

const LOGIN_PATH: &str = "api/auth/login";
const REGISTER_PATH: &str = "api/auth/register";

/// Whether a credential exchange is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Idle,
    Pending,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    /// The backend matches this against usernames as well as emails.
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    token: String,
    user: UserSummary,
}

impl AuthResponse {
    fn into_session(self) -> Result<Session, AuthError> {
        if self.token.trim().is_empty() {
            return Err(AuthError::Decode("response carried an empty token".to_string()));
        }
        Ok(Session::new(self.token, self.user))
    }
}

#[derive(Debug, Default)]
struct FlowState {
    state: AuthState,
    error: Option<String>,
}

/// Credential exchange against the backend.
#[derive(Clone)]
pub struct AuthFlow {
    api: ApiClient,
    session: SessionStore,
    state: Arc<Mutex<FlowState>>,
}

impl std::fmt::Debug for AuthFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthFlow")
            .field("state", &self.state())
            .field("error", &self.error())
            .finish_non_exhaustive()
    }
}

impl AuthFlow {
    /// Create a flow that saves successful sessions into `session`.
    #[must_use]
    pub fn new(api: ApiClient, session: SessionStore) -> Self {
        Self {
            api,
            session,
            state: Arc::new(Mutex::new(FlowState::default())),
        }
    }

    /// Log in with an email address or username.
    ///
    /// Both fields must be non-empty; the identifier is not checked for email
    /// format since the backend also accepts usernames.
    ///
    /// # Errors
    ///
    /// - `AuthError::Busy` if another exchange is pending (no request sent)
    /// - `AuthError::Validation` for blank fields (no request sent)
    /// - `AuthError::Rejected` with the backend's message
    /// - `AuthError::Unreachable` if the backend did not answer
    #[instrument(skip(self, password))]
    pub async fn login(&self, identifier: &str, password: &str) -> Result<Session, AuthError> {
        let attempt = self.begin()?;
        let result = self.exchange_login(identifier, password).await;
        attempt.finish(result)
    }

    /// Create an account and log into it.
    ///
    /// # Errors
    ///
    /// As [`login`](Self::login); additionally the email must be well formed
    /// and the password at least
    /// [`MIN_PASSWORD_LENGTH`](portfolio_core::MIN_PASSWORD_LENGTH)
    /// characters, both checked before any request.
    #[instrument(skip(self, email, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let attempt = self.begin()?;
        let result = self.exchange_register(username, email, password).await;
        attempt.finish(result)
    }

    /// Forget the current session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the persisted session cannot be removed.
    pub fn logout(&self) -> Result<(), StorageError> {
        self.session.clear()?;
        info!("Logged out");
        Ok(())
    }

    /// Clear the retained error, as when the user edits a field.
    pub fn input_changed(&self) {
        self.lock().error = None;
    }

    /// Whether an exchange is pending.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.lock().state
    }

    /// Message of the last failed exchange, until the next input change or
    /// submit.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    async fn exchange_login(&self, identifier: &str, password: &str) -> Result<Session, AuthError> {
        require("email", identifier)?;
        require("password", password)?;

        let request = LoginRequest {
            email: identifier.trim(),
            password,
        };
        let response: AuthResponse = self.api.post(LOGIN_PATH, &request, None).await?;
        self.establish(response)
    }

    async fn exchange_register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        require("username", username)?;
        require("email", email)?;
        require("password", password)?;
        let email = Email::parse(email).map_err(portfolio_core::ValidationError::from)?;
        validate_password(password)?;

        let request = RegisterRequest {
            username: username.trim(),
            email: email.as_str(),
            password,
        };
        let response: AuthResponse = self.api.post(REGISTER_PATH, &request, None).await?;
        self.establish(response)
    }

    fn establish(&self, response: AuthResponse) -> Result<Session, AuthError> {
        let session = response.into_session()?;
        self.session.save(session.clone())?;
        info!(username = %session.user().username, role = %session.user().role, "Authenticated");
        Ok(session)
    }

    fn begin(&self) -> Result<Attempt<'_>, AuthError> {
        let mut state = self.lock();
        if state.state == AuthState::Pending {
            debug!("Rejecting submit while a request is pending");
            return Err(AuthError::Busy);
        }
        state.state = AuthState::Pending;
        state.error = None;
        Ok(Attempt { flow: self })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FlowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A pending exchange. Returns the flow to idle when dropped, so an
/// abandoned future cannot leave it stuck in `Pending`.
struct Attempt<'a> {
    flow: &'a AuthFlow,
}

impl Attempt<'_> {
    fn finish(self, result: Result<Session, AuthError>) -> Result<Session, AuthError> {
        if let Err(e) = &result {
            self.flow.lock().error = Some(e.to_string());
        }
        result
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        self.flow.lock().state = AuthState::Idle;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use portfolio_core::ValidationError;

    use super::*;
    use crate::config::ClientConfig;

    /// A flow pointed at a port nothing listens on.
    fn offline_flow() -> AuthFlow {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = ClientConfig::new(&format!("http://{addr}"), "unused.json").unwrap();
        AuthFlow::new(ApiClient::new(&config).unwrap(), SessionStore::in_memory())
    }

    #[tokio::test]
    async fn test_short_password_rejected_locally() {
        let flow = offline_flow();
        let result = flow.register("ada", "ada@example.com", "12345").await;

        assert!(matches!(
            result,
            Err(AuthError::Validation(ValidationError::PasswordTooShort { min: 6 }))
        ));
        assert_eq!(flow.state(), AuthState::Idle);
        assert_eq!(
            flow.error().as_deref(),
            Some("Password must be at least 6 characters")
        );
    }

    #[tokio::test]
    async fn test_bad_email_rejected_on_register_only() {
        let flow = offline_flow();
        let register = flow.register("ada", "not-an-email", "secret1").await;
        assert!(matches!(register, Err(AuthError::Validation(ValidationError::InvalidEmail(_)))));

        // Usernames are valid login identifiers, so this reaches the network.
        let login = flow.login("ada", "secret1").await;
        assert!(matches!(login, Err(AuthError::Unreachable(_))));
    }

    #[tokio::test]
    async fn test_error_retained_until_input_changes() {
        let flow = offline_flow();
        flow.login("", "secret1").await.unwrap_err();
        assert_eq!(flow.error().as_deref(), Some("email is required"));

        flow.input_changed();
        assert!(flow.error().is_none());
    }

    #[tokio::test]
    async fn test_submit_while_pending_is_busy() {
        let flow = offline_flow();
        let attempt = flow.begin().unwrap();
        assert_eq!(flow.state(), AuthState::Pending);

        let second = flow.login("ada", "secret1").await;
        assert!(matches!(second, Err(AuthError::Busy)));
        assert!(flow.error().is_none());

        drop(attempt);
        assert_eq!(flow.state(), AuthState::Idle);
    }

    #[test]
    fn test_empty_token_is_not_a_session() {
        let response: AuthResponse =
            serde_json::from_str(r#"{"token":"","user":{"username":"a","role":"admin"}}"#)
                .unwrap();
        assert!(matches!(response.into_session(), Err(AuthError::Decode(_))));
    }
}
