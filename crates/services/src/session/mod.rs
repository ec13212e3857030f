//! The signed-in user, backed by the persisted bearer token.
//!
//! State moves `Unknown -> Authenticating -> Authenticated | Unauthenticated`
//! and is published on a watch channel; every other component gates on the
//! user id it carries.

mod requests;

pub use requests::SignUpForm;

use serde::de::IgnoredAny;
use servicehub_models::{NewNotification, NotificationType, Profile, UserType};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::gateway::{ApiClient, GatewayError};
use crate::notifications::NotificationApi;
use crate::storage::StorageError;
use crate::toast::Toasts;
use requests::{AuthResponse, LoginRequest, ProfileResponse, RegisterRequest};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("Could not persist the auth token: {0}")]
    Storage(#[from] StorageError),
    #[error("Invalid sign-up form: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("Not signed in")]
    NotAuthenticated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
    pub profile: Profile,
}

impl Session {
    fn new(token: String, profile: Profile) -> Self {
        Self {
            user_id: profile.id,
            email: profile.email.clone(),
            token,
            profile,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Unknown,
    Authenticating,
    Authenticated(Session),
    Unauthenticated,
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.session().map(|s| s.user_id)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

pub struct SessionStore {
    client: Arc<ApiClient>,
    notifications: NotificationApi,
    toasts: Toasts,
    state: Arc<watch::Sender<SessionState>>,
    loading: AtomicBool,
    token_watch: JoinHandle<()>,
}

impl SessionStore {
    /// Must be called inside a tokio runtime: the store spawns a task that
    /// ends the session as soon as the client's token is cleared.
    pub fn new(client: Arc<ApiClient>, toasts: Toasts) -> Self {
        let (state, _rx) = watch::channel(SessionState::Unknown);
        let state = Arc::new(state);
        let token_watch = watch_token(&client, Arc::downgrade(&state));
        Self {
            notifications: NotificationApi::new(Arc::clone(&client)),
            client,
            toasts,
            state,
            loading: AtomicBool::new(false),
            token_watch,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.reconcile();
        self.state.borrow().clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.state().session().cloned()
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.state().user_id()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.session().map(|s| s.profile)
    }

    /// Projection of the current profile; always `Some` while authenticated.
    pub fn user_type(&self) -> Option<UserType> {
        self.session().map(|s| s.profile.user_type)
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    fn publish(&self, next: SessionState) {
        self.state.send_replace(next);
    }

    fn clear_token(&self) {
        if let Err(e) = self.client.set_token(None) {
            warn!(error = %e, "Failed to clear persisted token");
        }
    }

    /// Token and session must agree. Any divergence means logged out.
    /// Skipped mid sign-in, where the two are updated one after the other.
    fn reconcile(&self) {
        if self.is_loading() {
            return;
        }
        let has_token = self.client.token().is_some();
        let diverged = match &*self.state.borrow() {
            SessionState::Authenticated(session) => {
                self.client.token().as_deref() != Some(session.token.as_str())
            }
            SessionState::Unauthenticated => has_token,
            _ => false,
        };
        if diverged {
            warn!(has_token, "Token and session diverged, signing out locally");
            self.clear_token();
            self.publish(SessionState::Unauthenticated);
        }
    }

    /// Validates a persisted token against the profile endpoint.
    pub async fn initialize(&self) -> SessionState {
        let Some(token) = self.client.token() else {
            debug!("No persisted token");
            self.publish(SessionState::Unauthenticated);
            return SessionState::Unauthenticated;
        };

        self.publish(SessionState::Authenticating);
        let next = match self.client.get::<ProfileResponse>("/auth/profile").await {
            Ok(resp) => {
                info!(user_id = %resp.user.id, "Session restored");
                SessionState::Authenticated(Session::new(token, resp.user))
            }
            Err(e) => {
                warn!(error = %e, "Persisted token rejected");
                self.clear_token();
                SessionState::Unauthenticated
            }
        };
        self.publish(next.clone());
        next
    }

    /// On failure the previous state is left untouched. On success the
    /// authenticated state is published before the loading flag drops.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Profile, SessionError> {
        self.loading.store(true, Ordering::SeqCst);

        let result = self
            .client
            .post::<AuthResponse, _>("/auth/login", &LoginRequest { email, password })
            .await;

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                self.loading.store(false, Ordering::SeqCst);
                self.toasts.error(e.user_message());
                return Err(e.into());
            }
        };

        let profile = self.establish(resp).inspect_err(|_| {
            self.loading.store(false, Ordering::SeqCst);
        })?;
        self.toasts.success("Signed in successfully");
        self.loading.store(false, Ordering::SeqCst);
        Ok(profile)
    }

    pub async fn sign_up(&self, form: &SignUpForm) -> Result<Profile, SessionError> {
        if let Err(errors) = form.validate() {
            self.toasts.error(first_field_message(&errors));
            return Err(errors.into());
        }
        self.loading.store(true, Ordering::SeqCst);

        let body = RegisterRequest::from_form(form);
        if body.postcode_p1.is_empty() && body.postcode_p2.is_empty() && body.postcode_p3.is_empty() {
            debug!(postcode = %form.postcode, "Postcode did not split, sending empty parts");
        }

        let resp = match self
            .client
            .post::<AuthResponse, _>("/auth/register", &body)
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                self.loading.store(false, Ordering::SeqCst);
                self.toasts.error(e.user_message());
                return Err(e.into());
            }
        };

        let profile = self.establish(resp).inspect_err(|_| {
            self.loading.store(false, Ordering::SeqCst);
        })?;

        let welcome = NewNotification {
            user_id: profile.id,
            notification_type: NotificationType::Welcome,
            title: "Welcome to ServiceHub".to_string(),
            message: format!("Hi {}, your account is ready.", profile.first_name),
            related_id: None,
            related_type: None,
        };
        if let Err(e) = self.notifications.create(&welcome).await {
            warn!(user_id = %profile.id, error = %e, "Welcome notification failed");
        }

        self.toasts.success("Account created");
        self.loading.store(false, Ordering::SeqCst);
        Ok(profile)
    }

    fn establish(&self, resp: AuthResponse) -> Result<Profile, SessionError> {
        if let Err(e) = self.client.set_token(Some(&resp.token)) {
            self.clear_token();
            return Err(e.into());
        }
        info!(user_id = %resp.user.id, user_type = %resp.user.user_type, "Signed in");
        let profile = resp.user.clone();
        self.publish(SessionState::Authenticated(Session::new(resp.token, resp.user)));
        Ok(profile)
    }

    /// Tells the server, then clears local state whatever it answered.
    pub async fn sign_out(&self) {
        if let Err(e) = self
            .client
            .post::<IgnoredAny, _>("/auth/logout", &serde_json::json!({}))
            .await
        {
            warn!(error = %e, "Logout call failed, clearing local session anyway");
        }
        self.clear_token();
        self.publish(SessionState::Unauthenticated);
        self.toasts.info("Signed out");
    }

    /// Re-reads the profile of the current session. A rejected token ends
    /// the session.
    pub async fn refresh_profile(&self) -> Result<Profile, SessionError> {
        let session = self.session().ok_or(SessionError::NotAuthenticated)?;
        match self.client.get::<ProfileResponse>("/auth/profile").await {
            Ok(resp) => {
                let profile = resp.user.clone();
                self.publish(SessionState::Authenticated(Session::new(
                    session.token,
                    resp.user,
                )));
                Ok(profile)
            }
            Err(e) if e.is_unauthorized() => {
                warn!(user_id = %session.user_id, "Token no longer valid");
                self.clear_token();
                self.publish(SessionState::Unauthenticated);
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.token_watch.abort();
    }
}

/// Publishes `Unauthenticated` when the token disappears under an
/// authenticated session, whoever cleared it.
fn watch_token(client: &ApiClient, state: Weak<watch::Sender<SessionState>>) -> JoinHandle<()> {
    let mut tokens = client.subscribe_token();
    tokio::spawn(async move {
        while tokens.changed().await.is_ok() {
            if tokens.borrow_and_update().is_some() {
                continue;
            }
            let Some(state) = state.upgrade() else {
                break;
            };
            let ended = state.send_if_modified(|current| {
                if current.is_authenticated() {
                    *current = SessionState::Unauthenticated;
                    true
                } else {
                    false
                }
            });
            if ended {
                warn!("Token cleared, session ended");
            }
        }
    })
}

/// Message of the alphabetically first failing field.
fn first_field_message(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .iter()
        .flat_map(|(_, errs)| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Please check the form and try again".to_string())
}
