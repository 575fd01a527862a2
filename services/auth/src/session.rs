//! Client-side session management
//!
//! One `SessionManager` owns at most one [`Session`]. Screens observe it
//! through a watch channel instead of polling.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use common::{ClientError, models::User};

use crate::{
    client::AuthApiClient,
    jwt,
    models::AuthData,
    validation::{LoginForm, SignUpErrors, SignUpForm},
};

/// Authenticated principal
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    /// `None` when the backend gave no usable lifetime
    pub expires_at: Option<DateTime<Utc>>,
    pub user: User,
    /// Elevated flag read from the token payload; advisory only
    pub is_founder: bool,
}

impl Session {
    fn from_auth_data(data: AuthData, now: DateTime<Utc>) -> Self {
        let claims = jwt::decode_unverified(&data.access_token).unwrap_or_default();
        let expires_at = if data.expires_in > 0 {
            let expiry = Duration::try_seconds(data.expires_in)
                .and_then(|lifetime| now.checked_add_signed(lifetime));
            if expiry.is_none() {
                warn!("Ignoring out-of-range token lifetime of {}s", data.expires_in);
            }
            expiry
        } else {
            None
        };

        Self {
            is_founder: claims.is_founder,
            access_token: data.access_token,
            token_type: data.token_type,
            expires_at,
            user: data.user,
        }
    }

    fn from_stored_token(token: String, user: User) -> Self {
        let claims = jwt::decode_unverified(&token).unwrap_or_default();

        Self {
            is_founder: claims.is_founder,
            expires_at: claims.expires_at(),
            access_token: token,
            token_type: "Bearer".to_string(),
            user,
        }
    }

    /// Whether the session's lifetime has run out at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| now >= expiry)
    }
}

/// Session errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{0}")]
    InvalidLogin(String),

    #[error(transparent)]
    InvalidSignUp(#[from] SignUpErrors),

    #[error(transparent)]
    Client(#[from] ClientError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Session manager for the authenticated user
#[derive(Clone)]
pub struct SessionManager {
    client: AuthApiClient,
    state: Arc<watch::Sender<Option<Session>>>,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(client: AuthApiClient) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            client,
            state: Arc::new(state),
        }
    }

    /// Auth client used by this manager
    pub fn client(&self) -> &AuthApiClient {
        &self.client
    }

    /// Log in and install the resulting session
    pub async fn login(&self, form: &LoginForm) -> SessionResult<Session> {
        form.validate().map_err(SessionError::InvalidLogin)?;

        let data = self.client.login(&form.to_request()).await?;
        Ok(self.install(Session::from_auth_data(data, Utc::now())))
    }

    /// Sign up and install the resulting session
    pub async fn sign_up(&self, form: &SignUpForm) -> SessionResult<Session> {
        form.validate(today())?;

        let data = self.client.sign_up(&form.to_request()).await?;
        Ok(self.install(Session::from_auth_data(data, Utc::now())))
    }

    /// Rebuild the session from a previously stored token
    ///
    /// Returns `None` when no token is stored or the backend rejects it; the
    /// stored token itself is left alone.
    pub async fn restore(&self) -> Option<Session> {
        let token = self.client.token_store().get()?;

        match self.client.current_user().await {
            Ok(user) => {
                let session = Session::from_stored_token(token, user);
                Some(self.install(session))
            }
            Err(e) => {
                warn!("Failed to restore session: {}", e);
                self.clear();
                None
            }
        }
    }

    /// Log out and destroy the session
    pub async fn logout(&self) -> SessionResult<()> {
        self.client.logout().await?;
        self.clear();
        Ok(())
    }

    /// Current session, if any
    pub fn current(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some()
    }

    /// Bearer token of a live session; an expired session is dropped
    pub fn bearer_token(&self) -> Option<String> {
        let session = self.current()?;
        if session.is_expired_at(Utc::now()) {
            info!("Session for {} expired", session.user.username);
            self.clear();
            return None;
        }
        Some(session.access_token)
    }

    /// Observe session changes
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.state.subscribe()
    }

    fn install(&self, session: Session) -> Session {
        info!("Session started for {}", session.user.username);
        self.state.send_replace(Some(session.clone()));
        session
    }

    fn clear(&self) {
        if self.state.send_replace(None).is_some() {
            info!("Session cleared");
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
