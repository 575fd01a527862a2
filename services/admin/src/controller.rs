//! Founder admin-access controller
//!
//! Gates the admin surface behind the founder check, a biometric challenge
//! and a wall-clock session timeout, and runs the supervised, time-boxed
//! impersonation capability nested inside an active admin session.
//!
//! ```text
//! Inactive --(founder + biometric ok)--> Active(now + 15m)
//! Active   --(countdown fires)---------> Inactive
//! Active   --(extend + biometric ok)---> Active(now + 15m)
//! Active   --(extend + biometric fail)-> Inactive
//! any      --(end_admin_session)-------> Inactive
//!
//! inside Active:
//! None     --(reason ok + biometric ok + password ok)--> Granted(now + 10m)
//! Granted  --(timer fires | end | parent ends)---------> None
//! ```
//!
//! Every rejected call leaves the state as it was, except that an active
//! session whose stored token no longer belongs to the founder is ended by
//! the next call that touches it. Nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use auth::{TokenStore, jwt};
use common::{ClientError, ClientResult};

use crate::{
    api::{AdminApi, BanRequest, ImpersonationRequest, ShadowbanRequest},
    audit::{AuditEvent, AuditSink, ImpersonationEnd},
    biometric::{BiometricAuthenticator, BiometricPrompt},
    error::{AdminError, AdminResult},
    scheduler::{self, TimerHandle},
};

/// Ban duration understood by the backend as permanent
pub const PERMANENT_BAN: u64 = 0;

/// Admin controller configuration
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// The single account allowed into the admin surface
    pub founder_username: String,
    /// Lifetime of an admin session from the last successful authentication
    pub session_timeout: Duration,
    /// Lifetime of an impersonation grant
    pub impersonation_timeout: Duration,
    /// Minimum length of an impersonation justification, in characters
    pub min_reason_chars: usize,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            founder_username: "neoqiss".to_string(),
            session_timeout: Duration::from_secs(15 * 60),
            impersonation_timeout: Duration::from_secs(10 * 60),
            min_reason_chars: 20,
        }
    }
}

/// Observable snapshot of the controller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminStatus {
    pub active: bool,
    pub expires_at: Option<Instant>,
    /// User currently impersonated, if any
    pub impersonating: Option<String>,
    pub impersonation_expires_at: Option<Instant>,
}

/// A successful impersonation
///
/// `token` is the credential to use for requests made on behalf of
/// `user_id`. The grant is ended with the admin token it was obtained with,
/// not with whatever the token store holds by then.
#[derive(Clone)]
pub struct ImpersonationGrant {
    pub user_id: String,
    pub token: String,
    pub expires_at: Instant,
}

impl std::fmt::Debug for ImpersonationGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImpersonationGrant")
            .field("user_id", &self.user_id)
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

struct ActiveImpersonation {
    generation: u64,
    user_id: String,
    /// Admin credential the grant was obtained with; it is ended with it too
    admin_token: String,
    timer: TimerHandle,
}

struct ActiveSession {
    generation: u64,
    timer: TimerHandle,
    impersonation: Option<ActiveImpersonation>,
}

#[derive(Default)]
struct State {
    session: Option<ActiveSession>,
    generations: u64,
}

impl State {
    fn next_generation(&mut self) -> u64 {
        self.generations += 1;
        self.generations
    }

    fn status(&self) -> AdminStatus {
        match &self.session {
            Some(session) => AdminStatus {
                active: true,
                expires_at: Some(session.timer.deadline()),
                impersonating: session.impersonation.as_ref().map(|g| g.user_id.clone()),
                impersonation_expires_at: session
                    .impersonation
                    .as_ref()
                    .map(|g| g.timer.deadline()),
            },
            None => AdminStatus::default(),
        }
    }
}

struct Inner {
    config: AdminConfig,
    tokens: Arc<dyn TokenStore>,
    biometric: Arc<dyn BiometricAuthenticator>,
    api: Arc<dyn AdminApi>,
    audit: Arc<dyn AuditSink>,
    state: Mutex<State>,
    status: watch::Sender<AdminStatus>,
}

/// Admin-access controller
///
/// Cheap to clone; clones share one state. Build one per signed-in client
/// and hand it to the screens that need it.
#[derive(Clone)]
pub struct AdminController {
    inner: Arc<Inner>,
}

impl AdminController {
    pub fn new(
        config: AdminConfig,
        tokens: Arc<dyn TokenStore>,
        biometric: Arc<dyn BiometricAuthenticator>,
        api: Arc<dyn AdminApi>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let (status, _) = watch::channel(AdminStatus::default());
        Self {
            inner: Arc::new(Inner {
                config,
                tokens,
                biometric,
                api,
                audit,
                state: Mutex::new(State::default()),
                status,
            }),
        }
    }

    /// Whether the stored token belongs to the founder account
    ///
    /// Advisory only: decides whether to show the admin entry point. The
    /// backend authorizes every privileged call itself.
    pub fn is_founder_account(&self) -> bool {
        self.inner.is_founder_account()
    }

    /// Current snapshot
    pub fn status(&self) -> AdminStatus {
        self.inner.status.borrow().clone()
    }

    pub fn is_admin_active(&self) -> bool {
        self.status().active
    }

    /// Observe status changes
    pub fn subscribe(&self) -> watch::Receiver<AdminStatus> {
        self.inner.status.subscribe()
    }

    /// Enter admin mode
    ///
    /// Requires the founder account and a successful biometric challenge.
    /// On an already active session a successful challenge restarts the
    /// countdown; a failed one leaves the session untouched.
    pub async fn request_admin_access(&self) -> AdminResult<AdminStatus> {
        let inner = &self.inner;

        if !inner.is_founder_account() {
            warn!("Not authorized for admin access");
            inner.record(AuditEvent::AccessDenied {
                reason: "not the founder account".to_string(),
            });
            inner.end_session().await;
            return Err(AdminError::NotFounder);
        }

        inner
            .confirm("admin access", BiometricPrompt::admin_access())
            .await?;

        // the stored token may have changed while the prompt was up
        if !inner.is_founder_account() {
            inner.record(AuditEvent::AccessDenied {
                reason: "account changed during authentication".to_string(),
            });
            inner.end_session().await;
            return Err(AdminError::NotFounder);
        }

        let mut state = inner.state.lock().await;
        let refreshed = state.session.is_some();
        inner.arm_session(&mut state);
        inner.publish(&state);
        drop(state);

        let timeout_secs = inner.config.session_timeout.as_secs();
        if refreshed {
            inner.record(AuditEvent::SessionExtended { timeout_secs });
        } else {
            info!("Admin session started - founder mode active");
            inner.record(AuditEvent::SessionStarted { timeout_secs });
        }

        Ok(self.status())
    }

    /// Re-authenticate to reset the countdown
    ///
    /// A failed challenge ends the session at once.
    pub async fn extend_admin_session(&self) -> AdminResult<AdminStatus> {
        let inner = &self.inner;
        inner.require_active().await?;

        if let Err(e) = inner
            .confirm("extend admin session", BiometricPrompt::extend_session())
            .await
        {
            inner.end_session().await;
            return Err(e);
        }
        inner.require_active().await?;

        let mut state = inner.state.lock().await;
        if state.session.is_none() {
            // expired while the prompt was open
            return Err(AdminError::NotActive);
        }
        inner.arm_session(&mut state);
        inner.publish(&state);
        drop(state);

        inner.record(AuditEvent::SessionExtended {
            timeout_secs: inner.config.session_timeout.as_secs(),
        });
        Ok(self.status())
    }

    /// Leave admin mode; also ends any impersonation. Idempotent.
    pub async fn end_admin_session(&self) {
        self.inner.end_session().await;
    }

    /// Permanently ban a user
    pub async fn ban_user(&self, user_id: &str, reason: &str) -> AdminResult<()> {
        let inner = &self.inner;
        let token = inner
            .authorize("ban user", BiometricPrompt::ban_user())
            .await?;

        let request = BanRequest {
            reason: reason.to_string(),
            duration: PERMANENT_BAN,
        };

        match inner.api.ban_user(&token, user_id, &request).await {
            Ok(()) => {
                inner.record(AuditEvent::UserBanned {
                    user_id: user_id.to_string(),
                });
                Ok(())
            }
            Err(e) => Err(inner.action_failed("ban user", e)),
        }
    }

    /// Shadowban a user
    pub async fn shadowban_user(&self, user_id: &str, reason: &str) -> AdminResult<()> {
        let inner = &self.inner;
        let token = inner
            .authorize("shadowban user", BiometricPrompt::shadowban_user())
            .await?;

        let request = ShadowbanRequest {
            reason: reason.to_string(),
        };

        match inner.api.shadowban_user(&token, user_id, &request).await {
            Ok(()) => {
                inner.record(AuditEvent::UserShadowbanned {
                    user_id: user_id.to_string(),
                });
                Ok(())
            }
            Err(e) => Err(inner.action_failed("shadowban user", e)),
        }
    }

    /// Act as another user for a limited time
    ///
    /// `reason` is checked before anything else. The password is the second
    /// factor and is verified by the backend. The grant ends by itself after
    /// the impersonation timeout, or earlier with [`Self::end_impersonation`]
    /// or when the admin session ends.
    pub async fn impersonate_user(
        &self,
        user_id: &str,
        reason: &str,
        password: &str,
    ) -> AdminResult<ImpersonationGrant> {
        let inner = &self.inner;

        let min = inner.config.min_reason_chars;
        let actual = reason.trim().chars().count();
        if actual < min {
            warn!("Impersonation reason too short ({} < {})", actual, min);
            return Err(AdminError::ReasonTooShort { min, actual });
        }

        inner.require_no_impersonation().await?;

        let token = inner
            .authorize("impersonate user", BiometricPrompt::impersonate_user())
            .await?;

        let request = ImpersonationRequest {
            reason: reason.trim().to_string(),
            password: password.to_string(),
        };

        let response = inner
            .api
            .impersonate_user(&token, user_id, &request)
            .await
            .map_err(|e| inner.action_failed("impersonate user", e))?;

        let Some(impersonation_token) = response
            .impersonation_token
            .filter(|t| !t.trim().is_empty())
        else {
            inner.record(AuditEvent::ActionFailed {
                action: "impersonate user".to_string(),
                error: "no impersonation token returned".to_string(),
            });
            return Err(AdminError::MissingImpersonationToken);
        };

        let mut state = inner.state.lock().await;
        let conflict = match &state.session {
            None => Some(AdminError::NotActive),
            Some(session) => session
                .impersonation
                .as_ref()
                .map(|g| AdminError::ImpersonationInProgress(g.user_id.clone())),
        };

        if let Some(conflict) = conflict {
            drop(state);
            // the backend granted it but we can no longer hold it
            if let Err(e) = inner.api.end_impersonation(&token, user_id).await {
                error!("Failed to end orphaned impersonation: {}", e);
            }
            return Err(conflict);
        }

        let expires_at = inner.arm_impersonation(&mut state, user_id, token);
        inner.publish(&state);
        drop(state);

        info!("Impersonating user {}", user_id);
        inner.record(AuditEvent::ImpersonationStarted {
            user_id: user_id.to_string(),
            timeout_secs: inner.config.impersonation_timeout.as_secs(),
        });

        Ok(ImpersonationGrant {
            user_id: user_id.to_string(),
            token: impersonation_token,
            expires_at,
        })
    }

    /// End the running impersonation early
    ///
    /// The grant is dropped locally even if the backend cannot be told; the
    /// error is still returned so the caller knows.
    pub async fn end_impersonation(&self) -> AdminResult<()> {
        let inner = &self.inner;

        let grant = {
            let mut state = inner.state.lock().await;
            let session = state.session.as_mut().ok_or(AdminError::NotActive)?;
            let grant = session
                .impersonation
                .take()
                .ok_or(AdminError::NoImpersonation)?;
            inner.publish(&state);
            grant
        };

        inner
            .finish_impersonation(grant, ImpersonationEnd::Revoked)
            .await?;
        Ok(())
    }
}

impl Inner {
    fn is_founder_account(&self) -> bool {
        match self.tokens.get() {
            Some(token) => jwt::is_founder_token(&token, &self.config.founder_username),
            None => false,
        }
    }

    fn record(&self, event: AuditEvent) {
        self.audit.record(event);
    }

    fn publish(&self, state: &State) {
        self.status.send_replace(state.status());
    }

    fn action_failed(&self, action: &str, e: ClientError) -> AdminError {
        error!("Failed to {}: {}", action, e);
        self.record(AuditEvent::ActionFailed {
            action: action.to_string(),
            error: e.to_string(),
        });
        AdminError::Client(e)
    }

    async fn confirm(&self, action: &str, prompt: BiometricPrompt) -> AdminResult<()> {
        let outcome = self.biometric.authenticate(&prompt).await;
        if outcome.is_success() {
            return Ok(());
        }

        warn!("Biometric authentication for {} did not succeed: {:?}", action, outcome);
        self.record(AuditEvent::BiometricRejected {
            action: action.to_string(),
            outcome: format!("{:?}", outcome).to_lowercase(),
        });
        Err(AdminError::BiometricRejected(outcome))
    }

    /// Active session still backed by the founder's token
    ///
    /// A session whose token was deleted or replaced by another account's is
    /// ended on the spot.
    async fn require_active(&self) -> AdminResult<()> {
        if self.state.lock().await.session.is_none() {
            warn!("Admin session is not active");
            return Err(AdminError::NotActive);
        }

        let error = match self.tokens.get() {
            None => AdminError::NotAuthenticated,
            Some(token) if !jwt::is_founder_token(&token, &self.config.founder_username) => {
                AdminError::NotFounder
            }
            Some(_) => return Ok(()),
        };

        warn!("Admin session lost its founder token: {}", error);
        self.record(AuditEvent::AccessDenied {
            reason: "founder token no longer stored".to_string(),
        });
        self.end_session().await;
        Err(error)
    }

    async fn require_no_impersonation(&self) -> AdminResult<()> {
        self.require_active().await?;
        let state = self.state.lock().await;
        match &state.session {
            None => {
                warn!("Admin session is not active");
                Err(AdminError::NotActive)
            }
            Some(session) => match &session.impersonation {
                Some(grant) => Err(AdminError::ImpersonationInProgress(grant.user_id.clone())),
                None => Ok(()),
            },
        }
    }

    /// Active session, fresh biometric proof, then the founder's bearer token
    ///
    /// The session is checked again after the prompt since it may have
    /// expired, or the stored account changed, meanwhile.
    async fn authorize(&self, action: &str, prompt: BiometricPrompt) -> AdminResult<String> {
        self.require_active().await?;
        self.confirm(action, prompt).await?;
        self.require_active().await?;
        self.tokens
            .get()
            .filter(|token| jwt::is_founder_token(token, &self.config.founder_username))
            .ok_or(AdminError::NotFounder)
    }

    /// Start or restart the session countdown
    fn arm_session(self: &Arc<Self>, state: &mut State) {
        let generation = state.next_generation();
        let weak = Arc::downgrade(self);
        let timer = scheduler::schedule(self.config.session_timeout, async move {
            if let Some(inner) = weak.upgrade() {
                inner.expire_session(generation).await;
            }
        });

        match state.session.as_mut() {
            // replacing the handle cancels the previous countdown
            Some(session) => {
                session.generation = generation;
                session.timer = timer;
            }
            None => {
                state.session = Some(ActiveSession {
                    generation,
                    timer,
                    impersonation: None,
                });
            }
        }
    }

    fn arm_impersonation(
        self: &Arc<Self>,
        state: &mut State,
        user_id: &str,
        admin_token: String,
    ) -> Instant {
        let generation = state.next_generation();
        let weak = Arc::downgrade(self);
        let timer = scheduler::schedule(self.config.impersonation_timeout, async move {
            if let Some(inner) = weak.upgrade() {
                inner.expire_impersonation(generation).await;
            }
        });
        let expires_at = timer.deadline();

        if let Some(session) = state.session.as_mut() {
            session.impersonation = Some(ActiveImpersonation {
                generation,
                user_id: user_id.to_string(),
                admin_token,
                timer,
            });
        }
        expires_at
    }

    async fn expire_session(&self, generation: u64) {
        let session = {
            let mut state = self.state.lock().await;
            if state.session.as_ref().map(|s| s.generation) != Some(generation) {
                return;
            }
            let session = state.session.take();
            self.publish(&state);
            session
        };

        if let Some(ActiveSession {
            timer,
            impersonation,
            ..
        }) = session
        {
            // running inside this timer's task
            timer.detach();
            info!("Admin session expired");
            self.record(AuditEvent::SessionExpired);
            self.close_impersonation(impersonation).await;
        }
    }

    async fn end_session(&self) {
        let session = {
            let mut state = self.state.lock().await;
            let session = state.session.take();
            if session.is_some() {
                self.publish(&state);
            }
            session
        };

        if let Some(ActiveSession {
            timer,
            impersonation,
            ..
        }) = session
        {
            timer.cancel();
            info!("Admin session ended");
            self.record(AuditEvent::SessionEnded);
            self.close_impersonation(impersonation).await;
        }
    }

    async fn close_impersonation(&self, impersonation: Option<ActiveImpersonation>) {
        if let Some(grant) = impersonation {
            if let Err(e) = self
                .finish_impersonation(grant, ImpersonationEnd::SessionEnded)
                .await
            {
                debug!("Not retrying end of impersonation: {}", e);
            }
        }
    }

    async fn expire_impersonation(&self, generation: u64) {
        let grant = {
            let mut state = self.state.lock().await;
            let Some(session) = state.session.as_mut() else {
                return;
            };
            if session.impersonation.as_ref().map(|g| g.generation) != Some(generation) {
                return;
            }
            let grant = session.impersonation.take();
            self.publish(&state);
            grant
        };

        if let Some(grant) = grant {
            if let Err(e) = self
                .finish_impersonation(grant, ImpersonationEnd::Expired)
                .await
            {
                debug!("Not retrying end of expired impersonation: {}", e);
            }
        }
    }

    async fn finish_impersonation(
        &self,
        grant: ActiveImpersonation,
        cause: ImpersonationEnd,
    ) -> ClientResult<()> {
        let ActiveImpersonation {
            user_id,
            admin_token,
            timer,
            ..
        } = grant;
        if cause == ImpersonationEnd::Expired {
            timer.detach();
        } else {
            timer.cancel();
        }

        self.record(AuditEvent::ImpersonationEnded {
            user_id: user_id.clone(),
            cause,
        });

        match self.api.end_impersonation(&admin_token, &user_id).await {
            Ok(()) => {
                info!("Impersonation session ended");
                Ok(())
            }
            Err(e) => {
                error!("Failed to end impersonation of {}: {}", user_id, e);
                Err(e)
            }
        }
    }
}
