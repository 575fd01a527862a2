//! Admin controller tests
//!
//! Biometrics and the admin API are scripted in-process and the tokio clock
//! is paused, so session and impersonation expiry are driven with
//! `tokio::time::advance`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use admin::{
    AdminConfig, AdminController, AdminError, AuditEvent, AuditSink, BiometricAuthenticator,
    BiometricOutcome, BiometricPrompt,
    api::{AdminApi, BanRequest, ImpersonationRequest, ImpersonationResponse, ShadowbanRequest},
    audit::ImpersonationEnd,
};
use async_trait::async_trait;
use auth::{MemoryTokenStore, TokenStore};
use common::{ClientError, ClientResult};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use tokio::time::{Instant, advance};
use tokio_test::{assert_err, assert_ok};

const GOOD_REASON: &str = "Investigating reported account takeover";

fn mint_token(username: &str, is_founder: bool) -> String {
    let claims = json!({
        "sub": "user-1",
        "username": username,
        "is_founder": is_founder,
        "iat": 1_700_000_000,
        "exp": 4_100_000_000i64,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"backend-secret"),
    )
    .expect("Failed to mint token")
}

async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Replays queued outcomes, then succeeds
#[derive(Default)]
struct ScriptedBiometric {
    outcomes: Mutex<VecDeque<BiometricOutcome>>,
    prompts: Mutex<Vec<BiometricPrompt>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedBiometric {
    fn push(&self, outcome: BiometricOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl BiometricAuthenticator for ScriptedBiometric {
    async fn authenticate(&self, prompt: &BiometricPrompt) -> BiometricOutcome {
        self.prompts.lock().unwrap().push(prompt.clone());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(BiometricOutcome::Success)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Ban {
        token: String,
        user_id: String,
        reason: String,
        duration: u64,
    },
    Shadowban {
        user_id: String,
        reason: String,
    },
    Impersonate {
        user_id: String,
        reason: String,
        password: String,
    },
    EndImpersonation {
        token: String,
        user_id: String,
    },
}

struct RecordingApi {
    calls: Mutex<Vec<Call>>,
    fail_status: Mutex<Option<u16>>,
    impersonation_token: Mutex<Option<String>>,
}

impl Default for RecordingApi {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_status: Mutex::new(None),
            impersonation_token: Mutex::new(Some("impersonation-token".to_string())),
        }
    }
}

impl RecordingApi {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn end_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::EndImpersonation { .. }))
            .count()
    }

    fn fail_with(&self, status: u16) {
        *self.fail_status.lock().unwrap() = Some(status);
    }

    fn outcome(&self, call: Call) -> ClientResult<()> {
        self.calls.lock().unwrap().push(call);
        match *self.fail_status.lock().unwrap() {
            Some(status) => Err(ClientError::Http {
                status,
                message: "Internal Server Error".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AdminApi for RecordingApi {
    async fn ban_user(&self, token: &str, user_id: &str, request: &BanRequest) -> ClientResult<()> {
        self.outcome(Call::Ban {
            token: token.to_string(),
            user_id: user_id.to_string(),
            reason: request.reason.clone(),
            duration: request.duration,
        })
    }

    async fn shadowban_user(
        &self,
        _token: &str,
        user_id: &str,
        request: &ShadowbanRequest,
    ) -> ClientResult<()> {
        self.outcome(Call::Shadowban {
            user_id: user_id.to_string(),
            reason: request.reason.clone(),
        })
    }

    async fn impersonate_user(
        &self,
        _token: &str,
        user_id: &str,
        request: &ImpersonationRequest,
    ) -> ClientResult<ImpersonationResponse> {
        self.outcome(Call::Impersonate {
            user_id: user_id.to_string(),
            reason: request.reason.clone(),
            password: request.password.clone(),
        })?;
        Ok(ImpersonationResponse {
            impersonation_token: self.impersonation_token.lock().unwrap().clone(),
        })
    }

    async fn end_impersonation(&self, token: &str, user_id: &str) -> ClientResult<()> {
        self.outcome(Call::EndImpersonation {
            token: token.to_string(),
            user_id: user_id.to_string(),
        })
    }
}

#[derive(Default)]
struct RecordingAudit {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAudit {
    fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl AuditSink for RecordingAudit {
    fn record(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }
}

struct Harness {
    controller: AdminController,
    tokens: Arc<MemoryTokenStore>,
    biometric: Arc<ScriptedBiometric>,
    api: Arc<RecordingApi>,
    audit: Arc<RecordingAudit>,
}

fn harness_with_token(token: Option<String>) -> Harness {
    let tokens = Arc::new(match token {
        Some(token) => MemoryTokenStore::with_token(token),
        None => MemoryTokenStore::new(),
    });
    let biometric = Arc::new(ScriptedBiometric::default());
    let api = Arc::new(RecordingApi::default());
    let audit = Arc::new(RecordingAudit::default());

    let controller = AdminController::new(
        AdminConfig::default(),
        tokens.clone(),
        biometric.clone(),
        api.clone(),
        audit.clone(),
    );

    Harness {
        controller,
        tokens,
        biometric,
        api,
        audit,
    }
}

fn founder_harness() -> Harness {
    harness_with_token(Some(mint_token("neoqiss", true)))
}

async fn active_founder() -> Harness {
    let h = founder_harness();
    assert_ok!(h.controller.request_admin_access().await);
    h
}

#[tokio::test(start_paused = true)]
async fn test_non_founder_is_rejected_without_prompt() {
    for token in [
        Some(mint_token("someone", true)),
        Some(mint_token("neoqiss", false)),
        Some("not-a-token".to_string()),
        None,
    ] {
        let h = harness_with_token(token);
        assert!(!h.controller.is_founder_account());

        let result = h.controller.request_admin_access().await;
        assert!(matches!(result, Err(AdminError::NotFounder)));
        assert_eq!(h.biometric.calls(), 0);
        assert!(!h.controller.is_admin_active());
    }
}

#[tokio::test(start_paused = true)]
async fn test_failed_biometric_keeps_admin_inactive() {
    for outcome in [
        BiometricOutcome::Failed,
        BiometricOutcome::Cancelled,
        BiometricOutcome::Unavailable,
    ] {
        let h = founder_harness();
        h.biometric.push(outcome);

        let result = h.controller.request_admin_access().await;
        assert!(matches!(result, Err(AdminError::BiometricRejected(o)) if o == outcome));
        assert!(!h.controller.is_admin_active());
    }
}

#[tokio::test(start_paused = true)]
async fn test_session_expires_after_fifteen_minutes() {
    let h = founder_harness();
    let started = Instant::now();

    let status = assert_ok!(h.controller.request_admin_access().await);
    assert!(status.active);
    assert_eq!(status.expires_at, Some(started + Duration::from_secs(15 * 60)));
    assert_eq!(h.biometric.prompts.lock().unwrap()[0], BiometricPrompt::admin_access());

    advance(Duration::from_secs(14 * 60 + 59)).await;
    settle().await;
    assert!(h.controller.is_admin_active());

    advance(Duration::from_secs(1)).await;
    settle().await;
    assert!(!h.controller.is_admin_active());
    assert_eq!(h.controller.status().expires_at, None);

    let events = h.audit.events();
    assert!(events.contains(&AuditEvent::SessionStarted { timeout_secs: 900 }));
    assert_eq!(events.last(), Some(&AuditEvent::SessionExpired));
}

#[tokio::test(start_paused = true)]
async fn test_extend_restarts_countdown() {
    let h = active_founder().await;

    advance(Duration::from_secs(10 * 60)).await;
    settle().await;
    let extended_at = Instant::now();

    let status = assert_ok!(h.controller.extend_admin_session().await);
    assert_eq!(
        status.expires_at,
        Some(extended_at + Duration::from_secs(15 * 60))
    );

    // the first deadline passes without effect
    advance(Duration::from_secs(10 * 60)).await;
    settle().await;
    assert!(h.controller.is_admin_active());

    advance(Duration::from_secs(5 * 60)).await;
    settle().await;
    assert!(!h.controller.is_admin_active());
}

#[tokio::test(start_paused = true)]
async fn test_failed_extend_ends_session() {
    let h = active_founder().await;
    h.biometric.push(BiometricOutcome::Failed);

    let result = h.controller.extend_admin_session().await;
    assert!(matches!(
        result,
        Err(AdminError::BiometricRejected(BiometricOutcome::Failed))
    ));
    assert!(!h.controller.is_admin_active());
}

#[tokio::test(start_paused = true)]
async fn test_extend_requires_active_session() {
    let h = founder_harness();

    let result = h.controller.extend_admin_session().await;
    assert!(matches!(result, Err(AdminError::NotActive)));
    assert_eq!(h.biometric.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_extend_after_expiry_during_prompt() {
    let h = active_founder().await;
    h.biometric.set_delay(Duration::from_secs(16 * 60));

    let result = h.controller.extend_admin_session().await;
    assert!(matches!(result, Err(AdminError::NotActive)));
    assert!(!h.controller.is_admin_active());
}

#[tokio::test(start_paused = true)]
async fn test_request_while_active_refreshes_or_keeps() {
    let h = active_founder().await;
    let first_expiry = h.controller.status().expires_at;

    advance(Duration::from_secs(60)).await;
    h.biometric.push(BiometricOutcome::Cancelled);
    assert_err!(h.controller.request_admin_access().await);
    assert!(h.controller.is_admin_active());
    assert_eq!(h.controller.status().expires_at, first_expiry);

    let status = assert_ok!(h.controller.request_admin_access().await);
    assert_eq!(
        status.expires_at,
        Some(Instant::now() + Duration::from_secs(15 * 60))
    );
}

#[tokio::test(start_paused = true)]
async fn test_end_admin_session_is_idempotent() {
    let h = active_founder().await;

    h.controller.end_admin_session().await;
    assert!(!h.controller.is_admin_active());
    h.controller.end_admin_session().await;
    assert!(!h.controller.is_admin_active());

    let ended = h
        .audit
        .events()
        .iter()
        .filter(|e| **e == AuditEvent::SessionEnded)
        .count();
    assert_eq!(ended, 1);

    // the cancelled countdown never reports an expiry
    advance(Duration::from_secs(20 * 60)).await;
    settle().await;
    assert!(!h.audit.events().contains(&AuditEvent::SessionExpired));
}

#[tokio::test(start_paused = true)]
async fn test_ban_is_permanent_and_needs_biometric() {
    let h = active_founder().await;

    assert_ok!(h.controller.ban_user("user-42", "spam").await);

    assert_eq!(
        h.api.calls(),
        vec![Call::Ban {
            token: mint_token("neoqiss", true),
            user_id: "user-42".to_string(),
            reason: "spam".to_string(),
            duration: 0,
        }]
    );
    assert_eq!(h.biometric.calls(), 2);
    assert_eq!(h.biometric.prompts.lock().unwrap()[1], BiometricPrompt::ban_user());
    assert!(h.audit.events().contains(&AuditEvent::UserBanned {
        user_id: "user-42".to_string()
    }));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_actions_each_prompt() {
    let h = active_founder().await;

    let (a, b) = tokio::join!(
        h.controller.ban_user("user-1", "spam"),
        h.controller.shadowban_user("user-2", "harassment")
    );
    assert_ok!(a);
    assert_ok!(b);

    assert_eq!(h.biometric.calls(), 3);
    assert_eq!(h.api.calls().len(), 2);
    assert!(h.api.calls().contains(&Call::Shadowban {
        user_id: "user-2".to_string(),
        reason: "harassment".to_string(),
    }));
}

#[tokio::test(start_paused = true)]
async fn test_moderation_requires_active_session() {
    let h = founder_harness();

    assert!(matches!(
        h.controller.ban_user("user-1", "spam").await,
        Err(AdminError::NotActive)
    ));
    assert!(matches!(
        h.controller.shadowban_user("user-1", "spam").await,
        Err(AdminError::NotActive)
    ));
    assert_eq!(h.biometric.calls(), 0);
    assert!(h.api.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_rejected_biometric_skips_network() {
    let h = active_founder().await;
    h.biometric.push(BiometricOutcome::Cancelled);

    let result = h.controller.shadowban_user("user-1", "spam").await;
    assert!(matches!(result, Err(AdminError::BiometricRejected(_))));
    assert!(h.api.calls().is_empty());
    assert!(h.controller.is_admin_active());
}

#[tokio::test(start_paused = true)]
async fn test_backend_failure_surfaces_status() {
    let h = active_founder().await;
    h.api.fail_with(500);

    let error = h.controller.ban_user("user-1", "spam").await.unwrap_err();
    assert_eq!(error.status(), Some(500));
    assert!(h.controller.is_admin_active());
    assert!(
        h.audit
            .events()
            .iter()
            .any(|e| matches!(e, AuditEvent::ActionFailed { action, .. } if action == "ban user"))
    );
}

#[tokio::test(start_paused = true)]
async fn test_short_reason_is_rejected_first() {
    let h = active_founder().await;
    let nineteen = "a".repeat(19);

    let result = h
        .controller
        .impersonate_user("user-7", &nineteen, "Correct1Horse")
        .await;
    assert!(matches!(
        result,
        Err(AdminError::ReasonTooShort { min: 20, actual: 19 })
    ));
    assert_eq!(h.biometric.calls(), 1);
    assert!(h.api.calls().is_empty());

    // whitespace padding does not count
    let padded = format!("   {}   ", nineteen);
    assert_err!(
        h.controller
            .impersonate_user("user-7", &padded, "Correct1Horse")
            .await
    );

    let twenty = "a".repeat(20);
    assert_ok!(
        h.controller
            .impersonate_user("user-7", &twenty, "Correct1Horse")
            .await
    );
}

#[tokio::test(start_paused = true)]
async fn test_short_reason_wins_over_inactive_session() {
    let h = founder_harness();

    let result = h.controller.impersonate_user("user-7", "too short", "pw").await;
    assert!(matches!(result, Err(AdminError::ReasonTooShort { .. })));

    let result = h.controller.impersonate_user("user-7", GOOD_REASON, "pw").await;
    assert!(matches!(result, Err(AdminError::NotActive)));
    assert_eq!(h.biometric.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_impersonation_expires_after_ten_minutes() {
    let h = active_founder().await;
    let started = Instant::now();

    let grant = assert_ok!(
        h.controller
            .impersonate_user("user-7", GOOD_REASON, "Correct1Horse")
            .await
    );
    assert_eq!(grant.user_id, "user-7");
    assert_eq!(grant.token, "impersonation-token");
    assert_eq!(grant.expires_at, started + Duration::from_secs(10 * 60));
    assert!(!format!("{:?}", grant).contains("impersonation-token"));

    let status = h.controller.status();
    assert_eq!(status.impersonating.as_deref(), Some("user-7"));
    assert_eq!(status.impersonation_expires_at, Some(grant.expires_at));

    assert_eq!(
        h.api.calls()[0],
        Call::Impersonate {
            user_id: "user-7".to_string(),
            reason: GOOD_REASON.to_string(),
            password: "Correct1Horse".to_string(),
        }
    );

    advance(Duration::from_secs(9 * 60 + 59)).await;
    settle().await;
    assert_eq!(h.api.end_calls(), 0);

    advance(Duration::from_secs(1)).await;
    settle().await;
    assert_eq!(h.api.end_calls(), 1);
    assert_eq!(h.controller.status().impersonating, None);
    assert!(h.controller.is_admin_active());

    advance(Duration::from_secs(4 * 60)).await;
    settle().await;
    assert_eq!(h.api.end_calls(), 1);

    assert!(h.audit.events().contains(&AuditEvent::ImpersonationEnded {
        user_id: "user-7".to_string(),
        cause: ImpersonationEnd::Expired,
    }));
}

#[tokio::test(start_paused = true)]
async fn test_one_impersonation_at_a_time() {
    let h = active_founder().await;
    assert_ok!(
        h.controller
            .impersonate_user("user-7", GOOD_REASON, "Correct1Horse")
            .await
    );

    let result = h
        .controller
        .impersonate_user("user-8", GOOD_REASON, "Correct1Horse")
        .await;
    assert!(matches!(result, Err(AdminError::ImpersonationInProgress(ref id)) if id == "user-7"));
    assert_eq!(h.api.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_impersonation_token_is_failure() {
    for token in [None, Some(String::new()), Some("   ".to_string())] {
        let h = active_founder().await;
        *h.api.impersonation_token.lock().unwrap() = token;

        let result = h
            .controller
            .impersonate_user("user-7", GOOD_REASON, "Correct1Horse")
            .await;
        assert!(matches!(result, Err(AdminError::MissingImpersonationToken)));
        assert_eq!(h.controller.status().impersonating, None);
    }
}

#[tokio::test(start_paused = true)]
async fn test_wrong_password_is_backend_failure() {
    let h = active_founder().await;
    h.api.fail_with(401);

    let error = h
        .controller
        .impersonate_user("user-7", GOOD_REASON, "wrong")
        .await
        .unwrap_err();
    assert_eq!(error.status(), Some(401));
    assert_eq!(h.controller.status().impersonating, None);
}

#[tokio::test(start_paused = true)]
async fn test_end_impersonation_early() {
    let h = active_founder().await;

    assert!(matches!(
        h.controller.end_impersonation().await,
        Err(AdminError::NoImpersonation)
    ));

    assert_ok!(
        h.controller
            .impersonate_user("user-7", GOOD_REASON, "Correct1Horse")
            .await
    );
    assert_ok!(h.controller.end_impersonation().await);
    assert_eq!(h.controller.status().impersonating, None);
    assert_eq!(
        h.api.calls().last(),
        Some(&Call::EndImpersonation {
            token: mint_token("neoqiss", true),
            user_id: "user-7".to_string(),
        })
    );

    // the cancelled timer stays quiet
    advance(Duration::from_secs(11 * 60)).await;
    settle().await;
    assert_eq!(h.api.end_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_end_impersonation_clears_locally_on_network_failure() {
    let h = active_founder().await;
    assert_ok!(
        h.controller
            .impersonate_user("user-7", GOOD_REASON, "Correct1Horse")
            .await
    );
    h.api.fail_with(503);

    let error = h.controller.end_impersonation().await.unwrap_err();
    assert_eq!(error.status(), Some(503));
    assert_eq!(h.controller.status().impersonating, None);
}

#[tokio::test(start_paused = true)]
async fn test_ending_session_ends_impersonation() {
    let h = active_founder().await;
    assert_ok!(
        h.controller
            .impersonate_user("user-7", GOOD_REASON, "Correct1Horse")
            .await
    );

    h.controller.end_admin_session().await;
    assert_eq!(h.api.end_calls(), 1);
    assert_eq!(h.controller.status(), Default::default());

    advance(Duration::from_secs(20 * 60)).await;
    settle().await;
    assert_eq!(h.api.end_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_session_expiry_ends_impersonation() {
    let h = active_founder().await;

    // start the grant late so it outlives the session
    advance(Duration::from_secs(10 * 60)).await;
    assert_ok!(
        h.controller
            .impersonate_user("user-7", GOOD_REASON, "Correct1Horse")
            .await
    );

    advance(Duration::from_secs(5 * 60)).await;
    settle().await;
    assert!(!h.controller.is_admin_active());
    assert_eq!(h.api.end_calls(), 1);
    assert!(h.audit.events().contains(&AuditEvent::ImpersonationEnded {
        user_id: "user-7".to_string(),
        cause: ImpersonationEnd::SessionEnded,
    }));

    advance(Duration::from_secs(10 * 60)).await;
    settle().await;
    assert_eq!(h.api.end_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_logout_after_activation_ends_session() {
    let h = active_founder().await;
    h.tokens.delete();

    let result = h.controller.ban_user("user-1", "spam").await;
    assert!(matches!(result, Err(AdminError::NotAuthenticated)));
    assert!(!h.controller.is_admin_active());
    assert_eq!(h.biometric.calls(), 1);
    assert!(h.api.calls().is_empty());
    assert!(h.audit.events().contains(&AuditEvent::SessionEnded));
}

#[tokio::test(start_paused = true)]
async fn test_account_switch_after_activation_ends_session() {
    let h = active_founder().await;
    h.tokens.save(&mint_token("someone", false));

    let result = h.controller.extend_admin_session().await;
    assert!(matches!(result, Err(AdminError::NotFounder)));
    assert!(!h.controller.is_admin_active());

    // the session stays ended for later calls
    let result = h.controller.ban_user("user-1", "spam").await;
    assert!(matches!(result, Err(AdminError::NotActive)));
    assert_eq!(h.biometric.calls(), 1);
    assert!(h.api.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_account_switch_blocks_each_privileged_call() {
    for action in ["ban", "shadowban", "impersonate"] {
        let h = active_founder().await;
        h.tokens.save(&mint_token("someone", false));

        let result = match action {
            "ban" => h.controller.ban_user("user-1", "spam").await,
            "shadowban" => h.controller.shadowban_user("user-1", "spam").await,
            _ => h
                .controller
                .impersonate_user("user-1", GOOD_REASON, "Correct1Horse")
                .await
                .map(|_| ()),
        };

        assert!(matches!(result, Err(AdminError::NotFounder)), "{}", action);
        assert!(!h.controller.is_admin_active(), "{}", action);
        assert_eq!(h.biometric.calls(), 1, "{}", action);
        assert!(h.api.calls().is_empty(), "{}", action);
    }
}

#[tokio::test(start_paused = true)]
async fn test_account_switch_during_prompt_sends_nothing() {
    let h = active_founder().await;
    h.biometric.set_delay(Duration::from_secs(5));

    let controller = h.controller.clone();
    let ban = tokio::spawn(async move { controller.ban_user("user-1", "spam").await });
    settle().await;
    h.tokens.save(&mint_token("someone", false));

    let result = ban.await.unwrap();
    assert!(matches!(result, Err(AdminError::NotFounder)));
    assert!(!h.controller.is_admin_active());
    assert!(h.api.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_impersonation_ends_with_admin_token_after_logout() {
    let h = active_founder().await;
    assert_ok!(
        h.controller
            .impersonate_user("user-7", GOOD_REASON, "Correct1Horse")
            .await
    );
    h.tokens.delete();

    assert_err!(h.controller.extend_admin_session().await);
    assert!(!h.controller.is_admin_active());
    assert_eq!(
        h.api.calls().last(),
        Some(&Call::EndImpersonation {
            token: mint_token("neoqiss", true),
            user_id: "user-7".to_string(),
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_observe_transitions() {
    let h = founder_harness();
    let mut status = h.controller.subscribe();
    assert!(!status.borrow().active);

    assert_ok!(h.controller.request_admin_access().await);
    assert_ok!(status.changed().await);
    assert!(status.borrow_and_update().active);

    advance(Duration::from_secs(15 * 60)).await;
    assert_ok!(status.changed().await);
    assert!(!status.borrow_and_update().active);
}

#[tokio::test(start_paused = true)]
async fn test_failed_teardown_call_is_not_retried() {
    let h = active_founder().await;
    assert_ok!(
        h.controller
            .impersonate_user("user-7", GOOD_REASON, "Correct1Horse")
            .await
    );
    h.api.fail_with(503);

    h.controller.end_admin_session().await;
    assert_eq!(h.controller.status(), Default::default());
    assert_eq!(h.api.end_calls(), 1);

    advance(Duration::from_secs(20 * 60)).await;
    settle().await;
    assert_eq!(h.api.end_calls(), 1);
}
