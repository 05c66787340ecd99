use std::collections::HashMap;

use async_trait::async_trait;
use opsdesk_core::{AppError, AppResult};
use opsdesk_domain::UserId;
use tokio::sync::Mutex;

use crate::{KeyValueStore, MemoryKeyValueStore, Navigator, SessionClient, SessionRef};

use super::{
    IMPERSONATION_KEY, ImpersonationBanner, ImpersonationSession, ORIGINAL_SESSION_KEY,
    SIGN_IN_PATH,
};

#[derive(Default)]
struct FakeBackend {
    active: Option<SessionRef>,
    links: HashMap<String, SessionRef>,
    calls: Vec<String>,
    fail_restore: bool,
    expire_restore: bool,
}

#[derive(Default)]
struct FakeSessionClient {
    backend: Mutex<FakeBackend>,
}

impl FakeSessionClient {
    fn signed_in_as(session: &str) -> Self {
        Self {
            backend: Mutex::new(FakeBackend {
                active: Some(SessionRef::new(session)),
                ..FakeBackend::default()
            }),
        }
    }

    async fn with_link(self, link: &str, session: &str) -> Self {
        self.backend
            .lock()
            .await
            .links
            .insert(link.to_owned(), SessionRef::new(session));
        self
    }

    async fn active(&self) -> Option<SessionRef> {
        self.backend.lock().await.active.clone()
    }

    async fn calls(&self) -> Vec<String> {
        self.backend.lock().await.calls.clone()
    }

    async fn fail_restore(&self, fail: bool) {
        self.backend.lock().await.fail_restore = fail;
    }

    async fn expire_restore(&self) {
        self.backend.lock().await.expire_restore = true;
    }
}

#[async_trait]
impl SessionClient for FakeSessionClient {
    async fn current_session(&self) -> AppResult<Option<SessionRef>> {
        Ok(self.backend.lock().await.active.clone())
    }

    async fn set_session(&self, session: SessionRef) -> AppResult<()> {
        let mut backend = self.backend.lock().await;
        backend.calls.push(format!("set_session:{}", session.as_str()));
        if backend.fail_restore {
            return Err(AppError::Internal("auth backend unavailable".to_owned()));
        }
        if backend.expire_restore {
            return Err(AppError::Unauthorized("session expired".to_owned()));
        }

        backend.active = Some(session);
        Ok(())
    }

    async fn sign_out(&self) -> AppResult<()> {
        let mut backend = self.backend.lock().await;
        backend.calls.push("sign_out".to_owned());
        backend.active = None;
        Ok(())
    }

    async fn follow_sign_in_link(&self, link: &str) -> AppResult<SessionRef> {
        let mut backend = self.backend.lock().await;
        backend.calls.push("follow".to_owned());

        let session = backend
            .links
            .remove(link)
            .ok_or_else(|| AppError::Unauthorized("invalid or expired link".to_owned()))?;
        backend.active = Some(session.clone());
        Ok(session)
    }
}

#[derive(Default)]
struct RecordingNavigator {
    paths: Mutex<Vec<String>>,
}

#[async_trait]
impl Navigator for RecordingNavigator {
    async fn navigate(&self, path: &str) -> AppResult<()> {
        self.paths.lock().await.push(path.to_owned());
        Ok(())
    }
}

type Session = ImpersonationSession<MemoryKeyValueStore, FakeSessionClient, RecordingNavigator>;

fn session_with(client: FakeSessionClient) -> Session {
    ImpersonationSession::new(
        MemoryKeyValueStore::new(),
        client,
        RecordingNavigator::default(),
    )
}

#[tokio::test]
async fn exit_without_state_is_a_no_op() {
    let session = session_with(FakeSessionClient::signed_in_as("admin-session"));

    assert!(session.exit().await.is_ok());
    assert!(session.exit().await.is_ok());

    assert!(session.client().calls().await.is_empty());
    assert!(session.navigator.paths.lock().await.is_empty());
    assert_eq!(
        session.client().active().await,
        Some(SessionRef::new("admin-session"))
    );
}

#[tokio::test]
async fn enter_then_exit_restores_original_session() {
    let client = FakeSessionClient::signed_in_as("admin-session")
        .with_link("https://api/auth/sign-in?token=t1", "target-session")
        .await;
    let session = session_with(client);
    let target_id = UserId::new();

    let entered = session
        .enter("https://api/auth/sign-in?token=t1", target_id, "Otto Operador")
        .await;
    assert!(entered.is_ok());
    assert_eq!(
        session.client().active().await,
        Some(SessionRef::new("target-session"))
    );
    assert!(matches!(session.is_impersonating().await, Ok(true)));
    assert_eq!(
        session.banner().await.ok().flatten(),
        Some(ImpersonationBanner {
            target_name: "Otto Operador".to_owned()
        })
    );

    assert!(session.exit().await.is_ok());
    assert_eq!(
        session.client().active().await,
        Some(SessionRef::new("admin-session"))
    );
    assert!(matches!(session.is_impersonating().await, Ok(false)));
    assert_eq!(session.banner().await.ok().flatten(), None);
    assert_eq!(
        session.client().calls().await,
        vec!["follow", "sign_out", "set_session:admin-session"]
    );
    assert_eq!(
        *session.navigator.paths.lock().await,
        vec!["/dashboard?impersonated=true", "/"]
    );
}

#[tokio::test]
async fn enter_requires_an_active_session() {
    let session = session_with(FakeSessionClient::default());

    let result = session.enter("link", UserId::new(), "Otto").await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
    assert_eq!(session.store.get(ORIGINAL_SESSION_KEY).await.ok().flatten(), None);
}

#[tokio::test]
async fn rejected_link_rolls_back_persisted_state() {
    let session = session_with(FakeSessionClient::signed_in_as("admin-session"));

    let result = session.enter("expired-link", UserId::new(), "Otto").await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));

    assert!(matches!(session.is_impersonating().await, Ok(false)));
    assert_eq!(session.store.get(IMPERSONATION_KEY).await.ok().flatten(), None);
    assert_eq!(
        session.client().active().await,
        Some(SessionRef::new("admin-session"))
    );
}

#[tokio::test]
async fn second_enter_while_impersonating_is_rejected() {
    let client = FakeSessionClient::signed_in_as("admin-session")
        .with_link("first", "target-session")
        .await
        .with_link("second", "other-session")
        .await;
    let session = session_with(client);

    assert!(session.enter("first", UserId::new(), "Otto").await.is_ok());
    let second = session.enter("second", UserId::new(), "Bia").await;
    assert!(matches!(second, Err(AppError::Conflict(_))));

    assert_eq!(
        session.store.get(ORIGINAL_SESSION_KEY).await.ok().flatten().as_deref(),
        Some("admin-session")
    );
}

#[tokio::test]
async fn failed_restore_keeps_state_for_retry() {
    let client = FakeSessionClient::signed_in_as("admin-session")
        .with_link("link", "target-session")
        .await;
    let session = session_with(client);
    assert!(session.enter("link", UserId::new(), "Otto").await.is_ok());

    session.client().fail_restore(true).await;
    assert!(session.exit().await.is_err());
    assert!(matches!(session.is_impersonating().await, Ok(true)));
    assert_eq!(session.navigator.paths.lock().await.len(), 1);

    session.client().fail_restore(false).await;
    assert!(session.exit().await.is_ok());
    assert!(matches!(session.is_impersonating().await, Ok(false)));
    assert_eq!(
        session.client().active().await,
        Some(SessionRef::new("admin-session"))
    );
}

#[tokio::test]
async fn expired_original_session_ends_impersonation_at_sign_in() {
    let client = FakeSessionClient::signed_in_as("admin-session")
        .with_link("link", "target-session")
        .await;
    let session = session_with(client);
    assert!(session.enter("link", UserId::new(), "Otto").await.is_ok());

    session.client().expire_restore().await;
    assert!(matches!(session.exit().await, Err(AppError::Unauthorized(_))));

    assert!(matches!(session.is_impersonating().await, Ok(false)));
    assert!(matches!(session.store.get(ORIGINAL_SESSION_KEY).await, Ok(None)));
    assert!(matches!(session.store.get(IMPERSONATION_KEY).await, Ok(None)));
    assert_eq!(
        session.navigator.paths.lock().await.as_slice(),
        ["/dashboard?impersonated=true", SIGN_IN_PATH]
    );

    assert!(session.exit().await.is_ok());
    assert_eq!(session.navigator.paths.lock().await.len(), 2);
}

#[tokio::test]
async fn undecodable_record_is_not_an_active_impersonation() {
    let store = MemoryKeyValueStore::new();
    assert!(store.set(ORIGINAL_SESSION_KEY, "admin-session".to_owned()).await.is_ok());
    assert!(store.set(IMPERSONATION_KEY, "{not json".to_owned()).await.is_ok());
    let session = ImpersonationSession::new(
        store,
        FakeSessionClient::signed_in_as("target-session"),
        RecordingNavigator::default(),
    );

    assert!(matches!(session.is_impersonating().await, Ok(false)));
    assert!(session.exit().await.is_ok());
    assert!(session.client().calls().await.is_empty());
}
