//! Client-side state for an active impersonation.
//!
//! While impersonating, the original session reference and the impersonated
//! user are persisted so the banner survives reloads and `exit` can restore
//! the administrator's own session.

#[cfg(test)]
mod tests;

use opsdesk_core::{AppError, AppResult};
use opsdesk_domain::{IMPERSONATED_QUERY_MARKER, IMPERSONATION_LANDING_PATH, UserId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{KeyValueStore, Navigator, SessionClient, SessionRef};

/// Store key holding the session to restore on exit.
pub const ORIGINAL_SESSION_KEY: &str = "opsdesk.original_session";

/// Store key holding the serialized [`ImpersonationRecord`].
pub const IMPERSONATION_KEY: &str = "opsdesk.impersonation";

/// Where `exit` sends the user when the original session can no longer be restored.
pub const SIGN_IN_PATH: &str = "/login";

/// Who is being impersonated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpersonationRecord {
    /// Impersonated user.
    pub impersonated_user_id: UserId,
    /// Display name shown in the banner.
    pub impersonated_user_name: String,
}

/// View model for the "viewing as" banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpersonationBanner {
    /// Name of the impersonated user.
    pub target_name: String,
}

struct ActiveImpersonation {
    original_session: SessionRef,
    record: ImpersonationRecord,
}

/// State holder coordinating the key-value store, the session backend and navigation.
pub struct ImpersonationSession<S, C, N> {
    store: S,
    client: C,
    navigator: N,
}

impl<S, C, N> ImpersonationSession<S, C, N>
where
    S: KeyValueStore,
    C: SessionClient,
    N: Navigator,
{
    /// Creates a state holder.
    pub fn new(store: S, client: C, navigator: N) -> Self {
        Self {
            store,
            client,
            navigator,
        }
    }

    /// Returns the session backend.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Starts impersonating `target_id` by redeeming `link`.
    ///
    /// The current session is saved first. If the link cannot be redeemed the
    /// saved state is discarded and the original session is put back.
    pub async fn enter(&self, link: &str, target_id: UserId, target_name: &str) -> AppResult<()> {
        if self.active().await?.is_some() {
            return Err(AppError::Conflict(
                "an impersonation is already active".to_owned(),
            ));
        }

        let original_session = self
            .client
            .current_session()
            .await?
            .ok_or_else(|| AppError::Unauthorized("no active session to return to".to_owned()))?;

        let record = ImpersonationRecord {
            impersonated_user_id: target_id,
            impersonated_user_name: target_name.to_owned(),
        };
        let encoded = serde_json::to_string(&record).map_err(|error| {
            AppError::Internal(format!("failed to encode impersonation record: {error}"))
        })?;

        self.store
            .set(ORIGINAL_SESSION_KEY, original_session.as_str().to_owned())
            .await?;
        if let Err(error) = self.store.set(IMPERSONATION_KEY, encoded).await {
            self.discard_state().await;
            return Err(error);
        }

        if let Err(error) = self.client.follow_sign_in_link(link).await {
            self.discard_state().await;
            if let Err(restore_error) = self.client.set_session(original_session).await {
                warn!(%restore_error, "failed to restore session after rejected sign-in link");
            }
            return Err(error);
        }

        info!(target_id = %target_id, "impersonation started");
        self.navigator
            .navigate(&format!(
                "{IMPERSONATION_LANDING_PATH}?{IMPERSONATED_QUERY_MARKER}"
            ))
            .await
    }

    /// Returns whether an impersonation is active.
    pub async fn is_impersonating(&self) -> AppResult<bool> {
        Ok(self.active().await?.is_some())
    }

    /// Returns the banner to show while impersonating.
    pub async fn banner(&self) -> AppResult<Option<ImpersonationBanner>> {
        Ok(self.active().await?.map(|active| ImpersonationBanner {
            target_name: active.record.impersonated_user_name,
        }))
    }

    /// Ends the impersonation and returns to the original session.
    ///
    /// Does nothing when no impersonation is active. Steps run in order: sign
    /// out, restore, clear state, navigate home. A transient restore failure
    /// keeps the persisted state so the exit can be retried. If the backend
    /// rejects the original session outright, the state is dropped, the user
    /// is sent to [`SIGN_IN_PATH`] and `Unauthorized` is returned.
    pub async fn exit(&self) -> AppResult<()> {
        let Some(active) = self.active().await? else {
            return Ok(());
        };

        self.client.sign_out().await?;
        match self.client.set_session(active.original_session).await {
            Ok(()) => {}
            Err(AppError::Unauthorized(reason)) => {
                self.discard_state().await;
                warn!(
                    target_id = %active.record.impersonated_user_id,
                    %reason,
                    "original session expired; impersonation dropped"
                );
                self.navigator.navigate(SIGN_IN_PATH).await?;
                return Err(AppError::Unauthorized(
                    "original session expired; sign in again".to_owned(),
                ));
            }
            Err(error) => return Err(error),
        }

        self.store.remove(IMPERSONATION_KEY).await?;
        self.store.remove(ORIGINAL_SESSION_KEY).await?;
        info!(
            target_id = %active.record.impersonated_user_id,
            "impersonation ended"
        );

        self.navigator.navigate("/").await
    }

    async fn active(&self) -> AppResult<Option<ActiveImpersonation>> {
        let Some(original_session) = self.store.get(ORIGINAL_SESSION_KEY).await? else {
            return Ok(None);
        };
        let Some(encoded) = self.store.get(IMPERSONATION_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<ImpersonationRecord>(&encoded) {
            Ok(record) => Ok(Some(ActiveImpersonation {
                original_session: SessionRef::new(original_session),
                record,
            })),
            Err(error) => {
                warn!(%error, "ignoring undecodable impersonation record");
                Ok(None)
            }
        }
    }

    async fn discard_state(&self) {
        for key in [IMPERSONATION_KEY, ORIGINAL_SESSION_KEY] {
            if let Err(error) = self.store.remove(key).await {
                warn!(key, %error, "failed to discard impersonation state");
            }
        }
    }
}
