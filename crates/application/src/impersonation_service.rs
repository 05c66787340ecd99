//! Support impersonation: an administrator obtains a one-time sign-in link
//! for another user's account.

use std::sync::Arc;

use opsdesk_core::{AppError, AppResult, UserIdentity};
use opsdesk_domain::{
    AuditAction, IMPERSONATED_QUERY_MARKER, IMPERSONATION_LANDING_PATH, ImpersonationDenial,
    ImpersonationPolicy, SignInTokenPurpose, UserId, UserProfile,
};
use tracing::{info, warn};

use crate::{AuditEvent, AuditRepository, ProfileRepository, RoleRepository, SignInLink, SignInLinkService};


/// Minimal identity of the impersonated user, returned for confirmation display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpersonationTarget {
    /// User identifier.
    pub id: UserId,
    /// Full display name.
    pub full_name: String,
    /// Sign-in email.
    pub email: String,
}

/// Successful authorization result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpersonationGrant {
    /// One-time link establishing the target's session.
    pub link: SignInLink,
    /// Target identity.
    pub target: ImpersonationTarget,
}

/// Session data resolved from a redeemed link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemedSignIn {
    /// Identity to store in the new session.
    pub identity: UserIdentity,
    /// Destination to redirect the browser to.
    pub redirect_to: String,
}

/// Application service authorizing impersonation requests.
#[derive(Clone)]
pub struct ImpersonationService {
    role_repository: Arc<dyn RoleRepository>,
    profile_repository: Arc<dyn ProfileRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    link_service: SignInLinkService,
    policy: ImpersonationPolicy,
    frontend_url: String,
}

impl ImpersonationService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        role_repository: Arc<dyn RoleRepository>,
        profile_repository: Arc<dyn ProfileRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        link_service: SignInLinkService,
        policy: ImpersonationPolicy,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            role_repository,
            profile_repository,
            audit_repository,
            link_service,
            policy,
            frontend_url: frontend_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Validates an impersonation request and issues a one-time link for the target.
    ///
    /// Checks run in a fixed order so a caller learns nothing about the target
    /// before their own privilege is confirmed:
    /// authentication, target presence, self-target, caller privilege,
    /// target existence, target status, target protection.
    pub async fn authorize_and_grant(
        &self,
        caller: Option<&UserIdentity>,
        target_user_id: Option<&str>,
    ) -> AppResult<ImpersonationGrant> {
        let caller = caller
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;
        let caller_id = UserId::from_uuid(caller.user_id());

        let target_user_id = target_user_id
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::Validation("missing target".to_owned()))?;
        let target_id = UserId::parse(target_user_id)
            .map_err(|_| AppError::Validation("invalid target".to_owned()))?;

        if target_id == caller_id {
            return Err(ImpersonationDenial::SelfTarget.into());
        }

        let caller_roles = self.role_repository.list_roles_for_user(caller_id).await?;
        if !self.policy.can_impersonate(&caller_roles) {
            return Err(ImpersonationDenial::InsufficientPrivilege.into());
        }

        let target = self
            .profile_repository
            .find_profile(target_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{target_id}' does not exist")))?;

        if !target.status.is_active() {
            return Err(ImpersonationDenial::TargetInactive.into());
        }

        let target_roles = self.role_repository.list_roles_for_user(target_id).await?;
        if self.policy.is_protected(&target_roles) {
            return Err(ImpersonationDenial::TargetProtected.into());
        }

        let redirect_to = format!(
            "{}{IMPERSONATION_LANDING_PATH}?{IMPERSONATED_QUERY_MARKER}",
            self.frontend_url
        );
        let link = self
            .link_service
            .issue_link(
                &target,
                SignInTokenPurpose::Impersonation,
                &redirect_to,
                Some(caller_id),
            )
            .await?;

        self.record_grant(caller_id, &target).await;
        info!(caller_id = %caller_id, target_id = %target.id, "impersonation granted");

        Ok(ImpersonationGrant {
            link,
            target: ImpersonationTarget {
                id: target.id,
                full_name: target.full_name,
                email: target.email.into(),
            },
        })
    }

    /// Redeems an impersonation link and resolves the session to establish.
    pub async fn redeem_link(&self, raw_token: &str) -> AppResult<RedeemedSignIn> {
        let record = self
            .link_service
            .consume(raw_token, SignInTokenPurpose::Impersonation)
            .await?;

        let profile = self
            .profile_repository
            .find_profile(record.user_id)
            .await?
            .filter(|profile| profile.status.is_active())
            .ok_or_else(|| AppError::Unauthorized("invalid or expired link".to_owned()))?;

        let mut identity = UserIdentity::new(
            profile.id.as_uuid(),
            profile.full_name,
            Some(profile.email.into()),
        );
        if let Some(issued_by) = record.issued_by {
            identity = identity.with_impersonator(issued_by.as_uuid());
        }

        Ok(RedeemedSignIn {
            identity,
            redirect_to: record.redirect_to,
        })
    }

    // Audit is best-effort: an audit store outage must not disable support access.
    async fn record_grant(&self, caller_id: UserId, target: &UserProfile) {
        let event = AuditEvent {
            actor_id: caller_id,
            action: AuditAction::ImpersonateUser,
            target_id: Some(target.id),
            details: serde_json::json!({
                "target_email": target.email.as_str(),
                "target_name": target.full_name,
            }),
        };

        if let Err(error) = self.audit_repository.append_event(event).await {
            warn!(
                caller_id = %caller_id,
                target_id = %target.id,
                %error,
                "failed to write impersonation audit record"
            );
        }
    }
}
