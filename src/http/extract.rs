//! Authentication extractors.
//!
//! [`AuthUser`] accepts any valid credential. [`RequireRole`] additionally
//! checks the principal's role against a [`RoleSet`]. Both reject with the
//! same generic 401.

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::{extract_credential, Principal, Role};
use crate::http::error::ApiError;
use crate::http::server::AppState;

/// Any authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let credential = extract_credential(&parts.headers, &state.cookie_name);
        state
            .authenticator
            .authenticate(credential)
            .map(AuthUser)
            .map_err(ApiError::from)
    }
}

/// Roles allowed through a [`RequireRole`] guard.
pub trait RoleSet: Send + Sync + 'static {
    const ROLES: &'static [Role];
}

/// `admin`.
pub struct AdminOnly;

impl RoleSet for AdminOnly {
    const ROLES: &'static [Role] = &[Role::Admin];
}

/// `admin` or `supervisor`.
pub struct AdminOrSupervisor;

impl RoleSet for AdminOrSupervisor {
    const ROLES: &'static [Role] = &[Role::Admin, Role::Supervisor];
}

/// Roles that may submit scores.
pub struct ScoreSubmitters;

impl RoleSet for ScoreSubmitters {
    const ROLES: &'static [Role] = &[Role::Admin, Role::Judge, Role::Expert, Role::Master];
}

/// Authenticated caller whose role is in `R`.
#[derive(Debug)]
pub struct RequireRole<R: RoleSet> {
    pub principal: Principal,
    _roles: PhantomData<R>,
}

impl<R: RoleSet> RequireRole<R> {
    pub fn into_inner(self) -> Principal {
        self.principal
    }
}

impl<R: RoleSet> FromRequestParts<AppState> for RequireRole<R> {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(principal) = AuthUser::from_request_parts(parts, state).await?;

        if !principal.has_any_role(R::ROLES) {
            tracing::info!(
                subject = %principal.subject,
                role = %principal.role,
                path = %parts.uri.path(),
                "Role not permitted for route"
            );
            return Err(ApiError::Unauthorized);
        }

        Ok(Self {
            principal,
            _roles: PhantomData,
        })
    }
}
