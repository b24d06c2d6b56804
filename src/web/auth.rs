use std::convert::Infallible;
use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::web::{error::AppError, AppState};

pub const SESSION_COOKIE: &str = "token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user_id: i32,
    pub admin: bool,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub username: String,
    pub is_superuser: bool,
}

/// The caller's identity and role, resolved once per request from the
/// session cookie and consumed uniformly by every handler. Extraction never
/// fails: a missing, expired or garbled token is simply `Anonymous`.
#[derive(Debug, Clone)]
pub enum Viewer {
    Anonymous,
    Member(AuthenticatedUser),
    Admin(AuthenticatedUser),
}

impl Viewer {
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Viewer::Anonymous => None,
            Viewer::Member(user) | Viewer::Admin(user) => Some(user),
        }
    }

    /// Any authenticated identity; anonymous callers are sent to the login
    /// page.
    pub fn require_member(&self) -> Result<&AuthenticatedUser, AppError> {
        self.user().ok_or(AppError::AuthRequired)
    }

    /// Superuser only. Anyone else gets a fail-fast 403, anonymous callers
    /// included: an anonymous caller is simply not a superuser.
    pub fn require_admin(&self) -> Result<&AuthenticatedUser, AppError> {
        match self {
            Viewer::Admin(user) => Ok(user),
            _ => Err(AppError::Forbidden),
        }
    }
}

impl FromRequestParts<Arc<AppState>> for Viewer {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Ok(Viewer::Anonymous);
        };

        let token_data = match decode::<Claims>(
            cookie.value(),
            &DecodingKey::from_secret(state.config.session_secret.as_ref()),
            &Validation::default(),
        ) {
            Ok(data) => data,
            Err(err) => {
                debug!(error = %err, "rejecting session cookie");
                return Ok(Viewer::Anonymous);
            }
        };

        let user = AuthenticatedUser {
            id: token_data.claims.user_id,
            username: token_data.claims.sub,
            is_superuser: token_data.claims.admin,
        };

        Ok(if user.is_superuser {
            Viewer::Admin(user)
        } else {
            Viewer::Member(user)
        })
    }
}
