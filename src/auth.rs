//! Token issuance, verification and the bearer security scheme.
//!
//! Tokens are stateless HS256 JWTs: there is no revocation list, so a
//! compromised token stays valid until its embedded expiry elapses.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use poem::Request;
use poem_openapi::{auth::Bearer, SecurityScheme};
use serde::{Deserialize, Serialize};

use crate::{
    config::AppConfig,
    entities::user::{self, Role},
    error::{Error, Result},
    store, AppState,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub email: String,
    pub role: Role,
    pub exp: i64,
}

/// Sign a token for `user`, expiring `jwt_expire_hours` after `now`.
pub fn issue(user: &user::Model, now: DateTime<Utc>, cfg: &AppConfig) -> Result<String> {
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role.clone(),
        exp: (now + Duration::hours(cfg.jwt_expire_hours)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.jwt_secret.as_bytes()),
    )
    .map_err(|_| Error::Internal("failed to sign token"))
}

pub fn verify(token: &str, cfg: &AppConfig) -> Result<Claims> {
    let mut validation = Validation::default();
    validation.leeway = 0;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(cfg.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|err| match err.kind() {
        ErrorKind::ExpiredSignature => Error::Unauthenticated("token expired"),
        ErrorKind::InvalidSignature => Error::Unauthenticated("invalid token signature"),
        _ => Error::Unauthenticated("malformed token"),
    })
}

/// The caller resolved from a bearer token.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: user::Model,
}

/// Bearer auth for the authenticated and admin endpoint classes. A missing
/// or malformed `Authorization: Bearer <token>` header is rejected by the
/// framework before the checker runs.
#[derive(SecurityScheme)]
#[oai(ty = "bearer", checker = "bearer_checker")]
pub struct TokenAuth(pub Identity);

async fn bearer_checker(req: &Request, bearer: Bearer) -> poem::Result<Identity> {
    let state = req
        .data::<Arc<AppState>>()
        .ok_or(Error::Internal("application state missing"))?;
    let claims = verify(&bearer.token, &state.config)?;
    // The subject is re-resolved on every request: a still-valid token for a
    // deleted user no longer authenticates.
    let user = store::users::find_active(&state.db, claims.sub)
        .await?
        .ok_or(Error::Unauthenticated("unknown token subject"))?;
    Ok(Identity { user })
}

/// Exact-match role gate; there is no role hierarchy.
pub fn require_admin(identity: &Identity) -> Result<()> {
    match identity.user.role {
        Role::Admin => Ok(()),
        Role::User => Err(Error::Forbidden("admin role required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> user::Model {
        user::Model {
            id: 7,
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "0".repeat(64),
            avatar: String::new(),
            role: Role::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn round_trip_preserves_identity() {
        let cfg = AppConfig::for_tests();
        let user = sample_user();
        let token = issue(&user, Utc::now(), &cfg).unwrap();
        let claims = verify(&token, &cfg).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, Role::User);
    }

    #[test]
    fn expired_token_is_rejected() {
        let cfg = AppConfig::for_tests();
        let issued_at = Utc::now() - Duration::hours(cfg.jwt_expire_hours) - Duration::minutes(1);
        let token = issue(&sample_user(), issued_at, &cfg).unwrap();
        match verify(&token, &cfg) {
            Err(Error::Unauthenticated(msg)) => assert_eq!(msg, "token expired"),
            other => panic!("expected expiry rejection, got {other:?}"),
        }
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let cfg = AppConfig::for_tests();
        let mut other = AppConfig::for_tests();
        other.jwt_secret = "a different secret".into();
        let token = issue(&sample_user(), Utc::now(), &other).unwrap();
        match verify(&token, &cfg) {
            Err(Error::Unauthenticated(msg)) => assert_eq!(msg, "invalid token signature"),
            other => panic!("expected signature rejection, got {other:?}"),
        }
    }

    #[test]
    fn garbage_token_is_malformed() {
        let cfg = AppConfig::for_tests();
        match verify("not-a-token", &cfg) {
            Err(Error::Unauthenticated(msg)) => assert_eq!(msg, "malformed token"),
            other => panic!("expected malformed rejection, got {other:?}"),
        }
    }

    #[test]
    fn admin_gate_is_exact_match() {
        let mut user = sample_user();
        assert!(require_admin(&Identity { user: user.clone() }).is_err());
        user.role = Role::Admin;
        assert!(require_admin(&Identity { user }).is_ok());
    }
}
