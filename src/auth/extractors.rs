use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;

use crate::{
    error::{AppError, AppResult},
    response::ApiError,
    state::AppState,
    users::{repo::User, services::get_user_by_id},
};

/// The authenticated user of a protected request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Pull the token out of `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Header → token → claims → user. Any failed step rejects with `InvalidToken`.
pub async fn authorize(state: &AppState, headers: &HeaderMap) -> AppResult<User> {
    let token = bearer_token(headers).ok_or_else(|| {
        warn!("missing or malformed Authorization header");
        AppError::InvalidToken
    })?;

    let claims = state.keys.validate(token)?;

    match get_user_by_id(state.users.as_ref(), claims.user_id).await {
        Ok(user) => Ok(user),
        Err(AppError::NotFound(_)) => {
            warn!(user_id = claims.user_id, "token for unknown user");
            Err(AppError::InvalidToken)
        }
        Err(e) => {
            warn!(error = %e, user_id = claims.user_id, "user lookup failed during auth");
            Err(AppError::InvalidToken)
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(state, &parts.headers)
            .await
            .map(CurrentUser)
            .map_err(|_| ApiError::unauthorized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::jwt::JwtKeys,
        config::JwtConfig,
        testing::{insert_user, MemoryUsers},
    };
    use axum::http::HeaderValue;
    use std::sync::Arc;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn bearer_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("abc")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let state = AppState::fake();
        let err = authorize(&state, &HeaderMap::new()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let state = AppState::fake();
        let user = insert_user(state.users.as_ref(), "a@x.com").await;
        let expired = JwtKeys::new(&JwtConfig {
            ttl_minutes: -120,
            ..state.config.jwt.clone()
        });
        let token = expired.issue(user.id).unwrap();

        let err = authorize(&state, &headers(&format!("Bearer {}", token)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn token_for_missing_user_is_rejected() {
        let state = AppState::fake();
        let token = state.keys.issue(404).unwrap();
        let err = authorize(&state, &headers(&format!("Bearer {}", token)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn valid_token_resolves_user() {
        let state = AppState::fake();
        let user = insert_user(state.users.as_ref(), "a@x.com").await;
        let token = state.keys.issue(user.id).unwrap();

        let resolved = authorize(&state, &headers(&format!("Bearer {}", token)))
            .await
            .unwrap();
        assert_eq!(resolved.id, user.id);
        assert_eq!(resolved.email, "a@x.com");
    }

    #[tokio::test]
    async fn store_failure_is_rejected_not_propagated() {
        let mut state = AppState::fake();
        state.users = Arc::new(MemoryUsers::unavailable());
        let token = state.keys.issue(1).unwrap();
        let err = authorize(&state, &headers(&format!("Bearer {}", token)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }
}
