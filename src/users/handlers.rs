use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, DefaultBodyLimit, Multipart,
        State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{error, info, instrument, warn};

use super::{
    dto::{
        AvatarUploaded, CheckEmailInput, EmailAvailability, LoginInput, RegisterUserInput,
        UserFormatter,
    },
    services,
};
use crate::{
    auth::{extractors::CurrentUser, session::record_session},
    error::AppError,
    response::{success, ApiError, ApiResponse},
    state::AppState,
};

const AVATAR_FIELD: &str = "avatar";
const AVATAR_BODY_LIMIT: usize = 5 * 1024 * 1024;

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register_user))
        .route("/sessions", post(login))
        .route("/email_checkers", post(check_email_availability))
        .route("/users/fetch", get(fetch_user))
        .route(
            "/avatars",
            post(upload_avatar).layer(DefaultBodyLimit::max(AVATAR_BODY_LIMIT)),
        )
}

/// Malformed JSON is reported like any other validation failure.
pub(crate) fn bad_json(rejection: JsonRejection, message: &'static str) -> ApiError {
    warn!(error = %rejection.body_text(), "{}", message);
    ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, message)
        .with_data(json!({ "errors": [rejection.body_text()] }))
}

#[instrument(skip(state, payload))]
pub async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<RegisterUserInput>, JsonRejection>,
) -> ApiResult<UserFormatter> {
    const FAILED: &str = "Register account failed";
    let Json(input) = payload.map_err(|r| bad_json(r, FAILED))?;

    let user = services::register_user(state.users.as_ref(), input)
        .await
        .map_err(|e| ApiError::from_app(e, FAILED))?;

    let token = state
        .keys
        .issue(user.id)
        .map_err(|e| ApiError::from_app(e, FAILED))?;

    Ok(success(
        "Account has been registered",
        UserFormatter::new(&user, token),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> ApiResult<UserFormatter> {
    const FAILED: &str = "Login failed";
    let Json(input) = payload.map_err(|r| bad_json(r, FAILED))?;

    let user = match services::login(state.users.as_ref(), input).await {
        Ok(u) => u,
        Err(e @ (AppError::NotFound(_) | AppError::InvalidCredentials)) => {
            warn!(error = %e, "login rejected");
            return Err(ApiError::new(StatusCode::BAD_REQUEST, FAILED)
                .with_data(json!({ "errors": "Invalid email or password" })));
        }
        Err(e) => return Err(ApiError::from_app(e, FAILED)),
    };

    let token = state
        .keys
        .issue(user.id)
        .map_err(|e| ApiError::from_app(e, FAILED))?;

    if let Err(e) = record_session(state.sessions.as_ref(), user.id, &token).await {
        error!(error = %e, user_id = user.id, "session not recorded");
        return Err(ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error saving session",
        ));
    }

    info!(user_id = user.id, "user logged in");
    Ok(success("Successfuly logged in", UserFormatter::new(&user, token)))
}

#[instrument(skip(state, payload))]
pub async fn check_email_availability(
    State(state): State<AppState>,
    payload: Result<Json<CheckEmailInput>, JsonRejection>,
) -> ApiResult<EmailAvailability> {
    const FAILED: &str = "Email checking failed";
    let Json(input) = payload.map_err(|r| bad_json(r, FAILED))?;

    let is_available = services::is_email_available(state.users.as_ref(), input)
        .await
        .map_err(|e| match e {
            AppError::Validation(_) => ApiError::from_app(e, FAILED),
            other => ApiError::from_app(other, FAILED)
                .with_data(json!({ "errors": "Server error" })),
        })?;

    let message = if is_available {
        "Email is available"
    } else {
        "Email has been registered"
    };
    Ok(success(message, EmailAvailability { is_available }))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn fetch_user(CurrentUser(user): CurrentUser) -> ApiResult<UserFormatter> {
    Ok(success(
        "Successfuly fetch user data",
        UserFormatter::new(&user, ""),
    ))
}

fn not_uploaded(message: &'static str) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, message).with_data(json!({ "is_uploaded": false }))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<AvatarUploaded> {
    const FAILED: &str = "Failed to upload avatar image";
    let mut mp = multipart.map_err(|r| {
        warn!(error = %r.body_text(), "avatar request is not multipart");
        not_uploaded(FAILED)
    })?;

    let mut upload = None;
    loop {
        let field = match mp.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "avatar multipart read failed");
                return Err(not_uploaded(FAILED));
            }
        };
        if field.name() != Some(AVATAR_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let body = field.bytes().await.map_err(|e| {
            warn!(error = %e, "avatar body read failed");
            not_uploaded(FAILED)
        })?;
        upload = Some((file_name, body));
        break;
    }

    let Some((file_name, body)) = upload else {
        warn!("avatar field missing");
        return Err(not_uploaded(FAILED));
    };

    match services::upload_avatar(
        state.users.as_ref(),
        state.avatars.as_ref(),
        &user,
        &file_name,
        body,
    )
    .await
    {
        Ok(_) => Ok(success(
            "Avatar successfully uploaded",
            AvatarUploaded { is_uploaded: true },
        )),
        Err(AppError::Validation(errors)) => {
            warn!(?errors, "avatar rejected");
            let message = if errors.iter().any(|e| e.starts_with("Only JPG")) {
                "Only JPG/JPEG/PNG image is allowed"
            } else {
                FAILED
            };
            Err(not_uploaded(message))
        }
        Err(e) => {
            error!(error = %e, "avatar upload failed");
            Err(not_uploaded(FAILED))
        }
    }
}
