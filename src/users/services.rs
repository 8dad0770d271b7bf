use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::{CheckEmailInput, LoginInput, RegisterUserInput},
    repo::{NewUser, User, UserRepository},
};
use crate::{
    auth::password::{hash_password, verify_password},
    error::{AppError, AppResult},
    storage::{detect_image_type, AvatarStorage},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn require(errors: &mut Vec<String>, value: &str, field: &str) {
    if value.trim().is_empty() {
        errors.push(format!("{} is required", field));
    }
}

fn check_email(errors: &mut Vec<String>, email: &str) {
    if email.is_empty() {
        errors.push("Email is required".into());
    } else if !is_valid_email(email) {
        errors.push("Email is invalid".into());
    }
}

fn into_result(errors: Vec<String>) -> AppResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub fn validate_register(input: &RegisterUserInput) -> AppResult<()> {
    let mut errors = Vec::new();
    require(&mut errors, &input.name, "Name");
    require(&mut errors, &input.occupation, "Occupation");
    check_email(&mut errors, &normalize_email(&input.email));
    if input.password.is_empty() {
        errors.push("Password is required".into());
    }
    into_result(errors)
}

pub fn validate_login(input: &LoginInput) -> AppResult<()> {
    let mut errors = Vec::new();
    check_email(&mut errors, &normalize_email(&input.email));
    if input.password.is_empty() {
        errors.push("Password is required".into());
    }
    into_result(errors)
}

pub fn validate_check_email(input: &CheckEmailInput) -> AppResult<()> {
    let mut errors = Vec::new();
    check_email(&mut errors, &normalize_email(&input.email));
    into_result(errors)
}

pub async fn register_user(users: &dyn UserRepository, input: RegisterUserInput) -> AppResult<User> {
    validate_register(&input)?;
    let email = normalize_email(&input.email);

    if users.find_by_email(&email).await?.is_some() {
        return Err(AppError::EmailTaken);
    }

    let password_hash = hash_password(&input.password)?;
    let user = users
        .create(NewUser {
            name: input.name.trim().to_string(),
            occupation: input.occupation.trim().to_string(),
            email,
            password_hash,
        })
        .await?;

    info!(user_id = user.id, "user registered");
    Ok(user)
}

pub async fn login(users: &dyn UserRepository, input: LoginInput) -> AppResult<User> {
    validate_login(&input)?;
    let email = normalize_email(&input.email);

    let user = users
        .find_by_email(&email)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    if !verify_password(&input.password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }
    Ok(user)
}

pub async fn is_email_available(
    users: &dyn UserRepository,
    input: CheckEmailInput,
) -> AppResult<bool> {
    validate_check_email(&input)?;
    let found = users.find_by_email(&normalize_email(&input.email)).await?;
    Ok(found.is_none())
}

pub async fn get_user_by_id(users: &dyn UserRepository, id: i64) -> AppResult<User> {
    users.find_by_id(id).await?.ok_or(AppError::NotFound("user"))
}

pub async fn save_avatar(users: &dyn UserRepository, user_id: i64, path: &str) -> AppResult<User> {
    users
        .update_avatar(user_id, Some(path))
        .await?
        .ok_or(AppError::NotFound("user"))
}

/// Only the final path component of a client file name is kept.
fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next()?.trim();
    if base.is_empty() || base == "." || base == ".." {
        return None;
    }
    Some(base.to_string())
}

/// Store the image at `<user_id>-<file name>` and point the user at it.
///
/// The bytes are staged first and only published once the user record holds
/// the new path, so a failed update never touches the file the user already
/// links to. If publishing fails the previous link is put back.
pub async fn upload_avatar(
    users: &dyn UserRepository,
    storage: &dyn AvatarStorage,
    user: &User,
    file_name: &str,
    body: Bytes,
) -> AppResult<User> {
    let Some(file_name) = sanitize_file_name(file_name) else {
        return Err(AppError::Validation(vec!["Avatar file name is invalid".into()]));
    };
    if detect_image_type(&body).is_none() {
        return Err(AppError::Validation(vec![
            "Only JPG/JPEG/PNG image is allowed".into(),
        ]));
    }

    let staged = storage
        .stage(&format!("{}-{}", user.id, file_name), body)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;
    let path = staged.public_path();

    let updated = match save_avatar(users, user.id, &path).await {
        Ok(updated) => updated,
        Err(e) => {
            if let Err(rm) = storage.discard(staged).await {
                warn!(error = %rm, %path, "staged avatar not discarded");
            }
            return Err(e);
        }
    };

    if let Err(e) = storage.publish(staged).await {
        let previous = user.avatar_file_name.as_deref();
        if let Err(restore) = users.update_avatar(user.id, previous).await {
            warn!(error = %restore, user_id = user.id, "previous avatar link not restored");
        }
        return Err(AppError::Storage(e.to_string()));
    }

    info!(user_id = user.id, %path, "avatar saved");
    Ok(updated)
}
