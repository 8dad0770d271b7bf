use serde::{Deserialize, Serialize};

use super::repo::User;

/// Request body for registration. Missing fields deserialize empty and are
/// reported by validation rather than by the JSON extractor.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterUserInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub occupation: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for email availability checks.
#[derive(Debug, Default, Deserialize)]
pub struct CheckEmailInput {
    #[serde(default)]
    pub email: String,
}

/// Public view of a user, with the token issued in this response (empty when none).
#[derive(Debug, Serialize)]
pub struct UserFormatter {
    pub id: i64,
    pub name: String,
    pub occupation: String,
    pub email: String,
    pub token: String,
    pub image_url: String,
}

impl UserFormatter {
    pub fn new(user: &User, token: impl Into<String>) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            occupation: user.occupation.clone(),
            email: user.email.clone(),
            token: token.into(),
            image_url: user.avatar_file_name.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EmailAvailability {
    pub is_available: bool,
}

#[derive(Debug, Serialize)]
pub struct AvatarUploaded {
    pub is_uploaded: bool,
}
