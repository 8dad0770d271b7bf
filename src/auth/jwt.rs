use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use super::claims::Claims;
use crate::{
    config::JwtConfig,
    error::{AppError, AppResult},
};

/// Signing and verification keys plus the token policy they enforce.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    has_secret: bool,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            has_secret: !cfg.secret.is_empty(),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::minutes(cfg.ttl_minutes),
        }
    }

    pub fn issue(&self, user_id: i64) -> AppResult<String> {
        if !self.has_secret {
            return Err(AppError::Signing("signing key unavailable".into()));
        }
        let now = OffsetDateTime::now_utc();
        let exp = now + self.ttl;
        let claims = Claims {
            user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp().max(0) as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Signing(e.to_string()))?;
        debug!(user_id, "jwt signed");
        Ok(token)
    }

    pub fn validate(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            warn!(error = %e, "jwt rejected");
            AppError::InvalidToken
        })?;
        debug!(user_id = data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }
}
