use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub redis_url: String,
    pub jwt: JwtConfig,
    pub avatar_dir: String,
    pub avatar_staging_dir: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/3".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "crowdfund".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "crowdfund-users".into()),
            // tokens are long-lived; the session record is what expires daily
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 7),
        };
        let avatar_dir = std::env::var("AVATAR_DIR").unwrap_or_else(|_| "images".into());
        // sibling of the served dir so the final rename stays on one filesystem
        let avatar_staging_dir = std::env::var("AVATAR_STAGING_DIR")
            .unwrap_or_else(|_| format!("{}.staging", avatar_dir.trim_end_matches('/')));
        Ok(Self {
            database_url,
            redis_url,
            jwt,
            avatar_dir,
            avatar_staging_dir,
        })
    }
}
