use anyhow::{Context, Result, anyhow};
use axum_extra::extract::cookie::Key;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use platform_authn::{AdminDirectory, AuthConfig};

#[derive(Clone)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub admins: AdminDirectory,
    pub cookie_key: Key,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let jwt_secret =
            std::env::var("SESSION_JWT_SECRET").context("SESSION_JWT_SECRET missing")?;
        let session_ttl_minutes = std::env::var("SESSION_TTL_MINUTES")
            .ok()
            .map(|raw| raw.parse::<i64>())
            .transpose()
            .context("invalid SESSION_TTL_MINUTES")?
            .unwrap_or(12 * 60);
        let auth = AuthConfig::new(jwt_secret, session_ttl_minutes);

        let admin_ids = std::env::var("ADMIN_USER_IDS").unwrap_or_default();
        let admin_emails = std::env::var("ADMIN_EMAILS").unwrap_or_default();
        let admins = AdminDirectory::from_lists(&admin_ids, &admin_emails);

        let cookie_secret =
            std::env::var("COOKIE_SECRET_BASE64").context("COOKIE_SECRET_BASE64 missing")?;
        let secret_bytes = STANDARD
            .decode(cookie_secret.trim())
            .context("invalid COOKIE_SECRET_BASE64")?;
        if secret_bytes.len() < 32 {
            return Err(anyhow!(
                "COOKIE_SECRET_BASE64 must decode to at least 32 bytes"
            ));
        }
        let cookie_key = Key::from(&secret_bytes[..32]);

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        Ok(Self {
            auth,
            admins,
            cookie_key,
            cors_allowed_origins,
        })
    }
}
