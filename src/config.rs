use std::env;

use thiserror::Error;

pub const SUPABASE_URL: &str = "SUPABASE_URL";
pub const SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
pub const SUPABASE_SERVICE_ROLE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
pub const EMAIL_DOMAIN: &str = "RLS_SMOKE_EMAIL_DOMAIN";

pub const DEFAULT_EMAIL_DOMAIN: &str = "storagevalet.test";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing Supabase env vars: {}. Set SUPABASE_URL, SUPABASE_ANON_KEY, SUPABASE_SERVICE_ROLE_KEY.", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("SUPABASE_URL must start with http:// or https:// (got {0:?})")]
    InvalidUrl(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Service endpoint, without a trailing slash
    pub supabase_url: String,
    /// Public (anon) key sent as `apikey` on user-level requests
    pub anon_key: String,
    /// Service-role key, only used for identity provisioning and deletion
    pub service_role_key: String,
    /// Domain used for generated test emails
    pub email_domain: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let url = get(SUPABASE_URL);
        let anon_key = get(SUPABASE_ANON_KEY);
        let service_role_key = get(SUPABASE_SERVICE_ROLE_KEY);

        let missing: Vec<&'static str> = [
            (SUPABASE_URL, url.is_none()),
            (SUPABASE_ANON_KEY, anon_key.is_none()),
            (SUPABASE_SERVICE_ROLE_KEY, service_role_key.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (Some(url), Some(anon_key), Some(service_role_key)) = (url, anon_key, service_role_key)
        else {
            return Err(ConfigError::Missing(missing));
        };

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(url));
        }

        Ok(Self {
            supabase_url: url.trim_end_matches('/').to_string(),
            anon_key,
            service_role_key,
            email_domain: get(EMAIL_DOMAIN).unwrap_or_else(|| DEFAULT_EMAIL_DOMAIN.to_string()),
        })
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.supabase_url, path)
    }

    pub fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.supabase_url, path)
    }
}
