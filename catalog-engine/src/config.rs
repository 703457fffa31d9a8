use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the marketplace catalog API
    pub api_base_url: String,
    /// Provider whose catalog this session edits
    pub provider_id: String,
    /// Per-request timeout for catalog calls
    pub request_timeout: Duration,
    /// Label attached to session logs
    pub session_label: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let provider_id = std::env::var("CATALOG_PROVIDER_ID")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("CATALOG_PROVIDER_ID must be set"))?;

        Ok(Self {
            api_base_url: env_str("CATALOG_API_BASE_URL", "http://localhost:8080/api"),
            session_label: env_str("CATALOG_SESSION_LABEL", &format!("provider:{provider_id}")),
            provider_id,
            request_timeout: Duration::from_secs(env_parse("CATALOG_REQUEST_TIMEOUT_SECS", 15)?),
        })
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={val}: {e}")),
        Err(_) => Ok(default),
    }
}
