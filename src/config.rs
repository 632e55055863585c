use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Where and how to reach the external services.
///
/// This is library-level configuration. Binaries map environment variables and flags into it;
/// other frontends can construct it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Base URL shared by the asset and rendering endpoints, without a trailing slash.
    pub base_url: String,

    /// Per-request timeout. Rendering is slow, so this is generous by default.
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ServiceConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::default().with_base_url(base_url)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = normalize_base_url(base_url)?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `REELMARK_SERVICE_URL` and `REELMARK_TIMEOUT_SECS`, falling back to defaults for
    /// anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(url) = lookup("REELMARK_SERVICE_URL") {
            cfg = cfg.with_base_url(&url)?;
        }

        if let Some(raw) = lookup("REELMARK_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                Error::validation(format!("REELMARK_TIMEOUT_SECS must be whole seconds, got '{raw}'"))
            })?;
            cfg.timeout = Duration::from_secs(secs);
        }

        Ok(cfg)
    }

    /// Join `path` onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::validation(format!(
            "service URL must start with http:// or https://, got '{raw}'"
        )));
    }
    Ok(trimmed.to_owned())
}
