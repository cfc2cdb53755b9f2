//! Client configuration.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `MARKSTRO_CACHE_TTL_MS` | `300000` | Cache entry lifetime (0 disables caching) |
//! | `MARKSTRO_CACHE_MAX_ENTRIES` | `256` | Cache capacity before LRU eviction |
//! | `MARKSTRO_MAX_CALLS` | `5` | Admitted provider calls per window |
//! | `MARKSTRO_COOLDOWN_MS` | `60000` | Rate-limit window length |
//! | `MARKSTRO_TIMEOUT_MS` | `10000` | Per-request HTTP timeout |
//! | `MARKSTRO_DEMO_MODE` | `false` | Substitute synthetic data on provider failure |
//! | `MARKSTRO_PROXY_URL` | unset | Route calls through a backend proxy |
//! | `MARKSTRO_PROXY_TOKEN` | unset | Bearer credential for the proxy; required with `MARKSTRO_PROXY_URL` |
//! | `MARKSTRO_ALPHAVANTAGE_API_KEY` | `demo` | Provider key (also `ALPHAVANTAGE_API_KEY`, `ALPHA_VANTAGE_KEY`) |

use std::env;
use std::fmt::{Debug, Formatter};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const ALPHAVANTAGE_BASE_URL: &str = "https://www.alphavantage.co";

/// TTL cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_millis(300_000),
            max_entries: 256,
        }
    }
}

/// Sliding-window admission settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_calls: u32,
    pub cooldown: Duration,
}

impl RateLimitConfig {
    /// Alpha Vantage free tier: five calls per minute.
    pub const fn alphavantage_free_tier() -> Self {
        Self {
            max_calls: 5,
            cooldown: Duration::from_millis(60_000),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::alphavantage_free_tier()
    }
}

/// Where provider requests are sent and how they authenticate.
#[derive(Clone, PartialEq, Eq)]
pub enum ProviderEndpoint {
    /// Call the provider directly with an api key query parameter.
    Direct { base_url: String, api_key: String },
    /// Call a backend proxy that mirrors the provider's `/query` interface.
    Proxy { base_url: String, token: String },
}

impl ProviderEndpoint {
    pub fn direct(api_key: impl Into<String>) -> Self {
        Self::Direct {
            base_url: String::from(ALPHAVANTAGE_BASE_URL),
            api_key: api_key.into(),
        }
    }

    pub fn proxy(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::Proxy {
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        match self {
            Self::Direct { base_url, .. } | Self::Proxy { base_url, .. } => base_url,
        }
    }
}

impl Debug for ProviderEndpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct { base_url, .. } => f
                .debug_struct("Direct")
                .field("base_url", base_url)
                .field("api_key", &"[REDACTED]")
                .finish(),
            Self::Proxy { base_url, .. } => f
                .debug_struct("Proxy")
                .field("base_url", base_url)
                .field("token", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Provider transport settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub endpoint: ProviderEndpoint,
    pub timeout: Duration,
    /// How long to back off after the provider sends a throttle notice.
    pub throttle_cooldown: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: ProviderEndpoint::direct("demo"),
            timeout: Duration::from_millis(10_000),
            throttle_cooldown: Duration::from_secs(60),
        }
    }
}

/// What `QuoteClient` does when the provider cannot supply live data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackMode {
    /// Surface the typed failure.
    #[default]
    Disabled,
    /// Substitute clearly-marked synthetic data (offline/demo mode).
    Demo,
}

/// Aggregate configuration for one `QuoteClient`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientConfig {
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub provider: ProviderConfig,
    pub fallback: FallbackMode,
}

impl ClientConfig {
    /// Build configuration from `MARKSTRO_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64, _>(&lookup, "MARKSTRO_CACHE_TTL_MS", "integer")? {
            config.cache.ttl = Duration::from_millis(ms);
        }
        if let Some(entries) =
            parse_var::<usize, _>(&lookup, "MARKSTRO_CACHE_MAX_ENTRIES", "integer")?
        {
            config.cache.max_entries = entries;
        }
        if let Some(calls) = parse_var::<u32, _>(&lookup, "MARKSTRO_MAX_CALLS", "integer")? {
            config.rate_limit.max_calls = calls;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "MARKSTRO_COOLDOWN_MS", "integer")? {
            config.rate_limit.cooldown = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "MARKSTRO_TIMEOUT_MS", "integer")? {
            config.provider.timeout = Duration::from_millis(ms);
        }
        if let Some(demo) = parse_var::<bool, _>(&lookup, "MARKSTRO_DEMO_MODE", "boolean")? {
            config.fallback = if demo {
                FallbackMode::Demo
            } else {
                FallbackMode::Disabled
            };
        }

        config.provider.endpoint = match lookup("MARKSTRO_PROXY_URL") {
            Some(base_url) if !base_url.trim().is_empty() => ProviderEndpoint::proxy(
                base_url.trim().trim_end_matches('/'),
                lookup("MARKSTRO_PROXY_TOKEN").unwrap_or_default(),
            ),
            _ => {
                let api_key = lookup("MARKSTRO_ALPHAVANTAGE_API_KEY")
                    .or_else(|| lookup("ALPHAVANTAGE_API_KEY"))
                    .or_else(|| lookup("ALPHA_VANTAGE_KEY"))
                    .unwrap_or_else(|| String::from("demo"));
                ProviderEndpoint::direct(api_key)
            }
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.max_entries == 0 {
            return Err(ConfigError::Zero {
                field: "cache.max_entries",
            });
        }
        if self.rate_limit.max_calls == 0 {
            return Err(ConfigError::Zero {
                field: "rate_limit.max_calls",
            });
        }
        if self.rate_limit.cooldown.is_zero() {
            return Err(ConfigError::Zero {
                field: "rate_limit.cooldown",
            });
        }
        if self.provider.timeout.is_zero() {
            return Err(ConfigError::Zero {
                field: "provider.timeout",
            });
        }
        if let ProviderEndpoint::Proxy { token, .. } = &self.provider.endpoint {
            if token.trim().is_empty() {
                return Err(ConfigError::Blank {
                    field: "provider.endpoint.token",
                });
            }
        }
        Ok(())
    }
}

fn parse_var<T, F>(
    lookup: &F,
    name: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .to_ascii_lowercase()
        .parse::<T>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidEnv {
            name,
            expected,
            value: raw.clone(),
        })
}
