use std::env;
use std::time::Duration;
use std::num::NonZeroU32;
use governor::Quota;

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: String,
    pub port: u16,

    // Upstream status API
    pub status_api_base: String,
    pub user_agent: String,
    pub fetch_timeout_secs: u64,
    pub refresh_interval_secs: u64,

    // Admin access and registry durability
    pub admin_token: Option<String>,
    pub registry_file: Option<String>,

    // Rate limiting configs
    pub status_read_period_secs: u64,
    pub status_read_burst_limit: u32,
    pub refresh_period_secs: u64,
    pub refresh_burst_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            status_api_base: "https://api.mcsrvstat.us".to_string(),
            user_agent: default_user_agent(),
            fetch_timeout_secs: 10,
            refresh_interval_secs: 60,
            admin_token: None,
            registry_file: None,
            status_read_period_secs: 1,
            status_read_burst_limit: 30,
            refresh_period_secs: 10,
            refresh_burst_limit: 3,
        }
    }
}

fn default_user_agent() -> String {
    format!("mcstatus/{}", env!("CARGO_PKG_VERSION"))
}

fn parsed<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            port: parsed("PORT", defaults.port),

            status_api_base: non_empty("STATUS_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.status_api_base),
            user_agent: non_empty("STATUS_USER_AGENT").unwrap_or(defaults.user_agent),
            fetch_timeout_secs: parsed("FETCH_TIMEOUT_SECS", defaults.fetch_timeout_secs),
            refresh_interval_secs: parsed("REFRESH_INTERVAL_SECS", defaults.refresh_interval_secs),

            admin_token: non_empty("ADMIN_TOKEN"),
            registry_file: non_empty("REGISTRY_FILE"),

            status_read_period_secs: parsed("STATUS_READ_PERIOD_SECS", defaults.status_read_period_secs),
            status_read_burst_limit: parsed("STATUS_READ_BURST_LIMIT", defaults.status_read_burst_limit),
            refresh_period_secs: parsed("REFRESH_PERIOD_SECS", defaults.refresh_period_secs),
            refresh_burst_limit: parsed("REFRESH_BURST_LIMIT", defaults.refresh_burst_limit),
        }
    }

    pub fn bind(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn status_read_quota(&self) -> Quota {
        quota(self.status_read_period_secs, self.status_read_burst_limit)
    }

    pub fn refresh_quota(&self) -> Quota {
        quota(self.refresh_period_secs, self.refresh_burst_limit)
    }
}

fn quota(period_secs: u64, burst: u32) -> Quota {
    // Quota::with_period only rejects a zero duration, which the clamp rules out.
    let period = Duration::from_secs(period_secs.max(1));
    let burst = NonZeroU32::new(burst.max(1)).unwrap_or(NonZeroU32::MIN);
    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
        .allow_burst(burst)
}
