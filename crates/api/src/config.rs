use hof_core::error::CoreError;
use hof_core::pagination::MAX_SCAN_LIMIT;
use hof_core::selection::ScoringPolicy;
use hof_core::similarity::{DistanceMetric, ScanOptions, DEFAULT_THRESHOLD};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on draining in-flight requests after a shutdown signal.
    pub shutdown_timeout_secs: u64,
    /// Bearer token verification settings.
    pub jwt: JwtConfig,
    /// Selector and duplicate-detector tuning.
    pub engine: EngineConfig,
}

/// Tuning for the discovery and deduplication engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum distance for a pair to be reported as a duplicate candidate.
    pub similarity_threshold: f64,
    pub similarity_metric: DistanceMetric,
    /// Ceiling on `limit` for one duplicate scan request.
    pub duplicate_scan_max_limit: i64,
    /// Anti-repeat window applied when a request omits `view_max_age_days`.
    pub default_view_max_age_days: u32,
    pub scoring: ScoringPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_THRESHOLD,
            similarity_metric: DistanceMetric::default(),
            duplicate_scan_max_limit: MAX_SCAN_LIMIT,
            default_view_max_age_days: 30,
            scoring: ScoringPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Load engine settings from environment variables with defaults.
    ///
    /// | Env Var                     | Default   |
    /// |-----------------------------|-----------|
    /// | `SIMILARITY_THRESHOLD`      | `0.05`    |
    /// | `SIMILARITY_METRIC`         | `cosine`  |
    /// | `DUPLICATE_SCAN_MAX_LIMIT`  | `500`     |
    /// | `DEFAULT_VIEW_MAX_AGE_DAYS` | `30`      |
    /// | `TRENDING_WINDOW_DAYS`      | `7`       |
    /// | `RECENT_HALF_LIFE_DAYS`     | `14`      |
    /// | `ARCHEOLOGIST_MIN_AGE_DAYS` | `90`      |
    /// | `POPULAR_SMOOTHING`         | `1.0`     |
    ///
    /// # Panics
    ///
    /// Panics if a variable does not parse or the resulting settings are
    /// out of range. Misconfiguration should fail at startup.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            similarity_threshold: env_or("SIMILARITY_THRESHOLD", defaults.similarity_threshold),
            similarity_metric: env_or("SIMILARITY_METRIC", defaults.similarity_metric),
            duplicate_scan_max_limit: env_or(
                "DUPLICATE_SCAN_MAX_LIMIT",
                defaults.duplicate_scan_max_limit,
            ),
            default_view_max_age_days: env_or(
                "DEFAULT_VIEW_MAX_AGE_DAYS",
                defaults.default_view_max_age_days,
            ),
            scoring: ScoringPolicy {
                trending_window_days: env_or(
                    "TRENDING_WINDOW_DAYS",
                    defaults.scoring.trending_window_days,
                ),
                recent_half_life_days: env_or(
                    "RECENT_HALF_LIFE_DAYS",
                    defaults.scoring.recent_half_life_days,
                ),
                archeologist_min_age_days: env_or(
                    "ARCHEOLOGIST_MIN_AGE_DAYS",
                    defaults.scoring.archeologist_min_age_days,
                ),
                popular_smoothing: env_or("POPULAR_SMOOTHING", defaults.scoring.popular_smoothing),
            },
        };

        if let Err(e) = config.validate() {
            panic!("Invalid engine configuration: {e}");
        }
        config
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.scoring.validate()?;
        self.scan_options(self.similarity_threshold, None).validate()?;
        if self.duplicate_scan_max_limit < 1 {
            return Err(CoreError::Validation(format!(
                "Duplicate scan limit must be at least 1, got {}",
                self.duplicate_scan_max_limit
            )));
        }
        Ok(())
    }

    /// Scan options for the configured metric at the given threshold.
    pub fn scan_options(&self, threshold: f64, limit: Option<usize>) -> ScanOptions {
        ScanOptions {
            threshold,
            metric: self.similarity_metric,
            prune: true,
            limit,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    ///
    /// See [`JwtConfig::from_env`] and [`EngineConfig::from_env`] for the rest.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            engine: EngineConfig::from_env(),
        }
    }
}

/// Parse `name` from the environment, falling back to `default` when unset.
fn env_or<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} has an invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}
