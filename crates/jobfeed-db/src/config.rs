use jobfeed_core::AppError;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Connection settings for the job store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Read configuration from environment variables.
    ///
    /// - `DATABASE_URL` (required)
    /// - `DATABASE_MAX_CONNECTIONS` (optional, defaults to 5)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                AppError::ConfigError(
                    "DATABASE_URL not set. Required to store scraped jobs.".into(),
                )
            })?;

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(0) => {
                    return Err(AppError::ConfigError(
                        "DATABASE_MAX_CONNECTIONS must be at least 1".into(),
                    ));
                }
                Ok(parsed) => parsed,
                Err(_) => {
                    return Err(AppError::ConfigError(format!(
                        "Invalid DATABASE_MAX_CONNECTIONS '{raw}': must be a positive integer"
                    )));
                }
            },
        };

        Ok(Self {
            url,
            max_connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<DatabaseConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DatabaseConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_pool_size() {
        let cfg = config(&[("DATABASE_URL", "postgres://localhost/jobs")]).unwrap();
        assert_eq!(cfg.url, "postgres://localhost/jobs");
        assert_eq!(cfg.max_connections, 5);
    }

    #[test]
    fn requires_url() {
        let err = config(&[]).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn rejects_zero_and_garbage_pool_sizes() {
        let url = ("DATABASE_URL", "postgres://localhost/jobs");
        assert!(config(&[url, ("DATABASE_MAX_CONNECTIONS", "0")]).is_err());
        assert!(config(&[url, ("DATABASE_MAX_CONNECTIONS", "many")]).is_err());
        assert_eq!(
            config(&[url, ("DATABASE_MAX_CONNECTIONS", "12")])
                .unwrap()
                .max_connections,
            12
        );
    }
}
