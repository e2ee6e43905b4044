use std::time::Duration;

/// Listener addresses and lifecycle timeouts.
///
/// | Variable | Default |
/// |----------|---------|
/// | `DROP_WEB_API_HOST` | `0.0.0.0:3000` |
/// | `DROP_WEB_DEBUG_HOST` | `0.0.0.0:4000` |
/// | `DROP_WEB_SHUTDOWN_TIMEOUT_SECS` | `5` |
/// | `DROP_BUILD` | `develop` |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebConfig {
    pub api_host: String,
    pub debug_host: String,
    pub shutdown_timeout: Duration,
    pub build: String,
}

impl WebConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secs = |key: &str, default: u64| {
            Duration::from_secs(
                lookup(key)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(default),
            )
        };

        Self {
            api_host: lookup("DROP_WEB_API_HOST").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            debug_host: lookup("DROP_WEB_DEBUG_HOST")
                .unwrap_or_else(|| "0.0.0.0:4000".to_string()),
            shutdown_timeout: secs("DROP_WEB_SHUTDOWN_TIMEOUT_SECS", 5),
            build: lookup("DROP_BUILD").unwrap_or_else(|| "develop".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = WebConfig::from_lookup(|_| None);
        assert_eq!(config.api_host, "0.0.0.0:3000");
        assert_eq!(config.debug_host, "0.0.0.0:4000");
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(config.build, "develop");
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("DROP_WEB_API_HOST", "127.0.0.1:8080"),
            ("DROP_WEB_SHUTDOWN_TIMEOUT_SECS", "soon"),
        ]);
        let config = WebConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_host, "127.0.0.1:8080");
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
    }
}
