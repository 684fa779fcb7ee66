use std::env;
use std::time::Duration;

/// Ceiling for request bodies on the food scanner route (base64 camera frames).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub const DEFAULT_NUTRIENTS_URL: &str = "https://trackapi.nutritionix.com/v2/natural/nutrients";

const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "https://chinny.net",
    "https://www.chinny.net",
    "http://localhost:3000",
];

/// Credentials and endpoints for the food scanner.
#[derive(Debug, Clone)]
pub struct FoodiSettings {
    pub app_id: Option<String>,
    pub api_key: Option<String>,
    pub classifier_url: Option<String>,
    pub nutrients_url: String,
    pub max_upload_bytes: usize,
}

impl Default for FoodiSettings {
    fn default() -> Self {
        Self {
            app_id: None,
            api_key: None,
            classifier_url: None,
            nutrients_url: DEFAULT_NUTRIENTS_URL.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Server settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub http_proxy: Option<String>,
    pub finnhub_api_key: Option<String>,
    pub foodi: FoodiSettings,
    pub allowed_origins: Vec<String>,
    pub options_refresh: Duration,
    pub earnings_window_days: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            http_proxy: None,
            finnhub_api_key: None,
            foodi: FoodiSettings::default(),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
            options_refresh: Duration::from_secs(30),
            earnings_window_days: 7,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let allowed_origins = get("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().trim_end_matches('/').to_string())
                    .filter(|o| !o.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or(defaults.allowed_origins);

        Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: get("PORT").and_then(|p| p.parse().ok()).unwrap_or(defaults.port),
            http_proxy: get("HTTP_PROXY"),
            finnhub_api_key: get("FINNHUB_API_KEY"),
            foodi: FoodiSettings {
                app_id: get("FOODI_APP_ID"),
                api_key: get("FOODI_API_KEY"),
                classifier_url: get("FOODI_CLASSIFIER_URL"),
                nutrients_url: get("FOODI_NUTRIENTS_URL").unwrap_or(defaults.foodi.nutrients_url),
                max_upload_bytes: get("FOODI_MAX_UPLOAD_MB")
                    .and_then(|mb| mb.parse::<usize>().ok())
                    .filter(|mb| *mb > 0)
                    .and_then(|mb| mb.checked_mul(1024 * 1024))
                    .unwrap_or(defaults.foodi.max_upload_bytes),
            },
            allowed_origins,
            options_refresh: get("OPTIONS_REFRESH_SECS")
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.options_refresh),
            earnings_window_days: get("EARNINGS_WINDOW_DAYS")
                .and_then(|d| d.parse::<i64>().ok())
                .filter(|d| *d >= 0)
                .unwrap_or(defaults.earnings_window_days),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let s = settings(&[]);
        assert_eq!(s.bind_addr(), "0.0.0.0:8000");
        assert_eq!(s.options_refresh, Duration::from_secs(30));
        assert_eq!(s.earnings_window_days, 7);
        assert_eq!(s.foodi.nutrients_url, DEFAULT_NUTRIENTS_URL);
        assert_eq!(s.foodi.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(s.allowed_origins.len(), 3);
        assert!(s.finnhub_api_key.is_none());
    }

    #[test]
    fn reads_overrides() {
        let s = settings(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("FINNHUB_API_KEY", "abc"),
            ("ALLOWED_ORIGINS", "https://a.dev/, https://b.dev"),
            ("OPTIONS_REFRESH_SECS", "5"),
            ("FOODI_MAX_UPLOAD_MB", "8"),
        ]);
        assert_eq!(s.foodi.max_upload_bytes, 8 * 1024 * 1024);
        assert_eq!(s.bind_addr(), "127.0.0.1:9000");
        assert_eq!(s.finnhub_api_key.as_deref(), Some("abc"));
        assert_eq!(s.allowed_origins, vec!["https://a.dev", "https://b.dev"]);
        assert_eq!(s.options_refresh, Duration::from_secs(5));
    }

    #[test]
    fn invalid_values_fall_back() {
        let s = settings(&[
            ("PORT", "http"),
            ("FOODI_API_KEY", "   "),
            ("OPTIONS_REFRESH_SECS", "0"),
            ("ALLOWED_ORIGINS", " , "),
        ]);
        assert_eq!(s.port, 8000);
        assert!(s.foodi.api_key.is_none());
        assert_eq!(s.options_refresh, Duration::from_secs(30));
        assert_eq!(s.allowed_origins.len(), 3);
    }
}
