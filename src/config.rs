use std::time::Duration;

/// Server-side settings, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub client: ClientConfig,
}

/// Settings for the submission client. Injected explicitly so tests can
/// shrink timeouts and toggle the mock fallback without touching the
/// environment.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub webhook_url: String,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Development aid only: synthesize a successful result after all
    /// retries fail. Must stay off in production deployments.
    pub enable_mock_fallback: bool,
}

impl ClientConfig {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            request_timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_delay: Duration::from_secs(2),
            enable_mock_fallback: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5001".to_string())
            .parse()
            .unwrap_or(5001);

        let webhook_url = std::env::var("WEBHOOK_URL")
            .unwrap_or_else(|_| format!("http://127.0.0.1:{}/webhook", port));

        let mut client = ClientConfig::new(webhook_url);

        if let Ok(secs) = std::env::var("REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                client.request_timeout = Duration::from_secs(secs);
            }
        }

        client.enable_mock_fallback = std::env::var("ENABLE_MOCK_FALLBACK")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self { host, port, client })
    }
}
