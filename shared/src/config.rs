use tracing::warn;

/// Process configuration, read once at startup.
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub geocoding_api_key: Option<String>,
    pub suggest_api_key: Option<String>,
}

impl Config {
    const DEFAULT_HOST: &str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 5000;
    const DEFAULT_DB_PATH: &str = "geocache.db";

    pub fn from_env() -> Self {
        let host = std::env::var("GEOCACHE_HOST").unwrap_or_else(|_| Self::DEFAULT_HOST.to_string());
        let port = std::env::var("GEOCACHE_PORT")
            .unwrap_or_else(|_| Self::DEFAULT_PORT.to_string())
            .parse::<u16>()
            .unwrap_or(Self::DEFAULT_PORT);
        let db_path =
            std::env::var("GEOCACHE_DB_PATH").unwrap_or_else(|_| Self::DEFAULT_DB_PATH.to_string());

        // An empty key counts as unset: the endpoint answers 503 either way.
        let geocoding_api_key = std::env::var("YANDEX_GEOCODING_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());
        let suggest_api_key = std::env::var("YANDEX_SUGGEST_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        if geocoding_api_key.is_none() {
            warn!("YANDEX_GEOCODING_API_KEY not set, /geocode will answer 503");
        }
        if suggest_api_key.is_none() {
            warn!("YANDEX_SUGGEST_API_KEY not set, /suggest will answer 503");
        }

        Self {
            host,
            port,
            db_path,
            geocoding_api_key,
            suggest_api_key,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
