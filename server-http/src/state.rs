use cache_store::CacheStore;
use shared::config::Config;
use std::sync::Arc;
use yandex_client::YandexClient;

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// `None` when the database could not be opened at startup; the proxy
    /// then runs without caching (every lookup is a miss, writes are skipped).
    pub store: Option<CacheStore>,
    pub yandex: YandexClient,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Self {
        let store = match CacheStore::open(&config.db_path) {
            Ok(store) => {
                tracing::info!("cache store opened at {}", config.db_path);
                Some(store)
            }
            Err(e) => {
                tracing::error!(
                    "failed to open cache store at {}: {e}. Running without cache.",
                    config.db_path
                );
                None
            }
        };

        Self {
            store,
            yandex: YandexClient::new(),
            config,
        }
    }

    /// Assemble state from pre-built parts. Used by tests.
    pub fn with_parts(store: Option<CacheStore>, yandex: YandexClient, config: Config) -> Self {
        Self {
            store,
            yandex,
            config: Arc::new(config),
        }
    }
}
