use std::time::Duration;

use bounty_common::{env_or, EnvVars};
use bounty_runtime::DEFAULT_SNAPSHOT_DELAY;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_STORAGE_DIR: &str = ".bounty";

pub struct DeckbuilderEnv {
    pub api_url: String,
    pub storage_dir: String,
    pub snapshot_debounce_ms: u64,
    pub session_cookie: Option<String>,
}

impl DeckbuilderEnv {
    pub fn snapshot_delay(&self) -> Duration {
        Duration::from_millis(self.snapshot_debounce_ms)
    }
}

impl EnvVars for DeckbuilderEnv {
    fn load() -> Self {
        let default_delay = DEFAULT_SNAPSHOT_DELAY.as_millis() as u64;
        let debounce = env_or("BOUNTY_SNAPSHOT_DEBOUNCE_MS", &default_delay.to_string());
        let snapshot_debounce_ms = debounce.trim().parse().unwrap_or_else(|_| {
            warn!("BOUNTY_SNAPSHOT_DEBOUNCE_MS is not a number: {}", debounce);
            default_delay
        });

        Self {
            api_url: env_or("BOUNTY_API_URL", DEFAULT_API_URL),
            storage_dir: env_or("BOUNTY_STORAGE_DIR", DEFAULT_STORAGE_DIR),
            snapshot_debounce_ms,
            session_cookie: std::env::var("BOUNTY_SESSION_COOKIE")
                .ok()
                .filter(|c| !c.trim().is_empty()),
        }
    }

    fn get_env_var(&self, key: &str) -> Option<String> {
        match key {
            "BOUNTY_API_URL" => Some(self.api_url.clone()),
            "BOUNTY_STORAGE_DIR" => Some(self.storage_dir.clone()),
            "BOUNTY_SNAPSHOT_DEBOUNCE_MS" => Some(self.snapshot_debounce_ms.to_string()),
            "BOUNTY_SESSION_COOKIE" => self.session_cookie.clone(),
            _ => None,
        }
    }
}
