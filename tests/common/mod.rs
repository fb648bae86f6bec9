use cryptomoon::config::Config;
use cryptomoon::repository::Repository;
use cryptomoon::storage::CacheStore;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_cache() -> (CacheStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let store = CacheStore::new_with_path(tmp.path()).expect("failed to create cache store");
    (store, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Configuration pointing both backends at mock servers
#[allow(dead_code)]
pub fn config_for(crypto_url: &str, moon_url: &str, cache_dir: &Path) -> Config {
    let mut config = Config::default();
    config.backends.crypto.base_url = crypto_url.to_string();
    config.backends.moon.base_url = moon_url.to_string();
    config.cache.dir = Some(cache_dir.to_string_lossy().to_string());
    config.http.connect_timeout_seconds = 2;
    config.http.request_timeout_seconds = 5;
    config
}

#[allow(dead_code)]
pub fn repository_for(crypto_url: &str, moon_url: &str, cache_dir: &Path) -> Repository {
    Repository::from_config(&config_for(crypto_url, moon_url, cache_dir))
        .expect("failed to build repository")
}

/// Moon phase body as served by the moon backend
#[allow(dead_code)]
pub fn moon_phase_json(with_prediction: bool) -> Value {
    let mut body = json!({
        "phase": "Waxing Gibbous",
        "phaseEmoji": "🌔",
        "waxing": true,
        "waning": false,
        "lunarAge": 11.3,
        "lunarAgePercent": 38.3,
        "lunationNumber": 1262,
        "lunarDistance": 389612.4,
        "nextFullMoon": "2026-10-26T04:11:00Z",
        "lastFullMoon": "2026-09-27T12:49:00Z"
    });
    if with_prediction {
        body["cryptoPrediction"] = json!({
            "trend": "bullish",
            "confidence": "medium",
            "reasoning": "Waxing phases historically precede rallies.",
            "recommendation": "Consider accumulating."
        });
    }
    body
}

/// Crypto summary body with a price list and a text item
#[allow(dead_code)]
pub fn crypto_summary_json() -> Value {
    json!({
        "items": [
            {
                "type": "prices",
                "ts": 1760000000000i64,
                "base": "USD",
                "coins": [
                    {"symbol": "btc", "name": "Bitcoin", "price": 65000.5, "change1hPct": 0.4},
                    {"symbol": "eth", "price": 2450.0}
                ]
            },
            {"type": "text", "ts": 1760000000001i64, "text": "Markets are calm."}
        ]
    })
}
