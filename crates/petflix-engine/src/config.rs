//! Pipeline configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use petflix_models::{Resolution, SCENES_PER_THEME};
use petflix_store::{DEFAULT_CAP_USD, DEFAULT_UNIT_PRICE_USD};

/// Orchestrator-level settings. Client-level settings (URLs, keys,
/// polling) live with the clients themselves.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Clips per run; fixed by the narrative structure
    pub total_clips: u32,
    /// Requested clip length, used to estimate cost up front
    pub estimated_clip_seconds: f64,
    /// Pause between consecutive generation submissions
    pub inter_call_delay: Duration,
    pub cache_dir: PathBuf,
    pub ledger_path: PathBuf,
    pub budget_cap_usd: f64,
    pub unit_price_usd: f64,
    pub resolution: Resolution,
    /// JSON manifest mapping reference image ids to image refs
    pub reference_manifest: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            total_clips: SCENES_PER_THEME as u32,
            estimated_clip_seconds: 4.0,
            inter_call_delay: Duration::from_millis(15_000),
            cache_dir: PathBuf::from(".petflix/cache"),
            ledger_path: PathBuf::from(".petflix/budget.json"),
            budget_cap_usd: DEFAULT_CAP_USD,
            unit_price_usd: DEFAULT_UNIT_PRICE_USD,
            resolution: Resolution::default(),
            reference_manifest: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(secs) = env_parse::<f64>("CLIP_DURATION_SECS") {
            config.estimated_clip_seconds = secs;
        }
        if let Some(ms) = env_parse::<u64>("API_CALL_DELAY_MS") {
            config.inter_call_delay = Duration::from_millis(ms);
        }
        if let Ok(dir) = std::env::var("VIDEO_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("BUDGET_LEDGER_PATH") {
            config.ledger_path = PathBuf::from(path);
        }
        if let Some(cap) = env_parse::<f64>("BUDGET_CAP_USD") {
            config.budget_cap_usd = cap;
        }
        if let Some(price) = env_parse::<f64>("BUDGET_UNIT_PRICE_USD") {
            config.unit_price_usd = price;
        }
        if let Some(resolution) = std::env::var("OUTPUT_RESOLUTION")
            .ok()
            .and_then(|v| parse_resolution(&v))
        {
            config.resolution = resolution;
        }
        config.reference_manifest = std::env::var("REFERENCE_IMAGE_MANIFEST")
            .ok()
            .map(PathBuf::from);
        config
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn parse_resolution(raw: &str) -> Option<Resolution> {
    match raw.to_lowercase().as_str() {
        "sd" => Some(Resolution::Sd),
        "hd" => Some(Resolution::Hd),
        "1080" => Some(Resolution::Full1080),
        _ => None,
    }
}
