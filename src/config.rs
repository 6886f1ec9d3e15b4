use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

/// Number of discrete volume steps in a music fade.
pub const FADE_STEPS: u32 = 20;

/// Fade length used for screen transitions.
pub const DEFAULT_FADE: Duration = Duration::from_millis(1000);

/// Seconds on the clock for a quiz round.
pub const QUESTION_TIME_SECS: u32 = 15;

/// Remaining seconds at which the warning cue starts.
pub const WARNING_AT_SECS: u32 = 10;

/// First number shown by the pre-round countdown.
pub const COUNTDOWN_FROM: u8 = 3;

/// Gap between two numbers of the pre-round countdown.
pub const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

/// Delay before the countdown-to-start cue when the quiz screen opens.
pub const INTRO_CUE_DELAY: Duration = Duration::from_millis(500);

/// Music volume change per `+`/`-` key press.
pub const VOLUME_STEP: f32 = 0.1;

/// Points awarded for a correct answer.
pub const POINTS_PER_CORRECT: u32 = 100;

/// How long a tip stays on the loading screen.
pub const TIP_ROTATION: Duration = Duration::from_secs(9);

/// Pause between showing the loading screen and starting the game loads.
pub const LOADING_DELAY: Duration = Duration::from_millis(3000);

/// Pause between the home screen leaving and the loading screen appearing.
pub const SCREEN_SWAP_DELAY: Duration = Duration::from_millis(100);

/// Environment variable naming an optional JSON config file.
pub const CONFIG_PATH_VAR: &str = "DAILY_COVER_CONFIG";
/// Environment override for [`GameConfig::api_base`].
pub const API_BASE_VAR: &str = "DAILY_COVER_API_BASE";
/// Environment override for [`GameConfig::asset_root`].
pub const ASSET_ROOT_VAR: &str = "DAILY_COVER_ASSET_ROOT";

/// Top-level configuration for the game client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Base URL of the question backend, without a trailing slash.
    pub api_base: String,
    /// Directory or `http(s)://` base URL the static assets are served from.
    pub asset_root: String,
    /// Retries after the first failed question request.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on every further retry.
    #[serde(rename = "retry_base_delay_ms", with = "millis")]
    pub retry_base_delay: Duration,
    /// Background music volume (linear, 0..=1).
    pub music_volume: f32,
    /// Sound effect volume (linear, 0..=1).
    pub sfx_volume: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:3030/api".to_string(),
            asset_root: "assets".to_string(),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(1000),
            music_volume: 0.1,
            sfx_volume: 0.6,
        }
    }
}

impl GameConfig {
    /// Parses a JSON config; missing fields fall back to the defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    /// Builds the config from the process environment.
    ///
    /// `lookup` resolves environment variables so callers (and tests) decide
    /// where values come from. A config file that fails to read or parse is
    /// logged and ignored.
    pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = match lookup(CONFIG_PATH_VAR) {
            Some(path) => match Self::read_file(Path::new(&path)) {
                Ok(config) => {
                    info!("loaded config from {}", path);
                    config
                }
                Err(e) => {
                    warn!("ignoring config file {}: {}", path, e);
                    Self::default()
                }
            },
            None => Self::default(),
        };

        if let Some(api_base) = lookup(API_BASE_VAR) {
            config.api_base = api_base;
        }
        if let Some(asset_root) = lookup(ASSET_ROOT_VAR) {
            config.asset_root = asset_root;
        }
        config.normalized()
    }

    fn read_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }

    fn normalized(mut self) -> Self {
        self.music_volume = clamp_volume(self.music_volume);
        self.sfx_volume = clamp_volume(self.sfx_volume);
        while self.api_base.ends_with('/') {
            self.api_base.pop();
        }
        self
    }
}

/// Clamps a linear volume into `0..=1`, mapping NaN to silence.
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        return 0.0;
    }
    volume.clamp(0.0, 1.0)
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
