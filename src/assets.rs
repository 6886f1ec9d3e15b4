//! # Assets Module
//!
//! Static registry of every asset the game loads at runtime. Assets are tagged
//! with the loading stage that needs them and the kind of decoder they go
//! through; the [`crate::loader::AssetLoader`] reads this table to know what to
//! fetch for each stage.

use std::fmt;

/// Loading stage an asset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    /// Needed before the home screen is interactive.
    Critical,
    /// Needed before entering the quiz.
    Game,
    /// Nice to have; never gates a screen.
    Optional,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 3] = [
        AssetCategory::Critical,
        AssetCategory::Game,
        AssetCategory::Optional,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetCategory::Critical => "critical",
            AssetCategory::Game => "game",
            AssetCategory::Optional => "optional",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoder an asset goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Audio,
    Image,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Audio => f.write_str("audio"),
            AssetKind::Image => f.write_str("image"),
        }
    }
}

/// One loadable asset, addressed by a path relative to the asset root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDefinition {
    pub path: String,
    pub category: AssetCategory,
    pub kind: AssetKind,
}

impl AssetDefinition {
    pub fn new(path: impl Into<String>, category: AssetCategory, kind: AssetKind) -> Self {
        Self {
            path: path.into(),
            category,
            kind,
        }
    }

    pub fn audio(path: impl Into<String>, category: AssetCategory) -> Self {
        Self::new(path, category, AssetKind::Audio)
    }

    pub fn image(path: impl Into<String>, category: AssetCategory) -> Self {
        Self::new(path, category, AssetKind::Image)
    }
}

// Home screen
/// Menu music loop
pub const MUSIC_MENU: &str = "audio/menu.mp3";
/// Generic UI click on the home screen
pub const AUDIO_MOUSE_CLICK: &str = "audio/mouse-click.wav";

// Quiz
/// In-round music loop
pub const MUSIC_IN_GAME: &str = "audio/in-game.mp3";
/// Ticking cue for the last seconds of a round
pub const AUDIO_COUNTDOWN_IN_GAME: &str = "audio/countdown-in-game.mp3";
/// 3-2-1 cue before a round starts
pub const AUDIO_COUNTDOWN_TO_GAME: &str = "audio/countdown-to-game.mp3";
/// Correct answer cue
pub const AUDIO_CORRECT: &str = "audio/correct.mp3";
/// Wrong answer cue
pub const AUDIO_WRONG: &str = "audio/wrong-2.wav";
/// Answer button click
pub const AUDIO_CLICK: &str = "audio/click.mp3";

/// Immutable list of assets, fixed when the loader is created.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    assets: Vec<AssetDefinition>,
}

impl AssetCatalog {
    pub fn new(assets: Vec<AssetDefinition>) -> Self {
        Self { assets }
    }

    /// The assets the shipped game uses.
    pub fn standard() -> Self {
        use AssetCategory::{Critical, Game};
        Self::new(vec![
            AssetDefinition::audio(MUSIC_MENU, Critical),
            AssetDefinition::audio(AUDIO_MOUSE_CLICK, Critical),
            AssetDefinition::audio(MUSIC_IN_GAME, Game),
            AssetDefinition::audio(AUDIO_COUNTDOWN_IN_GAME, Game),
            AssetDefinition::audio(AUDIO_COUNTDOWN_TO_GAME, Game),
            AssetDefinition::audio(AUDIO_CORRECT, Game),
            AssetDefinition::audio(AUDIO_WRONG, Game),
            AssetDefinition::audio(AUDIO_CLICK, Game),
        ])
    }

    /// Assets of one category, in declaration order.
    pub fn in_category(&self, category: AssetCategory) -> Vec<&AssetDefinition> {
        self.assets
            .iter()
            .filter(|asset| asset.category == category)
            .collect()
    }

    pub fn find(&self, path: &str) -> Option<&AssetDefinition> {
        self.assets.iter().find(|asset| asset.path == path)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
