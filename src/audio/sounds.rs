//! Closed set of sounds and music tracks the game can play.

use std::fmt;

use crate::assets::{self, AssetCategory};

/// How repeated plays of the same sound interact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPolicy {
    /// Every play is a new, independent instance (UI clicks).
    Overlap,
    /// A new play stops the previous tracked instance (in-round cues).
    Exclusive,
}

/// Short sound effects, decoded once and played from memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundId {
    MouseClick,
    Click,
    Correct,
    Wrong,
    Countdown,
    CountdownToStart,
}

impl SoundId {
    pub const ALL: [SoundId; 6] = [
        SoundId::MouseClick,
        SoundId::Click,
        SoundId::Correct,
        SoundId::Wrong,
        SoundId::Countdown,
        SoundId::CountdownToStart,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SoundId::MouseClick => "mouse-click",
            SoundId::Click => "click",
            SoundId::Correct => "correct",
            SoundId::Wrong => "wrong",
            SoundId::Countdown => "countdown",
            SoundId::CountdownToStart => "countdown-to-start",
        }
    }

    /// Looks up a sound by its external name.
    pub fn from_name(name: &str) -> Option<SoundId> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }

    pub fn path(self) -> &'static str {
        match self {
            SoundId::MouseClick => assets::AUDIO_MOUSE_CLICK,
            SoundId::Click => assets::AUDIO_CLICK,
            SoundId::Correct => assets::AUDIO_CORRECT,
            SoundId::Wrong => assets::AUDIO_WRONG,
            SoundId::Countdown => assets::AUDIO_COUNTDOWN_IN_GAME,
            SoundId::CountdownToStart => assets::AUDIO_COUNTDOWN_TO_GAME,
        }
    }

    /// Loading stage whose audio init registers this sound.
    pub fn category(self) -> AssetCategory {
        match self {
            SoundId::MouseClick => AssetCategory::Critical,
            _ => AssetCategory::Game,
        }
    }

    pub fn policy(self) -> PlaybackPolicy {
        match self {
            SoundId::MouseClick | SoundId::Click => PlaybackPolicy::Overlap,
            SoundId::Correct | SoundId::Wrong | SoundId::Countdown | SoundId::CountdownToStart => {
                PlaybackPolicy::Exclusive
            }
        }
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Looping music.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MusicTrack {
    /// Home screen background music.
    Menu,
    /// Music under a quiz round.
    InGame,
}

impl MusicTrack {
    pub const ALL: [MusicTrack; 2] = [MusicTrack::Menu, MusicTrack::InGame];

    pub fn path(self) -> &'static str {
        match self {
            MusicTrack::Menu => assets::MUSIC_MENU,
            MusicTrack::InGame => assets::MUSIC_IN_GAME,
        }
    }

    pub fn category(self) -> AssetCategory {
        match self {
            MusicTrack::Menu => AssetCategory::Critical,
            MusicTrack::InGame => AssetCategory::Game,
        }
    }
}

impl fmt::Display for MusicTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MusicTrack::Menu => f.write_str("menu music"),
            MusicTrack::InGame => f.write_str("in-game music"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetCatalog;

    #[test]
    fn every_sound_is_in_the_catalog_under_its_stage() {
        let catalog = AssetCatalog::standard();
        for id in SoundId::ALL {
            let asset = catalog.find(id.path()).unwrap();
            assert_eq!(asset.category, id.category(), "{id}");
        }
        for track in MusicTrack::ALL {
            let asset = catalog.find(track.path()).unwrap();
            assert_eq!(asset.category, track.category(), "{track}");
        }
    }

    #[test]
    fn names_round_trip() {
        for id in SoundId::ALL {
            assert_eq!(SoundId::from_name(id.name()), Some(id));
        }
        assert_eq!(SoundId::from_name("gameOver"), None);
    }

    #[test]
    fn clicks_overlap_and_cues_are_exclusive() {
        assert_eq!(SoundId::Click.policy(), PlaybackPolicy::Overlap);
        assert_eq!(SoundId::MouseClick.policy(), PlaybackPolicy::Overlap);
        assert_eq!(SoundId::Countdown.policy(), PlaybackPolicy::Exclusive);
        assert_eq!(SoundId::Correct.policy(), PlaybackPolicy::Exclusive);
    }
}
