//! Audio engine.
//!
//! Wraps a kira [`AudioManager`] behind a one-way unlock gate: nothing plays
//! until [`AudioEngine::unlock`] has opened the output from a user input.
//! Sound effects are decoded up front into a buffer table and every play
//! starts a fresh instance at the effect volume; music tracks loop and are
//! paused/rewound instead of being restarted.

pub mod sounds;

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::future::join_all;
use kira::backend::Backend;
use kira::sound::PlaybackState;
use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle, StaticSoundSettings};
use kira::{
    AudioManager, AudioManagerSettings, Decibels, DefaultBackend, Easing, Frame, StartTime, Tween,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::assets::AssetCategory;
use crate::config::{FADE_STEPS, clamp_volume};
use crate::error::{AssetLoadError, AudioUnlockError};
use crate::loader::AssetLoader;

pub use sounds::{MusicTrack, PlaybackPolicy, SoundId};

/// Quietest level kira treats as audible; anything below is silence.
const SILENCE_DB: f32 = -60.0;

/// Opens the audio output. Called by [`AudioEngine::unlock`].
pub type OutputOpener<B> = Box<dyn Fn() -> Result<AudioManager<B>, AudioUnlockError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockState {
    Locked,
    Unlocking,
    Unlocked,
}

/// Converts a linear volume to decibels, floored at silence.
pub fn amplitude_to_db(amplitude: f32) -> f32 {
    let amplitude = clamp_volume(amplitude);
    if amplitude <= 0.0 {
        return SILENCE_DB;
    }
    (20.0 * amplitude.log10()).max(SILENCE_DB)
}

pub fn amplitude_to_decibels(amplitude: f32) -> Decibels {
    Decibels::from(amplitude_to_db(amplitude))
}

fn immediate() -> Tween {
    Tween {
        start_time: StartTime::Immediate,
        duration: Duration::from_millis(10),
        easing: Easing::Linear,
    }
}

/// A short silent clip used to validate the output when no music is loaded yet.
fn silent_reference() -> StaticSoundData {
    StaticSoundData {
        sample_rate: 44_100,
        frames: Arc::from(vec![Frame::new(0.0, 0.0); 441]),
        settings: StaticSoundSettings::default(),
        slice: None,
    }
}

#[derive(Default)]
struct MusicChannel {
    data: Option<StaticSoundData>,
    handle: Option<StaticSoundHandle>,
    playing: bool,
    /// Resume this loop when mute is lifted.
    resume_on_unmute: bool,
    /// Current linear level, including any fade in progress.
    level: f32,
}

impl MusicChannel {
    fn set_level(&mut self, level: f32) {
        self.level = level;
        if let Some(handle) = self.handle.as_mut() {
            handle.set_volume(amplitude_to_decibels(level), immediate());
        }
    }

    fn pause(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.pause(immediate());
        }
        self.playing = false;
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.pause(immediate());
            handle.seek_to(0.0);
        }
        self.playing = false;
        self.resume_on_unmute = false;
    }

    fn mute(&mut self) {
        self.resume_on_unmute |= self.playing;
        self.pause();
    }
}

struct EngineState<B: Backend> {
    unlock: UnlockState,
    manager: Option<AudioManager<B>>,
    muted: bool,
    music_volume: f32,
    sfx_volume: f32,
    /// Append-only table of decoded effects.
    buffers: HashMap<SoundId, StaticSoundData>,
    /// At most one tracked instance per sound, for exclusive plays.
    active: HashMap<SoundId, StaticSoundHandle>,
    background: MusicChannel,
    in_game: MusicChannel,
}

impl<B: Backend> EngineState<B> {
    fn can_play(&self) -> bool {
        self.unlock == UnlockState::Unlocked && !self.muted
    }

    fn channel_mut(&mut self, track: MusicTrack) -> &mut MusicChannel {
        match track {
            MusicTrack::Menu => &mut self.background,
            MusicTrack::InGame => &mut self.in_game,
        }
    }

    /// Forget tracked instances that finished on their own.
    fn prune_finished(&mut self) {
        self.active
            .retain(|_, handle| handle.state() != PlaybackState::Stopped);
    }

    fn start_effect(&mut self, id: SoundId) -> Option<StaticSoundHandle> {
        let Some(data) = self.buffers.get(&id) else {
            warn!("sound {} is not loaded, skipping", id);
            return None;
        };
        let data = data.clone().volume(amplitude_to_decibels(self.sfx_volume));
        let manager = self.manager.as_mut()?;
        match manager.play(data) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("failed to play {}: {:?}", id, e);
                None
            }
        }
    }

    fn start_music(&mut self, track: MusicTrack) -> bool {
        if self.unlock != UnlockState::Unlocked {
            return false;
        }
        if self.muted {
            // Picked up by the unmute.
            self.channel_mut(track).resume_on_unmute = true;
            return false;
        }
        let EngineState {
            manager,
            background,
            in_game,
            ..
        } = self;
        let channel = match track {
            MusicTrack::Menu => background,
            MusicTrack::InGame => in_game,
        };
        if channel.playing {
            return true;
        }
        let level = channel.level;
        if let Some(handle) = channel.handle.as_mut() {
            handle.set_volume(amplitude_to_decibels(level), immediate());
            handle.resume(immediate());
            channel.playing = true;
            return true;
        }

        let Some(data) = channel.data.clone() else {
            warn!("{} is not loaded, skipping", track);
            return false;
        };
        let Some(manager) = manager.as_mut() else {
            return false;
        };
        match manager.play(data.loop_region(..).volume(amplitude_to_decibels(level))) {
            Ok(handle) => {
                debug!("started {}", track);
                channel.handle = Some(handle);
                channel.playing = true;
                true
            }
            Err(e) => {
                warn!("failed to start {}: {:?}", track, e);
                false
            }
        }
    }
}

pub struct AudioEngine<B: Backend = DefaultBackend> {
    state: Mutex<EngineState<B>>,
    opener: OutputOpener<B>,
    /// Bumped by every fade; a running fade stops touching the volume once
    /// a newer one starts.
    fade_generation: AtomicU64,
}

impl<B> AudioEngine<B>
where
    B: Backend + 'static,
    B::Settings: Default,
    B::Error: Debug,
{
    /// An engine that opens the backend's default output on unlock.
    pub fn new(music_volume: f32, sfx_volume: f32) -> Self {
        Self::with_opener(
            music_volume,
            sfx_volume,
            Box::new(|| {
                AudioManager::<B>::new(AudioManagerSettings::default())
                    .map_err(|e| AudioUnlockError::Output(format!("{:?}", e)))
            }),
        )
    }
}

impl<B: Backend> AudioEngine<B> {
    pub fn with_opener(music_volume: f32, sfx_volume: f32, opener: OutputOpener<B>) -> Self {
        let music_volume = clamp_volume(music_volume);
        let background = MusicChannel {
            level: music_volume,
            ..MusicChannel::default()
        };
        let in_game = MusicChannel {
            level: music_volume,
            ..MusicChannel::default()
        };
        Self {
            state: Mutex::new(EngineState {
                unlock: UnlockState::Locked,
                manager: None,
                muted: false,
                music_volume,
                sfx_volume: clamp_volume(sfx_volume),
                buffers: HashMap::new(),
                active: HashMap::new(),
                background,
                in_game,
            }),
            opener,
            fade_generation: AtomicU64::new(0),
        }
    }

    /// Activate audio output. Call from a user input handler.
    ///
    /// Returns `true` once unlocked; later calls return `true` without doing
    /// anything. On failure the engine stays locked and the call can be
    /// repeated on the next input.
    pub fn unlock(&self) -> bool {
        match self.try_unlock() {
            Ok(()) => true,
            Err(e) => {
                warn!("audio unlock failed: {}", e);
                false
            }
        }
    }

    pub fn try_unlock(&self) -> Result<(), AudioUnlockError> {
        let mut state = self.state.lock();
        if state.unlock == UnlockState::Unlocked {
            return Ok(());
        }
        state.unlock = UnlockState::Unlocking;

        let mut manager = match (self.opener)() {
            Ok(manager) => manager,
            Err(e) => {
                state.unlock = UnlockState::Locked;
                return Err(e);
            }
        };

        // Zero-volume play/pause cycle on a reference clip.
        let reference = state
            .background
            .data
            .clone()
            .unwrap_or_else(silent_reference)
            .volume(Decibels::from(SILENCE_DB));
        match manager.play(reference) {
            Ok(mut handle) => {
                handle.pause(immediate());
                handle.stop(immediate());
            }
            Err(e) => {
                state.unlock = UnlockState::Locked;
                return Err(AudioUnlockError::Validation(format!("{:?}", e)));
            }
        }

        state.manager = Some(manager);
        state.unlock = UnlockState::Unlocked;
        info!("audio unlocked");
        Ok(())
    }

    pub fn unlock_state(&self) -> UnlockState {
        self.state.lock().unlock
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlock_state() == UnlockState::Unlocked
    }

    /// Register the home screen effects and the menu loop from the loader.
    pub async fn initialize_critical_audio(&self, loader: &AssetLoader) -> Result<(), AssetLoadError> {
        self.initialize_stage(loader, AssetCategory::Critical).await
    }

    /// Register the quiz effects and the in-round loop from the loader.
    pub async fn initialize_game_audio(&self, loader: &AssetLoader) -> Result<(), AssetLoadError> {
        self.initialize_stage(loader, AssetCategory::Game).await
    }

    async fn initialize_stage(
        &self,
        loader: &AssetLoader,
        category: AssetCategory,
    ) -> Result<(), AssetLoadError> {
        if !self.is_unlocked() {
            debug!("initializing {} audio before unlock", category);
        }

        let sounds = SoundId::ALL
            .into_iter()
            .filter(|id| id.category() == category)
            .map(|id| async move { (id, loader.ensure_audio(id.path()).await) });
        let tracks = MusicTrack::ALL
            .into_iter()
            .filter(|track| track.category() == category)
            .map(|track| async move { (track, loader.ensure_audio(track.path()).await) });
        let (sounds, tracks) = futures::join!(join_all(sounds), join_all(tracks));

        let mut first_error = None;
        let mut state = self.state.lock();
        for (id, result) in sounds {
            match result {
                Ok(data) => {
                    state.buffers.entry(id).or_insert(data);
                }
                Err(e) => {
                    warn!("no buffer for {}: {}", id, e);
                    first_error.get_or_insert(e);
                }
            }
        }
        for (track, result) in tracks {
            match result {
                Ok(data) => {
                    let channel = state.channel_mut(track);
                    if channel.data.is_none() {
                        channel.data = Some(data);
                    }
                }
                Err(e) => {
                    warn!("no buffer for {}: {}", track, e);
                    first_error.get_or_insert(e);
                }
            }
        }
        info!("{} audio initialized", category);

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn has_buffer(&self, id: SoundId) -> bool {
        self.state.lock().buffers.contains_key(&id)
    }

    /// Play a fresh, independent instance of `id`.
    ///
    /// Does nothing while locked or muted, or when the sound has no buffer.
    pub fn play_sound(&self, id: SoundId) -> Option<StaticSoundHandle> {
        let mut state = self.state.lock();
        if !state.can_play() {
            return None;
        }
        state.start_effect(id)
    }

    /// Stop the tracked instance of `id`, then play and track a new one.
    pub fn play_sound_with_stop(&self, id: SoundId) -> bool {
        let mut state = self.state.lock();
        if !state.can_play() {
            return false;
        }
        state.prune_finished();
        if let Some(mut previous) = state.active.remove(&id) {
            previous.stop(immediate());
        }
        match state.start_effect(id) {
            Some(handle) => {
                state.active.insert(id, handle);
                true
            }
            None => false,
        }
    }

    /// Play `id` using its [`PlaybackPolicy`].
    pub fn play_cue(&self, id: SoundId) {
        match id.policy() {
            PlaybackPolicy::Overlap => {
                self.play_sound(id);
            }
            PlaybackPolicy::Exclusive => {
                self.play_sound_with_stop(id);
            }
        }
    }

    /// Stop and forget the tracked instance of `id`, if any.
    pub fn stop_sound(&self, id: SoundId) {
        let mut state = self.state.lock();
        if let Some(mut handle) = state.active.remove(&id) {
            handle.stop(immediate());
        }
        state.prune_finished();
    }

    /// Number of tracked (exclusive) instances of `id` still alive.
    pub fn tracked_instances(&self, id: SoundId) -> usize {
        let mut state = self.state.lock();
        state.prune_finished();
        usize::from(state.active.contains_key(&id))
    }

    /// Entries in the tracked-instance table, finished or not.
    pub fn tracked_total(&self) -> usize {
        self.state.lock().active.len()
    }

    /// Run `f` against the output backend, if it has been opened.
    pub fn with_backend<R>(&self, f: impl FnOnce(&mut B) -> R) -> Option<R> {
        self.state.lock().manager.as_mut().map(|m| f(m.backend_mut()))
    }

    pub fn play_background_music(&self) -> bool {
        self.state.lock().start_music(MusicTrack::Menu)
    }

    pub fn play_in_game_music(&self) -> bool {
        self.state.lock().start_music(MusicTrack::InGame)
    }

    /// Pause the background loop where it is.
    pub fn pause_background_music(&self) {
        let mut state = self.state.lock();
        state.background.pause();
        state.background.resume_on_unmute = false;
    }

    /// Pause the background loop and rewind it to the start.
    pub fn stop_background_music(&self) {
        self.state.lock().background.stop();
    }

    pub fn stop_in_game_music(&self) {
        self.state.lock().in_game.stop();
    }

    pub fn is_music_playing(&self, track: MusicTrack) -> bool {
        self.state.lock().channel_mut(track).playing
    }

    /// Current background level, including a fade in progress.
    pub fn music_level(&self) -> f32 {
        self.state.lock().background.level
    }

    pub fn music_volume(&self) -> f32 {
        self.state.lock().music_volume
    }

    pub fn sfx_volume(&self) -> f32 {
        self.state.lock().sfx_volume
    }

    pub fn set_music_volume(&self, volume: f32) {
        let mut state = self.state.lock();
        let volume = clamp_volume(volume);
        state.music_volume = volume;
        state.background.set_level(volume);
        state.in_game.set_level(volume);
    }

    /// Takes effect on the next played effect.
    pub fn set_sfx_volume(&self, volume: f32) {
        self.state.lock().sfx_volume = clamp_volume(volume);
    }

    pub fn is_muted(&self) -> bool {
        self.state.lock().muted
    }

    /// Flip the mute flag and return the new value.
    ///
    /// Muting pauses both loops; unmuting resumes only the ones that were
    /// playing, or were asked to start, while muted.
    pub fn toggle_mute(&self) -> bool {
        let mut state = self.state.lock();
        state.muted = !state.muted;
        if state.muted {
            state.background.mute();
            state.in_game.mute();
        } else {
            for track in MusicTrack::ALL {
                let channel = state.channel_mut(track);
                let resume = std::mem::take(&mut channel.resume_on_unmute);
                if resume {
                    state.start_music(track);
                }
            }
        }
        info!("audio {}", if state.muted { "muted" } else { "unmuted" });
        state.muted
    }

    /// Ramp the background music down over `duration`, then stop it and
    /// restore the configured volume for the next play.
    pub async fn fade_out(&self, duration: Duration) {
        let (generation, target) = {
            let state = self.state.lock();
            if state.background.handle.is_none() {
                return;
            }
            (self.next_fade(), state.music_volume)
        };

        let step_time = duration / FADE_STEPS;
        let volume_step = target / FADE_STEPS as f32;
        for step in 1..=FADE_STEPS {
            tokio::time::sleep(step_time).await;
            if self.fade_generation.load(Ordering::SeqCst) != generation {
                debug!("fade out superseded at step {}", step);
                return;
            }
            let level = (target - volume_step * step as f32).max(0.0);
            self.state.lock().background.set_level(level);
        }

        let mut state = self.state.lock();
        state.background.stop();
        let volume = state.music_volume;
        state.background.set_level(volume);
    }

    /// Claim the volume for a new fade; older fades stop writing levels.
    fn next_fade(&self) -> u64 {
        self.fade_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Start the background music from silence and ramp it up to the
    /// configured volume over `duration`.
    pub async fn fade_in(&self, duration: Duration) {
        let (generation, target) = {
            let mut state = self.state.lock();
            if state.background.data.is_none() {
                return;
            }
            let generation = self.next_fade();
            state.background.set_level(0.0);
            state.start_music(MusicTrack::Menu);
            (generation, state.music_volume)
        };

        let step_time = duration / FADE_STEPS;
        let volume_step = target / FADE_STEPS as f32;
        for step in 1..=FADE_STEPS {
            tokio::time::sleep(step_time).await;
            if self.fade_generation.load(Ordering::SeqCst) != generation {
                debug!("fade in superseded at step {}", step);
                return;
            }
            let level = (volume_step * step as f32).min(target);
            self.state.lock().background.set_level(level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decibel_conversion_floors_at_silence() {
        assert_eq!(amplitude_to_db(1.0), 0.0);
        assert_eq!(amplitude_to_db(0.0), SILENCE_DB);
        assert_eq!(amplitude_to_db(-3.0), SILENCE_DB);
        assert_eq!(amplitude_to_db(0.0001), SILENCE_DB);
        let half = amplitude_to_db(0.5);
        assert!(half > -6.1 && half < -5.9);
    }
}
