//! Game-flow controller.
//!
//! [`GameFlow`] owns the loader, the audio engine, the question fetcher and the
//! [`SessionState`], and sequences them through the screens:
//!
//! 1. **Home**: the first user input unlocks audio, preloads the critical
//!    assets and starts the menu loop
//! 2. **Loading**: the menu loop fades out, tips rotate, and the game assets
//!    and today's questions load in parallel
//! 3. **Quiz**: a 3-2-1 intro, then the timed round
//! 4. **Results**: the final score
//!
//! [`FlowHooks`] exposes the deferred entry points (start loading questions,
//! play the click, load the game) to callers that only hold a shared handle.

pub mod app_state;
pub mod event_handler;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use kira::DefaultBackend;
use kira::backend::Backend;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::assets::{AssetCatalog, AssetCategory};
use crate::audio::{AudioEngine, SoundId};
use crate::config::{
    COUNTDOWN_FROM, COUNTDOWN_STEP, DEFAULT_FADE, GameConfig, INTRO_CUE_DELAY, LOADING_DELAY,
    SCREEN_SWAP_DELAY, VOLUME_STEP,
};
use crate::error::{FetchRetryExhausted, FlowError};
use crate::fetch::{HttpTransport, RetryPolicy, RetryState, RetryingFetcher, Transport};
use crate::game::questions::{question_date, questions_url};
use crate::game::{
    AnswerOutcome, GameData, GameQuestion, QuizSession, QuizState, QuizTick, Timeline, Tip,
};
use crate::loader::{AssetLoader, source_for};

pub use app_state::{Screen, SessionState};
pub use event_handler::{InputEvent, parse_input};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HomeStep {
    ShowLoading,
    LoadGame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntroStep {
    Cue,
    Count(u8),
    Go,
}

pub struct GameFlow<B: Backend = DefaultBackend, T: Transport = HttpTransport> {
    config: GameConfig,
    loader: AssetLoader,
    audio: AudioEngine<B>,
    fetcher: RetryingFetcher<T>,
    session: Mutex<SessionState>,
}

impl GameFlow {
    /// A flow on the default audio output, loading assets from
    /// `config.asset_root` and questions over HTTP.
    pub fn new(config: GameConfig) -> Self {
        let loader = AssetLoader::new(AssetCatalog::standard(), source_for(&config.asset_root));
        let audio = AudioEngine::new(config.music_volume, config.sfx_volume);
        let fetcher = RetryingFetcher::http(RetryPolicy::from(&config));
        Self::from_parts(config, loader, audio, fetcher, SessionState::default())
    }
}

impl<B: Backend, T: Transport> GameFlow<B, T> {
    pub fn from_parts(
        config: GameConfig,
        loader: AssetLoader,
        audio: AudioEngine<B>,
        fetcher: RetryingFetcher<T>,
        session: SessionState,
    ) -> Self {
        Self {
            config,
            loader,
            audio,
            fetcher,
            session: Mutex::new(session),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn loader(&self) -> &AssetLoader {
        &self.loader
    }

    pub fn audio(&self) -> &AudioEngine<B> {
        &self.audio
    }

    pub fn screen(&self) -> Screen {
        self.session.lock().screen
    }

    /// Run `f` against the session state.
    pub fn with_session<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.session.lock())
    }

    /// Observe the question fetch retries.
    pub fn retry_state(&self) -> watch::Receiver<RetryState> {
        self.fetcher.subscribe()
    }

    pub fn hooks(self: &Arc<Self>) -> FlowHooks<B, T> {
        FlowHooks {
            flow: Arc::clone(self),
        }
    }

    /// Handle a user input on the home screen.
    ///
    /// Unlocks audio, loads the critical assets and starts the menu loop.
    /// The gesture is recorded in the session whatever happens, so the game
    /// stays playable without sound. Returns whether audio is unlocked.
    pub async fn on_user_interaction(&self) -> bool {
        self.session.lock().gesture_seen = true;
        if self.prepare_critical_audio().await && self.screen() == Screen::Home {
            self.audio.play_background_music();
        }
        self.audio.is_unlocked()
    }

    /// Unlock audio and register the critical sounds. Both steps are no-ops
    /// once done, so this doubles as the retry on later gestures.
    async fn prepare_critical_audio(&self) -> bool {
        if !self.audio.unlock() {
            return false;
        }
        if let Err(e) = self.loader.preload_category(AssetCategory::Critical).await {
            warn!("critical assets unavailable: {}", e);
            return false;
        }
        if let Err(e) = self.audio.initialize_critical_audio(&self.loader).await {
            warn!("critical audio incomplete: {}", e);
        }
        true
    }

    /// The generic UI click; available from the home screen on.
    pub fn play_click(&self) {
        self.audio.play_cue(SoundId::MouseClick);
    }

    /// Leave the home screen: fade the menu loop out while the loading screen
    /// comes up, then load the game.
    ///
    /// A failed unlock or critical preload from the first gesture is retried
    /// here; if it fails again the game goes on silently.
    pub async fn leave_home(&self) -> Result<(), FlowError> {
        if !self.prepare_critical_audio().await {
            debug!("leaving home without sound");
        }
        let outcome = Mutex::new(Ok(()));
        let outcome_ref = &outcome;
        let timeline = Timeline::new()
            .then(SCREEN_SWAP_DELAY, HomeStep::ShowLoading)
            .then(LOADING_DELAY, HomeStep::LoadGame);

        futures::join!(
            self.audio.fade_out(DEFAULT_FADE),
            timeline.run(move |step| async move {
                if let Err(e) = self.home_step(step).await {
                    *outcome_ref.lock() = Err(e);
                }
            })
        );
        outcome.into_inner()
    }

    async fn home_step(&self, step: HomeStep) -> Result<(), FlowError> {
        match step {
            HomeStep::ShowLoading => {
                let mut session = self.session.lock();
                session.screen = Screen::Loading;
                session.rotate_tip();
                debug!("loading screen shown");
                Ok(())
            }
            HomeStep::LoadGame => self.load_game_stuff().await,
        }
    }

    /// Draw the next loading-screen tip.
    pub fn rotate_tip(&self) -> Option<Tip> {
        self.session.lock().rotate_tip()
    }

    /// Load the game assets and today's questions, then open the quiz.
    ///
    /// Both loads run to completion. The quiz opens only if both succeeded;
    /// otherwise the session is flagged as failed and the first error is
    /// returned. Calling again retries, skipping assets that already loaded.
    pub async fn load_game_stuff(&self) -> Result<(), FlowError> {
        self.session.lock().load_failed = false;

        let (assets, questions) = tokio::join!(
            self.loader.preload_category(AssetCategory::Game),
            self.fetch_questions()
        );
        let gate = assets
            .map_err(FlowError::from)
            .and_then(|()| questions.map_err(FlowError::from));
        let questions = match gate {
            Ok(questions) if questions.is_empty() => {
                warn!("no questions for today");
                self.session.lock().load_failed = true;
                return Err(FlowError::NotReady("start the quiz"));
            }
            Ok(questions) => questions,
            Err(e) => {
                error!("game failed to load: {}", e);
                self.session.lock().load_failed = true;
                return Err(e);
            }
        };

        if let Err(e) = self.audio.initialize_game_audio(&self.loader).await {
            warn!("game audio incomplete: {}", e);
        }

        let mut session = self.session.lock();
        info!("starting quiz with {} questions", questions.len());
        session.quiz = Some(QuizSession::new(questions));
        session.final_score = None;
        session.screen = Screen::Quiz;
        Ok(())
    }

    /// Fetch today's questions into the session. Returns how many arrived.
    pub async fn start_question_loading(&self) -> Result<usize, FlowError> {
        Ok(self.fetch_questions().await?.len())
    }

    async fn fetch_questions(&self) -> Result<Vec<GameQuestion>, FetchRetryExhausted> {
        let url = questions_url(&self.config.api_base, &question_date(Utc::now()));
        let data: GameData = self.fetcher.fetch_with_retry(&url).await?;
        if data.total_questions as usize != data.questions.len() {
            debug!(
                "backend reported {} questions, received {}",
                data.total_questions,
                data.questions.len()
            );
        }
        self.session.lock().questions = data.questions.clone();
        Ok(data.questions)
    }

    /// Play the 3-2-1 intro and start the round.
    pub async fn run_quiz_intro(&self) -> Result<(), FlowError> {
        match self.session.lock().quiz.as_ref().map(QuizSession::state) {
            Some(QuizState::Countdown) => {}
            _ => return Err(FlowError::NotReady("start the quiz")),
        }

        let mut timeline = Timeline::new().then(INTRO_CUE_DELAY, IntroStep::Cue);
        for number in (1..=COUNTDOWN_FROM).rev() {
            let delay = if number == COUNTDOWN_FROM {
                Duration::ZERO
            } else {
                COUNTDOWN_STEP
            };
            timeline = timeline.then(delay, IntroStep::Count(number));
        }
        timeline
            .then(COUNTDOWN_STEP, IntroStep::Go)
            .run(move |step| async move { self.intro_step(step) })
            .await;
        Ok(())
    }

    fn intro_step(&self, step: IntroStep) {
        match step {
            IntroStep::Cue => self.audio.play_cue(SoundId::CountdownToStart),
            IntroStep::Count(number) => {
                if let Some(quiz) = self.session.lock().quiz.as_mut() {
                    quiz.set_countdown(number);
                }
            }
            IntroStep::Go => {
                if let Some(quiz) = self.session.lock().quiz.as_mut() {
                    quiz.start_playing();
                }
                self.audio.stop_background_music();
                self.audio.play_in_game_music();
            }
        }
    }

    /// Advance the round by one second, playing the warning cue and closing
    /// the round when time runs out.
    pub fn tick_quiz(&self) -> QuizTick {
        let tick = match self.session.lock().quiz.as_mut() {
            Some(quiz) => quiz.tick(),
            None => QuizTick::Idle,
        };
        match tick {
            QuizTick::Warning { .. } => self.audio.play_cue(SoundId::Countdown),
            QuizTick::Expired => {
                self.finish_quiz();
            }
            QuizTick::Idle | QuizTick::Running { .. } => {}
        }
        tick
    }

    /// Answer the current question with `option`.
    pub fn answer(&self, option: &str) -> Option<AnswerOutcome> {
        let (outcome, ended) = {
            let mut session = self.session.lock();
            let quiz = session.quiz.as_mut()?;
            let outcome = quiz.choose_answer(option)?;
            (outcome, quiz.state() == QuizState::Ended)
        };

        self.audio.play_cue(SoundId::Click);
        self.audio.play_cue(match outcome {
            AnswerOutcome::Correct => SoundId::Correct,
            AnswerOutcome::Wrong => SoundId::Wrong,
        });
        if ended {
            self.finish_quiz();
        }
        Some(outcome)
    }

    /// Answer with the option at `index` (0-based) of the current question.
    pub fn answer_option(&self, index: usize) -> Option<AnswerOutcome> {
        let option = self
            .session
            .lock()
            .quiz
            .as_ref()?
            .current_question()?
            .options
            .get(index)?
            .clone();
        self.answer(&option)
    }

    /// End the round and show the results. Returns the final score.
    pub fn finish_quiz(&self) -> Option<u32> {
        self.audio.stop_sound(SoundId::Countdown);
        self.audio.stop_in_game_music();

        let mut session = self.session.lock();
        let quiz = session.quiz.as_mut()?;
        quiz.end();
        let score = quiz.total_points();
        let correct = quiz.correct_answers();
        session.final_score = Some(score);
        session.screen = Screen::Results;
        info!("quiz finished: {} points, {} correct", score, correct);
        Some(score)
    }

    /// Back to the home screen with the menu loop playing.
    pub fn return_home(&self) {
        self.audio.stop_in_game_music();
        self.session.lock().reset_to_home();
        self.audio.play_background_music();
    }

    pub fn set_music_volume(&self, volume: f32) {
        self.audio.set_music_volume(volume);
    }

    pub fn set_sfx_volume(&self, volume: f32) {
        self.audio.set_sfx_volume(volume);
    }

    /// Nudge the music volume by `steps` increments. Returns the new volume.
    pub fn adjust_music_volume(&self, steps: i32) -> f32 {
        self.audio
            .set_music_volume(self.audio.music_volume() + steps as f32 * VOLUME_STEP);
        self.audio.music_volume()
    }

    pub fn toggle_mute(&self) -> bool {
        self.audio.toggle_mute()
    }
}

/// Deferred entry points into a shared [`GameFlow`].
///
/// Cloneable handles for whoever decides when loading should start, such as
/// the end of a screen transition.
pub struct FlowHooks<B: Backend = DefaultBackend, T: Transport = HttpTransport> {
    flow: Arc<GameFlow<B, T>>,
}

impl<B: Backend, T: Transport> Clone for FlowHooks<B, T> {
    fn clone(&self) -> Self {
        Self {
            flow: Arc::clone(&self.flow),
        }
    }
}

impl<B: Backend, T: Transport> FlowHooks<B, T> {
    pub async fn start_question_loading(&self) -> Result<usize, FlowError> {
        self.flow.start_question_loading().await
    }

    pub fn play_click(&self) {
        self.flow.play_click();
    }

    pub async fn load_game_stuff(&self) -> Result<(), FlowError> {
        self.flow.load_game_stuff().await
    }
}
