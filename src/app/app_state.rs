//! Session state for the game flow.
//!
//! Everything the screens show lives in one [`SessionState`] owned by the
//! [`GameFlow`](super::GameFlow); nothing is kept in globals.

use crate::game::{GameQuestion, QuizSession, Tip, TipRotator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Loading,
    Quiz,
    Results,
}

pub struct SessionState {
    pub screen: Screen,
    /// The first home-screen input has been handled, whether or not audio
    /// unlocked.
    pub gesture_seen: bool,
    pub tips: TipRotator,
    /// Tip on the loading screen.
    pub current_tip: Option<Tip>,
    /// Today's questions, once fetched.
    pub questions: Vec<GameQuestion>,
    /// Set when the last attempt to enter the quiz failed.
    pub load_failed: bool,
    pub quiz: Option<QuizSession>,
    pub final_score: Option<u32>,
}

impl SessionState {
    pub fn new(tips: TipRotator) -> Self {
        Self {
            screen: Screen::Home,
            gesture_seen: false,
            tips,
            current_tip: None,
            questions: Vec::new(),
            load_failed: false,
            quiz: None,
            final_score: None,
        }
    }

    /// Draw the next tip and make it current.
    pub fn rotate_tip(&mut self) -> Option<Tip> {
        self.current_tip = self.tips.next_tip().cloned();
        self.current_tip.clone()
    }

    /// Back to the home screen with the quiz discarded. Fetched questions
    /// are kept.
    pub fn reset_to_home(&mut self) {
        self.screen = Screen::Home;
        self.current_tip = None;
        self.load_failed = false;
        self.quiz = None;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(TipRotator::embedded())
    }
}
