//! Game state module.
//!
//! Defines the [`QuizSession`], which tracks a single daily quiz: the pre-round
//! countdown, the round timer, the current question and the score.

pub mod countdown;
pub mod questions;
pub mod timeline;
pub mod tips;

use crate::config::{COUNTDOWN_FROM, POINTS_PER_CORRECT, QUESTION_TIME_SECS, WARNING_AT_SECS};

pub use countdown::MidnightCountdown;
pub use questions::{Difficulty, GameData, GameQuestion};
pub use timeline::Timeline;
pub use tips::{Tip, TipRotator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    Countdown,
    Playing,
    Ended,
}

/// Timer configuration for a quiz round
#[derive(Debug, Clone, Copy)]
pub struct TimerConfig {
    pub duration_secs: u32,
    /// Remaining seconds at which the warning cue plays.
    pub warning_at_secs: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            duration_secs: QUESTION_TIME_SECS,
            warning_at_secs: WARNING_AT_SECS,
        }
    }
}

/// What a one-second tick did to the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizTick {
    /// Not playing; nothing changed.
    Idle,
    Running { remaining: u32 },
    /// The warning threshold was just reached.
    Warning { remaining: u32 },
    /// Time ran out on this tick.
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Wrong,
}

/// Round timer, ticked once per second.
#[derive(Debug)]
pub struct RoundTimer {
    pub config: TimerConfig,
    pub remaining: u32,
    pub is_running: bool,
    pub is_expired: bool,
}

impl RoundTimer {
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            remaining: config.duration_secs,
            is_running: false,
            is_expired: false,
        }
    }

    pub fn start(&mut self) {
        self.remaining = self.config.duration_secs;
        self.is_running = true;
        self.is_expired = false;
    }

    pub fn stop(&mut self) {
        self.is_running = false;
    }

    pub fn tick(&mut self) -> QuizTick {
        if !self.is_running || self.is_expired {
            return QuizTick::Idle;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.is_expired = true;
            self.is_running = false;
            QuizTick::Expired
        } else if self.remaining == self.config.warning_at_secs {
            QuizTick::Warning {
                remaining: self.remaining,
            }
        } else {
            QuizTick::Running {
                remaining: self.remaining,
            }
        }
    }

    pub fn format_time(&self) -> String {
        format!("00:{:02}", self.remaining)
    }
}

pub struct QuizSession {
    state: QuizState,
    countdown_number: u8,
    questions: Vec<GameQuestion>,
    index: usize,
    timer: RoundTimer,
    total_points: u32,
    streak: u32,
    correct_answers: u32,
}

impl QuizSession {
    pub fn new(questions: Vec<GameQuestion>) -> Self {
        Self::with_timer(questions, TimerConfig::default())
    }

    pub fn with_timer(questions: Vec<GameQuestion>, config: TimerConfig) -> Self {
        Self {
            state: QuizState::Countdown,
            countdown_number: COUNTDOWN_FROM,
            questions,
            index: 0,
            timer: RoundTimer::new(config),
            total_points: 0,
            streak: 0,
            correct_answers: 0,
        }
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn countdown_number(&self) -> u8 {
        self.countdown_number
    }

    /// Update the number shown by the pre-round countdown.
    pub fn set_countdown(&mut self, number: u8) {
        if self.state == QuizState::Countdown {
            self.countdown_number = number;
        }
    }

    pub fn start_playing(&mut self) {
        if self.state != QuizState::Countdown {
            return;
        }
        self.countdown_number = 0;
        self.state = QuizState::Playing;
        self.timer.start();
    }

    pub fn current_question(&self) -> Option<&GameQuestion> {
        if self.state != QuizState::Playing {
            return None;
        }
        self.questions.get(self.index)
    }

    pub fn question_number(&self) -> usize {
        self.index + 1
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Score `option` against the current question and move to the next one.
    ///
    /// Returns `None` when no question is being asked. Running out of
    /// questions ends the quiz.
    pub fn choose_answer(&mut self, option: &str) -> Option<AnswerOutcome> {
        let question = self.current_question()?;
        let outcome = if question.is_correct(option) {
            AnswerOutcome::Correct
        } else {
            AnswerOutcome::Wrong
        };

        match outcome {
            AnswerOutcome::Correct => {
                self.total_points += POINTS_PER_CORRECT;
                self.streak += 1;
                self.correct_answers += 1;
            }
            AnswerOutcome::Wrong => self.streak = 0,
        }

        self.index += 1;
        if self.index >= self.questions.len() {
            self.end();
        }
        Some(outcome)
    }

    /// Advance the round timer by one second.
    pub fn tick(&mut self) -> QuizTick {
        if self.state != QuizState::Playing {
            return QuizTick::Idle;
        }
        let tick = self.timer.tick();
        if tick == QuizTick::Expired {
            self.end();
        }
        tick
    }

    pub fn end(&mut self) {
        self.timer.stop();
        self.state = QuizState::Ended;
    }

    pub fn time_remaining(&self) -> u32 {
        self.timer.remaining
    }

    pub fn timer_text(&self) -> String {
        self.timer.format_time()
    }

    pub fn total_points(&self) -> u32 {
        self.total_points
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    pub fn answered(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, answer: &str) -> GameQuestion {
        GameQuestion {
            id: id.to_string(),
            album_cover: format!("https://covers.test/{id}.jpg"),
            album_name: format!("Album {id}"),
            correct_answer: answer.to_string(),
            options: vec![
                answer.to_string(),
                "Other A".to_string(),
                "Other B".to_string(),
                "Other C".to_string(),
            ],
            genre: None,
            difficulty: None,
            release_date: None,
        }
    }

    #[test]
    fn no_questions_before_the_countdown_ends() {
        let mut quiz = QuizSession::new(vec![question("1", "A")]);
        assert_eq!(quiz.state(), QuizState::Countdown);
        assert!(quiz.current_question().is_none());
        assert_eq!(quiz.choose_answer("A"), None);
        assert_eq!(quiz.tick(), QuizTick::Idle);

        quiz.set_countdown(2);
        assert_eq!(quiz.countdown_number(), 2);
        quiz.start_playing();
        assert_eq!(quiz.countdown_number(), 0);
        assert_eq!(quiz.current_question().unwrap().id, "1");
    }

    #[test]
    fn scoring_and_streaks() {
        let mut quiz = QuizSession::new(vec![
            question("1", "A"),
            question("2", "B"),
            question("3", "C"),
            question("4", "D"),
        ]);
        quiz.start_playing();

        assert_eq!(quiz.choose_answer("A"), Some(AnswerOutcome::Correct));
        assert_eq!(quiz.choose_answer("B"), Some(AnswerOutcome::Correct));
        assert_eq!(quiz.streak(), 2);
        assert_eq!(quiz.choose_answer("nope"), Some(AnswerOutcome::Wrong));
        assert_eq!(quiz.streak(), 0);
        assert_eq!(quiz.total_points(), 2 * POINTS_PER_CORRECT);
        assert_eq!(quiz.question_number(), 4);
    }

    #[test]
    fn last_answer_ends_the_quiz() {
        let mut quiz = QuizSession::new(vec![question("1", "A")]);
        quiz.start_playing();
        quiz.choose_answer("A");
        assert_eq!(quiz.state(), QuizState::Ended);
        assert_eq!(quiz.correct_answers(), 1);
    }

    #[test]
    fn timer_warns_then_expires() {
        let mut quiz = QuizSession::new(vec![question("1", "A")]);
        quiz.start_playing();
        assert_eq!(quiz.time_remaining(), QUESTION_TIME_SECS);

        let ticks: Vec<QuizTick> = (0..QUESTION_TIME_SECS).map(|_| quiz.tick()).collect();
        assert_eq!(ticks[0], QuizTick::Running { remaining: 14 });
        assert_eq!(ticks[4], QuizTick::Warning { remaining: 10 });
        assert_eq!(
            ticks.iter().filter(|t| matches!(t, QuizTick::Warning { .. })).count(),
            1
        );
        assert_eq!(ticks.last(), Some(&QuizTick::Expired));
        assert_eq!(quiz.state(), QuizState::Ended);
        assert_eq!(quiz.tick(), QuizTick::Idle);
    }

    #[test]
    fn timer_text_is_zero_padded() {
        let mut timer = RoundTimer::new(TimerConfig {
            duration_secs: 9,
            warning_at_secs: 3,
        });
        timer.start();
        assert_eq!(timer.format_time(), "00:09");
    }
}
