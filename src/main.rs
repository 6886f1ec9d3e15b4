//! Daily Cover - terminal front end
//!
//! Plays the daily album cover quiz in a terminal. The first Enter counts as
//! the user gesture that unlocks audio and starts the menu music; the next one
//! starts loading today's game.
//!
//! # Controls
//! - `Enter`: continue
//! - `1`-`4`: answer
//! - `m`: mute, `+`/`-`: music volume
//! - `r`: retry after a failed load
//! - `q`: quit
//!
//! Logs go to stderr and follow `RUST_LOG`.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use daily_cover::app::{InputEvent, Screen, parse_input};
use daily_cover::config::TIP_ROTATION;
use daily_cover::error::FlowError;
use daily_cover::game::{MidnightCountdown, QuizState, QuizTick};
use daily_cover::{GameConfig, GameFlow};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::{MissedTickBehavior, interval};
use tracing::info;
use tracing_subscriber::EnvFilter;

type Input = Lines<BufReader<Stdin>>;

/// Redraw interval for the loading and intro screens.
const FRAME: Duration = Duration::from_millis(250);

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = GameConfig::load(|key| std::env::var(key).ok());
    info!("questions from {}, assets from {}", config.api_base, config.asset_root);
    let flow = GameFlow::new(config);
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    print_home(&flow);
    while let Some(line) = input.next_line().await? {
        let Some(event) = parse_input(&line) else {
            println!("?");
            continue;
        };
        if handle_audio_key(&flow, event) {
            continue;
        }

        match (flow.screen(), event) {
            (_, InputEvent::Quit) => break,
            (Screen::Home, InputEvent::Confirm) if !flow.with_session(|s| s.gesture_seen) => {
                if !flow.on_user_interaction().await {
                    println!("Audio is unavailable; the game may be silent.");
                }
                println!("Press Enter to play today's covers.");
            }
            (Screen::Home, InputEvent::Confirm) => {
                flow.play_click();
                if show_loading(&flow, flow.leave_home()).await && play_quiz(&flow, &mut input).await? {
                    break;
                }
            }
            (Screen::Loading, InputEvent::Retry) => {
                flow.play_click();
                if show_loading(&flow, flow.load_game_stuff()).await && play_quiz(&flow, &mut input).await? {
                    break;
                }
            }
            (Screen::Results, InputEvent::Confirm) => {
                flow.return_home();
                print_home(&flow);
            }
            _ => {}
        }
    }

    info!("bye");
    Ok(())
}

/// Mute and volume work on every screen. Returns whether `event` was one.
fn handle_audio_key(flow: &GameFlow, event: InputEvent) -> bool {
    match event {
        InputEvent::ToggleMute => {
            let muted = flow.toggle_mute();
            println!("{}", if muted { "Muted" } else { "Unmuted" });
        }
        InputEvent::VolumeUp => println!("Music volume {:.0}%", flow.adjust_music_volume(1) * 100.0),
        InputEvent::VolumeDown => println!("Music volume {:.0}%", flow.adjust_music_volume(-1) * 100.0),
        _ => return false,
    }
    true
}

fn print_home(flow: &GameFlow) {
    let countdown = MidnightCountdown::until_midnight(&Local::now());
    println!();
    println!("== DAILY COVER ==");
    println!("Guess the artist behind today's album covers.");
    println!(
        "New covers in {} ({:.0}% of the day left)",
        countdown.display(),
        countdown.progress_percent()
    );
    if flow.with_session(|s| s.gesture_seen) {
        println!("Press Enter to play.");
    } else {
        println!("Press Enter to begin.");
    }
}

/// Drive `load` while showing progress, retries and rotating tips. Returns
/// whether the quiz is ready.
async fn show_loading(flow: &GameFlow, load: impl Future<Output = Result<(), FlowError>>) -> bool {
    let mut progress = flow.loader().subscribe_progress();
    let mut retries = flow.retry_state();
    let mut frame = interval(FRAME);
    let mut tips = interval(TIP_ROTATION);
    tips.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The loading screen draws its own first tip.
    tips.tick().await;
    let mut shown_tip = None;
    tokio::pin!(load);

    loop {
        tokio::select! {
            result = &mut load => match result {
                Ok(()) => return true,
                Err(e) => {
                    println!("Could not load today's game: {}", e);
                    println!("Press r to retry or q to quit.");
                    return false;
                }
            },
            Ok(update) = progress.recv() => {
                println!(
                    "Loading {} assets: {}% ({})",
                    update.category, update.progress.percentage, update.progress.current_asset
                );
            }
            Ok(()) = retries.changed() => {
                let state = *retries.borrow_and_update();
                if state.is_retrying {
                    println!("Retrying {}/{}...", state.current_attempt, state.max_attempts);
                }
            }
            _ = tips.tick() => {
                flow.rotate_tip();
            }
            _ = frame.tick() => {
                let tip = flow.with_session(|s| s.current_tip.clone());
                if tip.is_some() && tip != shown_tip {
                    if let Some(tip) = &tip {
                        println!("Did you know? {}: {}", tip.artist, tip.fact);
                    }
                    shown_tip = tip;
                }
            }
        }
    }
}

/// Run the intro and the round. Returns whether the player quit.
async fn play_quiz(flow: &GameFlow, input: &mut Input) -> Result<bool> {
    let intro = flow.run_quiz_intro();
    tokio::pin!(intro);
    let mut frame = interval(FRAME);
    let mut shown = None;
    loop {
        tokio::select! {
            result = &mut intro => {
                result?;
                break;
            }
            _ = frame.tick() => {
                let number = flow.with_session(|s| s.quiz.as_ref().map(|q| q.countdown_number()));
                if number != shown {
                    if let Some(n) = number.filter(|n| *n > 0) {
                        println!("{}...", n);
                    }
                    shown = number;
                }
            }
        }
    }

    print_question(flow);
    let mut clock = interval(Duration::from_secs(1));
    clock.tick().await;
    while flow.screen() == Screen::Quiz {
        tokio::select! {
            _ = clock.tick() => match flow.tick_quiz() {
                QuizTick::Warning { remaining } => println!("{} seconds left!", remaining),
                QuizTick::Expired => println!("Time's up!"),
                _ => {}
            },
            line = input.next_line() => {
                let Some(line) = line? else {
                    return Ok(true);
                };
                match parse_input(&line) {
                    Some(InputEvent::Answer(index)) => {
                        if let Some(outcome) = flow.answer_option(index) {
                            println!("{:?}!", outcome);
                            let playing = flow.with_session(|s| {
                                s.quiz.as_ref().map(|q| q.state()) == Some(QuizState::Playing)
                            });
                            if playing {
                                print_question(flow);
                            }
                        }
                    }
                    Some(InputEvent::Quit) => return Ok(true),
                    Some(event) => {
                        handle_audio_key(flow, event);
                    }
                    None => {}
                }
            }
        }
    }

    let (score, correct, answered) = flow.with_session(|s| {
        let quiz = s.quiz.as_ref();
        (
            s.final_score.unwrap_or(0),
            quiz.map_or(0, |q| q.correct_answers()),
            quiz.map_or(0, |q| q.answered()),
        )
    });
    println!();
    println!("== RESULTS ==");
    println!("{} points, {} of {} correct", score, correct, answered);
    println!("Press Enter to go home or q to quit.");
    Ok(false)
}

fn print_question(flow: &GameFlow) {
    flow.with_session(|s| {
        let Some(quiz) = s.quiz.as_ref() else {
            return;
        };
        let Some(question) = quiz.current_question() else {
            return;
        };
        println!();
        println!(
            "[{}] Question {}/{}  score {}  streak {}",
            quiz.timer_text(),
            quiz.question_number(),
            quiz.question_count(),
            quiz.total_points(),
            quiz.streak()
        );
        println!("Who made \"{}\"? ({})", question.album_name, question.album_cover);
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}) {}", i + 1, option);
        }
    });
}
