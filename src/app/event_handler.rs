//! Terminal input mapping.
//!
//! The terminal front end reads one line per input. [`parse_input`] turns a
//! line into an [`InputEvent`]; what an event does depends on the screen.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Enter on its own.
    Confirm,
    /// Answer option, 0-based.
    Answer(usize),
    ToggleMute,
    VolumeUp,
    VolumeDown,
    Retry,
    Quit,
}

/// Number of answer options on a question.
const OPTION_KEYS: usize = 4;

pub fn parse_input(line: &str) -> Option<InputEvent> {
    let line = line.trim();
    match line {
        "" => return Some(InputEvent::Confirm),
        "+" | "=" => return Some(InputEvent::VolumeUp),
        "-" | "_" => return Some(InputEvent::VolumeDown),
        _ => {}
    }

    match line.to_ascii_lowercase().as_str() {
        "m" | "mute" => Some(InputEvent::ToggleMute),
        "r" | "retry" => Some(InputEvent::Retry),
        "q" | "quit" | "exit" => Some(InputEvent::Quit),
        other => match other.parse::<usize>() {
            Ok(n) if (1..=OPTION_KEYS).contains(&n) => Some(InputEvent::Answer(n - 1)),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_confirms() {
        assert_eq!(parse_input(""), Some(InputEvent::Confirm));
        assert_eq!(parse_input("  \n"), Some(InputEvent::Confirm));
    }

    #[test]
    fn numbers_pick_answers() {
        assert_eq!(parse_input("1"), Some(InputEvent::Answer(0)));
        assert_eq!(parse_input("4\n"), Some(InputEvent::Answer(3)));
        assert_eq!(parse_input("0"), None);
        assert_eq!(parse_input("5"), None);
    }

    #[test]
    fn control_keys() {
        assert_eq!(parse_input("M"), Some(InputEvent::ToggleMute));
        assert_eq!(parse_input("+"), Some(InputEvent::VolumeUp));
        assert_eq!(parse_input("-"), Some(InputEvent::VolumeDown));
        assert_eq!(parse_input("r"), Some(InputEvent::Retry));
        assert_eq!(parse_input("quit"), Some(InputEvent::Quit));
        assert_eq!(parse_input("hello"), None);
    }
}
