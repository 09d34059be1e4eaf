//! Command parsing for the browser prompt.

use std::path::PathBuf;

/// A parsed browser command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    /// One-based event number, not yet clamped.
    Jump(i64),
    Stats,
    Compare(PathBuf),
    /// Per-particle listing of the current event.
    List,
    Help,
    Quit,
    /// Unrecognized input, kept for the error message.
    Invalid(String),
}

/// Malformed command argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputParseError {
    InvalidNumber(String),
    MissingArgument(&'static str),
}

impl std::fmt::Display for InputParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputParseError::InvalidNumber(input) => {
                write!(f, "Invalid event number: '{}'", input)
            }
            InputParseError::MissingArgument(command) => {
                write!(f, "Missing argument for '{}'", command)
            }
        }
    }
}

impl std::error::Error for InputParseError {}

/// One-line summary shown under every event.
pub const NAVIGATION_HELP: &str =
    "n = next, p = previous, j N = jump, s = stats, c PATH = compare files, l = list, h = help, q = quit";

/// Longer help shown by the `h` command.
pub const COMMAND_HELP: &str = "\
Commands:
  n, next              next event (stays on the last one)
  p, prev, previous    previous event (stays on the first one)
  j N, g N, jump N     jump to event number N (1-based, clamped)
  s, stats             averages over the events displayed so far
  c PATH, compare PATH compare this file with another file
  l, list              per-particle listing of the current event
  h, help, ?           this help
  q, quit              exit the browser";

impl Command {
    /// Parses one prompt line. Keywords are case-insensitive.
    pub fn parse(input: &str) -> Result<Command, InputParseError> {
        let input = input.trim();
        let (keyword, rest) = match input.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (input, ""),
        };
        let command = match keyword.to_ascii_lowercase().as_str() {
            "n" | "next" if rest.is_empty() => Command::Next,
            "p" | "prev" | "previous" if rest.is_empty() => Command::Previous,
            "j" | "g" | "jump" | "goto" => {
                if rest.is_empty() {
                    return Err(InputParseError::MissingArgument("jump"));
                }
                Command::Jump(parse_event_number(rest)?)
            }
            "s" | "stats" if rest.is_empty() => Command::Stats,
            "c" | "compare" => {
                if rest.is_empty() {
                    return Err(InputParseError::MissingArgument("compare"));
                }
                Command::Compare(PathBuf::from(rest))
            }
            "l" | "list" if rest.is_empty() => Command::List,
            "h" | "help" | "?" if rest.is_empty() => Command::Help,
            "q" | "quit" | "exit" if rest.is_empty() => Command::Quit,
            _ => Command::Invalid(input.to_string()),
        };
        Ok(command)
    }
}

/// Event numbers too large for `i64` saturate, the session clamps them anyway.
fn parse_event_number(text: &str) -> Result<i64, InputParseError> {
    if let Ok(number) = text.parse::<i64>() {
        return Ok(number);
    }
    let (negative, digits) = match text.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InputParseError::InvalidNumber(text.to_string()));
    }
    Ok(if negative { i64::MIN } else { i64::MAX })
}

/// Follow-up question for a bare `j`/`g`/`c`. The answer is appended to the line.
pub fn argument_prompt(input: &str) -> Option<&'static str> {
    match input.trim().to_ascii_lowercase().as_str() {
        "j" | "g" | "jump" | "goto" => Some("Jump to event number: "),
        "c" | "compare" => Some("Enter path to another ROOT file to compare: "),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_navigation() {
        assert_eq!(Command::parse("n").unwrap(), Command::Next);
        assert_eq!(Command::parse("  NEXT ").unwrap(), Command::Next);
        assert_eq!(Command::parse("p").unwrap(), Command::Previous);
        assert_eq!(Command::parse("q").unwrap(), Command::Quit);
        assert_eq!(Command::parse("S").unwrap(), Command::Stats);
        assert_eq!(Command::parse("l").unwrap(), Command::List);
    }

    #[test]
    fn test_parse_jump() {
        assert_eq!(Command::parse("j 5").unwrap(), Command::Jump(5));
        assert_eq!(Command::parse("g 12").unwrap(), Command::Jump(12));
        assert_eq!(Command::parse("jump -3").unwrap(), Command::Jump(-3));
        assert_eq!(
            Command::parse("j abc"),
            Err(InputParseError::InvalidNumber("abc".to_string()))
        );
        assert_eq!(
            Command::parse("j"),
            Err(InputParseError::MissingArgument("jump"))
        );
    }

    #[test]
    fn test_parse_jump_saturates() {
        assert_eq!(
            Command::parse("j 99999999999999999999").unwrap(),
            Command::Jump(i64::MAX)
        );
        assert_eq!(
            Command::parse("j -99999999999999999999").unwrap(),
            Command::Jump(i64::MIN)
        );
        assert_eq!(
            Command::parse("j +7").unwrap(),
            Command::Jump(7)
        );
        assert_eq!(
            Command::parse("j 1e30"),
            Err(InputParseError::InvalidNumber("1e30".to_string()))
        );
        assert_eq!(
            Command::parse("j --5"),
            Err(InputParseError::InvalidNumber("--5".to_string()))
        );
    }

    #[test]
    fn test_parse_compare_keeps_path_case() {
        assert_eq!(
            Command::parse("c  /data/Gen1 Tau.root ").unwrap(),
            Command::Compare(PathBuf::from("/data/Gen1 Tau.root"))
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(
            Command::parse("x").unwrap(),
            Command::Invalid("x".to_string())
        );
        assert_eq!(Command::parse("").unwrap(), Command::Invalid(String::new()));
        // Arguments on argument-less commands are not silently dropped
        assert_eq!(
            Command::parse("n 3").unwrap(),
            Command::Invalid("n 3".to_string())
        );
    }

    #[test]
    fn test_argument_prompt() {
        assert!(argument_prompt("j").is_some());
        assert!(argument_prompt(" C ").is_some());
        assert!(argument_prompt("j 4").is_none());
        assert!(argument_prompt("n").is_none());
    }
}
