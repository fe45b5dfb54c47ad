//! Keyboard commands for the interactive session.

/// One line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Skip,
    Timer,
    StartTimer,
    TogglePause,
    SkipTimer,
    Adjust(i64),
    Foreground,
    Status,
    Abandon,
    Quit,
    Help,
}

impl Command {
    /// Parses a trimmed input line. Returns `None` for unknown input.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix('+') {
            return rest.parse::<i64>().ok().map(Command::Adjust);
        }
        if line.starts_with('-') {
            return line.parse::<i64>().ok().map(Command::Adjust);
        }

        let command = match line {
            "" | "n" | "next" => Command::Next,
            "s" | "skip" => Command::Skip,
            "v" | "view" => Command::Timer,
            "t" | "start" => Command::StartTimer,
            "p" | "pause" | "r" | "resume" => Command::TogglePause,
            "k" | "skip-timer" => Command::SkipTimer,
            "f" | "foreground" => Command::Foreground,
            "i" | "status" => Command::Status,
            "x" | "abandon" => Command::Abandon,
            "q" | "quit" => Command::Quit,
            "?" | "h" | "help" => Command::Help,
            _ => return None,
        };
        Some(command)
    }
}

pub const HELP: &str = "\
  [enter]/n  next step          s  skip step
  v          show timer         t  start timer
  p/r        pause or resume    k  skip timer
  +N / -N    adjust timer       f  resync timer with the clock
  i          status             x  abandon session
  q          quit (resume later with `regimen resume`)";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_navigation() {
        assert_eq!(Command::parse(""), Some(Command::Next));
        assert_eq!(Command::parse(" n "), Some(Command::Next));
        assert_eq!(Command::parse("skip"), Some(Command::Skip));
        assert_eq!(Command::parse("q"), Some(Command::Quit));
    }

    #[test]
    fn test_parse_adjustments() {
        assert_eq!(Command::parse("+30"), Some(Command::Adjust(30)));
        assert_eq!(Command::parse("-15"), Some(Command::Adjust(-15)));
        assert_eq!(Command::parse("+abc"), None);
        assert_eq!(Command::parse("-"), None);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Command::parse("dance"), None);
    }
}
