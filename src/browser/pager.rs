//! Line-based terminal loop around a [`BrowseSession`].

use std::io::{BufRead, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};

use super::{Action, BrowseError, BrowseSession, NAVIGATION_HELP, argument_prompt};

/// Pager settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowserConfig {
    /// Clear the terminal before each redraw.
    pub clear_screen: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self { clear_screen: true }
    }
}

/// Reads commands from `input` and writes reports to `output`.
pub struct Pager<R, W> {
    input: R,
    output: W,
    config: BrowserConfig,
}

impl<R: BufRead, W: Write> Pager<R, W> {
    pub fn new(input: R, output: W, config: BrowserConfig) -> Self {
        Self {
            input,
            output,
            config,
        }
    }

    /// Runs until `q` or end of input.
    pub fn run(&mut self, session: &mut BrowseSession) -> Result<(), BrowseError> {
        let mut status: Option<String> = None;
        loop {
            if self.config.clear_screen {
                queue!(self.output, Clear(ClearType::All), MoveTo(0, 0))?;
            }
            writeln!(self.output, "{}", session.render_current())?;
            if let Some(message) = status.take() {
                writeln!(self.output, "{}", message)?;
            }
            writeln!(self.output, "{}", NAVIGATION_HELP)?;

            let Some(mut line) = self.prompt("Enter choice: ")? else {
                return Ok(());
            };
            if let Some(question) = argument_prompt(&line) {
                let Some(argument) = self.prompt(question)? else {
                    return Ok(());
                };
                line = format!("{} {}", line.trim(), argument.trim());
            }

            match session.execute(&line) {
                Action::Redraw => {}
                Action::Message(message) => status = Some(message),
                Action::Report(text) => {
                    writeln!(self.output)?;
                    writeln!(self.output, "{}", text)?;
                    if self.prompt("Press Enter to continue...")?.is_none() {
                        return Ok(());
                    }
                }
                Action::Quit => return Ok(()),
            }
        }
    }

    /// Writes `text` and reads one line. `None` at end of input.
    fn prompt(&mut self, text: &str) -> std::io::Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ParticleRecord, ParticleTable};
    use crate::source::MockSource;
    use std::io::Cursor;

    fn session(events: i64) -> BrowseSession {
        let mut table = ParticleTable::new();
        for id in 0..events {
            table.push_event(
                id,
                None,
                vec![ParticleRecord {
                    pdg_code: 13,
                    is_reconstructed: true,
                    ..ParticleRecord::default()
                }],
            );
        }
        BrowseSession::new(table, "a.root", Box::new(MockSource::new())).unwrap()
    }

    fn run(session: &mut BrowseSession, input: &str) -> String {
        let mut pager = Pager::new(
            Cursor::new(input.to_string()),
            Vec::new(),
            BrowserConfig {
                clear_screen: false,
            },
        );
        pager.run(session).unwrap();
        String::from_utf8(pager.into_output()).unwrap()
    }

    #[test]
    fn test_quit_immediately() {
        let mut s = session(2);
        let out = run(&mut s, "q\n");
        assert!(out.contains("Event 1/2 (ID: 0)"));
        assert!(out.contains(NAVIGATION_HELP));
        assert!(out.contains("Enter choice: "));
    }

    #[test]
    fn test_end_of_input_exits() {
        let mut s = session(3);
        let out = run(&mut s, "n\nn\n");
        assert!(out.contains("Event 3/3 (ID: 2)"));
        assert_eq!(s.cursor(), 2);
    }

    #[test]
    fn test_bare_jump_prompts_for_number() {
        let mut s = session(5);
        let out = run(&mut s, "j\n4\nq\n");
        assert!(out.contains("Jump to event number: "));
        assert!(out.contains("Event 4/5 (ID: 3)"));
    }

    #[test]
    fn test_message_shown_under_redraw() {
        let mut s = session(1);
        let out = run(&mut s, "j abc\nq\n");
        let message = out.find("Invalid event number: 'abc'").unwrap();
        let second_header = out.rfind("Event 1/1").unwrap();
        assert!(message > second_header);
    }

    #[test]
    fn test_report_waits_for_enter() {
        let mut s = session(1);
        let out = run(&mut s, "s\n\nq\n");
        assert!(out.contains("Statistics Summary (1 events)"));
        assert!(out.contains("Press Enter to continue..."));
        assert_eq!(s.visited_stats().len(), 2);
    }

    #[test]
    fn test_clear_screen_writes_escape() {
        let mut s = session(1);
        let mut pager = Pager::new(Cursor::new("q\n"), Vec::new(), BrowserConfig::default());
        pager.run(&mut s).unwrap();
        let out = pager.into_output();
        assert!(out.starts_with(b"\x1b["));
    }
}
