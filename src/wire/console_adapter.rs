//! console command line -> command
//!
//! grammar (verbs case insensitive):
//! `COLOR <1-3> <NAME>`, `COLORS`, `SLIDESHOW`, `BANNER`, `AUTOSTART`, `VENUE <text>`,
//! `DOWNBEAT <HHMM>`, `ADDRESS`, `HELP`, `EXIT`

use crate::common::error::WireError;
use crate::entity::bo::command_bo::Command;
use crate::entity::bo::render_state_bo::Palette;
use crate::util::time::parse_hhmm;

/// what the console peer should do with one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleAction {
    Submit(Command),
    Help,
    Address,
    Exit,
    // blank line
    Nothing,
}

pub fn parse_line(line: &str) -> Result<ConsoleAction, WireError> {
    let line = line.trim();
    let mut tokens = line.split_whitespace();
    let Some(verb) = tokens.next() else {
        return Ok(ConsoleAction::Nothing);
    };
    let verb = verb.to_ascii_uppercase();

    let action = match verb.as_str() {
        "HELP" => ConsoleAction::Help,
        "EXIT" => ConsoleAction::Exit,
        "ADDRESS" => ConsoleAction::Address,
        "COLORS" => ConsoleAction::Submit(Command::ReadColors),
        "SLIDESHOW" => ConsoleAction::Submit(Command::SetMode(true)),
        "BANNER" => ConsoleAction::Submit(Command::SetMode(false)),
        "AUTOSTART" => ConsoleAction::Submit(Command::ToggleAutoStart),
        "COLOR" => {
            let slot = match tokens.next() {
                Some(s @ ("1" | "2" | "3")) => s.as_bytes()[0] - b'0',
                _ => return Err(WireError::InvalidSlot),
            };
            let name = tokens.next().unwrap_or_default();
            let palette = Palette::from_name(name).ok_or_else(|| WireError::InvalidColor(name.to_string()))?;
            ConsoleAction::Submit(Command::SetColorSlot {
                slot,
                color: palette.index(),
            })
        }
        "DOWNBEAT" => {
            let minutes = tokens.next().and_then(parse_hhmm).ok_or(WireError::InvalidTime)?;
            ConsoleAction::Submit(Command::SetDownbeat(minutes as i32))
        }
        "VENUE" => {
            // everything after the verb, as typed
            let name = line[verb.len()..].trim();
            if name.is_empty() {
                return Err(WireError::MissingVenue);
            }
            ConsoleAction::Submit(Command::SetVenueName(name.to_string()))
        }
        _ => return Err(WireError::UnknownCommand(verb)),
    };
    Ok(action)
}
