//! console peer: line oriented control surface on stdin / stdout
//!
//! every submit blocks the console until the coordinator answered, so output is always
//! printed from the snapshot the coordinator produced

use std::io::{self, BufRead, Write};
use std::thread::{self, JoinHandle};

use crate::common::error::ControlError;
use crate::control::control_block::ControlClient;
use crate::entity::bo::command_bo::Command;
use crate::entity::bo::control_bo::ReplyBo;
use crate::entity::bo::render_state_bo::Palette;
use crate::util::time::format_12h;
use crate::wire::console_adapter::{parse_line, ConsoleAction};
use crate::{info, warn};

const LOG_TAG: &str = "console_peer";

const HELP_TEXT: &str = "COLOR [1-3] [COLOR]: Change the color of the three lights
COLORS: List the available colors
EXIT: Exit the application (Please don't exit during the show!)
HELP: Display this message
BANNER: Switch to Banner display
SLIDESHOW: Switch to Slideshow display
ADDRESS: Display control panel URL
DOWNBEAT [TIME]: Change show start time (military 24-hour time HHMM)
VENUE [NAME]: Change the name of the venue to be displayed
AUTOSTART: Automatically switch slideshow off at showtime";

pub struct ConsolePeer<R: BufRead, W: Write> {
    client: ControlClient,
    input: R,
    output: W,
    panel_url: String,
}

impl<R: BufRead, W: Write> ConsolePeer<R, W> {
    pub fn new(client: ControlClient, input: R, output: W, panel_url: String) -> Self {
        ConsolePeer {
            client,
            input,
            output,
            panel_url,
        }
    }

    /// input loop, returns on `EXIT` or shutdown
    /// closed input parks the peer in `Running` until the cancel token fires
    pub fn run(&mut self) -> io::Result<()> {
        let result = self.input_loop();
        self.client.mark_stopping();
        info!(LOG_TAG, "console peer stopping");
        self.client.mark_stopped();
        result
    }

    fn input_loop(&mut self) -> io::Result<()> {
        writeln!(self.output, "Digital Interactive Banner")?;
        writeln!(self.output, "Control panel: {}", self.panel_url)?;
        writeln!(self.output, "Type \"HELP\" for a list of commands")?;
        writeln!(self.output)?;
        self.client.mark_running();

        let mut line = String::new();
        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                // no terminal attached, the banner keeps running until shutdown
                info!(LOG_TAG, "console input closed, waiting for shutdown");
                self.client.cancel_token().wait();
                return Ok(());
            }

            let action = match parse_line(&line) {
                Ok(action) => action,
                Err(e) => {
                    writeln!(self.output, "{}", e)?;
                    continue;
                }
            };

            match action {
                ConsoleAction::Nothing => {}
                ConsoleAction::Exit => return Ok(()),
                ConsoleAction::Help => writeln!(self.output, "{}", HELP_TEXT)?,
                ConsoleAction::Address => {
                    writeln!(self.output, "Address: {}", self.panel_url)?;
                    writeln!(self.output, "Ensure both your device and this device are on the same network")?;
                }
                ConsoleAction::Submit(command) => match self.client.submit(command.clone()) {
                    Ok(reply) => self.print_reply(&command, &reply)?,
                    Err(e @ (ControlError::Cancelled(_) | ControlError::Disconnected(_))) => {
                        info!(LOG_TAG, "console peer leaving: {}", e);
                        return Ok(());
                    }
                    Err(e) => {
                        warn!(LOG_TAG, "submit failed: {}", e);
                        writeln!(self.output, "Banner did not respond: {}", e)?;
                    }
                },
            }
        }
    }

    fn print_reply(&mut self, command: &Command, reply: &ReplyBo) -> io::Result<()> {
        if !reply.applied() {
            return writeln!(self.output, "Command rejected.");
        }
        let state = &reply.snapshot;
        match command {
            Command::ToggleAutoStart => writeln!(
                self.output,
                "Autostart is now {}.",
                if state.autostart() { "ENABLED" } else { "DISABLED" }
            ),
            Command::SetVenueName(_) => writeln!(self.output, "Updated venue name to \"{}\"", state.venue_name),
            Command::SetDownbeat(_) => {
                writeln!(self.output, "Time updated.")?;
                writeln!(self.output, "Showtime: {}", format_12h(state.downbeat_minutes))
            }
            Command::ReadColors => {
                writeln!(self.output, "Current light colors:")?;
                for (i, color) in state.colors.iter().enumerate() {
                    writeln!(self.output, "{}: {}", i + 1, color.ansi_name())?;
                }
                writeln!(self.output, "Available light colors:")?;
                for color in Palette::ALL {
                    writeln!(self.output, "{}", color.ansi_name())?;
                }
                Ok(())
            }
            Command::SetColorSlot { slot, .. } => match state.color(*slot) {
                Some(color) => writeln!(self.output, "Color {} switched to {}", slot, color.ansi_name()),
                None => Ok(()),
            },
            Command::SetMode(true) => writeln!(self.output, "Banner is now in Slideshow mode."),
            Command::SetMode(false) => writeln!(self.output, "Banner is now in Banner mode."),
            // not produced by the console grammar
            Command::SetFlagField(_) | Command::ToggleFlag { .. } | Command::Unrecognized => Ok(()),
        }
    }
}

/// run the console peer on its own thread, bound to the process stdin / stdout
pub fn spawn(client: ControlClient, panel_url: String) -> JoinHandle<()> {
    thread::spawn(move || {
        let stdin = io::stdin();
        let mut peer = ConsolePeer::new(client, stdin.lock(), io::stdout(), panel_url);
        if let Err(e) = peer.run() {
            warn!(LOG_TAG, "console io failed: {}", e);
        }
    })
}
