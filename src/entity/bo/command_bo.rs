//! command taxonomy shared by both control surfaces
//! arguments are kept raw, the coordinator range checks them when applying

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// overwrite the whole flag byte
    SetFlagField(u8),
    /// `mask` must be exactly one recognized flag bit
    ToggleFlag { mask: u8, on: bool },
    /// minutes since midnight
    SetDownbeat(i32),
    SetVenueName(String),
    /// slot 1..=3, palette index 0..=7
    SetColorSlot { slot: u8, color: u8 },
    ReadColors,
    /// true = slideshow, false = banner
    SetMode(bool),
    ToggleAutoStart,
    /// input rejected by a wire adapter, applied as a no-op
    Unrecognized,
}

impl Command {
    pub fn opcode(&self) -> &'static str {
        match self {
            Command::SetFlagField(_) => "SetFlagField",
            Command::ToggleFlag { .. } => "ToggleFlag",
            Command::SetDownbeat(_) => "SetDownbeat",
            Command::SetVenueName(_) => "SetVenueName",
            Command::SetColorSlot { .. } => "SetColorSlot",
            Command::ReadColors => "ReadColors",
            Command::SetMode(_) => "SetMode",
            Command::ToggleAutoStart => "ToggleAutoStart",
            Command::Unrecognized => "Unrecognized",
        }
    }

    /// commands that never change the render state
    pub fn is_read_only(&self) -> bool {
        matches!(self, Command::ReadColors | Command::Unrecognized)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Command::SetFlagField(bits) => write!(f, "SetFlagField({:#04x})", bits),
            Command::ToggleFlag { mask, on } => write!(f, "ToggleFlag({:#04x}, {})", mask, on),
            Command::SetDownbeat(minutes) => write!(f, "SetDownbeat({})", minutes),
            Command::SetVenueName(name) => write!(f, "SetVenueName({:?})", name),
            Command::SetColorSlot { slot, color } => write!(f, "SetColorSlot({}, {})", slot, color),
            Command::SetMode(slideshow) => write!(f, "SetMode({})", slideshow),
            other => f.write_str(other.opcode()),
        }
    }
}
