//! canonical render state of the banner
//!
//! light colors, behavior flags, downbeat time and venue name, read by the renderer every
//! frame and written only by the coordinator

use std::fmt;

/// palette of the three stage lights, index order is part of the web protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Palette {
    Black = 0,
    Red = 1,
    Green = 2,
    Blue = 3,
    Cyan = 4,
    Magenta = 5,
    Yellow = 6,
    White = 7,
}

impl Palette {
    pub const ALL: [Palette; 8] = [
        Palette::Black,
        Palette::Red,
        Palette::Green,
        Palette::Blue,
        Palette::Cyan,
        Palette::Magenta,
        Palette::Yellow,
        Palette::White,
    ];

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// case insensitive lookup of the console color names
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name().eq_ignore_ascii_case(name))
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Palette::Black => "BLACK",
            Palette::Red => "RED",
            Palette::Green => "GREEN",
            Palette::Blue => "BLUE",
            Palette::Cyan => "CYAN",
            Palette::Magenta => "MAGENTA",
            Palette::Yellow => "YELLOW",
            Palette::White => "WHITE",
        }
    }

    /// name wrapped in the matching ANSI terminal color
    pub fn ansi_name(self) -> String {
        let code = match self {
            Palette::Black => 90,
            Palette::Red => 91,
            Palette::Green => 92,
            Palette::Blue => 94,
            Palette::Cyan => 96,
            Palette::Magenta => 95,
            Palette::Yellow => 93,
            Palette::White => 97,
        };
        format!("\x1b[0;{}m{}\x1b[0m", code, self.name())
    }

    /// light color used by the renderer
    pub fn rgb(self) -> [f32; 3] {
        match self {
            Palette::Black => [0.0, 0.0, 0.0],
            Palette::Red => [1.0, 0.1, 0.1],
            Palette::Green => [0.1, 1.0, 0.1],
            Palette::Blue => [0.1, 0.1, 1.0],
            Palette::Cyan => [0.0, 0.8, 0.8],
            Palette::Magenta => [0.8, 0.0, 0.8],
            Palette::Yellow => [0.8, 0.8, 0.0],
            Palette::White => [0.7, 0.7, 0.7],
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// one of the four behavior bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviorFlag {
    SlideshowMode,
    AutoStart,
    BaseLight,
    MetaPosts,
}

impl BehaviorFlag {
    pub const ALL: [BehaviorFlag; 4] = [
        BehaviorFlag::SlideshowMode,
        BehaviorFlag::AutoStart,
        BehaviorFlag::BaseLight,
        BehaviorFlag::MetaPosts,
    ];

    pub fn mask(self) -> u8 {
        match self {
            BehaviorFlag::SlideshowMode => 0x01,
            BehaviorFlag::AutoStart => 0x02,
            BehaviorFlag::BaseLight => 0x04,
            BehaviorFlag::MetaPosts => 0x08,
        }
    }

    /// only single recognized bits map to a flag
    pub fn from_mask(mask: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.mask() == mask)
    }
}

/// bitset over [`BehaviorFlag`], unknown high bits are kept as written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BehaviorFlags(u8);

impl BehaviorFlags {
    pub fn from_bits(bits: u8) -> Self {
        BehaviorFlags(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, flag: BehaviorFlag) -> bool {
        self.0 & flag.mask() != 0
    }

    /// clear the bits in `mask`, then take them from `content`
    pub fn write(&mut self, mask: u8, content: u8) {
        self.0 = (!mask & self.0) | (mask & content);
    }

    pub fn set(&mut self, flag: BehaviorFlag, on: bool) {
        self.write(flag.mask(), if on { 0xff } else { 0x00 });
    }

    pub fn with(mut self, flag: BehaviorFlag) -> Self {
        self.set(flag, true);
        self
    }
}

/// venue name, truncated to fit the 248 byte slot of the display (247 + terminator)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VenueName(String);

impl VenueName {
    pub const MAX_LEN: usize = 247;

    /// truncates silently, never splits a UTF-8 character
    pub fn new(name: &str) -> Self {
        if name.len() <= Self::MAX_LEN {
            return VenueName(name.to_string());
        }
        let mut end = Self::MAX_LEN;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        VenueName(name[..end].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VenueName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub const MINUTES_PER_DAY: i32 = 24 * 60;
pub const DEFAULT_VENUE_NAME: &str = "Your Venue Name Here";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderState {
    /// light slots 1..=3 stored at 0..=2
    pub colors: [Palette; 3],
    pub flags: BehaviorFlags,
    /// show start, minutes since midnight, always < MINUTES_PER_DAY
    pub downbeat_minutes: u16,
    pub venue_name: VenueName,
}

impl RenderState {
    pub fn with_venue(venue_name: &str) -> Self {
        RenderState {
            venue_name: VenueName::new(venue_name),
            ..Default::default()
        }
    }

    /// color of slot 1..=3
    pub fn color(&self, slot: u8) -> Option<Palette> {
        let index = (slot as usize).checked_sub(1)?;
        self.colors.get(index).copied()
    }

    pub fn slideshow(&self) -> bool {
        self.flags.contains(BehaviorFlag::SlideshowMode)
    }

    pub fn autostart(&self) -> bool {
        self.flags.contains(BehaviorFlag::AutoStart)
    }
}

impl Default for RenderState {
    fn default() -> Self {
        RenderState {
            colors: [Palette::Red, Palette::Green, Palette::Blue],
            flags: BehaviorFlags::default()
                .with(BehaviorFlag::AutoStart)
                .with(BehaviorFlag::BaseLight)
                .with(BehaviorFlag::MetaPosts),
            downbeat_minutes: 1200,
            venue_name: VenueName::new(DEFAULT_VENUE_NAME),
        }
    }
}
