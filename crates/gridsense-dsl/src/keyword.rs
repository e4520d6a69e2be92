//! Reserved words of the pattern DSL.
//!
//! Keywords are case-sensitive; `Track` and `track` are different words.

use std::fmt;

use gridsense_core::PluckMode;

/// Terminal marker that closes every top-level block.
pub const EXEC: &str = "EXEC";

/// Command heading a top-level block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Define a pattern
    Hunt,
    /// Define a pattern whose sections carry a pluck mode
    Track,
    /// Emit a template directive
    Forge,
    /// Emit a code generation directive
    Weave,
}

impl Command {
    /// Every command.
    pub const ALL: [Command; 4] = [Command::Hunt, Command::Track, Command::Forge, Command::Weave];

    /// Look up a command by its exact spelling.
    pub fn lookup(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == word)
    }

    /// Source spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Command::Hunt => "hunt",
            Command::Track => "Track",
            Command::Forge => "forge",
            Command::Weave => "weave",
        }
    }

    /// Whether the block compiles into a pattern definition.
    pub const fn defines_pattern(self) -> bool {
        matches!(self, Command::Hunt | Command::Track)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Section mode assigned under `Track`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// First match per pluck
    Gather,
    /// Every match per pluck
    Harvest,
}

impl Mode {
    /// Look up a mode by its exact spelling.
    pub fn lookup(word: &str) -> Option<Self> {
        match word {
            "GATHER" => Some(Mode::Gather),
            "HARVEST" => Some(Mode::Harvest),
            _ => None,
        }
    }

    /// Source spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Mode::Gather => "GATHER",
            Mode::Harvest => "HARVEST",
        }
    }
}

impl From<Mode> for PluckMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Gather => PluckMode::Gather,
            Mode::Harvest => PluckMode::Harvest,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter heading a section entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    /// Marker presence rule
    Tag,
    /// Property extraction rule
    Pluck,
    /// Constraint rule
    Trap,
    /// Presentation hints
    Skin,
    /// Label traced on match
    Log,
    /// Confidence threshold
    Boil,
    /// Component type or rule inheritance
    From,
}

impl Param {
    /// Every parameter.
    pub const ALL: [Param; 7] = [
        Param::Tag,
        Param::Pluck,
        Param::Trap,
        Param::Skin,
        Param::Log,
        Param::Boil,
        Param::From,
    ];

    /// Look up a parameter by its exact spelling.
    pub fn lookup(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == word)
    }

    /// Source spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Param::Tag => "tag",
            Param::Pluck => "pluck",
            Param::Trap => "trap",
            Param::Skin => "skin",
            Param::Log => "log",
            Param::Boil => "boil",
            Param::From => "from",
        }
    }

    /// Whether the parameter may appear under `forge` or `weave`.
    pub const fn allowed_in_directive(self) -> bool {
        matches!(self, Param::Skin | Param::Log | Param::From)
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
