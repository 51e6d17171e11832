//! Control commands accepted by the remote simulation.

use std::fmt;

use crate::snapshot::CellVariant;

/// Fire-and-forget control command. Responses are never interpreted beyond delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    TogglePause,
    Reset,
    AddCell(CellVariant),
    AddFood,
    KillAll,
    Speed(SpeedSetting),
}

/// Time-scale presets understood by the `speed` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpeedSetting {
    Fast,
    Slow,
    #[default]
    Normal,
}

impl SpeedSetting {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Slow => "slow",
            Self::Normal => "normal",
        }
    }
}

impl Command {
    /// Path segment under `/api/simulation/`.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::TogglePause => "togglePause",
            Self::Reset => "reset",
            Self::AddCell(_) => "addCell",
            Self::AddFood => "addFood",
            Self::KillAll => "killAll",
            Self::Speed(_) => "speed",
        }
    }

    pub fn query(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::AddCell(variant) => Some(("type", variant.query_value())),
            Self::Speed(setting) => Some(("action", setting.as_str())),
            _ => None,
        }
    }

    /// Destructive commands go through the operator's yes/no gate before dispatch.
    pub fn requires_confirmation(self) -> bool {
        matches!(self, Self::KillAll)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())?;
        if let Some((key, value)) = self.query() {
            write!(f, "?{key}={value}")?;
        }
        Ok(())
    }
}
