//! View state machine: which screen is active and which background work it owns.

use std::fmt;

/// Exactly one mode is active; every mode can reach every other one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ApplicationMode {
    #[default]
    Menu,
    Running,
    Report,
}

impl ApplicationMode {
    pub fn title(self) -> &'static str {
        match self {
            Self::Menu => "MAIN MENU",
            Self::Running => "SIMULATION",
            Self::Report => "VIEW LOGS",
        }
    }
}

impl fmt::Display for ApplicationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Menu => "menu",
            Self::Running => "running",
            Self::Report => "report",
        };
        f.write_str(name)
    }
}

/// A completed mode change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ApplicationMode,
    pub to: ApplicationMode,
}

impl Transition {
    pub fn leaves(&self, mode: ApplicationMode) -> bool {
        self.from == mode && self.to != mode
    }

    pub fn enters(&self, mode: ApplicationMode) -> bool {
        self.to == mode && self.from != mode
    }
}

/// Owns the current mode plus one generation counter per mode with background work.
///
/// Each entry into `Running` or `Report` bumps that mode's generation. Completions
/// tagged with an older generation belong to a previous visit and must be dropped.
#[derive(Debug, Clone, Default)]
pub struct ViewMachine {
    mode: ApplicationMode,
    poll_generation: u64,
    report_generation: u64,
}

impl ViewMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ApplicationMode {
        self.mode
    }

    pub fn poll_generation(&self) -> u64 {
        self.poll_generation
    }

    pub fn report_generation(&self) -> u64 {
        self.report_generation
    }

    /// Moves to `target`. Navigating to the active mode is a no-op and returns `None`.
    pub fn navigate(&mut self, target: ApplicationMode) -> Option<Transition> {
        if target == self.mode {
            return None;
        }
        let transition = Transition {
            from: self.mode,
            to: target,
        };
        self.mode = target;
        match target {
            ApplicationMode::Running => self.poll_generation += 1,
            ApplicationMode::Report => self.report_generation += 1,
            ApplicationMode::Menu => {}
        }
        Some(transition)
    }

    /// True when a poll tagged `generation` still belongs to the active visit.
    pub fn accepts_poll(&self, generation: u64) -> bool {
        self.mode == ApplicationMode::Running && generation == self.poll_generation
    }

    pub fn accepts_report(&self, generation: u64) -> bool {
        self.mode == ApplicationMode::Report && generation == self.report_generation
    }
}
