//! Process-wide client state and the only place it is mutated.
//!
//! Operator intents go through [`Session::handle`], which updates local state and
//! returns the [`Effect`]s a runtime must carry out. Network completions come back
//! through [`Session::apply`]. Nothing else writes to the mirror.

use std::fmt;

use tracing::{debug, info, warn};

use crate::command::Command;
use crate::connectivity::Connectivity;
use crate::error::{ActionError, ExchangeError};
use crate::mode::{ApplicationMode, ViewMachine};
use crate::predict::predict;
use crate::snapshot::{ReportSummary, SimulationSnapshot};

/// Operator intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Leave the menu for the running view and start the remote simulation.
    Begin,
    Navigate(ApplicationMode),
    Issue(Command),
    /// Reset the remote simulation and start a fresh run.
    Restart,
    /// Answer the pending yes/no gate.
    Confirm(bool),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin => f.write_str("begin"),
            Self::Navigate(mode) => write!(f, "navigate to {mode}"),
            Self::Issue(command) => write!(f, "issue {command}"),
            Self::Restart => f.write_str("restart"),
            Self::Confirm(_) => f.write_str("confirm"),
        }
    }
}

/// Work the runtime must perform on behalf of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the commands in order from a single task.
    Dispatch(Vec<Command>),
    /// Begin the recurring status fetch, tagging completions with `generation`.
    StartPolling { generation: u64 },
    StopPolling,
    FetchReport { generation: u64 },
}

/// Completion of a network exchange started by an [`Effect`].
#[derive(Debug, Clone)]
pub enum Event {
    PollCompleted {
        generation: u64,
        outcome: Result<SimulationSnapshot, ExchangeError>,
    },
    ReportCompleted {
        generation: u64,
        outcome: Result<ReportSummary, ExchangeError>,
    },
    CommandCompleted {
        command: Command,
        outcome: Result<(), ExchangeError>,
    },
}

/// Whether a completion still belonged to the active view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Applied,
    Stale,
}

/// Report view state, discarded whenever the report view is left.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportState {
    pub loading: bool,
    pub summary: Option<ReportSummary>,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    machine: ViewMachine,
    mirror: Option<SimulationSnapshot>,
    report: ReportState,
    connectivity: Connectivity,
    pending: Option<Command>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ApplicationMode {
        self.machine.mode()
    }

    /// `None` until the first poll (or prediction) lands.
    pub fn mirror(&self) -> Option<&SimulationSnapshot> {
        self.mirror.as_ref()
    }

    pub fn report(&self) -> &ReportState {
        &self.report
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// Command waiting on the operator's yes/no answer.
    pub fn pending_confirmation(&self) -> Option<Command> {
        self.pending
    }

    /// Polling must run exactly while this is true.
    pub fn is_polling(&self) -> bool {
        self.mode() == ApplicationMode::Running
    }

    pub fn handle(&mut self, action: Action) -> Result<Vec<Effect>, ActionError> {
        match action {
            Action::Begin => {
                self.require(action, ApplicationMode::Menu)?;
                let mut effects = vec![Effect::Dispatch(vec![Command::Start])];
                effects.extend(self.navigate(ApplicationMode::Running));
                Ok(effects)
            }
            Action::Navigate(target) => Ok(self.navigate(target)),
            Action::Issue(command) => {
                self.require(action, ApplicationMode::Running)?;
                if command.requires_confirmation() {
                    debug!(%command, "awaiting operator confirmation");
                    self.pending = Some(command);
                    return Ok(Vec::new());
                }
                Ok(self.issue(command))
            }
            Action::Restart => {
                self.require(action, ApplicationMode::Running)?;
                Ok(vec![Effect::Dispatch(vec![Command::Reset, Command::Start])])
            }
            Action::Confirm(accepted) => {
                let command = self
                    .pending
                    .take()
                    .ok_or(ActionError::NoPendingConfirmation)?;
                if accepted {
                    Ok(self.issue(command))
                } else {
                    debug!(%command, "operator declined");
                    Ok(Vec::new())
                }
            }
        }
    }

    pub fn apply(&mut self, event: Event) -> Disposition {
        match event {
            Event::PollCompleted {
                generation,
                outcome,
            } => {
                self.note_exchange("status", &outcome);
                if !self.machine.accepts_poll(generation) {
                    debug!(generation, "discarding stale status response");
                    return Disposition::Stale;
                }
                if let Ok(snapshot) = outcome {
                    self.mirror = Some(snapshot);
                }
                Disposition::Applied
            }
            Event::ReportCompleted {
                generation,
                outcome,
            } => {
                if !self.machine.accepts_report(generation) {
                    debug!(generation, "discarding stale report response");
                    return Disposition::Stale;
                }
                let summary = outcome.unwrap_or_else(|err| {
                    warn!(error = %err, "report unavailable; storing fallback summary");
                    ReportSummary::unavailable()
                });
                self.report = ReportState {
                    loading: false,
                    summary: Some(summary),
                };
                Disposition::Applied
            }
            Event::CommandCompleted { command, outcome } => {
                if let Err(err) = &outcome {
                    debug!(%command, error = %err, "command delivery failed");
                }
                self.note_exchange("command", &outcome);
                Disposition::Applied
            }
        }
    }

    fn require(&self, action: Action, mode: ApplicationMode) -> Result<(), ActionError> {
        if self.mode() == mode {
            Ok(())
        } else {
            Err(ActionError::NotAllowed {
                action: action.to_string(),
                mode: self.mode(),
            })
        }
    }

    fn navigate(&mut self, target: ApplicationMode) -> Vec<Effect> {
        let Some(transition) = self.machine.navigate(target) else {
            return Vec::new();
        };
        debug!(from = %transition.from, to = %transition.to, "mode transition");
        self.pending = None;

        let mut effects = Vec::new();
        if transition.leaves(ApplicationMode::Running) {
            effects.push(Effect::StopPolling);
        }
        if transition.leaves(ApplicationMode::Report) {
            self.report = ReportState::default();
        }
        if transition.enters(ApplicationMode::Running) {
            effects.push(Effect::StartPolling {
                generation: self.machine.poll_generation(),
            });
        }
        if transition.enters(ApplicationMode::Report) {
            self.report = ReportState {
                loading: true,
                summary: None,
            };
            effects.push(Effect::FetchReport {
                generation: self.machine.report_generation(),
            });
        }
        effects
    }

    fn issue(&mut self, command: Command) -> Vec<Effect> {
        if let Some(predicted) = predict(&command, self.mirror.as_ref()) {
            self.mirror = Some(predicted);
        }
        vec![Effect::Dispatch(vec![command])]
    }

    fn note_exchange<T>(&mut self, exchange: &'static str, outcome: &Result<T, ExchangeError>) {
        match (self.connectivity.record(outcome), outcome) {
            (Some(false), Err(err)) => warn!(exchange, error = %err, "simulation unreachable"),
            (Some(true), _) => info!(exchange, "simulation reachable again"),
            _ => {}
        }
    }
}
