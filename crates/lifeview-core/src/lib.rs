//! Core state layer for the lifeview simulation observer.
//!
//! The remote simulation owns the truth; this crate owns the client's view of it:
//! the active mode, the local mirror refreshed by polling, optimistic predictions
//! for commands, report state and reachability. Everything here is synchronous and
//! free of I/O. Runtimes feed [`Action`]s and [`Event`]s into a [`Session`] and
//! execute the [`Effect`]s it returns.

pub mod command;
pub mod connectivity;
pub mod error;
pub mod mode;
pub mod predict;
pub mod session;
pub mod snapshot;

pub use command::{Command, SpeedSetting};
pub use connectivity::Connectivity;
pub use error::{ActionError, ExchangeError};
pub use mode::{ApplicationMode, Transition, ViewMachine};
pub use predict::{food_grant, predict};
pub use session::{Action, Disposition, Effect, Event, ReportState, Session};
pub use snapshot::{
    CellRecord, CellVariant, FoodItem, REPORT_UNAVAILABLE, ReportSummary, SimulationSnapshot,
};
