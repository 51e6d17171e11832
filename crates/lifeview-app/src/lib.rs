//! Runtime plumbing for the lifeview observer: REST client, effect driver and HUD.

pub mod client;
pub mod config;
pub mod driver;
pub mod events;
pub mod terminal;

pub use client::{RestClient, SimulationApi};
pub use config::{ClientConfig, ConfigError};
pub use driver::{DriverStats, SessionDriver};
pub use terminal::{HeadlessReport, TerminalHud};
