//! Executes session effects on a tokio runtime and feeds completions back.
//!
//! The driver is owned by a single thread (the HUD loop). Network work runs as
//! detached tasks that only ever talk back through the event bus, so the session
//! is never touched concurrently.

use std::sync::Arc;
use std::time::Duration;

use lifeview_core::{Action, ActionError, Command, Effect, Event, Session};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::client::SimulationApi;
use crate::events::{
    DEFAULT_EVENT_CAPACITY, EventReceiver, EventSender, create_event_bus, drain_pending_events,
    publish,
};

/// Counters accumulated over the driver's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Times a recurring status schedule was started.
    pub polling_sessions: u64,
    pub polls_applied: u64,
    pub stale_discarded: u64,
    pub commands_dispatched: u64,
}

struct Poller {
    generation: u64,
    task: JoinHandle<()>,
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct SessionDriver<A: SimulationApi> {
    session: Session,
    api: Arc<A>,
    runtime: Handle,
    events: EventSender,
    inbox: EventReceiver,
    poll_interval: Duration,
    poller: Option<Poller>,
    stats: DriverStats,
}

impl<A: SimulationApi> SessionDriver<A> {
    pub fn new(api: Arc<A>, runtime: Handle, poll_interval: Duration) -> Self {
        let (events, inbox) = create_event_bus(DEFAULT_EVENT_CAPACITY);
        Self {
            session: Session::new(),
            api,
            runtime,
            events,
            inbox,
            poll_interval,
            poller: None,
            stats: DriverStats::default(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    /// Whether a recurring status schedule is currently installed.
    pub fn is_polling(&self) -> bool {
        self.poller.is_some()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Runs `action` through the session and starts whatever work it requires.
    pub fn perform(&mut self, action: Action) -> Result<(), ActionError> {
        let effects = self.session.handle(action)?;
        for effect in effects {
            self.execute(effect);
        }
        Ok(())
    }

    /// Applies every completion received so far. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let report = drain_pending_events(&self.inbox, &mut self.session);
        self.stats.polls_applied += report.polls_applied as u64;
        self.stats.stale_discarded += report.stale as u64;
        report.applied
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Dispatch(commands) => self.dispatch(commands),
            Effect::StartPolling { generation } => self.start_polling(generation),
            Effect::StopPolling => self.stop_polling(),
            Effect::FetchReport { generation } => self.fetch_report(generation),
        }
    }

    fn dispatch(&mut self, commands: Vec<Command>) {
        self.stats.commands_dispatched += commands.len() as u64;
        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        self.runtime.spawn(async move {
            for command in commands {
                debug!(%command, "sending command");
                let outcome = api.send_command(command).await;
                publish(&events, Event::CommandCompleted { command, outcome });
            }
        });
    }

    fn start_polling(&mut self, generation: u64) {
        self.stop_polling();
        self.stats.polling_sessions += 1;

        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        let period = self.poll_interval;
        let task = self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                // Each cycle is independent: a slow fetch never holds back the next tick.
                let api = Arc::clone(&api);
                let events = events.clone();
                tokio::spawn(async move {
                    let outcome = api.fetch_status().await;
                    publish(&events, Event::PollCompleted { generation, outcome });
                });
            }
        });
        info!(
            generation,
            interval_ms = period.as_millis() as u64,
            "status polling started"
        );
        self.poller = Some(Poller { generation, task });
    }

    fn stop_polling(&mut self) {
        if let Some(poller) = self.poller.take() {
            info!(generation = poller.generation, "status polling stopped");
        }
    }

    fn fetch_report(&mut self, generation: u64) {
        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        debug!(generation, "fetching report");
        self.runtime.spawn(async move {
            let outcome = api.fetch_report().await;
            publish(&events, Event::ReportCompleted { generation, outcome });
        });
    }
}
