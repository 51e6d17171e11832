use crossfire::mpmc;
use crossfire::{MAsyncTx, MRx, TryRecvError, TrySendError, detect_backoff_cfg};
use lifeview_core::{Disposition, Event, Session};
use tracing::{trace, warn};

/// Network tasks publish completions here; the session owner drains them.
pub type EventSender = MAsyncTx<Event>;
pub type EventReceiver = MRx<Event>;

pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

pub fn create_event_bus(capacity: usize) -> (EventSender, EventReceiver) {
    detect_backoff_cfg();
    mpmc::bounded_tx_async_rx_blocking(capacity)
}

/// Enqueues `event` without waiting. A full or closed bus drops it.
pub fn publish(sender: &EventSender, event: Event) -> bool {
    match sender.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(event)) => {
            warn!(?event, "event bus full; dropping completion");
            false
        }
        Err(TrySendError::Disconnected(event)) => {
            trace!(?event, "event bus closed; dropping completion");
            false
        }
    }
}

/// Tally of one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub applied: usize,
    pub polls_applied: usize,
    pub stale: usize,
}

pub fn drain_pending_events(receiver: &EventReceiver, session: &mut Session) -> DrainReport {
    let mut report = DrainReport::default();
    loop {
        match receiver.try_recv() {
            Ok(event) => {
                let is_poll = matches!(event, Event::PollCompleted { .. });
                match session.apply(event) {
                    Disposition::Applied => {
                        report.applied += 1;
                        if is_poll {
                            report.polls_applied += 1;
                        }
                    }
                    Disposition::Stale => report.stale += 1,
                }
            }
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => break,
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeview_core::{Action, ApplicationMode, Command, SimulationSnapshot};

    #[test]
    fn drain_applies_current_and_counts_stale() {
        let (sender, receiver) = create_event_bus(8);
        let mut session = Session::new();
        session.handle(Action::Begin).expect("begin");

        assert!(publish(
            &sender,
            Event::PollCompleted {
                generation: 1,
                outcome: Ok(SimulationSnapshot {
                    alive_count: 4,
                    ..SimulationSnapshot::default()
                }),
            }
        ));
        assert!(publish(
            &sender,
            Event::CommandCompleted {
                command: Command::Start,
                outcome: Ok(()),
            }
        ));
        assert!(publish(
            &sender,
            Event::PollCompleted {
                generation: 0,
                outcome: Ok(SimulationSnapshot::default()),
            }
        ));

        let report = drain_pending_events(&receiver, &mut session);
        assert_eq!(
            report,
            DrainReport {
                applied: 2,
                polls_applied: 1,
                stale: 1,
            }
        );
        assert_eq!(session.mirror().map(|m| m.alive_count), Some(4));
        assert_eq!(session.mode(), ApplicationMode::Running);
    }
}
