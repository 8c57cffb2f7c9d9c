use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockKind {
    Tick,
    Countdown,
}

/// One firing of a clock. `generation` identifies the schedule that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockEvent {
    pub kind: ClockKind,
    pub generation: u64,
}

/// Periodic event source feeding a shared queue.
///
/// Every `start`/`reschedule`/`stop` aborts the running task and bumps the
/// generation, so an event already queued by the old schedule is recognised as
/// stale by [`SimulationClock::is_current`] and never acted on.
pub struct SimulationClock {
    kind: ClockKind,
    events: mpsc::UnboundedSender<ClockEvent>,
    generation: u64,
    period: Option<Duration>,
    task: Option<JoinHandle<()>>,
}

impl SimulationClock {
    pub fn new(kind: ClockKind, events: mpsc::UnboundedSender<ClockEvent>) -> Self {
        Self {
            kind,
            events,
            generation: 0,
            period: None,
            task: None,
        }
    }

    pub fn kind(&self) -> ClockKind {
        self.kind
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// First event fires one full `period` after the call.
    pub fn start(&mut self, period: Duration) {
        self.cancel();
        self.generation += 1;
        self.period = Some(period);

        let event = ClockEvent {
            kind: self.kind,
            generation: self.generation,
        };
        let events = self.events.clone();
        self.task = Some(tokio::spawn(async move {
            let mut timer = interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                timer.tick().await;
                if events.send(event).is_err() {
                    break;
                }
            }
        }));
    }

    /// Replaces the running schedule in one step. Does nothing while stopped.
    pub fn reschedule(&mut self, period: Duration) {
        if self.is_running() && self.period != Some(period) {
            self.start(period);
        }
    }

    pub fn stop(&mut self) {
        if self.cancel() {
            self.generation += 1;
        }
        self.period = None;
    }

    pub fn is_current(&self, event: &ClockEvent) -> bool {
        self.is_running() && event.kind == self.kind && event.generation == self.generation
    }

    fn cancel(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for SimulationClock {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut mpsc::UnboundedReceiver<ClockEvent>) -> Vec<ClockEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_per_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut clock = SimulationClock::new(ClockKind::Tick, tx);
        clock.start(Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(350)).await;

        let events = drain(&mut rx);
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| clock.is_current(e)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_invalidates_old_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut clock = SimulationClock::new(ClockKind::Tick, tx);
        clock.start(Duration::from_millis(100));
        tokio::time::sleep(Duration::from_millis(150)).await;
        let old = drain(&mut rx);
        assert_eq!(old.len(), 1);

        clock.reschedule(Duration::from_millis(40));
        assert!(!clock.is_current(&old[0]));
        assert_eq!(clock.period(), Some(Duration::from_millis(40)));

        tokio::time::sleep(Duration::from_millis(130)).await;
        let fresh = drain(&mut rx);
        assert_eq!(fresh.len(), 3);
        assert!(fresh.iter().all(|e| clock.is_current(e)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_silences_clock() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut clock = SimulationClock::new(ClockKind::Countdown, tx);
        clock.start(Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let before_stop = drain(&mut rx);
        assert_eq!(before_stop.len(), 1);

        clock.stop();
        clock.stop();
        assert!(!clock.is_current(&before_stop[0]));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_while_stopped_is_ignored() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut clock = SimulationClock::new(ClockKind::Tick, tx);
        clock.reschedule(Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!clock.is_running());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_of_other_clock_kind_are_not_current() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut tick = SimulationClock::new(ClockKind::Tick, tx.clone());
        let mut countdown = SimulationClock::new(ClockKind::Countdown, tx);
        tick.start(Duration::from_millis(100));
        countdown.start(Duration::from_secs(1));

        let tick_event = ClockEvent {
            kind: ClockKind::Tick,
            generation: 1,
        };
        assert!(tick.is_current(&tick_event));
        assert!(!countdown.is_current(&tick_event));
    }
}
