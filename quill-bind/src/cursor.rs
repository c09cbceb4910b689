//! Periodic caret reporting.
//!
//! The reporter is the only timer in a binding. It is polled from the
//! binding's event loop, so stopping it drops the pending interval and no
//! tick can fire afterwards.

use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::channel::Collaborator;
use crate::surface::TextSurface;

#[derive(Debug)]
pub struct CursorReporter {
    period: Duration,
    running: bool,
    /// Created on first poll so that start/stop work outside a runtime.
    ticker: Option<Interval>,
}

impl CursorReporter {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            running: false,
            ticker: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Arm the reporter. The first tick comes one full period later.
    pub fn start(&mut self) {
        self.running = true;
        self.ticker = None;
    }

    /// Disarm and drop any scheduled tick.
    pub fn stop(&mut self) {
        self.running = false;
        self.ticker = None;
    }

    /// Resolve at the next tick. Never resolves while stopped.
    pub async fn tick(&mut self) {
        if !self.running {
            return std::future::pending().await;
        }
        let period = self.period;
        let ticker = self.ticker.get_or_insert_with(|| {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        ticker.tick().await;
    }

    /// Send the caret (selection start) upstream and return it.
    pub fn report<S, C>(surface: &S, collaborator: &mut C) -> usize
    where
        S: TextSurface,
        C: Collaborator,
    {
        let offset = surface.selection().start;
        collaborator.update_cursor(offset);
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelCollaborator, Outbound};
    use crate::selection::Selection;
    use crate::surface::MemorySurface;
    use tokio::time::timeout;

    #[test]
    fn test_start_stop_without_runtime() {
        let mut reporter = CursorReporter::new(Duration::from_millis(100));
        assert!(!reporter.is_running());
        reporter.start();
        assert!(reporter.is_running());
        reporter.stop();
        assert!(!reporter.is_running());
        assert_eq!(reporter.period(), Duration::from_millis(100));
    }

    #[test]
    fn test_report_sends_selection_start() {
        let mut surface = MemorySurface::new();
        surface.set_content("hello world");
        surface.set_selection(Selection::new(3, 7));
        let (mut collab, mut rx) = ChannelCollaborator::new();

        assert_eq!(CursorReporter::report(&surface, &mut collab), 3);
        assert_eq!(rx.try_recv().unwrap(), Outbound::Cursor(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_period() {
        let mut reporter = CursorReporter::new(Duration::from_millis(100));
        reporter.start();
        let started = Instant::now();
        reporter.tick().await;
        assert!(started.elapsed() >= Duration::from_millis(100));
        reporter.tick().await;
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_never_ticks() {
        let mut reporter = CursorReporter::new(Duration::from_millis(10));
        reporter.start();
        reporter.tick().await;
        reporter.stop();
        let result = timeout(Duration::from_secs(5), reporter.tick()).await;
        assert!(result.is_err());
    }
}
