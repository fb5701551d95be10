//! Elapsed-time ticker for a run

use crate::board::{RunBoard, RunEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Background task that records whole elapsed seconds on a [`RunBoard`]
///
/// Stops on [`Ticker::stop`] or when dropped.
pub struct Ticker {
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Start ticking every `interval`, measuring from `started`
    pub fn start(board: Arc<RunBoard>, started: Instant, interval: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(started + interval, interval);
            loop {
                ticks.tick().await;
                let elapsed_seconds = started.elapsed().as_secs();
                board.set_elapsed(elapsed_seconds);
                board.emit(RunEvent::Tick { elapsed_seconds });
            }
        });

        Self {
            handle: Some(handle),
        }
    }

    /// Stop the ticker; later calls do nothing
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether the ticker is still running
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_core::Catalog;
    use tokio::sync::broadcast;

    fn board() -> Arc<RunBoard> {
        let (tx, _) = broadcast::channel(16);
        Arc::new(RunBoard::new(&Catalog::standard(), tx))
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_record_elapsed_seconds() {
        let board = board();
        let ticker = Ticker::start(Arc::clone(&board), Instant::now(), Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(board.elapsed_seconds(), 3);
        assert!(ticker.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_freezes_the_clock() {
        let board = board();
        let mut ticker = Ticker::start(Arc::clone(&board), Instant::now(), Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        ticker.stop();
        ticker.stop();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(board.elapsed_seconds(), 2);
        assert!(!ticker.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_ticking() {
        let board = board();
        {
            let _ticker = Ticker::start(Arc::clone(&board), Instant::now(), Duration::from_secs(1));
            tokio::time::sleep(Duration::from_millis(1500)).await;
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(board.elapsed_seconds(), 1);
    }
}
