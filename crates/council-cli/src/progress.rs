//! Live progress output for a run in flight

use crate::render;
use council_engine::RunEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Renders run events to a line sink until the run returns
pub struct Progress {
    done: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Progress {
    pub fn start<F>(mut events: broadcast::Receiver<RunEvent>, mut sink: F) -> Self
    where
        F: FnMut(String) + Send + 'static,
    {
        let (done, mut finished) = oneshot::channel();
        let handle = tokio::spawn(async move {
            loop {
                // Buffered events win over the finish signal
                tokio::select! {
                    biased;
                    received = events.recv() => match received {
                        Ok(event) => {
                            if let Some(line) = render::event_line(&event) {
                                sink(line);
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            sink(format!("   ({skipped} events skipped)"));
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = &mut finished => break,
                }
            }
        });
        Self { done, handle }
    }

    /// Render whatever is still buffered, then stop
    pub async fn finish(self) -> anyhow::Result<()> {
        let _ = self.done.send(());
        self.handle.await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_core::{AgentRole, AgentStatus, DebateCheckpoint};
    use std::sync::{Arc, Mutex};

    fn collector() -> (Arc<Mutex<Vec<String>>>, impl FnMut(String) + Send + 'static) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink_lines = Arc::clone(&lines);
        (lines, move |line| sink_lines.lock().unwrap().push(line))
    }

    #[tokio::test]
    async fn test_buffered_events_are_rendered_before_finishing() {
        let (tx, rx) = broadcast::channel(16);
        let (lines, sink) = collector();
        let progress = Progress::start(rx, sink);

        tx.send(RunEvent::AgentStatusChanged {
            role: AgentRole::PortfolioManager,
            status: AgentStatus::Success,
        })
        .unwrap();
        tx.send(RunEvent::DebateFinished {
            checkpoint: DebateCheckpoint::RiskAppetite,
            score: 48,
        })
        .unwrap();
        tx.send(RunEvent::Tick { elapsed_seconds: 9 }).unwrap();

        progress.finish().await.unwrap();

        assert_eq!(
            *lines.lock().unwrap(),
            vec![
                "   Portfolio Manager: success".to_string(),
                "   debate_b concluded at 48/100".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_finishes_with_nothing_buffered() {
        let (_tx, rx) = broadcast::channel::<RunEvent>(4);
        let (lines, sink) = collector();

        Progress::start(rx, sink).finish().await.unwrap();

        assert!(lines.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reports_skipped_events() {
        let (tx, rx) = broadcast::channel(1);
        let (lines, sink) = collector();
        let progress = Progress::start(rx, sink);

        for elapsed_seconds in 0..3 {
            tx.send(RunEvent::Tick { elapsed_seconds }).unwrap();
        }
        progress.finish().await.unwrap();

        assert_eq!(*lines.lock().unwrap(), vec!["   (2 events skipped)".to_string()]);
    }
}
