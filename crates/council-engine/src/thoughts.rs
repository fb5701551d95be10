//! Cosmetic progress cues for a running agent

use crate::board::RunBoard;
use council_core::AgentRole;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Emits an agent's cue sequence, one cue per interval, until the agent
/// settles, the cues run out, or the stream is stopped or dropped
///
/// Purely decorative: nothing waits on it.
pub struct ThoughtStream {
    handle: JoinHandle<()>,
}

impl ThoughtStream {
    /// Start emitting `cues` for `role`; the first cue is emitted immediately
    pub fn start(
        board: Arc<RunBoard>,
        role: AgentRole,
        cues: &'static [&'static str],
        interval: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(interval);
            for cue in cues {
                ticks.tick().await;
                match board.push_thought(role, cue) {
                    Ok(true) => {}
                    Ok(false) | Err(_) => break,
                }
            }
        });

        Self { handle }
    }

    /// Stop emitting
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for ThoughtStream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
