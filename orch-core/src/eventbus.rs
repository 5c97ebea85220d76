//! Delivery policy for a single run's event stream.
//!
//! One `RunEventBus` backs one run's bounded channel. Status and terminal
//! events must reach the subscriber even if the channel is momentarily full;
//! chunk events are best-effort and may be dropped under backpressure rather
//! than stall the agent producing them.

use orch_protocol::Event;
use tokio::sync::mpsc;

pub struct RunEventBus {
    tx: mpsc::Sender<Event>,
}

impl RunEventBus {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    pub fn from_sender(tx: mpsc::Sender<Event>) -> Self {
        Self { tx }
    }

    /// Pushes an event onto the run's stream. Never blocks the caller for
    /// more than a channel probe: a full channel drops a `Chunk` outright and
    /// hands everything else off to a background send so the emitting task
    /// keeps moving.
    pub fn push(&self, event: Event) {
        if matches!(event, Event::Chunk { .. }) {
            let _ = self.tx.try_send(event);
            return;
        }
        if self.tx.try_send(event.clone()).is_err() {
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(event).await;
            });
        }
    }

    pub fn sender(&self) -> mpsc::Sender<Event> {
        self.tx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orch_protocol::event::AgentState;

    #[tokio::test]
    async fn status_survives_a_full_channel_chunks_may_not() {
        let (bus, mut rx) = RunEventBus::new(1);
        bus.push(Event::Chunk {
            agent: "a".into(),
            data: "first".into(),
            timestamp: "t".into(),
        });
        // Channel now holds one chunk; this second chunk has nowhere to go.
        bus.push(Event::Chunk {
            agent: "a".into(),
            data: "dropped".into(),
            timestamp: "t".into(),
        });
        bus.push(Event::Status {
            agent: "a".into(),
            state: AgentState::Executing,
            timestamp: "t".into(),
        });

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, Event::Chunk { ref data, .. } if data == "first"));
        let second = rx.recv().await.unwrap();
        assert!(matches!(second, Event::Status { .. }));
    }
}
