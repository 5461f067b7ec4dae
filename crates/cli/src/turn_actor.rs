//! Turn actor: owns a TimelineAggregator and processes commands sequentially.
//!
//! The actor runs as a tokio task. Callers talk to it through
//! `TurnActorHandle`, which sends `TurnCommand` messages over an mpsc
//! channel. Lock-free reads of the latest timeline go through `ArcSwap`.

use std::sync::Arc;

use arc_swap::ArcSwap;
use packetline_protocol::Packet;
use packetline_timeline::{StreamEnd, Timeline, TimelineAggregator};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

/// A command for the turn actor
pub enum TurnCommand {
    /// Fold the next packet of the stream
    Ingest(Packet),
    /// The stream is over
    Finalize(StreamEnd),
    /// A new turn begins
    Reset,
    /// Reply with the timeline once every earlier command has been applied
    GetTimeline { reply: oneshot::Sender<Arc<Timeline>> },
}

/// Handle to a running turn actor (cheap to Clone).
#[derive(Clone)]
pub struct TurnActorHandle {
    command_tx: mpsc::Sender<TurnCommand>,
    snapshot: Arc<ArcSwap<Timeline>>,
}

impl TurnActorHandle {
    /// Spawn an actor around `aggregator`, returning a handle.
    pub fn spawn(aggregator: TimelineAggregator) -> TurnActorHandle {
        let (command_tx, command_rx) = mpsc::channel(256);
        let snapshot = Arc::new(ArcSwap::new(aggregator.snapshot()));

        tokio::spawn(turn_actor_loop(aggregator, command_rx, Arc::clone(&snapshot)));

        TurnActorHandle {
            command_tx,
            snapshot,
        }
    }

    /// Send a command to the actor (fire-and-forget).
    pub async fn send(&self, cmd: TurnCommand) {
        if self.command_tx.send(cmd).await.is_err() {
            warn!(
                component = "turn_actor",
                turn_id = %self.snapshot().turn_id,
                "Actor channel closed, command dropped"
            );
        }
    }

    /// Timeline after everything sent so far has been processed.
    pub async fn timeline(&self) -> anyhow::Result<Arc<Timeline>> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(TurnCommand::GetTimeline { reply })
            .await
            .map_err(|_| anyhow::anyhow!("turn actor {} stopped", self.snapshot().turn_id))?;
        Ok(rx.await?)
    }

    /// Lock-free snapshot read.
    pub fn snapshot(&self) -> Arc<Timeline> {
        self.snapshot.load_full()
    }
}

async fn turn_actor_loop(
    mut aggregator: TimelineAggregator,
    mut command_rx: mpsc::Receiver<TurnCommand>,
    snapshot: Arc<ArcSwap<Timeline>>,
) {
    while let Some(cmd) = command_rx.recv().await {
        let timeline = match cmd {
            TurnCommand::Ingest(packet) => aggregator.ingest(packet),
            TurnCommand::Finalize(end) => aggregator.finalize(end),
            TurnCommand::Reset => aggregator.reset(),
            TurnCommand::GetTimeline { reply } => {
                let _ = reply.send(aggregator.snapshot());
                continue;
            }
        };
        snapshot.store(timeline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packetline_protocol::{PacketObj, Placement};

    fn delta(content: &str) -> Packet {
        Packet::new(
            Placement::new(0, 0),
            PacketObj::MessageDelta {
                content: content.to_string(),
            },
        )
    }

    #[tokio::test]
    async fn actor_applies_packets_in_order() {
        let actor = TurnActorHandle::spawn(TimelineAggregator::with_turn_id("turn-a"));

        for content in ["a", "b", "c"] {
            actor.send(TurnCommand::Ingest(delta(content))).await;
        }
        actor
            .send(TurnCommand::Finalize(StreamEnd::Cancelled))
            .await;

        let timeline = actor.timeline().await.expect("actor alive");
        assert_eq!(timeline.turn_id, "turn-a");
        assert_eq!(timeline.steps.len(), 1);
        assert_eq!(timeline.steps[0].text(), "abc");
        assert!(timeline.steps[0].interrupted);
        assert_eq!(timeline.end, Some(StreamEnd::Cancelled));
    }

    #[tokio::test]
    async fn snapshot_tracks_latest_timeline() {
        let actor = TurnActorHandle::spawn(TimelineAggregator::new());
        assert!(actor.snapshot().steps.is_empty());

        actor.send(TurnCommand::Ingest(delta("hi"))).await;
        // GetTimeline is queued behind the ingest, so the store has happened
        actor.timeline().await.expect("actor alive");

        assert_eq!(actor.snapshot().steps.len(), 1);
    }

    #[tokio::test]
    async fn reset_clears_timeline() {
        let actor = TurnActorHandle::spawn(TimelineAggregator::with_turn_id("first"));
        actor.send(TurnCommand::Ingest(delta("old"))).await;
        actor.send(TurnCommand::Reset).await;

        let timeline = actor.timeline().await.expect("actor alive");
        assert!(timeline.steps.is_empty());
        assert_ne!(timeline.turn_id, "first");
        // logs after the reset name the new turn
        assert_eq!(actor.snapshot().turn_id, timeline.turn_id);
    }
}
