//! Stateful wrapper around the pure transition function.
//!
//! One aggregator is scoped to one assistant turn. Every call returns an
//! `Arc<Timeline>` snapshot; snapshots already handed out are never
//! mutated (copy-on-write when a reader still holds one).

use std::sync::Arc;

use packetline_protocol::{new_id, Packet};
use tracing::{debug, warn};

use crate::transition::{transition, Input, StreamEnd, Timeline, TimelineEvent};

pub struct TimelineAggregator {
    state: Arc<Timeline>,
}

impl Default for TimelineAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineAggregator {
    /// Aggregator for a new turn with a generated turn id
    pub fn new() -> Self {
        Self::with_turn_id(new_id())
    }

    pub fn with_turn_id(turn_id: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Timeline::new(turn_id)),
        }
    }

    pub fn turn_id(&self) -> &str {
        &self.state.turn_id
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<Timeline> {
        Arc::clone(&self.state)
    }

    /// Fold one packet into the timeline
    pub fn ingest(&mut self, packet: Packet) -> Arc<Timeline> {
        self.apply(Input::Packet(packet))
    }

    /// The stream ended (done, cancelled or failed). Idempotent.
    pub fn finalize(&mut self, end: StreamEnd) -> Arc<Timeline> {
        self.apply(Input::Finalize(end))
    }

    /// Drop all steps and start a new turn
    pub fn reset(&mut self) -> Arc<Timeline> {
        self.apply(Input::Reset { turn_id: new_id() })
    }

    fn apply(&mut self, input: Input) -> Arc<Timeline> {
        let current = Arc::unwrap_or_clone(std::mem::take(&mut self.state));
        let (next, events) = transition(current, input);
        self.state = Arc::new(next);

        for event in &events {
            self.log_event(event);
        }

        self.snapshot()
    }

    fn log_event(&self, event: &TimelineEvent) {
        let turn_id = self.turn_id();
        match event {
            TimelineEvent::StepOpened { index, kind } => debug!(
                component = "timeline",
                event = "timeline.step_opened",
                turn_id = %turn_id,
                index = *index,
                kind = ?kind,
            ),
            TimelineEvent::StepAppended { index } => debug!(
                component = "timeline",
                event = "timeline.step_appended",
                turn_id = %turn_id,
                index = *index,
            ),
            TimelineEvent::StepCompleted {
                index,
                interrupted: false,
            } => debug!(
                component = "timeline",
                event = "timeline.step_completed",
                turn_id = %turn_id,
                index = *index,
            ),
            TimelineEvent::StepCompleted {
                index,
                interrupted: true,
            } => warn!(
                component = "timeline",
                event = "timeline.step_force_closed",
                turn_id = %turn_id,
                index = *index,
                "Step closed without its terminal packet"
            ),
            TimelineEvent::StepErrored { index } => warn!(
                component = "timeline",
                event = "timeline.step_errored",
                turn_id = %turn_id,
                index = *index,
            ),
            TimelineEvent::Orphaned { index, type_name } => warn!(
                component = "timeline",
                event = "timeline.orphan_packet",
                turn_id = %turn_id,
                index = *index,
                packet_type = %type_name,
                "Tool packet without an open tool step, opened a best-effort step"
            ),
            TimelineEvent::ControlRecorded { type_name } => debug!(
                component = "timeline",
                event = "timeline.control",
                turn_id = %turn_id,
                packet_type = %type_name,
            ),
            TimelineEvent::Ended(end) => debug!(
                component = "timeline",
                event = "timeline.ended",
                turn_id = %turn_id,
                end = ?end,
            ),
            TimelineEvent::PacketIgnored { type_name } => warn!(
                component = "timeline",
                event = "timeline.packet_after_end",
                turn_id = %turn_id,
                packet_type = %type_name,
                "Packet arrived after the stream ended, dropped"
            ),
            TimelineEvent::Reset => debug!(
                component = "timeline",
                event = "timeline.reset",
                turn_id = %turn_id,
            ),
        }
    }
}
