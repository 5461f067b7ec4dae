//! Pure timeline transition function
//!
//! All grouping logic for a streamed turn lives here as a pure,
//! synchronous function: `transition(timeline, input) -> (timeline, events)`.
//! No IO, no logging, no locking. The aggregator wraps it and publishes
//! snapshots.

use packetline_protocol::{Packet, PacketObj, Placement};
use serde::{Deserialize, Serialize};

use crate::classify::{self, PacketRole, StepKind};

// ---------------------------------------------------------------------------
// Timeline: pure data snapshot of one assistant turn
// ---------------------------------------------------------------------------

/// Inline failure marker on a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// One renderable unit of agent activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineStep {
    pub kind: StepKind,
    /// Placement of the packet that opened the step
    pub placement: Placement,
    pub packets: Vec<Packet>,
    pub compact: bool,
    pub complete: bool,
    /// Completed without its own terminal packet; may be partial
    pub interrupted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StepError>,
    /// Research agent sub-conversation, one level deep
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_steps: Vec<TimelineStep>,
}

impl TimelineStep {
    fn open(kind: StepKind, packet: Packet, level: Level) -> Self {
        let mut step = TimelineStep {
            kind,
            placement: packet.placement,
            packets: Vec::new(),
            compact: false,
            complete: false,
            interrupted: false,
            error: None,
            sub_steps: Vec::new(),
        };
        append(&mut step, packet, level);
        step
    }

    /// Streamed text of the step (answer, reasoning, plan or report deltas)
    pub fn text(&self) -> String {
        self.packets
            .iter()
            .filter_map(|p| match &p.obj {
                PacketObj::MessageDelta { content }
                | PacketObj::DeepResearchPlanDelta { content }
                | PacketObj::IntermediateReportDelta { content } => Some(content.as_str()),
                PacketObj::ReasoningDelta { reasoning } => Some(reasoning.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Task of a research agent step
    pub fn research_task(&self) -> Option<&str> {
        self.packets.iter().find_map(|p| match &p.obj {
            PacketObj::ResearchAgentStart { research_task } => Some(research_task.as_str()),
            _ => None,
        })
    }
}

/// How the stream ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StreamEnd {
    Done {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stop_reason: Option<String>,
    },
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
    Cancelled,
}

/// Steps of one assistant turn plus its stream-level signals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub turn_id: String,
    pub steps: Vec<TimelineStep>,
    /// Stream-level packets (`stop`, `error`, `top_level_branching`) in arrival order
    pub control: Vec<Packet>,
    pub end: Option<StreamEnd>,
    /// Packets that arrived after the stream had ended
    pub ignored_after_end: usize,
}

impl Timeline {
    pub fn new(turn_id: impl Into<String>) -> Self {
        Self {
            turn_id: turn_id.into(),
            ..Default::default()
        }
    }

    /// Index of the step still accepting packets. Only the last step can be open.
    pub fn open_step(&self) -> Option<usize> {
        open_index(&self.steps)
    }

    pub fn is_finished(&self) -> bool {
        self.end.is_some()
    }

    /// Member packets of all steps, in step order
    pub fn step_packets(&self) -> impl Iterator<Item = &Packet> {
        self.steps.iter().flat_map(|s| s.packets.iter())
    }
}

// ---------------------------------------------------------------------------
// Input / events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Input {
    Packet(Packet),
    Finalize(StreamEnd),
    Reset { turn_id: String },
}

/// What changed, for renderers that update incrementally
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineEvent {
    StepOpened { index: usize, kind: StepKind },
    StepAppended { index: usize },
    StepCompleted { index: usize, interrupted: bool },
    StepErrored { index: usize },
    /// A tool delta or result with no matching open step opened one
    Orphaned { index: usize, type_name: &'static str },
    ControlRecorded { type_name: &'static str },
    Ended(StreamEnd),
    PacketIgnored { type_name: &'static str },
    Reset,
}

// ---------------------------------------------------------------------------
// transition(): the pure core
// ---------------------------------------------------------------------------

/// Pure, synchronous state transition.
///
/// Given the current timeline and an input, returns the new timeline and
/// the list of changes it made.
pub fn transition(mut state: Timeline, input: Input) -> (Timeline, Vec<TimelineEvent>) {
    let mut events = Vec::new();

    match input {
        Input::Reset { turn_id } => {
            state = Timeline::new(turn_id);
            events.push(TimelineEvent::Reset);
        }

        Input::Finalize(end) => {
            if !state.is_finished() {
                finish(&mut state, end, &mut events);
            }
        }

        Input::Packet(packet) if state.is_finished() => {
            state.ignored_after_end += 1;
            events.push(TimelineEvent::PacketIgnored {
                type_name: packet.obj.type_name(),
            });
        }

        Input::Packet(packet) => {
            if classify::role(&packet.obj) == PacketRole::Control {
                let end = match &packet.obj {
                    PacketObj::Stop { stop_reason } => Some(StreamEnd::Done {
                        stop_reason: stop_reason.clone(),
                    }),
                    PacketObj::Error { message, code } => Some(StreamEnd::Error {
                        message: message.clone(),
                        code: code.clone(),
                    }),
                    _ => None,
                };
                events.push(TimelineEvent::ControlRecorded {
                    type_name: packet.obj.type_name(),
                });
                state.control.push(packet);
                if let Some(end) = end {
                    finish(&mut state, end, &mut events);
                }
            } else {
                let type_name = packet.obj.type_name();
                let tool_companion = matches!(
                    classify::role(&packet.obj),
                    PacketRole::Continue(StepKind::ToolCall) | PacketRole::SectionEnd
                );
                match fold(&mut state.steps, packet, Level::Turn) {
                    Fold::Appended { index, completed } => {
                        events.push(TimelineEvent::StepAppended { index });
                        if completed {
                            events.push(TimelineEvent::StepCompleted {
                                index,
                                interrupted: false,
                            });
                        }
                    }
                    Fold::Opened {
                        index,
                        kind,
                        closed_previous,
                        completed,
                    } => {
                        if let Some(previous) = closed_previous {
                            events.push(TimelineEvent::StepCompleted {
                                index: previous,
                                interrupted: true,
                            });
                        }
                        if tool_companion {
                            events.push(TimelineEvent::Orphaned { index, type_name });
                        }
                        events.push(TimelineEvent::StepOpened { index, kind });
                        if completed {
                            events.push(TimelineEvent::StepCompleted {
                                index,
                                interrupted: false,
                            });
                        }
                    }
                }
            }
        }
    }

    (state, events)
}

/// Close the open step, record the end, and mark the failure inline.
fn finish(state: &mut Timeline, end: StreamEnd, events: &mut Vec<TimelineEvent>) {
    let interrupted = !matches!(end, StreamEnd::Done { .. });
    if let Some(index) = state.open_step() {
        close_step(&mut state.steps[index], interrupted);
        events.push(TimelineEvent::StepCompleted { index, interrupted });
    }

    // With no step to carry it, the error lives on `end` alone.
    if let StreamEnd::Error { message, code } = &end {
        if let Some(last) = state.steps.last_mut() {
            last.error = Some(StepError {
                message: message.clone(),
                code: code.clone(),
            });
            events.push(TimelineEvent::StepErrored {
                index: state.steps.len() - 1,
            });
        }
    }

    state.end = Some(end.clone());
    events.push(TimelineEvent::Ended(end));
}

// ---------------------------------------------------------------------------
// Folding packets into steps
// ---------------------------------------------------------------------------

/// Nesting level being folded: the turn itself, or a research agent's
/// sub-conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Turn,
    SubAgent,
}

enum Fold {
    Appended {
        index: usize,
        completed: bool,
    },
    Opened {
        index: usize,
        kind: StepKind,
        closed_previous: Option<usize>,
        completed: bool,
    },
}

fn open_index(steps: &[TimelineStep]) -> Option<usize> {
    match steps.last() {
        Some(step) if !step.complete => Some(steps.len() - 1),
        _ => None,
    }
}

fn unit_key(placement: &Placement, level: Level) -> (u32, u32) {
    match level {
        Level::Turn => placement.unit_key(),
        Level::SubAgent => (placement.sub_turn_index.unwrap_or_default(), 0),
    }
}

fn fold(steps: &mut Vec<TimelineStep>, packet: Packet, level: Level) -> Fold {
    if let Some(index) = open_index(steps) {
        if continues(&steps[index], &packet, level) {
            let completed = append(&mut steps[index], packet, level);
            return Fold::Appended { index, completed };
        }
    }

    // A new unit starts: a still-open step will never get its terminal.
    let closed_previous = open_index(steps).map(|index| {
        close_step(&mut steps[index], true);
        index
    });

    let kind = kind_for(&packet.obj, level);
    let step = TimelineStep::open(kind, packet, level);
    let completed = step.complete;
    steps.push(step);

    Fold::Opened {
        index: steps.len() - 1,
        kind,
        closed_previous,
        completed,
    }
}

fn kind_for(obj: &PacketObj, level: Level) -> StepKind {
    match classify::role(obj) {
        // Nesting stops at one level.
        PacketRole::Start(StepKind::ResearchAgent) if level == Level::SubAgent => {
            StepKind::ToolCall
        }
        PacketRole::Start(kind) | PacketRole::Continue(kind) => kind,
        PacketRole::SectionEnd | PacketRole::Control => StepKind::ToolCall,
    }
}

fn continues(step: &TimelineStep, packet: &Packet, level: Level) -> bool {
    if step.complete || unit_key(&step.placement, level) != unit_key(&packet.placement, level) {
        return false;
    }

    match classify::role(&packet.obj) {
        PacketRole::Control => false,
        PacketRole::SectionEnd => true,
        // Another agent at the turn level is a new unit; inside the
        // sub-conversation it is just one more sub-step.
        _ if step.kind == StepKind::ResearchAgent => {
            !matches!(packet.obj, PacketObj::ResearchAgentStart { .. })
                || packet.placement.sub_turn_index.is_some()
        }
        PacketRole::Start(_) => false,
        PacketRole::Continue(kind) => kind == step.kind,
    }
}

fn is_terminal(kind: StepKind, packet: &Packet) -> bool {
    match packet.obj {
        PacketObj::SectionEnd => true,
        PacketObj::ReasoningDone => kind == StepKind::Reasoning,
        _ => false,
    }
}

/// Whether a packet appended to an open research agent step belongs to the
/// agent's sub-conversation rather than to the agent itself.
fn in_sub_conversation(agent: &TimelineStep, packet: &Packet) -> bool {
    if packet.placement.sub_turn_index.is_some() {
        return true;
    }
    // The agent's own tool calls run at its placement without a sub-turn.
    match classify::role(&packet.obj) {
        PacketRole::Start(StepKind::ToolCall) => true,
        PacketRole::Continue(StepKind::ToolCall) | PacketRole::SectionEnd => {
            open_index(&agent.sub_steps).is_some_and(|index| {
                let sub = &agent.sub_steps[index];
                sub.kind == StepKind::ToolCall && sub.placement.sub_turn_index.is_none()
            })
        }
        _ => false,
    }
}

/// Append to an open step. Returns true if the packet completed it.
fn append(step: &mut TimelineStep, packet: Packet, level: Level) -> bool {
    let nested = level == Level::Turn
        && step.kind == StepKind::ResearchAgent
        && !step.packets.is_empty()
        && in_sub_conversation(step, &packet);
    // Sub-conversation packets only ever end a sub-step.
    let terminal = !nested && is_terminal(step.kind, &packet);

    if nested {
        fold(&mut step.sub_steps, packet.clone(), Level::SubAgent);
    }

    step.packets.push(packet);
    step.compact = !classify::is_research_agent_group(&step.packets)
        && classify::supports_compact(&step.packets);

    if terminal {
        step.complete = true;
        if let Some(index) = open_index(&step.sub_steps) {
            close_step(&mut step.sub_steps[index], true);
        }
    }
    terminal
}

fn close_step(step: &mut TimelineStep, interrupted: bool) {
    if step.complete {
        return;
    }
    step.complete = true;
    step.interrupted = interrupted;
    if let Some(index) = open_index(&step.sub_steps) {
        close_step(&mut step.sub_steps[index], interrupted);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
