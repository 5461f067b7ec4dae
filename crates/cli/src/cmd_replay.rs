//! `packetline replay`: fold a JSONL packet stream into a timeline.
//!
//! Lines are decoded one at a time and handed to the turn actor. Malformed
//! lines are logged and skipped. When input runs out (or Ctrl-C arrives)
//! the stream is finalized as cancelled, and a failed read finalizes it
//! with an error so the partial timeline still renders. A stream that
//! already ended with `stop` or `error` is unaffected.

use std::path::PathBuf;
use std::sync::Arc;

use packetline_protocol::Packet;
use packetline_timeline::{StreamEnd, Timeline, TimelineAggregator};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::config::OutputFormat;
use crate::render;
use crate::turn_actor::{TurnActorHandle, TurnCommand};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    /// Lines read, blank and malformed ones included
    pub lines: usize,
    pub packets: usize,
    pub malformed: usize,
    /// Reads that failed and cut the stream short
    pub read_errors: usize,
}

pub async fn run(input: Option<PathBuf>, format: OutputFormat) -> anyhow::Result<()> {
    let actor = TurnActorHandle::spawn(TimelineAggregator::new());

    let (stats, timeline) = match input.as_deref() {
        Some(path) if path.as_os_str() != "-" => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|err| anyhow::anyhow!("failed to open {}: {}", path.display(), err))?;
            replay(BufReader::new(file), &actor).await?
        }
        _ => replay(BufReader::new(tokio::io::stdin()), &actor).await?,
    };

    info!(
        component = "replay",
        event = "replay.finished",
        turn_id = %timeline.turn_id,
        lines = stats.lines,
        packets = stats.packets,
        malformed = stats.malformed,
        read_errors = stats.read_errors,
        steps = timeline.steps.len(),
        "Replay finished"
    );

    render::print_timeline(&timeline, format)
}

/// Feed `reader` to `actor` until EOF, a read failure or Ctrl-C, then
/// finalize. A failed read ends the stream with an error, anything else
/// as cancelled; a stream that already ended keeps its own end.
pub async fn replay<R: AsyncBufRead + Unpin>(
    reader: R,
    actor: &TurnActorHandle,
) -> anyhow::Result<(ReplayStats, Arc<Timeline>)> {
    let mut stats = ReplayStats::default();

    let fed = tokio::select! {
        fed = feed_lines(reader, actor, &mut stats) => fed,
        _ = tokio::signal::ctrl_c() => {
            warn!(
                component = "replay",
                event = "replay.interrupted",
                turn_id = %actor.snapshot().turn_id,
                steps_so_far = actor.snapshot().steps.len(),
                "Interrupted, finalizing partial timeline"
            );
            Ok(())
        }
    };

    let end = match fed {
        Ok(()) => StreamEnd::Cancelled,
        Err(err) => {
            stats.read_errors += 1;
            warn!(
                component = "replay",
                event = "replay.read_failed",
                after_line = stats.lines,
                error = %err,
                "Input read failed, ending stream with an error"
            );
            StreamEnd::Error {
                message: format!("read failed after line {}: {}", stats.lines, err),
                code: None,
            }
        }
    };

    actor.send(TurnCommand::Finalize(end)).await;
    let timeline = actor.timeline().await?;
    Ok((stats, timeline))
}

/// Decode every line of `reader` and send the packets to `actor`.
///
/// `stats` is updated as lines arrive so the counts survive an interrupt.
pub async fn feed_lines<R: AsyncBufRead + Unpin>(
    reader: R,
    actor: &TurnActorHandle,
    stats: &mut ReplayStats,
) -> std::io::Result<()> {
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        stats.lines += 1;
        match Packet::decode_line(stats.lines, &line) {
            Ok(Some(packet)) => {
                stats.packets += 1;
                actor.send(TurnCommand::Ingest(packet)).await;
            }
            Ok(None) => {}
            Err(err) => {
                stats.malformed += 1;
                warn!(
                    component = "replay",
                    event = "replay.malformed_line",
                    line = stats.lines,
                    error = %err,
                    "Skipping malformed packet"
                );
            }
        }
    }

    Ok(())
}
