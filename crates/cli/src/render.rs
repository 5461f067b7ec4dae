//! Terminal rendering of a replayed timeline.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use console::style;
use packetline_protocol::PacketObj;
use packetline_timeline::{StepKind, StreamEnd, Timeline, TimelineStep};

use crate::config::OutputFormat;

const SUMMARY_WIDTH: usize = 60;

pub fn print_timeline(timeline: &Timeline, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(timeline)?),
        OutputFormat::Table => {
            println!("{}", timeline_table(timeline));
            println!("{}", footer(timeline));
        }
    }
    Ok(())
}

pub fn timeline_table(timeline: &Timeline) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Kind", "Summary", "Packets", "Compact", "Status"]);

    for (i, step) in timeline.steps.iter().enumerate() {
        let number = (i + 1).to_string();
        table.add_row(step_row(&number, step));
        for (j, sub) in step.sub_steps.iter().enumerate() {
            table.add_row(step_row(&format!("{}.{}", number, j + 1), sub));
        }
    }
    table
}

fn step_row(number: &str, step: &TimelineStep) -> Vec<String> {
    vec![
        number.to_string(),
        kind_label(step.kind).to_string(),
        summary(step),
        step.packets.len().to_string(),
        if step.compact { "yes" } else { "" }.to_string(),
        status(step),
    ]
}

fn kind_label(kind: StepKind) -> &'static str {
    match kind {
        StepKind::ToolCall => "tool",
        StepKind::ResearchAgent => "agent",
        StepKind::Text => "text",
        StepKind::Reasoning => "reasoning",
    }
}

/// One-line description of what the step did
pub fn summary(step: &TimelineStep) -> String {
    let Some(first) = step.packets.first() else {
        return String::new();
    };
    let line = match &first.obj {
        PacketObj::SearchToolStart {
            is_internet_search: true,
        } => "web search".to_string(),
        PacketObj::SearchToolStart { .. } => "internal search".to_string(),
        PacketObj::OpenUrlStart => "open url".to_string(),
        PacketObj::ImageGenerationStart => "image generation".to_string(),
        PacketObj::PythonToolStart { code } => format!("python: {}", code),
        PacketObj::CustomToolStart { tool_name } => tool_name.clone(),
        PacketObj::ResearchAgentStart { research_task } => research_task.clone(),
        _ => step.text(),
    };
    truncate(&line.replace('\n', " "), SUMMARY_WIDTH)
}

fn status(step: &TimelineStep) -> String {
    if let Some(error) = &step.error {
        return format!("error: {}", error.message);
    }
    match (step.complete, step.interrupted) {
        (false, _) => "open".to_string(),
        (true, true) => "interrupted".to_string(),
        (true, false) => "done".to_string(),
    }
}

pub fn footer(timeline: &Timeline) -> String {
    let end = match &timeline.end {
        None => style("stream still open".to_string()).yellow(),
        Some(StreamEnd::Done { stop_reason }) => style(format!(
            "done ({})",
            stop_reason.as_deref().unwrap_or("finished")
        ))
        .green(),
        Some(StreamEnd::Error { message, code }) => match code {
            Some(code) => style(format!("error [{}]: {}", code, message)).red(),
            None => style(format!("error: {}", message)).red(),
        },
        Some(StreamEnd::Cancelled) => style("cancelled".to_string()).yellow(),
    };

    let mut line = format!(
        "turn {} | {} steps | {}",
        style(&timeline.turn_id).dim(),
        timeline.steps.len(),
        end
    );
    if timeline.ignored_after_end > 0 {
        line.push_str(&format!(
            " | {} packets after end ignored",
            timeline.ignored_after_end
        ));
    }
    line
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
