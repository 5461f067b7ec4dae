//! `packetline branches`: inspect alternate responses around one message.

use std::path::Path;

use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use console::style;
use packetline_protocol::{MessageDetail, MessageId};
use packetline_timeline::{MessageTree, TreeError};
use serde::Serialize;
use tracing::debug;

use crate::config::OutputFormat;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchReport {
    pub node_id: MessageId,
    pub siblings: Vec<MessageId>,
    pub current_index: Option<usize>,
    pub previous: Option<MessageId>,
    pub next: Option<MessageId>,
    pub switcher_visible: bool,
    pub active_path: Vec<MessageId>,
}

pub fn run(file: &Path, node: MessageId, select: bool, format: OutputFormat) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .map_err(|err| anyhow::anyhow!("failed to read {}: {}", file.display(), err))?;
    let messages: Vec<MessageDetail> = serde_json::from_str(&raw)
        .map_err(|err| anyhow::anyhow!("invalid message list in {}: {}", file.display(), err))?;

    let mut tree = MessageTree::from_messages(messages)?;
    let report = build_report(&mut tree, node, select)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_report(&report),
    }
    Ok(())
}

/// Navigation state for `node`, after making it active when `select` is set.
pub fn build_report(
    tree: &mut MessageTree,
    node: MessageId,
    select: bool,
) -> Result<BranchReport, TreeError> {
    if tree.get(node).is_none() {
        return Err(TreeError::UnknownMessage(node));
    }
    let active_path = if select {
        tree.select(node)?
    } else {
        tree.active_path()
    };

    let nav = tree.navigator(node);
    debug!(
        component = "branches",
        event = "branches.report",
        node_id = node,
        siblings = nav.len(),
        selected = select,
    );

    Ok(BranchReport {
        node_id: nav.node_id(),
        siblings: tree.siblings(node).map(<[_]>::to_vec).unwrap_or_default(),
        current_index: nav.current_index(),
        previous: nav.previous(),
        next: nav.next(),
        switcher_visible: nav.switcher_visible(true),
        active_path,
    })
}

fn print_report(report: &BranchReport) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Sibling", "Position", ""]);

    for (i, id) in report.siblings.iter().enumerate() {
        let marker = if Some(i) == report.current_index {
            style("current").green().to_string()
        } else if Some(*id) == report.previous {
            "previous".to_string()
        } else if Some(*id) == report.next {
            "next".to_string()
        } else {
            String::new()
        };
        table.add_row(vec![
            id.to_string(),
            format!("{}/{}", i + 1, report.siblings.len()),
            marker,
        ]);
    }

    println!("{table}");
    if !report.switcher_visible {
        println!("{}", style("single response, no switcher").dim());
    }
    let path: Vec<String> = report.active_path.iter().map(|id| id.to_string()).collect();
    println!("active path: {}", path.join(" -> "));
}
