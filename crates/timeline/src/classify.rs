//! Stateless packet classification
//!
//! Two views over `PacketObj`: the role a packet plays when grouping the
//! stream into steps, and whether it can be shown in condensed form.
//! Both are exhaustive matches so a new packet type has to be placed
//! explicitly.

use packetline_protocol::{Packet, PacketObj};
use serde::{Deserialize, Serialize};

/// Kind of a timeline step, fixed when the step is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    ToolCall,
    ResearchAgent,
    Text,
    Reasoning,
}

/// What a packet does to the step structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketRole {
    /// Turn-level signal, never part of a step
    Control,
    /// Opens a new unit of the given kind
    Start(StepKind),
    /// Continues an open unit of the given kind
    Continue(StepKind),
    /// Result/terminal signal for whatever unit is open at this placement
    SectionEnd,
}

/// Condensed-rendering capability of a single packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompactRole {
    EligibleStart,
    Companion,
    Ineligible,
}

pub fn role(obj: &PacketObj) -> PacketRole {
    use PacketRole::*;
    use StepKind::*;

    match obj {
        PacketObj::Stop { .. } | PacketObj::Error { .. } | PacketObj::TopLevelBranching { .. } => {
            Control
        }
        PacketObj::SectionEnd => SectionEnd,

        PacketObj::MessageStart { .. } | PacketObj::IntermediateReportStart => Start(Text),
        PacketObj::MessageDelta { .. }
        | PacketObj::CitationInfo { .. }
        | PacketObj::IntermediateReportDelta { .. }
        | PacketObj::IntermediateReportCitedDocs { .. } => Continue(Text),

        PacketObj::SearchToolStart { .. }
        | PacketObj::OpenUrlStart
        | PacketObj::ImageGenerationStart
        | PacketObj::PythonToolStart { .. }
        | PacketObj::CustomToolStart { .. } => Start(ToolCall),
        PacketObj::SearchToolQueriesDelta { .. }
        | PacketObj::SearchToolDocumentsDelta { .. }
        | PacketObj::OpenUrlUrls { .. }
        | PacketObj::OpenUrlDocuments { .. }
        | PacketObj::ImageGenerationHeartbeat
        | PacketObj::ImageGenerationFinal { .. }
        | PacketObj::PythonToolDelta { .. }
        | PacketObj::CustomToolDelta { .. } => Continue(ToolCall),

        PacketObj::ReasoningStart | PacketObj::DeepResearchPlanStart => Start(Reasoning),
        PacketObj::ReasoningDelta { .. }
        | PacketObj::ReasoningDone
        | PacketObj::DeepResearchPlanDelta { .. } => Continue(Reasoning),

        PacketObj::ResearchAgentStart { .. } => Start(ResearchAgent),
    }
}

fn compact_role(obj: &PacketObj) -> CompactRole {
    use CompactRole::*;

    match obj {
        PacketObj::SearchToolStart { .. }
        | PacketObj::OpenUrlStart
        | PacketObj::PythonToolStart { .. }
        | PacketObj::CustomToolStart { .. } => EligibleStart,

        PacketObj::SearchToolQueriesDelta { .. }
        | PacketObj::SearchToolDocumentsDelta { .. }
        | PacketObj::OpenUrlUrls { .. }
        | PacketObj::OpenUrlDocuments { .. }
        | PacketObj::PythonToolDelta { .. }
        | PacketObj::CustomToolDelta { .. }
        | PacketObj::SectionEnd => Companion,

        PacketObj::Stop { .. }
        | PacketObj::TopLevelBranching { .. }
        | PacketObj::Error { .. }
        | PacketObj::MessageStart { .. }
        | PacketObj::MessageDelta { .. }
        | PacketObj::CitationInfo { .. }
        | PacketObj::ImageGenerationStart
        | PacketObj::ImageGenerationHeartbeat
        | PacketObj::ImageGenerationFinal { .. }
        | PacketObj::ReasoningStart
        | PacketObj::ReasoningDelta { .. }
        | PacketObj::ReasoningDone
        | PacketObj::DeepResearchPlanStart
        | PacketObj::DeepResearchPlanDelta { .. }
        | PacketObj::ResearchAgentStart { .. }
        | PacketObj::IntermediateReportStart
        | PacketObj::IntermediateReportDelta { .. }
        | PacketObj::IntermediateReportCitedDocs { .. } => Ineligible,
    }
}

/// True if the group contains a research agent start.
///
/// Such a group renders its own progress indicator and is kept out of
/// compact grouping.
pub fn is_research_agent_group(packets: &[Packet]) -> bool {
    packets
        .iter()
        .any(|p| matches!(p.obj, PacketObj::ResearchAgentStart { .. }))
}

/// True if the whole group can be rendered condensed: at least one
/// search/fetch/python/custom tool start, and nothing outside those tools'
/// own packets.
pub fn supports_compact(packets: &[Packet]) -> bool {
    let mut has_start = false;
    for packet in packets {
        match compact_role(&packet.obj) {
            CompactRole::EligibleStart => has_start = true,
            CompactRole::Companion => {}
            CompactRole::Ineligible => return false,
        }
    }
    has_start
}

#[cfg(test)]
mod tests {
    use super::*;
    use packetline_protocol::Placement;

    fn packet(obj: PacketObj) -> Packet {
        Packet::new(Placement::new(1, 0), obj)
    }

    fn search_start() -> Packet {
        packet(PacketObj::SearchToolStart {
            is_internet_search: false,
        })
    }

    #[test]
    fn each_eligible_start_supports_compact() {
        let starts = [
            search_start(),
            packet(PacketObj::OpenUrlStart),
            packet(PacketObj::PythonToolStart {
                code: "print(1)".to_string(),
            }),
            packet(PacketObj::CustomToolStart {
                tool_name: "weather".to_string(),
            }),
        ];
        for start in starts {
            assert!(
                supports_compact(std::slice::from_ref(&start)),
                "{} should be compact",
                start.obj.type_name()
            );
        }
    }

    #[test]
    fn tool_results_keep_group_compact() {
        let group = vec![
            search_start(),
            packet(PacketObj::SearchToolQueriesDelta {
                queries: vec!["rust".to_string()],
            }),
            packet(PacketObj::SearchToolDocumentsDelta { documents: vec![] }),
            packet(PacketObj::SectionEnd),
        ];
        assert!(supports_compact(&group));
    }

    #[test]
    fn group_without_eligible_start_is_not_compact() {
        assert!(!supports_compact(&[]));
        assert!(!supports_compact(&[packet(PacketObj::SectionEnd)]));
        assert!(!supports_compact(&[packet(PacketObj::PythonToolDelta {
            stdout: "1".to_string(),
            stderr: String::new(),
            file_ids: vec![],
        })]));
    }

    #[test]
    fn any_ineligible_type_disables_compact() {
        let group = vec![search_start(), packet(PacketObj::ImageGenerationHeartbeat)];
        assert!(!supports_compact(&group));

        let group = vec![
            search_start(),
            packet(PacketObj::MessageDelta {
                content: "hi".to_string(),
            }),
        ];
        assert!(!supports_compact(&group));
    }

    #[test]
    fn image_generation_is_never_compact() {
        let group = vec![
            packet(PacketObj::ImageGenerationStart),
            packet(PacketObj::ImageGenerationFinal { images: vec![] }),
        ];
        assert!(!supports_compact(&group));
    }

    #[test]
    fn research_agent_detected_regardless_of_other_members() {
        let agent = packet(PacketObj::ResearchAgentStart {
            research_task: "compare vendors".to_string(),
        });
        assert!(is_research_agent_group(std::slice::from_ref(&agent)));
        assert!(is_research_agent_group(&[
            search_start(),
            agent.clone(),
            packet(PacketObj::SectionEnd)
        ]));
        assert!(!is_research_agent_group(&[search_start()]));
        assert!(!is_research_agent_group(&[]));

        assert!(!supports_compact(&[agent, search_start()]));
    }

    #[test]
    fn roles_route_packets_to_step_kinds() {
        assert_eq!(
            role(&PacketObj::MessageDelta {
                content: "a".to_string()
            }),
            PacketRole::Continue(StepKind::Text)
        );
        assert_eq!(
            role(&PacketObj::OpenUrlStart),
            PacketRole::Start(StepKind::ToolCall)
        );
        assert_eq!(role(&PacketObj::ReasoningDone), PacketRole::Continue(StepKind::Reasoning));
        assert_eq!(role(&PacketObj::SectionEnd), PacketRole::SectionEnd);
        assert_eq!(
            role(&PacketObj::Stop { stop_reason: None }),
            PacketRole::Control
        );
    }
}
