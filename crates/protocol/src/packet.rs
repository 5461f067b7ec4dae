//! Streamed packets that describe an assistant turn in progress

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::*;

/// Errors raised while decoding recorded packet streams
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("line {line}: invalid packet: {source}")]
    InvalidPacket {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// One event of an assistant turn, as delivered by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub placement: Placement,
    pub obj: PacketObj,
}

impl Packet {
    pub fn new(placement: Placement, obj: PacketObj) -> Self {
        Self { placement, obj }
    }

    /// Decode one JSONL line. Blank lines yield `None`.
    pub fn decode_line(line: usize, text: &str) -> Result<Option<Packet>, DecodeError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(text)
            .map(Some)
            .map_err(|source| DecodeError::InvalidPacket { line, source })
    }
}

/// Packet payloads, one variant per streaming type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PacketObj {
    // Control
    /// The whole turn finished
    Stop {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stop_reason: Option<String>,
    },
    /// The unit at this placement has produced its result
    SectionEnd,
    /// Heads-up that the turn fans out into parallel tabs
    TopLevelBranching { num_parallel_branches: u32 },
    /// The backend failed mid-turn
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },

    // Final answer
    MessageStart {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        final_documents: Option<Vec<SearchDoc>>,
    },
    MessageDelta { content: String },
    CitationInfo {
        citation_number: u32,
        document_id: String,
    },

    // Tools
    SearchToolStart {
        #[serde(default)]
        is_internet_search: bool,
    },
    SearchToolQueriesDelta { queries: Vec<String> },
    SearchToolDocumentsDelta { documents: Vec<SearchDoc> },
    OpenUrlStart,
    OpenUrlUrls { urls: Vec<String> },
    OpenUrlDocuments { documents: Vec<SearchDoc> },
    ImageGenerationStart,
    ImageGenerationHeartbeat,
    ImageGenerationFinal { images: Vec<GeneratedImage> },
    PythonToolStart { code: String },
    PythonToolDelta {
        #[serde(default)]
        stdout: String,
        #[serde(default)]
        stderr: String,
        #[serde(default)]
        file_ids: Vec<String>,
    },
    CustomToolStart { tool_name: String },
    CustomToolDelta {
        tool_name: String,
        response_type: String,
        #[serde(default)]
        data: Option<Value>,
        #[serde(default)]
        file_ids: Option<Vec<String>>,
    },

    // Reasoning
    ReasoningStart,
    ReasoningDelta { reasoning: String },
    ReasoningDone,

    // Deep research
    DeepResearchPlanStart,
    DeepResearchPlanDelta { content: String },
    ResearchAgentStart { research_task: String },
    IntermediateReportStart,
    IntermediateReportDelta { content: String },
    IntermediateReportCitedDocs {
        #[serde(default)]
        cited_docs: Option<Vec<SearchDoc>>,
    },
}

impl PacketObj {
    /// Wire name of this packet type
    pub fn type_name(&self) -> &'static str {
        match self {
            PacketObj::Stop { .. } => "stop",
            PacketObj::SectionEnd => "section_end",
            PacketObj::TopLevelBranching { .. } => "top_level_branching",
            PacketObj::Error { .. } => "error",
            PacketObj::MessageStart { .. } => "message_start",
            PacketObj::MessageDelta { .. } => "message_delta",
            PacketObj::CitationInfo { .. } => "citation_info",
            PacketObj::SearchToolStart { .. } => "search_tool_start",
            PacketObj::SearchToolQueriesDelta { .. } => "search_tool_queries_delta",
            PacketObj::SearchToolDocumentsDelta { .. } => "search_tool_documents_delta",
            PacketObj::OpenUrlStart => "open_url_start",
            PacketObj::OpenUrlUrls { .. } => "open_url_urls",
            PacketObj::OpenUrlDocuments { .. } => "open_url_documents",
            PacketObj::ImageGenerationStart => "image_generation_start",
            PacketObj::ImageGenerationHeartbeat => "image_generation_heartbeat",
            PacketObj::ImageGenerationFinal { .. } => "image_generation_final",
            PacketObj::PythonToolStart { .. } => "python_tool_start",
            PacketObj::PythonToolDelta { .. } => "python_tool_delta",
            PacketObj::CustomToolStart { .. } => "custom_tool_start",
            PacketObj::CustomToolDelta { .. } => "custom_tool_delta",
            PacketObj::ReasoningStart => "reasoning_start",
            PacketObj::ReasoningDelta { .. } => "reasoning_delta",
            PacketObj::ReasoningDone => "reasoning_done",
            PacketObj::DeepResearchPlanStart => "deep_research_plan_start",
            PacketObj::DeepResearchPlanDelta { .. } => "deep_research_plan_delta",
            PacketObj::ResearchAgentStart { .. } => "research_agent_start",
            PacketObj::IntermediateReportStart => "intermediate_report_start",
            PacketObj::IntermediateReportDelta { .. } => "intermediate_report_delta",
            PacketObj::IntermediateReportCitedDocs { .. } => "intermediate_report_cited_docs",
        }
    }
}
