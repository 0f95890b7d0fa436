//! Conversation state machine
//!
//! A `Conversation` owns the message log and the current phase. Triggers are
//! plain method calls; the ones that need the network hand back an [`Effect`]
//! instead of doing I/O, and the caller feeds the finished call back in as an
//! [`Outcome`]. Only one request is ever in flight, so outcomes arrive in the
//! order their effects were issued.

use tracing::{debug, info, warn};

use crate::error::GatewayError;
use crate::gateway::{AnalyzeResponse, QueryResponse};
use crate::presentation::PresentationKind;
use crate::render::render;
use crate::state::{MessageLog, TextEntry};

pub const VISUALIZE_PROMPT: &str =
    "Your request can be visualized. Please select a format below, or choose none to receive a text reply.";
pub const ANALYZE_FAILED: &str = "Oops! Something went wrong.";
pub const NO_DATA: &str = "No data returned from server.";
pub const QUERY_FAILED: &str = "Failed to get report. Try again.";

/// Identifies an outbound request so late or foreign results can be discarded
pub type RequestId = u64;

/// Mutually exclusive conversational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationPhase {
    /// Accepting free text
    Idle,
    /// A request is in flight
    Busy,
    /// Waiting for the user to pick a presentation format
    AwaitingFormat,
}

/// Outbound call requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Analyze {
        request: RequestId,
        query: String,
    },
    Query {
        request: RequestId,
        query: String,
        kind: PresentationKind,
    },
}

impl Effect {
    pub fn request(&self) -> RequestId {
        match self {
            Effect::Analyze { request, .. } | Effect::Query { request, .. } => *request,
        }
    }
}

/// Result of executing an [`Effect`]
#[derive(Debug)]
pub enum Outcome {
    Analyzed {
        request: RequestId,
        result: Result<AnalyzeResponse, GatewayError>,
    },
    Queried {
        request: RequestId,
        result: Result<QueryResponse, GatewayError>,
    },
}

impl Outcome {
    pub fn request(&self) -> RequestId {
        match self {
            Outcome::Analyzed { request, .. } | Outcome::Queried { request, .. } => *request,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum Stage {
    #[default]
    Idle,
    Analyzing { request: RequestId, query: String },
    AwaitingFormat { pending: String },
    Querying { request: RequestId, kind: PresentationKind },
}

#[derive(Debug, Default)]
pub struct Conversation {
    stage: Stage,
    log: MessageLog,
    last_request: RequestId,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ConversationPhase {
        match self.stage {
            Stage::Idle => ConversationPhase::Idle,
            Stage::Analyzing { .. } | Stage::Querying { .. } => ConversationPhase::Busy,
            Stage::AwaitingFormat { .. } => ConversationPhase::AwaitingFormat,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.phase() == ConversationPhase::Busy
    }

    /// The free-text query waiting on a format choice, if any
    pub fn pending_query(&self) -> Option<&str> {
        match &self.stage {
            Stage::AwaitingFormat { pending } => Some(pending),
            _ => None,
        }
    }

    pub fn in_flight(&self) -> Option<RequestId> {
        match self.stage {
            Stage::Analyzing { request, .. } | Stage::Querying { request, .. } => Some(request),
            _ => None,
        }
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Idle → Busy. Ignored unless idle and `text` has non-whitespace content.
    pub fn submit(&mut self, text: &str) -> Option<Effect> {
        let query = text.trim();
        if self.phase() != ConversationPhase::Idle || query.is_empty() {
            return None;
        }

        self.log.push(TextEntry::user(query));
        let request = self.next_request();
        self.stage = Stage::Analyzing {
            request,
            query: query.to_string(),
        };
        info!("Analyzing query (request {})", request);

        Some(Effect::Analyze {
            request,
            query: query.to_string(),
        })
    }

    /// AwaitingFormat → Busy, consuming the pending query.
    pub fn choose_format(&mut self, kind: PresentationKind) -> Option<Effect> {
        let Stage::AwaitingFormat { pending } = &self.stage else {
            return None;
        };
        let query = pending.clone();

        self.log.push(TextEntry::system(format!("Format Selected: {}", kind)));
        self.log.push(TextEntry::system(format!("→ Sending: {} (Format: {})", query, kind)));

        let request = self.next_request();
        self.stage = Stage::Querying { request, kind };
        info!("Requesting {} report (request {})", kind.as_str(), request);

        Some(Effect::Query { request, query, kind })
    }

    /// AwaitingFormat → Idle without sending anything. Returns whether a pending query was dropped.
    pub fn abandon(&mut self) -> bool {
        if let Stage::AwaitingFormat { .. } = self.stage {
            debug!("Pending query abandoned");
            self.stage = Stage::Idle;
            true
        } else {
            false
        }
    }

    /// Feed back a finished request. Returns false when the outcome was stale and ignored.
    pub fn apply(&mut self, outcome: Outcome) -> bool {
        if self.in_flight() != Some(outcome.request()) {
            warn!(
                "Ignoring outcome for request {} (in flight: {:?})",
                outcome.request(),
                self.in_flight()
            );
            return false;
        }

        match (std::mem::take(&mut self.stage), outcome) {
            (Stage::Analyzing { query, .. }, Outcome::Analyzed { result, .. }) => {
                self.on_analyzed(query, result);
                true
            }
            (Stage::Querying { kind, .. }, Outcome::Queried { result, .. }) => {
                self.on_queried(kind, result);
                true
            }
            (stage, outcome) => {
                warn!("Outcome {:?} does not match stage {:?}", outcome, stage);
                self.stage = stage;
                false
            }
        }
    }

    fn on_analyzed(&mut self, query: String, result: Result<AnalyzeResponse, GatewayError>) {
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!("Analyze request failed: {}", e);
                self.log.push(TextEntry::bot(ANALYZE_FAILED));
                self.stage = Stage::Idle;
                return;
            }
        };

        let has_reply = !response.bot_response().trim().is_empty();

        if response.requires_visualization() {
            if has_reply {
                self.log.push(TextEntry::bot(VISUALIZE_PROMPT));
            }
            self.stage = Stage::AwaitingFormat { pending: query };
        } else {
            if has_reply {
                self.log.push(TextEntry::bot(response.bot_response()));
            }
            self.stage = Stage::Idle;
        }
    }

    fn on_queried(&mut self, requested: PresentationKind, result: Result<QueryResponse, GatewayError>) {
        self.stage = Stage::Idle;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!("Query request failed: {}", e);
                self.log.push(TextEntry::bot(QUERY_FAILED));
                return;
            }
        };

        match response.into_report(requested) {
            Ok(report) => {
                debug!("Rendering {} records as {}", report.data.len(), report.kind.as_str());
                self.log
                    .push(TextEntry::bot(format!("✅ Report generated in {} format!", requested)));
                self.log.push(render(report.kind, report.data));
            }
            Err(e) => {
                warn!("Incomplete query result: {}", e);
                self.log.push(TextEntry::bot(NO_DATA));
            }
        }
    }

    fn next_request(&mut self) -> RequestId {
        self.last_request += 1;
        self.last_request
    }
}
