pub mod config;
pub mod conversation;
pub mod error;
pub mod gateway;
pub mod loader;
pub mod presentation;
pub mod render;
pub mod state;

// Re-export main types for convenience
pub use config::Config;
pub use conversation::{Conversation, ConversationPhase, Effect, Outcome, RequestId};
pub use error::{GatewayError, IncompleteResult};
pub use gateway::{AnalysisClient, AnalyzeResponse, QueryResponse, Report};
pub use loader::{Loader, LoaderTransition};
pub use presentation::PresentationKind;
pub use render::{render, ChartEntry, ChartView};
pub use state::{ChatRole, MessageEntry, MessageLog, Record, TextEntry};
