//! External service clients consumed by node bodies.
//!
//! The engine core never depends on these beyond passing messages through;
//! they are the opaque capabilities a node may call. All clients take an
//! explicit configuration object at construction time; there is no
//! process-wide singleton state.

mod completion;
mod config;
mod search;

pub use completion::{
    ChatCompletionsClient, Completion, CompletionError, CompletionService, ToolCallRequest,
    ToolSpec,
};
pub use config::{CompletionConfig, ConfigError, SearchConfig};
pub use search::{KnowledgePanel, SearchClient, SearchHit, SearchOutcome, SearchResults};
