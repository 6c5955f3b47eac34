//! Application layer for pillar-council
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::EvaluationParams;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    llm_gateway::{GatewayError, GenerationRequest, GenerationResponse, LlmGateway},
    progress::{NoProgress, ProgressNotifier},
    retrieval::{RetrievalError, RetrievalPort, RetrievalQuery, RetrievalResult, RetrievalSource},
};
pub use use_cases::refine_agent::{RefineAgentInput, RefineAgentUseCase};
pub use use_cases::run_evaluation::{RunEvaluationError, RunEvaluationInput, RunEvaluationUseCase};
