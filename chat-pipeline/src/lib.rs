//! Chat orchestration and entity matching: similarity retrieval over
//! stored chunks, LLM calls with conversation history, the lexical
//! whole-word entity matcher, and question classification.
pub mod classifier;
pub mod entity_match;
pub mod matcher;
pub mod orchestrator;
pub mod prompts;
pub mod retrieval;

pub use entity_match::{EntityMatch, EntityMatchOutcome};
pub use matcher::{EntityMatcher, LexicalMatch};
pub use orchestrator::{ChatOrchestrator, ChatReply, SourceDocument};
pub use retrieval::RetrievedChunk;
