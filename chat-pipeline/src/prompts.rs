use common::storage::types::chat_turn::{format_history, ChatTurn};
use serde_json::Value;

use crate::retrieval::RetrievedChunk;

pub const CHAT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant for a financial \
    knowledge base. Use the provided context to answer the question. If you can find ANY \
    relevant information in the context, use it to provide a helpful answer. Only say you \
    don't know if there is absolutely no relevant information in the context.";

pub const PLAIN_CHAT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

pub const ENTITY_MATCH_SYSTEM_PROMPT: &str = "You match user descriptions to financial \
    institutions from a fixed catalog. Return only entities from the catalog, ranked by how \
    well they fit the request, each with a confidence between 0 and 1 and a short overall \
    explanation. Prefer entities whose category matches the role the user describes.";

/// Returned when RAG mode is requested but nothing has been ingested.
pub const NO_DOCUMENTS_GUIDANCE: &str = "I'm in RAG mode but no documents have been \
    uploaded yet. Please upload some documents first, or toggle RAG mode off to chat \
    without document context.";

/// Fixed reply for methodology questions about how entities are vetted,
/// mirroring the curated answer the entity workflow shipped with.
pub const METHODOLOGY_EXPLANATION: &str = "Entity coverage is maintained as a curated \
    catalog of financial institutions. Each entry carries a name, short code and category \
    that are reviewed against the institution's regulatory registrations, so matches are \
    restricted to the investment domain rather than inferred from free text. Matching \
    first looks for exact whole-word mentions, then ranks remaining candidates by how \
    well their category and description fit the request.";

/// Convert retrieval results to JSON for LLM context.
pub fn chunks_to_chat_context(chunks: &[RetrievedChunk]) -> Value {
    fn round_score(value: f32) -> f64 {
        (f64::from(value) * 1000.0).round() / 1000.0
    }

    serde_json::json!(chunks
        .iter()
        .map(|chunk| {
            serde_json::json!({
                "id": chunk.id,
                "content": chunk.chunk,
                "document": chunk.document_name,
                "score": round_score(chunk.score),
            })
        })
        .collect::<Vec<_>>())
}

pub fn create_user_message_with_history(
    context_json: &Value,
    history: &[ChatTurn],
    query: &str,
) -> String {
    format!(
        r"
        Chat history:
        ==================
        {}

        Context Information:
        ==================
        {}

        User Question:
        ==================
        {}
        ",
        format_history(history),
        context_json,
        query
    )
}

pub fn create_entity_match_message(
    catalog_json: &Value,
    lexical_hits: &Value,
    context_json: &Value,
    query: &str,
) -> String {
    format!(
        r"
        Entity catalog:
        ==================
        {catalog_json}

        Exact mentions found in the query:
        ==================
        {lexical_hits}

        Context Information:
        ==================
        {context_json}

        User Request:
        ==================
        {query}
        "
    )
}
