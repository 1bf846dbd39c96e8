use std::sync::Arc;

use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
    CreateChatCompletionRequestArgs,
};
use chrono::{DateTime, Utc};
use common::{
    error::AppError,
    session::SessionStore,
    storage::{
        db::SurrealDbClient,
        types::{
            chat_turn::{ChatTurn, TurnRole},
            document_chunk::DocumentChunk,
        },
    },
    utils::embedding::{EmbeddingProvider, OpenAIClientType},
};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    classifier::{classify, QuestionKind},
    entity_match::{
        create_entity_match_request, process_entity_match_response, EntityMatchOutcome,
    },
    matcher::EntityMatcher,
    prompts::{
        chunks_to_chat_context, create_entity_match_message, create_user_message_with_history,
        CHAT_SYSTEM_PROMPT, ENTITY_MATCH_SYSTEM_PROMPT, METHODOLOGY_EXPLANATION,
        NO_DOCUMENTS_GUIDANCE, PLAIN_CHAT_SYSTEM_PROMPT,
    },
    retrieval::retrieve_similar_chunks,
};

/// How many retrieved chunks are echoed back as cited sources.
const CITED_SOURCES: usize = 3;
/// How much of a chunk the citation excerpt shows.
const SOURCE_EXCERPT_CHARS: usize = 300;
/// Prompt context never includes more than this many history turns.
const HISTORY_TURN_CAP: usize = 64;

#[derive(Debug, Clone, Serialize)]
pub struct SourceDocument {
    pub content: String,
    pub filename: String,
    pub relevance_score: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub sources: Vec<SourceDocument>,
}

/// Answers chat messages with optional RAG grounding and runs the
/// LLM-backed entity matching. Holds the immutable catalog matcher
/// and the pluggable session store.
pub struct ChatOrchestrator {
    db: Arc<SurrealDbClient>,
    openai_client: Arc<OpenAIClientType>,
    embedding: Arc<EmbeddingProvider>,
    sessions: Arc<dyn SessionStore>,
    matcher: Arc<EntityMatcher>,
    chat_model: String,
    top_k: usize,
}

impl ChatOrchestrator {
    pub fn new(
        db: Arc<SurrealDbClient>,
        openai_client: Arc<OpenAIClientType>,
        embedding: Arc<EmbeddingProvider>,
        sessions: Arc<dyn SessionStore>,
        matcher: Arc<EntityMatcher>,
        chat_model: String,
        top_k: usize,
    ) -> Self {
        Self {
            db,
            openai_client,
            embedding,
            sessions,
            matcher,
            chat_model,
            top_k,
        }
    }

    pub fn matcher(&self) -> &Arc<EntityMatcher> {
        &self.matcher
    }

    /// Processes one chat message. With `use_rag` the reply is grounded
    /// in retrieved chunks and cites its sources; without documents the
    /// fixed guidance message is returned instead of calling the LLM.
    pub async fn chat(
        &self,
        message: &str,
        session_id: Option<String>,
        use_rag: bool,
    ) -> Result<ChatReply, AppError> {
        if message.trim().is_empty() {
            return Err(AppError::Validation("Message must not be empty".into()));
        }

        let session_id =
            session_id.unwrap_or_else(|| format!("session_{}", Uuid::new_v4()));
        let history = capped_history(self.sessions.history(&session_id).await?);

        let (response, sources) = if use_rag {
            let has_chunks = DocumentChunk::count_all(&self.db).await? > 0;
            if has_chunks {
                self.rag_reply(message, &history).await?
            } else {
                debug!(session_id, "RAG requested with empty knowledge base");
                (NO_DOCUMENTS_GUIDANCE.to_owned(), Vec::new())
            }
        } else {
            (self.plain_reply(message, &history).await?, Vec::new())
        };

        self.sessions
            .append(&session_id, TurnRole::User, message.to_owned())
            .await?;
        self.sessions
            .append(&session_id, TurnRole::Assistant, response.clone())
            .await?;

        info!(
            session_id,
            use_rag,
            sources = sources.len(),
            "Chat turn completed"
        );

        Ok(ChatReply {
            response,
            session_id,
            timestamp: Utc::now(),
            sources,
        })
    }

    /// Ranks catalog entities against a natural-language request.
    /// Methodology questions get the fixed explanation without an LLM
    /// round trip.
    pub async fn match_entities(
        &self,
        query: &str,
        session_id: Option<&str>,
    ) -> Result<EntityMatchOutcome, AppError> {
        if query.trim().is_empty() {
            return Err(AppError::Validation("Query must not be empty".into()));
        }

        let outcome = match classify(query) {
            QuestionKind::Methodology => {
                debug!(query, "Classified as methodology question");
                EntityMatchOutcome {
                    matches: Vec::new(),
                    explanation: METHODOLOGY_EXPLANATION.to_owned(),
                }
            }
            QuestionKind::EntityLookup => {
                if self.matcher.catalog().is_empty() {
                    EntityMatchOutcome {
                        matches: Vec::new(),
                        explanation: "The entity catalog is empty; nothing to match against."
                            .to_owned(),
                    }
                } else {
                    self.llm_entity_matches(query).await?
                }
            }
        };

        if let Some(session_id) = session_id {
            self.sessions
                .append(session_id, TurnRole::User, query.to_owned())
                .await?;
            self.sessions
                .append(session_id, TurnRole::Assistant, outcome.explanation.clone())
                .await?;
        }

        Ok(outcome)
    }

    async fn rag_reply(
        &self,
        message: &str,
        history: &[ChatTurn],
    ) -> Result<(String, Vec<SourceDocument>), AppError> {
        let retrieved =
            retrieve_similar_chunks(&self.db, &self.embedding, message, self.top_k).await?;

        let context = chunks_to_chat_context(&retrieved);
        let user_message = create_user_message_with_history(&context, history, message);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.chat_model)
            .messages([
                ChatCompletionRequestSystemMessage::from(CHAT_SYSTEM_PROMPT).into(),
                ChatCompletionRequestUserMessage::from(user_message).into(),
            ])
            .build()?;

        let response = self.openai_client.chat().create(request).await?;
        let answer = extract_answer(response)?;

        let sources = retrieved
            .iter()
            .take(CITED_SOURCES)
            .map(|chunk| SourceDocument {
                content: chunk.chunk.chars().take(SOURCE_EXCERPT_CHARS).collect(),
                filename: chunk.document_name.clone(),
                relevance_score: chunk.score,
            })
            .collect();

        Ok((answer, sources))
    }

    async fn plain_reply(
        &self,
        message: &str,
        history: &[ChatTurn],
    ) -> Result<String, AppError> {
        let mut messages: Vec<ChatCompletionRequestMessage> =
            Vec::with_capacity(history.len() + 2);
        messages.push(ChatCompletionRequestSystemMessage::from(PLAIN_CHAT_SYSTEM_PROMPT).into());
        for turn in history {
            messages.push(match turn.role {
                TurnRole::User => {
                    ChatCompletionRequestUserMessage::from(turn.content.clone()).into()
                }
                TurnRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.content.clone())
                    .build()?
                    .into(),
                TurnRole::System => {
                    ChatCompletionRequestSystemMessage::from(turn.content.clone()).into()
                }
            });
        }
        messages.push(ChatCompletionRequestUserMessage::from(message.to_owned()).into());

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.chat_model)
            .messages(messages)
            .build()?;

        let response = self.openai_client.chat().create(request).await?;
        extract_answer(response)
    }

    async fn llm_entity_matches(&self, query: &str) -> Result<EntityMatchOutcome, AppError> {
        let lexical_hits = serde_json::json!(self.matcher.candidates(query));

        // Retrieval context is optional; entity matching works off the
        // catalog alone when nothing has been ingested.
        let retrieved = if DocumentChunk::count_all(&self.db).await? > 0 {
            retrieve_similar_chunks(&self.db, &self.embedding, query, self.top_k).await?
        } else {
            Vec::new()
        };
        let context = chunks_to_chat_context(&retrieved);

        let user_message = create_entity_match_message(
            &self.matcher.catalog().to_prompt_json(),
            &lexical_hits,
            &context,
            query,
        );

        let request = create_entity_match_request(
            user_message,
            &self.chat_model,
            ENTITY_MATCH_SYSTEM_PROMPT,
        )?;
        let response = self.openai_client.chat().create(request).await?;

        process_entity_match_response(response)
    }
}

fn capped_history(mut history: Vec<ChatTurn>) -> Vec<ChatTurn> {
    if history.len() > HISTORY_TURN_CAP {
        history.drain(..history.len() - HISTORY_TURN_CAP);
    }
    history
}

fn extract_answer(
    response: async_openai::types::CreateChatCompletionResponse,
) -> Result<String, AppError> {
    response
        .choices
        .first()
        .and_then(|choice| choice.message.content.clone())
        .ok_or(AppError::LLMParsing(
            "No content found in LLM response".into(),
        ))
}
