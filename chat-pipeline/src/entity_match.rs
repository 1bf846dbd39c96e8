use async_openai::{
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse, ResponseFormat, ResponseFormatJsonSchema,
    },
};
use common::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A ranked candidate as reported by the LLM. Confidence is clamped
/// to [0, 1] but not otherwise validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMatch {
    pub name: String,
    pub short_code: String,
    pub category: String,
    pub confidence: f32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EntityMatchOutcome {
    pub matches: Vec<EntityMatch>,
    pub explanation: String,
}

pub fn get_entity_match_schema() -> Value {
    json!({
       "type": "object",
       "properties": {
           "matches": {
               "type": "array",
               "items": {
                   "type": "object",
                   "properties": {
                       "name": { "type": "string" },
                       "short_code": { "type": "string" },
                       "category": { "type": "string" },
                       "confidence": { "type": "number" },
                   },
               "required": ["name", "short_code", "category", "confidence"],
               "additionalProperties": false,
               }
           },
           "explanation": { "type": "string" }
       },
       "required": ["matches", "explanation"],
       "additionalProperties": false
    })
}

pub fn create_entity_match_request(
    user_message: String,
    model: &str,
    system_prompt: &str,
) -> Result<CreateChatCompletionRequest, OpenAIError> {
    let response_format = ResponseFormat::JsonSchema {
        json_schema: ResponseFormatJsonSchema {
            description: Some("Entity matching AI".into()),
            name: "entity_matching_with_confidence".into(),
            schema: Some(get_entity_match_schema()),
            strict: Some(true),
        },
    };

    CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages([
            ChatCompletionRequestSystemMessage::from(system_prompt.to_owned()).into(),
            ChatCompletionRequestUserMessage::from(user_message).into(),
        ])
        .response_format(response_format)
        .build()
}

pub fn process_entity_match_response(
    response: CreateChatCompletionResponse,
) -> Result<EntityMatchOutcome, AppError> {
    let outcome = response
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_ref())
        .ok_or(AppError::LLMParsing(
            "No content found in LLM response".into(),
        ))
        .and_then(|content| {
            serde_json::from_str::<EntityMatchOutcome>(content).map_err(|e| {
                AppError::LLMParsing(format!("Failed to parse LLM entity matches: {e}"))
            })
        })?;

    Ok(EntityMatchOutcome {
        matches: outcome
            .matches
            .into_iter()
            .map(|m| EntityMatch {
                confidence: m.confidence.clamp(0.0, 1.0),
                ..m
            })
            .collect(),
        explanation: outcome.explanation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_names_required_fields() {
        let schema = get_entity_match_schema();
        let required = schema["properties"]["matches"]["items"]["required"]
            .as_array()
            .expect("required array");
        assert!(required.iter().any(|v| v == "confidence"));
        assert_eq!(schema["required"][0], "matches");
    }

    #[test]
    fn test_request_carries_structured_output() {
        let request =
            create_entity_match_request("find a custodian".into(), "gpt-4o-mini", "prompt")
                .expect("request should build");
        assert_eq!(request.model, "gpt-4o-mini");
        assert!(matches!(
            request.response_format,
            Some(ResponseFormat::JsonSchema { .. })
        ));
    }

    #[test]
    fn test_parse_outcome_clamps_confidence() {
        let raw = r#"{
            "matches": [
                {"name": "State Street", "short_code": "STT", "category": "Custodian", "confidence": 1.7},
                {"name": "BNY Mellon", "short_code": "BK", "category": "Custodian", "confidence": 0.82}
            ],
            "explanation": "Both are custodians."
        }"#;
        let outcome: EntityMatchOutcome = serde_json::from_str(raw).expect("parse");
        let clamped: Vec<EntityMatch> = outcome
            .matches
            .into_iter()
            .map(|m| EntityMatch {
                confidence: m.confidence.clamp(0.0, 1.0),
                ..m
            })
            .collect();
        assert!((clamped[0].confidence - 1.0).abs() < f32::EPSILON);
        assert!((clamped[1].confidence - 0.82).abs() < f32::EPSILON);
    }
}
