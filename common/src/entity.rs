use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A financial institution from the static reference list. The catalog
/// is loaded once at startup and shared as an immutable snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "shortCode")]
    pub short_code: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EntityCatalog {
    pub entities: Vec<Entity>,
}

impl EntityCatalog {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AppError::Validation(format!(
                "Failed to read entity catalog {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, AppError> {
        serde_json::from_str(raw)
            .map_err(|e| AppError::Validation(format!("Invalid entity catalog JSON: {e}")))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Serializes the catalog for LLM prompt context.
    pub fn to_prompt_json(&self) -> serde_json::Value {
        serde_json::json!(self
            .entities
            .iter()
            .map(|entity| {
                serde_json::json!({
                    "name": entity.name,
                    "short_code": entity.short_code,
                    "category": entity.category,
                    "description": entity.description,
                })
            })
            .collect::<Vec<_>>())
    }
}
