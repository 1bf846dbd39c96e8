use std::sync::Arc;

use common::{entity::EntityCatalog, error::AppError};
use regex::Regex;
use serde::Serialize;

/// An entity mentioned verbatim in free text.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LexicalMatch {
    pub name: String,
    pub short_code: String,
    pub category: String,
}

struct EntityPattern {
    entity_index: usize,
    pattern: Regex,
}

/// Scans text for case-insensitive whole-word mentions of catalog
/// entity names and short codes. Patterns are compiled once at
/// startup against the immutable catalog snapshot.
pub struct EntityMatcher {
    catalog: Arc<EntityCatalog>,
    patterns: Vec<EntityPattern>,
    category_patterns: Vec<EntityPattern>,
}

impl EntityMatcher {
    pub fn new(catalog: Arc<EntityCatalog>) -> Result<Self, AppError> {
        let mut patterns = Vec::with_capacity(catalog.len() * 2);
        let mut category_patterns = Vec::with_capacity(catalog.len());

        for (entity_index, entity) in catalog.iter().enumerate() {
            for term in [&entity.name, &entity.short_code] {
                if term.trim().is_empty() {
                    continue;
                }
                patterns.push(EntityPattern {
                    entity_index,
                    pattern: whole_word_pattern(term)?,
                });
            }
            if !entity.category.trim().is_empty() {
                category_patterns.push(EntityPattern {
                    entity_index,
                    pattern: whole_word_pattern(&entity.category)?,
                });
            }
        }

        Ok(Self {
            catalog,
            patterns,
            category_patterns,
        })
    }

    pub fn catalog(&self) -> &Arc<EntityCatalog> {
        &self.catalog
    }

    /// All catalog entities mentioned in the text, in catalog order,
    /// each at most once. No ranking.
    pub fn find_matches(&self, text: &str) -> Vec<LexicalMatch> {
        self.collect_hits(text, &self.patterns)
    }

    /// Wider candidate set for the LLM ranking stage: entities whose
    /// name or short code is mentioned, plus entities whose category
    /// term appears ("I need a custodian" surfaces the Custodian
    /// entries).
    pub fn candidates(&self, text: &str) -> Vec<LexicalMatch> {
        let mut indices = hit_indices(text, &self.patterns);
        indices.extend(hit_indices(text, &self.category_patterns));
        indices.sort_unstable();
        indices.dedup();

        self.resolve(indices)
    }

    fn collect_hits(&self, text: &str, patterns: &[EntityPattern]) -> Vec<LexicalMatch> {
        let mut indices = hit_indices(text, patterns);
        indices.sort_unstable();
        indices.dedup();

        self.resolve(indices)
    }

    fn resolve(&self, indices: Vec<usize>) -> Vec<LexicalMatch> {
        indices
            .into_iter()
            .filter_map(|index| self.catalog.entities.get(index))
            .map(|entity| LexicalMatch {
                name: entity.name.clone(),
                short_code: entity.short_code.clone(),
                category: entity.category.clone(),
            })
            .collect()
    }
}

fn hit_indices(text: &str, patterns: &[EntityPattern]) -> Vec<usize> {
    patterns
        .iter()
        .filter(|candidate| candidate.pattern.is_match(text))
        .map(|candidate| candidate.entity_index)
        .collect()
}

/// Word boundaries are spelled out because entity names can end in
/// non-word characters ("Apple Inc."), where `\b` misbehaves.
fn whole_word_pattern(term: &str) -> Result<Regex, AppError> {
    Regex::new(&format!(
        "(?i)(^|[^A-Za-z0-9]){}([^A-Za-z0-9]|$)",
        regex::escape(term)
    ))
    .map_err(|e| AppError::Validation(format!("Invalid entity term '{term}': {e}")))
}
