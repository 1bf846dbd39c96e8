//! Splits incoming queries into methodology questions ("how do you
//! vet these entities?") and plain entity lookups, with a small
//! typo-tolerant rule set instead of prompt-side heuristics.

/// What kind of question a match-entity query is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    /// Asks how or why the entity list is built or verified.
    Methodology,
    /// Asks for entities themselves.
    EntityLookup,
}

// Cue vocabularies. Tokens of length >= 4 match their cue at edit
// distance <= 1; shorter tokens must match exactly.
const INTERROGATIVE_CUES: &[&str] = &["how", "why"];
const VERIFICATION_CUES: &[&str] = &["ensure", "verify", "validate", "confirm", "guarantee"];
const DOMAIN_CUES: &[&str] = &["entity", "entities", "domain", "domains", "catalog", "list"];
const METHODOLOGY_CUES: &[&str] = &["methodology", "method", "criteria", "process", "approach"];

const FUZZY_MIN_LEN: usize = 4;

pub fn classify(query: &str) -> QuestionKind {
    let tokens: Vec<String> = query
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();

    let interrogative = matches_any(&tokens, INTERROGATIVE_CUES);
    let verification = matches_any(&tokens, VERIFICATION_CUES);
    let domain = matches_any(&tokens, DOMAIN_CUES);
    let methodology = matches_any(&tokens, METHODOLOGY_CUES);

    let is_methodology = (verification && domain)
        || (interrogative && verification)
        || (interrogative && methodology);

    if is_methodology {
        QuestionKind::Methodology
    } else {
        QuestionKind::EntityLookup
    }
}

fn matches_any(tokens: &[String], cues: &[&str]) -> bool {
    tokens
        .iter()
        .any(|token| cues.iter().any(|cue| token_matches_cue(token, cue)))
}

fn token_matches_cue(token: &str, cue: &str) -> bool {
    if token == cue {
        return true;
    }
    if token.len() < FUZZY_MIN_LEN || cue.len() < FUZZY_MIN_LEN {
        return false;
    }
    levenshtein(token, cue) <= 1
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
