//! Canonical skill tokens.
//!
//! Skill names arrive from three uncoordinated vocabularies — the occupation
//! provider, posting text, and user checklists — so every comparison in the
//! crate goes through the same normalization: lowercase, separators to
//! spaces, whitespace collapsed, and a naive singular form for tokens longer
//! than four characters.

/// Normalize free-text into a comparable skill name.
pub fn normalize_skill(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .replace(['_', '-', '/'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical form of a single token: lowercased and singularized.
pub fn canonical_token(token: &str) -> String {
    let value = token.trim().to_lowercase();
    if value.len() > 4 && value.ends_with('s') {
        value[..value.len() - 1].to_string()
    } else {
        value
    }
}

const STOP_WORDS: &[&str] = &["and", "or", "the", "a", "an", "of"];

/// Canonical tokens of a normalized phrase, stop words removed.
pub fn content_tokens(normalized: &str) -> Vec<String> {
    normalized
        .split_whitespace()
        .filter(|token| !STOP_WORDS.contains(token))
        .map(canonical_token)
        .collect()
}

/// Alias sets used to spot a canonical skill inside arbitrary text
/// (repository manifests, posting descriptions, occupation blurbs).
pub const SKILL_ALIASES: &[(&str, &[&str])] = &[
    ("rest api", &["rest api", "restful api", "fastapi", "express", "flask"]),
    ("python", &["python", "py", "fastapi", "django"]),
    ("javascript", &["javascript", "node", "nodejs", "express"]),
    ("typescript", &["typescript", "ts-node", "tsconfig", "next.js"]),
    ("sql", &["sql", "postgresql", "mysql", "sqlite"]),
    ("cloud fundamentals", &["cloud fundamentals", "aws", "azure", "gcp", "terraform"]),
    ("cybersecurity", &["cybersecurity", "threat hunting", "siem", "splunk", "security"]),
];

/// Aliases for `skill`, always including the skill name itself.
pub fn aliases_for(skill: &str) -> Vec<&'static str> {
    SKILL_ALIASES
        .iter()
        .find(|(canonical, _)| *canonical == skill)
        .map(|(_, aliases)| aliases.to_vec())
        .unwrap_or_default()
}

/// `true` when `text` mentions `skill` directly or via one of its aliases.
pub fn text_mentions_skill(text: &str, skill: &str) -> bool {
    if !skill.is_empty() && text.contains(skill) {
        return true;
    }
    aliases_for(skill).iter().any(|alias| text.contains(alias))
}

const LOW_RESILIENCE_TOKENS: &[&str] = &[
    "manual testing",
    "basic html",
    "basic css",
    "vanilla coding",
    "documentation",
    "log monitoring",
    "frontend fundamentals",
];

const HIGH_RESILIENCE_TOKENS: &[&str] = &[
    "system design",
    "architecture",
    "rag",
    "prompt engineering",
    "cybersecurity",
    "threat hunting",
    "ethical ai",
    "compliance",
    "cloud",
    "distributed systems",
];

/// Weighting for how robust a skill is judged against future automation.
pub fn resilience_multiplier(skill_name: &str) -> f64 {
    let skill = normalize_skill(skill_name);
    if LOW_RESILIENCE_TOKENS.iter().any(|t| skill.contains(t)) {
        return 0.5;
    }
    if HIGH_RESILIENCE_TOKENS.iter().any(|t| skill.contains(t)) {
        return 1.7;
    }
    1.0
}
