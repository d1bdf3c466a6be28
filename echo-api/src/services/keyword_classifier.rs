//! Keyword fallback emotion classifier
//!
//! Deterministic, infallible classifier used whenever the GLM service is
//! unreachable or returns unusable output. Categories are checked in a fixed
//! priority order so severe/negative emotions win over positive ones; the
//! ordering of the table below is a documented invariant, not incidental.

/// Label returned when no category keyword matches
pub const DEFAULT_EMOTION: &str = "contemplative";

/// Base intensity before boost and length adjustments
const BASE_INTENSITY: f64 = 0.5;

/// Intensity added per matched intensifier word
const BOOST_INCREMENT: f64 = 0.2;

/// Priority-ordered emotion categories and their trigger keywords.
/// Matching is case-insensitive substring search; the first category with a
/// matching keyword wins.
const EMOTION_KEYWORDS: &[(&str, &[&str])] = &[
    ("despair", &["die", "death", "suicide", "kill", "end", "pain", "hurt", "depressed", "awful"]),
    ("anger", &["hate", "angry", "mad", "furious", "rage", "annoyed", "frustrated"]),
    ("fear", &["scared", "afraid", "terrified", "anxious", "worried", "nervous"]),
    ("sadness", &["sad", "crying", "tears", "lonely", "empty", "broken", "devastated"]),
    ("joy", &["happy", "excited", "amazing", "wonderful", "great", "fantastic", "delighted"]),
    ("love", &["love", "adore", "cherish", "care", "affection", "heart", "romance"]),
    ("peace", &["calm", "peaceful", "quiet", "serene", "tranquil", "relaxed", "zen"]),
    ("warmth", &["warm", "cozy", "comfort", "embrace", "gentle", "tender"]),
    ("grateful", &["thankful", "grateful", "appreciate", "blessed", "lucky"]),
    ("hopeful", &["hope", "future", "dream", "wish", "aspire", "optimistic"]),
    ("excitement", &["excited", "thrilled", "eager", "energetic", "pumped"]),
    ("nostalgia", &["remember", "back then", "used to", "childhood", "old", "past"]),
    ("contemplative", &["think", "wonder", "ponder", "reflect", "consider", "meditate"]),
];

/// Per-category intensifier words. Categories without an entry use
/// GENERIC_BOOSTS; the original data only defines these four lists.
const INTENSITY_BOOSTS: &[(&str, &[&str])] = &[
    ("despair", &["really", "so", "very", "extremely", "totally", "completely"]),
    ("anger", &["really", "so", "very", "extremely", "totally", "fucking"]),
    ("joy", &["really", "so", "very", "extremely", "amazing", "incredible"]),
    ("love", &["really", "so", "very", "deeply", "truly", "completely"]),
];

const GENERIC_BOOSTS: &[&str] = &["really", "so", "very"];

/// Result of the keyword classifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeywordClassification {
    pub emotion: &'static str,
    /// Intensity in [0, 1]
    pub intensity: f64,
}

/// Classify free text into an emotion label with an intensity score.
///
/// Pure and deterministic; always returns a label from the category table
/// (or DEFAULT_EMOTION) and an intensity in [0, 1].
pub fn classify(text: &str) -> KeywordClassification {
    let emotion = extract_emotion(text);
    KeywordClassification {
        emotion,
        intensity: calculate_intensity(text, emotion),
    }
}

fn extract_emotion(text: &str) -> &'static str {
    let lower = text.to_lowercase();

    EMOTION_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| lower.contains(keyword)))
        .map(|(emotion, _)| *emotion)
        .unwrap_or(DEFAULT_EMOTION)
}

/// Intensity = base 0.5, plus 0.2 per matched intensifier word, plus a text
/// length bonus capped at 0.3, clamped to 1.0.
pub fn calculate_intensity(text: &str, emotion: &str) -> f64 {
    let lower = text.to_lowercase();

    let boosts = INTENSITY_BOOSTS
        .iter()
        .find(|(category, _)| *category == emotion)
        .map(|(_, words)| *words)
        .unwrap_or(GENERIC_BOOSTS);

    let boost_count = boosts.iter().filter(|word| lower.contains(*word)).count();

    let mut intensity = BASE_INTENSITY + boost_count as f64 * BOOST_INCREMENT;
    intensity += (text.len() as f64 / 100.0).min(0.3);

    intensity.min(1.0)
}
