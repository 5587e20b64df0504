//! Lexicon
//!
//! Language-sensitive pieces of concept extraction: a stop-word set, a
//! morphological suffix-strip list, and the insight marker set. The default
//! lexicon targets English; both lists are pluggable, and extraction is
//! stable: the same input always yields the same concept list.

use std::collections::HashSet;

/// Minimum token length considered a concept
const MIN_TOKEN_LEN: usize = 4;

/// Maximum number of concepts extracted from one text
const MAX_CONCEPTS: usize = 15;

/// Maximum number of insight sentences surfaced from one response
const MAX_INSIGHTS: usize = 3;

/// English stop words filtered out of concept extraction
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being",
    "have", "has", "had", "do", "does", "did", "will", "would", "could",
    "should", "may", "might", "must", "shall", "can", "to", "of", "in",
    "for", "on", "with", "at", "by", "from", "it", "this", "that", "i",
    "you", "he", "she", "we", "they", "me", "my", "your", "his", "her",
    "not", "but", "or", "and", "if", "so", "no", "yes", "also", "just",
    "like", "how", "what", "when", "where", "which", "who", "about",
    "into", "through", "during", "before", "after", "above", "below",
    "between", "each", "other", "some", "such", "than", "too", "very",
    "use", "using", "used", "make", "made", "because", "while", "there",
    "their", "them", "these", "those", "then", "here", "more", "most",
    "only", "over", "same", "been", "both", "under", "again", "once",
];

/// Long derivational suffixes stripped before stop-word filtering; chosen
/// conservatively so common content words survive intact
const SUFFIXES: &[&str] = &[
    "ification", "izations", "ization", "isation", "ousness", "fulness",
    "ically", "ingly",
];

/// Markers that flag a sentence as a potential insight
const INSIGHT_MARKERS: &[&str] = &[
    "interesting", "connection", "perhaps", "actually", "notably",
    "surprising", "what if", "striking",
];

/// Pluggable stop-word set and suffix list for concept extraction
pub struct Lexicon {
    stop_words: HashSet<String>,
    suffixes: Vec<String>,
    insight_markers: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::english()
    }
}

impl Lexicon {
    /// The built-in English lexicon
    pub fn english() -> Self {
        Self::new(
            STOP_WORDS.iter().map(|s| s.to_string()).collect(),
            SUFFIXES.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// A lexicon with custom stop words and suffixes
    pub fn new(stop_words: HashSet<String>, suffixes: Vec<String>) -> Self {
        Self {
            stop_words,
            suffixes,
            insight_markers: INSIGHT_MARKERS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Extract concepts from free text
    ///
    /// Lowercases, tokenizes into alphanumeric runs of length ≥ 4, strips
    /// the suffix list, drops stop words and purely numeric tokens,
    /// deduplicates preserving first occurrence, and truncates to 15.
    pub fn extract_concepts(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut seen: HashSet<String> = HashSet::new();
        let mut concepts = Vec::new();

        for token in lowered.split(|c: char| !c.is_alphanumeric()) {
            if token.chars().count() < MIN_TOKEN_LEN {
                continue;
            }
            let stripped = self.strip_suffixes(token);
            if stripped.chars().count() < MIN_TOKEN_LEN {
                continue;
            }
            if self.stop_words.contains(&stripped) {
                continue;
            }
            if stripped.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            if seen.insert(stripped.clone()) {
                concepts.push(stripped);
                if concepts.len() >= MAX_CONCEPTS {
                    break;
                }
            }
        }
        concepts
    }

    /// Pull insight-like sentences from an LLM response: sentences carrying
    /// any marker word, at most three
    pub fn extract_insight_sentences(&self, response: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        for sentence in split_sentences(response) {
            let lowered = sentence.to_lowercase();
            if self.insight_markers.iter().any(|m| lowered.contains(m)) {
                sentences.push(sentence.trim().to_string());
                if sentences.len() >= MAX_INSIGHTS {
                    break;
                }
            }
        }
        sentences
    }

    fn strip_suffixes(&self, token: &str) -> String {
        let mut word = token.to_string();
        for suffix in &self.suffixes {
            if let Some(prefix) = word.strip_suffix(suffix.as_str()) {
                word = prefix.to_string();
            }
        }
        word
    }
}

/// Split on sentence terminators, keeping non-empty fragments
fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_content_words() {
        let lexicon = Lexicon::default();
        let concepts =
            lexicon.extract_concepts("The hash-array-mapped trie supports structural sharing");
        assert_eq!(
            concepts,
            vec!["hash", "array", "mapped", "trie", "supports", "structural", "sharing"]
        );
    }

    #[test]
    fn test_drops_short_and_numeric_tokens() {
        let lexicon = Lexicon::default();
        let concepts = lexicon.extract_concepts("ab 12345 x2y cache 9999");
        assert_eq!(concepts, vec!["cache"]);
    }

    #[test]
    fn test_deduplicates_preserving_order() {
        let lexicon = Lexicon::default();
        let concepts = lexicon.extract_concepts("graph walks graph nodes walks");
        assert_eq!(concepts, vec!["graph", "walks", "nodes"]);
    }

    #[test]
    fn test_caps_at_fifteen() {
        let lexicon = Lexicon::default();
        let text: String = (0..30).map(|i| format!("concept{i:02} ")).collect();
        assert_eq!(lexicon.extract_concepts(&text).len(), 15);
    }

    #[test]
    fn test_stable_output() {
        let lexicon = Lexicon::default();
        let text = "spreading activation over typed association graphs";
        assert_eq!(lexicon.extract_concepts(text), lexicon.extract_concepts(text));
    }

    #[test]
    fn test_suffix_stripping() {
        let lexicon = Lexicon::default();
        let concepts = lexicon.extract_concepts("normalization surprisingly");
        assert_eq!(concepts, vec!["normal", "surpris"]);
    }

    #[test]
    fn test_custom_lexicon() {
        let stop: HashSet<String> = ["dragon".to_string()].into_iter().collect();
        let lexicon = Lexicon::new(stop, vec![]);
        let concepts = lexicon.extract_concepts("dragon castle");
        assert_eq!(concepts, vec!["castle"]);
    }

    #[test]
    fn test_insight_sentences_pick_markers() {
        let lexicon = Lexicon::default();
        let response = "Trees balance themselves. Interestingly, this mirrors B-trees! \
                        There is a deep connection to logarithms. Plain filler here. \
                        Perhaps caching would help? Another interesting angle exists. \
                        Yet more interesting text.";
        let insights = lexicon.extract_insight_sentences(response);
        assert_eq!(insights.len(), 3);
        assert!(insights[0].to_lowercase().contains("interestingly"));
    }

    #[test]
    fn test_insight_sentences_empty_without_markers() {
        let lexicon = Lexicon::default();
        assert!(lexicon
            .extract_insight_sentences("Plain statement. Nothing special here.")
            .is_empty());
    }
}
