//! Lexical re-scoring of semantic candidates.

use crate::types::{Chunk, ScoredChunk};

/// Query substrings that pull extra boost terms into the search.
const SYNONYMS: &[(&str, &[&str])] = &[
    ("génie", &["engineering", "engineer"]),
    ("informatique", &["computer", "it", "ai"]),
    ("civil", &["civil"]),
    ("upf", &["université", "university", "fès"]),
    ("frais", &["fees", "tuition", "mad"]),
    ("prix", &["fees", "tuition"]),
];

/// Added to the final score per boost term found in a chunk.
pub const BOOST_WEIGHT: f32 = 2.0;

/// Semantic multiplier for general-reference sources with no lexical match.
pub const REFERENCE_DEMOTION: f32 = 0.1;

const REFERENCE_SOURCE_MARKER: &str = "encyclopedia";

/// Terms whose presence in a chunk raises its score.
///
/// Query tokens longer than two characters come first, followed by synonyms
/// of any trigger found in the query. Duplicates are dropped.
pub fn boost_terms(query: &str) -> Vec<String> {
    let lower = query.to_lowercase();
    let mut terms: Vec<String> = Vec::new();

    let tokens = lower.split_whitespace().filter(|t| t.chars().count() > 2);
    let synonyms = SYNONYMS
        .iter()
        .filter(|(trigger, _)| lower.contains(trigger))
        .flat_map(|(_, words)| words.iter().copied());

    for term in tokens.chain(synonyms) {
        if !terms.iter().any(|t| t == term) {
            terms.push(term.to_string());
        }
    }

    terms
}

/// `1 / (1 + distance)`.
pub fn semantic_score(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}

/// Score one candidate against the boost terms.
pub fn score_candidate(chunk: Chunk, distance: f32, terms: &[String]) -> ScoredChunk {
    let boost_matches = terms
        .iter()
        .filter(|term| chunk.normalized_text.contains(term.as_str()))
        .count();

    let mut semantic = semantic_score(distance);
    if boost_matches == 0 && chunk.source.to_lowercase().contains(REFERENCE_SOURCE_MARKER) {
        semantic *= REFERENCE_DEMOTION;
    }

    ScoredChunk {
        final_score: semantic + BOOST_WEIGHT * boost_matches as f32,
        semantic_score: semantic,
        boost_matches,
        distance,
        chunk,
    }
}

/// Re-score candidates given nearest first and keep the best `top_k`.
///
/// The sort is stable, so equal scores keep neighbour order.
pub fn rank(query: &str, candidates: Vec<(Chunk, f32)>, top_k: usize) -> Vec<ScoredChunk> {
    let terms = boost_terms(query);
    tracing::debug!("Boost terms for query: {:?}", terms);

    let mut scored: Vec<ScoredChunk> = candidates
        .into_iter()
        .map(|(chunk, distance)| score_candidate(chunk, distance, &terms))
        .collect();

    scored.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));
    scored.truncate(top_k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boost_terms_tokens_and_synonyms() {
        let terms = boost_terms("Frais du génie informatique à UPF");
        assert_eq!(
            terms,
            vec![
                "frais",
                "génie",
                "informatique",
                "upf",
                "engineering",
                "engineer",
                "computer",
                "it",
                "ai",
                "université",
                "university",
                "fès",
                "fees",
                "tuition",
                "mad",
            ]
        );
    }

    #[test]
    fn test_short_tokens_dropped() {
        assert_eq!(boost_terms("is it ok"), Vec::<String>::new());
    }

    #[test]
    fn test_semantic_score() {
        assert_eq!(semantic_score(0.0), 1.0);
        assert_eq!(semantic_score(1.0), 0.5);
    }

    #[test]
    fn test_boost_outranks_closer_candidate() {
        let near = Chunk::new("campus.txt", 0, "The library is open late.");
        let far = Chunk::new("fees.txt", 0, "Computer engineering tuition fees.");
        let ranked = rank(
            "computer engineering tuition",
            vec![(near, 0.0), (far, 3.5)],
            2,
        );

        assert_eq!(ranked[0].chunk.source, "fees.txt");
        assert_eq!(ranked[0].boost_matches, 3);
        assert_eq!(ranked[1].boost_matches, 0);
    }

    #[test]
    fn test_reference_source_demoted_without_match() {
        let chunk = Chunk::new("world_encyclopedia.txt", 0, "Morocco is in North Africa.");
        let scored = score_candidate(chunk, 0.0, &["tuition".to_string()]);
        assert!((scored.final_score - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_reference_source_kept_with_match() {
        let chunk = Chunk::new("Encyclopedia.txt", 0, "Tuition in Morocco varies.");
        let scored = score_candidate(chunk, 0.0, &["tuition".to_string()]);
        assert!((scored.final_score - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_ties_keep_neighbour_order() {
        let a = Chunk::new("a.txt", 0, "alpha");
        let b = Chunk::new("b.txt", 0, "beta");
        let ranked = rank("zzz", vec![(a, 1.0), (b, 1.0)], 2);
        assert_eq!(ranked[0].chunk.source, "a.txt");
        assert_eq!(ranked[1].chunk.source, "b.txt");
    }
}
