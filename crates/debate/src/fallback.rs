//! Deterministic local debate used when no model is reachable.
//!
//! The query is matched against an ordered topic table. Each topic names the
//! chunks the advocate and skeptic should quote (by source and content
//! markers) and a fixed synthesis. The transcript always has four turns.

use crate::intent::QueryTerms;
use crate::roles::{ADJUDICATOR, ADVOCATE, SKEPTIC, SYNTHESIZER};
use crate::types::Turn;
use agora_knowledge::Chunk;

/// Topics the local debate knows about, in matching order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Cost,
    Placement,
    Scholarship,
    Housing,
    StudyAbroad,
}

/// Selects the first chunk whose source contains `source_marker` (when set)
/// and whose lower-cased content contains any of `content_markers`.
#[derive(Debug)]
struct ChunkPick {
    source_marker: Option<&'static str>,
    content_markers: &'static [&'static str],
}

impl ChunkPick {
    const fn content(content_markers: &'static [&'static str]) -> Self {
        Self {
            source_marker: None,
            content_markers,
        }
    }

    fn matches(&self, chunk: &Chunk) -> bool {
        let source_ok = self
            .source_marker
            .map_or(true, |marker| chunk.source.to_lowercase().contains(marker));
        source_ok
            && self
                .content_markers
                .iter()
                .any(|marker| chunk.normalized_text.contains(marker))
    }
}

#[derive(Debug)]
struct TopicRule {
    topic: Topic,
    triggers: &'static [&'static str],
    /// Tried in order; the first pick that finds a chunk wins
    advocate_picks: &'static [ChunkPick],
    skeptic_picks: &'static [ChunkPick],
    synthesis: &'static str,
}

const COST_SYNTHESIS: &str = "STEP 1 — DIRECT ANSWER:
The total estimated cost for Computer Engineering is approx. 68,300 MAD.

STEP 2 — BREAKDOWN:
- Tuition: 55,000 MAD
- Registration: 5,000 MAD
- Insurance/Library: 1,300 MAD
- AI Lab Fee: 5,000 MAD (Hidden)
- Cloud Sub: ~2,000 MAD (Hidden)

STEP 3 — CONTEXT:
Mandatory hidden fees apply.";

const PLACEMENT_SYNTHESIS: &str = "STEP 1 — DIRECT ANSWER:
40% placement in Casablanca, vs 100% in Fes.

STEP 2 — BREAKDOWN:
- Fes-Meknes: 100% Placement (High Demand)
- Casablanca: 40% Placement (High Competition)

STEP 3 — CONTEXT:
UPF graduates face stiff competition from EMI/EHTP in Casablanca. Mandatory internships are often unpaid.";

const SCHOLARSHIP_SYNTHESIS: &str = "STEP 1 — DIRECT ANSWER:
No, it is not guaranteed. It can be cancelled immediately.

STEP 2 — CONDITIONS:
- Requirement: Annual average > 12/20.
- Penalty: Cancellation if average drops.
- Risk: Permanently lost if year is repeated.

STEP 3 — CONTEXT:
This 'Article 12' rule is strictly enforced.";

const HOUSING_SYNTHESIS: &str = "STEP 1 — DIRECT ANSWER:
Only 150 spots available for 600 students. Not guaranteed.

STEP 2 — BREAKDOWN:
- Availability: 25% of class only (First come, first served).
- Hidden Cost: Electricity ~400 MAD/month (Not included).
- Transport: Shuttle limited; Taxis cost ~1500 MAD/month.

STEP 3 — CONTEXT:
Gym access is restricted to off-peak hours.";

const ABROAD_SYNTHESIS: &str = "STEP 1 — DIRECT ANSWER:
Restricted to Top 5% of students only. Costs are double.

STEP 2 — BREAKDOWN:
- Eligibility: Top 5% academic performance only.
- Cost: Must pay tuition to BOTH UPF and Partner Uni.
- Risk: 30% Visa rejection rate.

STEP 3 — CONTEXT:
The 'Double Degree' is an elite track, not a standard option.";

const TOPIC_RULES: &[TopicRule] = &[
    TopicRule {
        topic: Topic::Cost,
        triggers: &[
            "cost", "costs", "price", "prices", "fee", "fees", "tuition", "much",
        ],
        advocate_picks: &[
            ChunkPick {
                source_marker: Some("master"),
                content_markers: &["55,000", "frais"],
            },
            ChunkPick::content(&["55,000"]),
        ],
        skeptic_picks: &[ChunkPick::content(&["hidden cost"])],
        synthesis: COST_SYNTHESIS,
    },
    TopicRule {
        topic: Topic::Placement,
        triggers: &[
            "job", "jobs", "work", "career", "careers", "placement", "civil",
        ],
        advocate_picks: &[ChunkPick::content(&["section 7", "partnerships"])],
        skeptic_picks: &[ChunkPick::content(&["real placement stats", "disparity"])],
        synthesis: PLACEMENT_SYNTHESIS,
    },
    TopicRule {
        topic: Topic::Scholarship,
        triggers: &["scholarship", "bourse", "merit"],
        advocate_picks: &[ChunkPick::content(&["section 9", "merit"])],
        skeptic_picks: &[ChunkPick::content(&["article 12", "cancelled"])],
        synthesis: SCHOLARSHIP_SYNTHESIS,
    },
    TopicRule {
        topic: Topic::Housing,
        triggers: &["housing", "dorm", "dorms", "accommodation", "living", "campus"],
        advocate_picks: &[ChunkPick::content(&["section 10", "on-campus"])],
        skeptic_picks: &[ChunkPick::content(&["housing reality", "availability crisis"])],
        synthesis: HOUSING_SYNTHESIS,
    },
    TopicRule {
        topic: Topic::StudyAbroad,
        triggers: &["abroad", "international", "exchange", "double degree", "visa"],
        advocate_picks: &[ChunkPick::content(&["section 11", "mobility"])],
        skeptic_picks: &[ChunkPick::content(&[
            "double degree myth",
            "eligibility restriction",
            "visa issues",
        ])],
        synthesis: ABROAD_SYNTHESIS,
    },
];

const NOT_FOUND: &str = "Information not found.";
const DEFAULT_SOURCE: &str = "Documents";
const NO_CONTRADICTIONS: &str = "No contradictions found.";

const GENERIC_ADVOCATE: &str = "Documents available.";
const GENERIC_SKEPTIC: &str = "Please ask about Costs, Jobs, Scholarships, Housing, or Study Abroad.";
const GENERIC_SYNTHESIS: &str = "Please refine your question.";

const JUDGE_VERDICT: &str =
    "Evaluation: Pro cited official brochure. Contra cited internal HR/Finance memos.\nScore: 9/10.";

/// First topic whose triggers appear in the query.
pub fn detect_topic(query: &str) -> Option<Topic> {
    let terms = QueryTerms::new(query);
    TOPIC_RULES
        .iter()
        .find(|rule| terms.matches_any(rule.triggers))
        .map(|rule| rule.topic)
}

fn pick<'a>(picks: &[ChunkPick], chunks: &'a [Chunk]) -> Option<&'a Chunk> {
    picks
        .iter()
        .find_map(|p| chunks.iter().find(|chunk| p.matches(chunk)))
}

/// Build the four-turn local transcript.
pub fn local_debate(query: &str, chunks: &[Chunk]) -> Vec<Turn> {
    let terms = QueryTerms::new(query);
    let rule = TOPIC_RULES
        .iter()
        .find(|rule| terms.matches_any(rule.triggers));

    let (advocate_source, advocate_content, skeptic_content, synthesis) = match rule {
        Some(rule) => {
            tracing::info!(topic = ?rule.topic, "Local debate topic");
            let advocate = pick(rule.advocate_picks, chunks);
            let skeptic = pick(rule.skeptic_picks, chunks);
            (
                advocate.map_or(DEFAULT_SOURCE, |c| c.source.as_str()),
                advocate.map_or(NOT_FOUND, |c| c.text.as_str()),
                skeptic.map_or(NO_CONTRADICTIONS, |c| c.text.as_str()),
                rule.synthesis,
            )
        }
        None => {
            tracing::info!("No local debate topic matched");
            (DEFAULT_SOURCE, GENERIC_ADVOCATE, GENERIC_SKEPTIC, GENERIC_SYNTHESIS)
        }
    };

    vec![
        Turn::new(
            ADVOCATE.name,
            format!(
                "Direct Answer based on {}:\nThe official data states:\n\n{}\n\nI confirm the positive outlook.",
                advocate_source, advocate_content
            ),
        ),
        Turn::new(
            SKEPTIC.name,
            format!(
                "WAIT! You missed the 'Internal Confidential' data:\n\n{}\n\nThe reality is different.",
                skeptic_content
            ),
        ),
        Turn::new(ADJUDICATOR.name, JUDGE_VERDICT),
        Turn::new(SYNTHESIZER.name, synthesis),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agents(turns: &[Turn]) -> Vec<&str> {
        turns.iter().map(|t| t.agent.as_str()).collect()
    }

    #[test]
    fn test_topic_order() {
        assert_eq!(detect_topic("how much does housing cost"), Some(Topic::Cost));
        assert_eq!(detect_topic("civil engineering jobs"), Some(Topic::Placement));
        assert_eq!(detect_topic("merit bourse"), Some(Topic::Scholarship));
        assert_eq!(detect_topic("is there a dorm"), Some(Topic::Housing));
        assert_eq!(detect_topic("double degree in France"), Some(Topic::StudyAbroad));
        assert_eq!(detect_topic("what about scholarships"), None);
    }

    #[test]
    fn test_plural_triggers() {
        assert_eq!(detect_topic("What are the fees?"), Some(Topic::Cost));
        assert_eq!(detect_topic("Tuition costs and prices"), Some(Topic::Cost));
        assert_eq!(detect_topic("Any jobs in Casablanca?"), Some(Topic::Placement));
        assert_eq!(detect_topic("Which careers open up?"), Some(Topic::Placement));
        assert_eq!(detect_topic("Are there dorms?"), Some(Topic::Housing));
    }

    #[test]
    fn test_cost_intent_gets_cost_topic() {
        let query = "What are the fees?";
        assert_eq!(
            crate::intent::classify_intent(query),
            crate::types::IntentLabel::FactualComparative
        );
        let turns = local_debate(query, &[]);
        assert!(turns[3].content.contains("68,300 MAD"));
    }

    #[test]
    fn test_tuition_scenario() {
        let chunks = vec![Chunk::new("tuition.txt", 0, "Computer Engineering tuition is 55,000 MAD")];
        let turns = local_debate("how much does computer engineering cost", &chunks);

        assert_eq!(
            agents(&turns),
            vec!["Agent_Pro", "Agent_Contra", "Agent_Judge", "Agent_Synthesizer"]
        );
        assert!(turns[0].content.contains("Direct Answer based on tuition.txt"));
        assert!(turns[0].content.contains("55,000 MAD"));
        assert!(turns[1].content.contains("No contradictions found."));
        assert!(turns[2].content.ends_with("Score: 9/10."));
        assert!(turns[3].content.contains("STEP 1"));
        assert!(turns[3].content.contains("55,000 MAD"));
        assert!(turns[3].content.contains("68,300 MAD"));
    }

    #[test]
    fn test_master_source_preferred_for_cost() {
        let chunks = vec![
            Chunk::new("brochure.txt", 0, "Tuition: 55,000 MAD per year"),
            Chunk::new("master_plan.txt", 0, "Frais de scolarité: 55,000 MAD"),
            Chunk::new("memo.txt", 0, "HIDDEN COST: AI lab fee of 5,000 MAD"),
        ];
        let turns = local_debate("tuition price", &chunks);

        assert!(turns[0].content.contains("based on master_plan.txt"));
        assert!(turns[1].content.contains("HIDDEN COST: AI lab fee"));
    }

    #[test]
    fn test_missing_chunks_use_defaults() {
        let turns = local_debate("housing on campus", &[]);
        assert!(turns[0].content.contains("based on Documents"));
        assert!(turns[0].content.contains("Information not found."));
        assert!(turns[3].content.contains("150 spots"));
    }

    #[test]
    fn test_generic_refine() {
        let chunks = vec![Chunk::new("scholarships.txt", 0, "Merit scholarships exist.")];
        let turns = local_debate("what about scholarships", &chunks);

        assert_eq!(turns.len(), 4);
        assert!(turns[0].content.contains("Documents available."));
        assert!(turns[1].content.contains("Please ask about Costs"));
        assert_eq!(turns[3].content, "Please refine your question.");
    }

    #[test]
    fn test_abroad_skeptic_markers() {
        let chunks = vec![
            Chunk::new("brochure.txt", 2, "Section 11: Mobility to 40 partner universities."),
            Chunk::new("memo.txt", 5, "Visa issues: 30% of applications rejected."),
        ];
        let turns = local_debate("study abroad options", &chunks);
        assert!(turns[0].content.contains("Section 11"));
        assert!(turns[1].content.contains("Visa issues"));
        assert!(turns[3].content.starts_with("STEP 1 — DIRECT ANSWER:\nRestricted to Top 5%"));
    }
}
