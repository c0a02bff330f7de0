//! Static role definitions for the four debate agents.

/// Identity and standing instruction of a debate agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleDefinition {
    /// Agent name as it appears in the transcript
    pub name: &'static str,
    pub role_label: &'static str,
    pub instruction: &'static str,
}

/// Answers the query directly from the context.
pub const ADVOCATE: RoleDefinition = RoleDefinition {
    name: "Agent_Pro",
    role_label: "Direct Answerer",
    instruction: "Your goal is to answer the user query DIRECTLY based on the provided context. \
        If the question is quantitative (e.g., costs), you MUST compute the value, list base costs, \
        mandatory fees, and calculate the total. Do not talk about strategy or admissions unless asked.",
};

/// Looks for what the advocate missed.
pub const SKEPTIC: RoleDefinition = RoleDefinition {
    name: "Agent_Contra",
    role_label: "Gap Finder",
    instruction: "Your goal is to find missing data or hidden factors that affect the answer. \
        For cost questions, look for hidden fees (lab fees, subscriptions) that Agent_Pro missed. \
        Do NOT change the topic. Do NOT debate philosophy if the question is factual.",
};

/// Scores the exchange; the first number in its reply is the score.
pub const ADJUDICATOR: RoleDefinition = RoleDefinition {
    name: "Agent_Judge",
    role_label: "Strict Evaluator",
    instruction: "Evaluate: 1. Did they answer the specific question? 2. Are calculations correct? \
        3. Is evidence cited? SCORE 0 if the final numeric answer is missing for a cost question.",
};

/// Produces the final structured answer.
pub const SYNTHESIZER: RoleDefinition = RoleDefinition {
    name: "Agent_Synthesizer",
    role_label: "Final Reformatter",
    instruction: "You MUST output the final answer in this exact format:\n\
        STEP 1 — DIRECT ANSWER: [The final number/conclusion]\n\
        STEP 2 — BREAKDOWN: [List of items and costs]\n\
        STEP 3 — CONTEXT: [Only if strict constraints/warnings apply]\n\
        Do not add conversational text.",
};

/// All roles in transcript order.
pub const ALL_ROLES: [RoleDefinition; 4] = [ADVOCATE, SKEPTIC, ADJUDICATOR, SYNTHESIZER];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        for (i, a) in ALL_ROLES.iter().enumerate() {
            for b in &ALL_ROLES[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_synthesizer_demands_step_format() {
        assert!(SYNTHESIZER.instruction.contains("STEP 1 — DIRECT ANSWER"));
        assert!(SYNTHESIZER.instruction.contains("\nSTEP 2"));
    }
}
