use serde::Serialize;

use super::Item;

const AFFIRMATIVE_ANSWER: &str = "true";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    Relevant,
    NotRelevant,
    Errored(String),
}

impl Outcome {
    /// Maps a raw oracle answer to an outcome.
    ///
    /// Only the literal `true` (trimmed, any case) is relevant. Every other answer,
    /// including `yes` or an empty string, is treated as not relevant rather than as a
    /// parse failure.
    pub fn from_answer(answer: &str) -> Self {
        if answer.trim().eq_ignore_ascii_case(AFFIRMATIVE_ANSWER) {
            Outcome::Relevant
        } else {
            Outcome::NotRelevant
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Relevant => "Relevant",
            Outcome::NotRelevant => "Not Relevant",
            Outcome::Errored(_) => "Error",
        }
    }

    pub fn is_errored(&self) -> bool {
        matches!(self, Outcome::Errored(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub text: String,
    pub category: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ClassificationResult {
    pub fn new(item: &Item, outcome: Outcome) -> Self {
        Self {
            text: item.text.clone(),
            category: item.category.clone(),
            outcome,
        }
    }
}
