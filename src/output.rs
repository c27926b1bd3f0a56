//! Result types returned by the generator.
//!
//! Everything here is plain data and `Serialize`, so the HTTP backend and the
//! CLI's `--json` mode can hand results straight to `serde_json`.

use crate::error::ArtifactError;
use serde::{Deserialize, Serialize};

/// One multiple-choice question block from a quiz completion.
///
/// `raw` always starts with [`crate::prompts::QUESTION_MARKER`]. The other
/// fields are a best-effort reading of `raw`; any of them may be `None`
/// when the model left the line out. No field is cross-checked against
/// another (an `answer` of `"E"` is kept as-is).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqRecord {
    /// The block exactly as split from the completion, trimmed.
    pub raw: String,
    pub question: Option<String>,
    pub options: Option<McqOptions>,
    /// Correct option letter, `A`–`D`.
    pub answer: Option<String>,
    pub explanation: Option<String>,
    /// Difficulty label the model assigned to this question.
    pub difficulty: Option<String>,
    /// Topic label the model assigned to this question.
    pub topic: Option<String>,
}

impl McqRecord {
    /// Whether every field was found. Partial records are still valid output.
    pub fn is_complete(&self) -> bool {
        self.question.is_some()
            && self.options.is_some()
            && self.answer.is_some()
            && self.explanation.is_some()
            && self.difficulty.is_some()
            && self.topic.is_some()
    }
}

/// The four lettered options of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqOptions {
    #[serde(rename = "A")]
    pub a: String,
    #[serde(rename = "B")]
    pub b: String,
    #[serde(rename = "C")]
    pub c: String,
    #[serde(rename = "D")]
    pub d: String,
}

/// Outcome of a quiz request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuizOutcome {
    /// Parsed question blocks, in completion order. May be empty if the model
    /// never emitted the question marker.
    Questions { questions: Vec<McqRecord> },
    /// No questions could be produced; `reason` is user-presentable.
    Unavailable { reason: String },
}

impl QuizOutcome {
    /// The wire shape the web front end expects: raw question blocks, or a
    /// single-element list holding the failure description.
    pub fn to_mcq_strings(&self) -> Vec<String> {
        match self {
            QuizOutcome::Questions { questions } => {
                questions.iter().map(|q| q.raw.clone()).collect()
            }
            QuizOutcome::Unavailable { reason } => vec![reason.clone()],
        }
    }

    pub fn questions(&self) -> &[McqRecord] {
        match self {
            QuizOutcome::Questions { questions } => questions,
            QuizOutcome::Unavailable { .. } => &[],
        }
    }
}

/// Topics, summary and keywords for one document.
///
/// Each artifact is produced independently; a failed artifact is left at its
/// degenerate value and its error is recorded in `failures`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInsights {
    pub topics: Vec<String>,
    pub summary: Option<String>,
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ArtifactError>,
}

impl DocumentInsights {
    /// True when no artifact failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::TaskKind;

    fn record(raw: &str) -> McqRecord {
        McqRecord {
            raw: raw.to_string(),
            question: None,
            options: None,
            answer: None,
            explanation: None,
            difficulty: None,
            topic: None,
        }
    }

    #[test]
    fn unavailable_quiz_is_single_reason_entry() {
        let q = QuizOutcome::Unavailable {
            reason: "no text".into(),
        };
        assert_eq!(q.to_mcq_strings(), vec!["no text".to_string()]);
        assert!(q.questions().is_empty());
    }

    #[test]
    fn questions_map_to_raw_blocks() {
        let q = QuizOutcome::Questions {
            questions: vec![record("Question: a"), record("Question: b")],
        };
        assert_eq!(q.to_mcq_strings(), vec!["Question: a", "Question: b"]);
    }

    #[test]
    fn options_serialise_with_letter_keys() {
        let opts = McqOptions {
            a: "1".into(),
            b: "2".into(),
            c: "3".into(),
            d: "4".into(),
        };
        let v = serde_json::to_value(&opts).unwrap();
        assert_eq!(v["A"], "1");
        assert_eq!(v["D"], "4");
    }

    #[test]
    fn insights_omit_empty_failures() {
        let i = DocumentInsights::default();
        let v = serde_json::to_value(&i).unwrap();
        assert!(v.get("failures").is_none());
        assert!(i.is_complete());
    }

    #[test]
    fn insights_with_failure_are_incomplete() {
        let i = DocumentInsights {
            failures: vec![ArtifactError::Provider {
                task: TaskKind::Summary,
                message: "x".into(),
            }],
            ..Default::default()
        };
        assert!(!i.is_complete());
    }
}
