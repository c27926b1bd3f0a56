//! Prompts for every artifact the generator can derive from a document.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing what the model is asked for
//!    (e.g. a different topic count) requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can build and inspect prompts directly
//!    without a live LLM, making prompt regressions easy to catch.
//!
//! The builder is a pure function of `(text, TaskRequest)`. The "exactly N"
//! counts come only from the constants below or from the caller's
//! [`QuizParams`]; nothing here validates that N is reasonable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of topics the topic prompt asks for.
pub const TOPIC_COUNT: usize = 9;

/// Number of keywords/phrases the keyword prompt asks for.
pub const KEYWORD_COUNT: usize = 10;

/// Literal marker that opens every question block in a quiz completion.
pub const QUESTION_MARKER: &str = "Question:";

const INPUT_START: &str = "=== INPUT START ===";
const INPUT_END: &str = "=== INPUT END ===";

// ── Task types ───────────────────────────────────────────────────────────

/// Quiz difficulty. Parsed case-insensitively, rendered capitalised in prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Capitalised label used inside prompts (`"Medium"`).
    pub fn capitalized(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        })
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!(
                "unknown difficulty '{other}' (expected easy, medium or hard)"
            )),
        }
    }
}

impl TryFrom<String> for Difficulty {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Parameters that only the quiz task carries.
///
/// Deserialisation goes through [`QuizParams::new`], so the same checks apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuizParamsFields")]
pub struct QuizParams {
    pub difficulty: Difficulty,
    /// Requested question count. Must be ≥ 1; see [`QuizParams::new`].
    pub num_questions: u32,
    /// Optional topic focus. Empty means "no focus clause".
    #[serde(default)]
    pub focus_topics: Vec<String>,
}

impl QuizParams {
    /// Create quiz parameters, rejecting a zero question count.
    ///
    /// Blank focus topics are dropped so `["", " "]` behaves like no focus.
    pub fn new(
        difficulty: Difficulty,
        num_questions: u32,
        focus_topics: Vec<String>,
    ) -> Result<Self, crate::error::QuizError> {
        if num_questions == 0 {
            return Err(crate::error::QuizError::InvalidRequest(
                "question count must be a positive integer".into(),
            ));
        }
        let focus_topics = focus_topics
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        Ok(Self {
            difficulty,
            num_questions,
            focus_topics,
        })
    }
}

/// Wire shape of [`QuizParams`] before validation.
#[derive(Deserialize)]
struct QuizParamsFields {
    #[serde(default)]
    difficulty: Difficulty,
    num_questions: u32,
    #[serde(default)]
    focus_topics: Vec<String>,
}

impl TryFrom<QuizParamsFields> for QuizParams {
    type Error = crate::error::QuizError;

    fn try_from(f: QuizParamsFields) -> Result<Self, Self::Error> {
        QuizParams::new(f.difficulty, f.num_questions, f.focus_topics)
    }
}

/// One artifact request against a document's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRequest {
    Topics,
    Keywords,
    Summary,
    Quiz(QuizParams),
}

impl TaskRequest {
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskRequest::Topics => TaskKind::Topics,
            TaskRequest::Keywords => TaskKind::Keywords,
            TaskRequest::Summary => TaskKind::Summary,
            TaskRequest::Quiz(_) => TaskKind::Quiz,
        }
    }
}

/// Parameter-free tag of a [`TaskRequest`], used in logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Topics,
    Keywords,
    Summary,
    Quiz,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskKind::Topics => "topics",
            TaskKind::Keywords => "keywords",
            TaskKind::Summary => "summary",
            TaskKind::Quiz => "quiz",
        })
    }
}

// ── Prompt text ──────────────────────────────────────────────────────────

/// Instructions for topic extraction. Expects a JSON array in the reply.
pub fn topics_instructions() -> String {
    format!(
        "You are an intelligent document analyzer.\n\
         Your task is to read the provided text and identify the main topics covered.\n\
         Provide exactly {TOPIC_COUNT} topics. The topics should be concise and relevant to the content.\n\
         Return the topics as a JSON array of strings, for example: [\"Topic 1\", \"Topic 2\", \"Topic 3\"]."
    )
}

/// Instructions for keyword extraction. Expects a JSON array in the reply.
pub fn keywords_instructions() -> String {
    format!(
        "You are a text analyzer.\n\
         Your task is to read the provided text and identify the most important keywords and key phrases.\n\
         Provide exactly {KEYWORD_COUNT} keywords/phrases. They should be concise and directly relevant to the content.\n\
         Return the keywords as a JSON array of strings, for example: [\"Keyword 1\", \"Keyword 2\", \"Keyword 3\"]."
    )
}

/// Instructions for the summary. Free text reply.
pub const SUMMARY_PROMPT: &str = r#"You are an expert summarizer.
Your task is to create a concise and accurate summary of the following text.
The summary should be approximately 5-7 sentences long.
It must capture the main ideas and key points without adding new information."#;

/// Block schema the quiz reply must follow, once per question.
pub const QUIZ_FORMAT: &str = r#"1. Format:
Question: <your question>
Options:
A. <option A>
B. <option B>
C. <option C>
D. <option D>
Answer: <Correct Option Letter>
Explanation: <Short explanation of the correct answer>
Difficulty: <Easy / Medium / Hard>
Topic: <Main concept or subject>"#;

const QUIZ_GUIDELINES: &str = r#"2. Guidelines:
- Use only information from the provided content.
- Avoid vague or trivial questions.
- Distractors must be plausible but incorrect.
- The output should be plain text. Do not use any markdown formatting."#;

// ── Builder ──────────────────────────────────────────────────────────────

/// Build the complete prompt for `task` over `text`.
///
/// `text` is embedded verbatim; callers truncate it to the context window
/// first (see [`crate::pipeline::llm::truncate_to_context`]).
pub fn build_prompt(text: &str, task: &TaskRequest) -> String {
    let instructions = match task {
        TaskRequest::Topics => topics_instructions(),
        TaskRequest::Keywords => keywords_instructions(),
        TaskRequest::Summary => SUMMARY_PROMPT.to_string(),
        TaskRequest::Quiz(params) => quiz_instructions(params),
    };
    format!("{instructions}\n\n{INPUT_START}\n{text} {INPUT_END}\n")
}

/// The focus clause, or `None` when no focus topics were requested.
pub fn focus_instruction(focus_topics: &[String]) -> Option<String> {
    if focus_topics.is_empty() {
        return None;
    }
    Some(format!(
        "The questions should be focused on the following topics: {}.",
        focus_topics.join(", ")
    ))
}

fn quiz_instructions(params: &QuizParams) -> String {
    let n = params.num_questions;
    let mut s = format!(
        "You are an intelligent and structured MCQ (Multiple Choice Question) generator.\n\n\
         Your task is to read the given educational content and create exactly {n} \
         multiple-choice questions (MCQs) that meet the following guidelines. \
         The questions should have a difficulty level of {}.\n\n",
        params.difficulty.capitalized()
    );
    if let Some(focus) = focus_instruction(&params.focus_topics) {
        s.push_str(&focus);
        s.push_str("\n\n");
    }
    s.push_str(QUIZ_FORMAT);
    s.push_str(&format!(
        "\n\nRepeat this format for each of the {n} questions.\n\n"
    ));
    s.push_str(QUIZ_GUIDELINES);
    s
}
