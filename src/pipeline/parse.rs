//! Response parsing: tolerant extraction of structure from LLM completions.
//!
//! ## Why tolerant?
//!
//! Even well-prompted models wrap the requested JSON array in prose
//! ("Sure! Here are the topics: [...] Let me know if ..."), number their
//! questions, or forget a line. Every function here is a pure `&str → T`
//! that returns a degenerate value (empty `Vec`, `None` field) instead of an
//! error when the model formatted things oddly. Callers never see a parse
//! error.
//!
//! ## What is NOT checked
//!
//! No semantic validation happens: an answer letter that matches none of the
//! options, a duplicate option, or a missing explanation all pass through.

use crate::output::{McqOptions, McqRecord};
use crate::prompts::QUESTION_MARKER;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

// ── JSON-array extraction (topics, keywords) ─────────────────────────────────

/// Shortest bracketed span: first `[` to the first `]` after it, across lines.
static RE_JSON_ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*?\]").unwrap());

/// Extract the first JSON array of strings embedded anywhere in `raw`.
///
/// Returns an empty `Vec` when there is no bracketed span or the span is not
/// valid JSON. Scalar non-string elements are stringified (`3` → `"3"`);
/// `null` and nested containers are skipped.
///
/// The match is non-greedy, so a nested array (`["a", ["b"]]`) is cut at the
/// first `]` and fails to parse. Models asked for a flat list of strings do
/// not produce those.
pub fn extract_json_array(raw: &str) -> Vec<String> {
    let Some(m) = RE_JSON_ARRAY.find(raw) else {
        return Vec::new();
    };
    match serde_json::from_str::<Value>(m.as_str()) {
        Ok(Value::Array(items)) => items.into_iter().filter_map(value_to_string).collect(),
        _ => Vec::new(),
    }
}

fn value_to_string(v: Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

// ── MCQ block splitting (quiz) ───────────────────────────────────────────────

/// Split a quiz completion into question blocks.
///
/// Splits on [`QUESTION_MARKER`], drops everything before the first marker,
/// re-prepends the marker to each remaining segment and trims it. Segments
/// with nothing but whitespace after the marker are dropped. Every returned
/// block therefore starts with the marker and has some content after it.
pub fn split_mcq_blocks(raw: &str) -> Vec<String> {
    raw.split(QUESTION_MARKER)
        .skip(1)
        .filter(|segment| !segment.trim().is_empty())
        .map(|segment| format!("{QUESTION_MARKER}{segment}").trim().to_string())
        .collect()
}

/// Split a quiz completion and parse every block into an [`McqRecord`].
pub fn parse_quiz(raw: &str) -> Vec<McqRecord> {
    split_mcq_blocks(raw)
        .into_iter()
        .map(parse_mcq_block)
        .collect()
}

// ── MCQ field extraction ─────────────────────────────────────────────────────

static RE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(question|options|answer|explanation|difficulty|topic)\s*:\s*(.*)$")
        .unwrap()
});

static RE_OPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\(?([A-Da-d])[\.\)]\s*(.*)$").unwrap());

static RE_ANSWER_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(?([A-Da-d])(?:$|[^A-Za-z])").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Question,
    Options,
    Option(usize),
    Answer,
    Explanation,
    Difficulty,
    Topic,
}

#[derive(Default)]
struct Fields {
    question: Option<String>,
    options: [Option<String>; 4],
    answer: Option<String>,
    explanation: Option<String>,
    difficulty: Option<String>,
    topic: Option<String>,
}

impl Fields {
    fn slot(&mut self, field: Field) -> Option<&mut Option<String>> {
        match field {
            Field::Question => Some(&mut self.question),
            Field::Options => None,
            Field::Option(i) => self.options.get_mut(i),
            Field::Answer => Some(&mut self.answer),
            Field::Explanation => Some(&mut self.explanation),
            Field::Difficulty => Some(&mut self.difficulty),
            Field::Topic => Some(&mut self.topic),
        }
    }

    /// Append `text` to `field`, joining continuation lines with a space.
    fn push(&mut self, field: Field, text: &str) {
        let text = text.trim();
        let Some(slot) = self.slot(field) else {
            return;
        };
        if text.is_empty() {
            return;
        }
        match slot {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(text);
            }
            None => *slot = Some(text.to_string()),
        }
    }
}

/// Read the labelled fields out of one question block.
///
/// Lines are matched against the block schema from the quiz prompt
/// (`Question:`, `Options:`, `A.`–`D.`, `Answer:`, `Explanation:`,
/// `Difficulty:`, `Topic:`); unlabelled lines continue the previous field.
/// Option letters are only recognised after `Options:` or another option,
/// so a question text that happens to start with "A." is not misread.
pub fn parse_mcq_block(block: String) -> McqRecord {
    let mut fields = Fields::default();
    let mut current: Option<Field> = None;

    for line in block.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let in_options = matches!(current, Some(Field::Options) | Some(Field::Option(_)));
        if in_options {
            if let Some(caps) = RE_OPTION.captures(line) {
                let letter = caps[1].to_ascii_uppercase();
                let idx = (letter.as_bytes()[0] - b'A') as usize;
                current = Some(Field::Option(idx));
                fields.push(Field::Option(idx), &caps[2]);
                continue;
            }
        }

        if let Some(caps) = RE_LABEL.captures(line) {
            let field = match caps[1].to_ascii_lowercase().as_str() {
                "question" => Field::Question,
                "options" => Field::Options,
                "answer" => Field::Answer,
                "explanation" => Field::Explanation,
                "difficulty" => Field::Difficulty,
                _ => Field::Topic,
            };
            current = Some(field);
            fields.push(field, &caps[2]);
            continue;
        }

        if let Some(field) = current {
            fields.push(field, line);
        }
    }

    let answer = fields.answer.as_deref().and_then(|a| {
        RE_ANSWER_LETTER
            .captures(a.trim())
            .map(|caps| caps[1].to_ascii_uppercase())
    });

    let [a, b, c, d] = fields.options;
    let options = match (a, b, c, d) {
        (Some(a), Some(b), Some(c), Some(d)) => Some(McqOptions { a, b, c, d }),
        _ => None,
    };

    McqRecord {
        raw: block,
        question: fields.question,
        options,
        answer,
        explanation: fields.explanation,
        difficulty: fields.difficulty,
        topic: fields.topic,
    }
}
