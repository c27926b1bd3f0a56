//! Test doubles shared by the integration tests.
//!
//! Nothing here touches pdfium or the network: documents come from
//! [`FixedText`], completions from [`ScriptedClient`], and backoff waits are
//! recorded by [`RecordingSleeper`] instead of slept.

#![allow(dead_code)]

use async_trait::async_trait;
use edgequake_quiz::{
    CompletionClient, GenerationConfig, ProviderError, QuizGenerator, Sleeper, TextSource,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Returns the same text for every document.
pub struct FixedText(pub Option<String>);

impl FixedText {
    pub fn text(s: &str) -> Self {
        Self(Some(s.to_string()))
    }

    pub fn unreadable() -> Self {
        Self(None)
    }
}

impl TextSource for FixedText {
    fn extract_text(&self, _bytes: &[u8]) -> Option<String> {
        self.0.clone()
    }
}

/// Replies from a script, one entry per call. The last entry repeats once the
/// script runs out.
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<String, String>>>,
    last: Mutex<Option<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(script: Vec<Result<&str, &str>>) -> Self {
        let script = script
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        Self {
            script: Mutex::new(script),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(vec![Ok(text)])
    }

    pub fn failing(message: &str) -> Self {
        Self::new(vec![Err(message)])
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.script.lock().unwrap().pop_front();
        let reply = match next {
            Some(r) => {
                *self.last.lock().unwrap() = Some(r.clone());
                r
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err("script is empty".to_string())),
        };
        reply.map_err(ProviderError::new)
    }
}

/// Records requested delays and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper(Mutex<Vec<Duration>>);

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.0.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.0.lock().unwrap().push(duration);
    }
}

/// A generator over the given doubles.
pub fn generator(
    text: FixedText,
    client: Arc<ScriptedClient>,
    sleeper: Arc<RecordingSleeper>,
    config: GenerationConfig,
) -> QuizGenerator {
    QuizGenerator::new(Arc::new(text), client, config).with_sleeper(sleeper)
}

pub const LECTURE: &str = "Photosynthesis converts light energy into chemical energy. \
    Chlorophyll absorbs mostly blue and red light. The Calvin cycle fixes carbon dioxide.";

pub const TWO_QUESTIONS: &str = "Here is your quiz.

Question: What pigment absorbs light in plants?
Options:
A) Chlorophyll
B) Keratin
C) Melanin
D) Hemoglobin
Answer: A
Explanation: Chlorophyll is the primary photosynthetic pigment.
Difficulty: Easy
Topic: Pigments

Question: Which cycle fixes carbon dioxide?
Options:
A) Krebs cycle
B) Calvin cycle
C) Urea cycle
D) Cori cycle
Answer: B
Explanation: The Calvin cycle incorporates CO2 into sugars.
Difficulty: Easy
Topic: Carbon fixation
";
