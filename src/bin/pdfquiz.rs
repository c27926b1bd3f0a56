//! CLI binary for edgequake-quiz.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GenerationConfig`, runs one boundary function, and prints the result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_quiz::{
    resolve_provider, Difficulty, DocumentInsights, FailurePolicy, GenerationConfig,
    McqRecord, PdfiumTextSource, ProviderCompletionClient, QuizGenerator, QuizOutcome, QuizParams,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Topics and keywords of a lecture
  pdfquiz topics lecture.pdf
  pdfquiz keywords lecture.pdf --json

  # Topics, summary and keywords in one go
  pdfquiz insights lecture.pdf

  # Ten hard questions focused on two topics
  pdfquiz quiz lecture.pdf --difficulty hard --questions 10 \
      --topic "Ownership" --topic "Borrowing"

  # HTTP backend for the web UI
  pdfquiz serve --addr 127.0.0.1:5000

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  GEMINI_API_KEY          Google Gemini API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium — skips auto-download
"#;

/// Derive topics, summaries, keywords and quizzes from PDFs with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "pdfquiz",
    version,
    about = "Derive topics, summaries, keywords and multiple-choice quizzes from PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    llm: LlmArgs,

    /// Output JSON instead of human-readable text.
    #[arg(long, global = true, env = "QUIZ_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "QUIZ_VERBOSE")]
    verbose: bool,

    /// Suppress all logs except errors.
    #[arg(short, long, global = true, env = "QUIZ_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the main topics of a PDF.
    Topics { input: PathBuf },
    /// List the most important keywords of a PDF.
    Keywords { input: PathBuf },
    /// Summarise a PDF in 5–7 sentences.
    Summary { input: PathBuf },
    /// Topics, summary and keywords together; partial results are kept.
    Insights { input: PathBuf },
    /// Generate a multiple-choice quiz.
    Quiz {
        input: PathBuf,

        /// easy, medium or hard (case-insensitive).
        #[arg(short, long, env = "QUIZ_DIFFICULTY")]
        difficulty: Option<Difficulty>,

        /// Number of questions to request.
        #[arg(short = 'n', long, env = "QUIZ_NUM_QUESTIONS",
              value_parser = clap::value_parser!(u32).range(1..))]
        questions: Option<u32>,

        /// Focus topic; repeat for several.
        #[arg(short, long = "topic")]
        topics: Vec<String>,
    },
    /// Serve the HTTP backend for the web UI.
    #[cfg(feature = "server")]
    Serve {
        /// Socket address to bind.
        #[arg(long, env = "QUIZ_ADDR", default_value = "127.0.0.1:5000")]
        addr: std::net::SocketAddr,
    },
}

#[derive(Args, Debug)]
struct LlmArgs {
    /// LLM model ID (e.g. gpt-4.1-nano, gemini-2.0-flash).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_LLM_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "QUIZ_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Max LLM output tokens per call.
    #[arg(long, global = true, env = "QUIZ_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// Quiz attempts while the provider reports quota / rate-limit errors.
    #[arg(long, global = true, env = "QUIZ_MAX_RETRIES", default_value_t = 5)]
    max_retries: u32,

    /// Delay before the first quiz retry, doubled after each retry.
    #[arg(long, global = true, env = "QUIZ_INITIAL_BACKOFF_MS", default_value_t = 1000)]
    initial_backoff_ms: u64,

    /// Characters of document text sent to the LLM.
    #[arg(long, global = true, env = "QUIZ_MAX_CONTEXT_CHARS", default_value_t = 100_000)]
    max_context_chars: usize,

    /// Default quiz difficulty for requests that do not set one.
    #[arg(long, global = true, env = "QUIZ_DEFAULT_DIFFICULTY", default_value = "medium")]
    default_difficulty: Difficulty,

    /// Default question count for requests that do not set one.
    #[arg(long, global = true, env = "QUIZ_DEFAULT_QUESTIONS", default_value_t = 5)]
    default_questions: u32,

    /// Return empty topics / keywords / summary instead of failing on LLM errors.
    #[arg(long, global = true, env = "QUIZ_DEGRADE")]
    degrade: bool,

    /// Path to an existing libpdfium instead of the cached download.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Ensure PDFium engine is available ────────────────────────────────
    // First run downloads the library (~30 MB) into the pdfium-auto cache.
    if cli.llm.pdfium_lib.is_none() && !pdfium_auto::is_pdfium_cached() {
        if !cli.quiet {
            eprintln!("{}", dim("Downloading PDF engine (first run only)…"));
        }
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
    }

    let generator = build_generator(&cli.llm)?;

    match cli.command {
        Command::Topics { input } => {
            let pdf = read_pdf(&input).await?;
            let topics = generator.get_topics(&pdf).await.context("Topic extraction failed")?;
            print_list("Topics", &topics, cli.json)?;
        }
        Command::Keywords { input } => {
            let pdf = read_pdf(&input).await?;
            let keywords = generator
                .get_keywords(&pdf)
                .await
                .context("Keyword extraction failed")?;
            print_list("Keywords", &keywords, cli.json)?;
        }
        Command::Summary { input } => {
            let pdf = read_pdf(&input).await?;
            let summary = generator.get_summary(&pdf).await.context("Summary failed")?;
            if cli.json {
                println!("{}", serde_json::json!({ "summary": summary }));
            } else {
                match summary {
                    Some(s) => println!("{s}"),
                    None => eprintln!("{}", red("No text could be extracted from the PDF.")),
                }
            }
        }
        Command::Insights { input } => {
            let pdf = read_pdf(&input).await?;
            let insights = generator.get_insights(&pdf).await;
            print_insights(&insights, cli.json)?;
        }
        Command::Quiz {
            input,
            difficulty,
            questions,
            topics,
        } => {
            let pdf = read_pdf(&input).await?;
            let config = generator.config();
            let params = QuizParams::new(
                difficulty.unwrap_or(config.default_difficulty),
                questions.unwrap_or(config.default_num_questions),
                topics,
            )?;
            let outcome = generator
                .get_quiz(&pdf, params)
                .await
                .context("Quiz generation failed")?;
            print_quiz(&outcome, cli.json)?;
        }
        #[cfg(feature = "server")]
        Command::Serve { addr } => {
            edgequake_quiz::server::serve(Arc::new(generator), addr)
                .await
                .context("HTTP server failed")?;
        }
    }

    Ok(())
}

/// Map CLI args to a generator.
fn build_generator(args: &LlmArgs) -> Result<QuizGenerator> {
    let mut builder = GenerationConfig::builder()
        .temperature(args.temperature)
        .max_tokens(args.max_tokens)
        .max_retries(args.max_retries)
        .initial_backoff_ms(args.initial_backoff_ms)
        .max_context_chars(args.max_context_chars)
        .default_difficulty(args.default_difficulty)
        .default_num_questions(args.default_questions)
        .failure_policy(if args.degrade {
            FailurePolicy::Degrade
        } else {
            FailurePolicy::Propagate
        });
    if let Some(ref model) = args.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider);
    }
    let config = builder.build().context("Invalid configuration")?;

    let provider = resolve_provider(&config)?;
    let client = Arc::new(ProviderCompletionClient::new(provider, &config));
    let text_source = match args.pdfium_lib {
        Some(ref path) => PdfiumTextSource::with_library_path(path),
        None => PdfiumTextSource::new(),
    };
    Ok(QuizGenerator::new(Arc::new(text_source), client, config))
}

async fn read_pdf(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

fn print_list(title: &str, items: &[String], json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(items).context("Failed to serialise output")?
        );
        return Ok(());
    }
    if items.is_empty() {
        eprintln!("{}", red(&format!("No {} found.", title.to_lowercase())));
        return Ok(());
    }
    println!("{}", bold(title));
    for (i, item) in items.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, item);
    }
    Ok(())
}

fn print_insights(insights: &DocumentInsights, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(insights).context("Failed to serialise output")?
        );
        return Ok(());
    }
    print_list("Topics", &insights.topics, false)?;
    println!();
    println!("{}", bold("Summary"));
    println!("  {}", insights.summary.as_deref().unwrap_or("—"));
    println!();
    print_list("Keywords", &insights.keywords, false)?;
    for failure in &insights.failures {
        eprintln!("{} {}", red("✗"), failure);
    }
    Ok(())
}

fn print_quiz(outcome: &QuizOutcome, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(outcome).context("Failed to serialise output")?
        );
        return Ok(());
    }
    match outcome {
        QuizOutcome::Unavailable { reason } => eprintln!("{} {}", red("✘"), reason),
        QuizOutcome::Questions { questions } => {
            for (i, q) in questions.iter().enumerate() {
                print_question(i + 1, q);
            }
            eprintln!(
                "{} {} questions",
                green("✔"),
                bold(&questions.len().to_string())
            );
        }
    }
    Ok(())
}

fn print_question(n: usize, q: &McqRecord) {
    let Some(ref question) = q.question else {
        // Unparseable block: show it as the model wrote it.
        println!("{}\n{}\n", bold(&format!("Q{n}.")), q.raw);
        return;
    };
    println!("{} {}", bold(&format!("Q{n}.")), question);
    if let Some(ref opts) = q.options {
        for (letter, text) in [("A", &opts.a), ("B", &opts.b), ("C", &opts.c), ("D", &opts.d)] {
            let line = format!("   {letter}. {text}");
            if q.answer.as_deref() == Some(letter) {
                println!("{}", green(&line));
            } else {
                println!("{line}");
            }
        }
    }
    if let Some(ref explanation) = q.explanation {
        println!("   {}", dim(explanation));
    }
    let tags: Vec<&str> = [q.difficulty.as_deref(), q.topic.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !tags.is_empty() {
        println!("   {}", dim(&format!("[{}]", tags.join(" · "))));
    }
    println!();
}
