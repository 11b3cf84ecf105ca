//! Coursemate - question answering over structured course documents

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use coursemate::cli::{Cli, Command};
use coursemate::{Config, CourseAssistant, GlmProvider, QueryResponse};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    config.validate()?;

    match cli.command {
        Command::Ingest => {
            // Validation pass: parse and index without serving queries.
            let assistant = build_assistant(config, true)?;
            let (courses, chunks) = assistant.ingest_folder(&cli.docs).await?;
            println!("Indexed {courses} course(s), {chunks} chunk(s) from {}", cli.docs.display());
            for title in assistant.index().course_titles()? {
                println!("  - {title}");
            }
        }
        Command::Ask { question, session } => {
            let assistant = build_assistant(config, false)?;
            ingest_if_present(&assistant, &cli.docs).await?;
            let response = assistant.handle_query(session.as_deref(), &question).await?;
            print_response(&response);
        }
        Command::Chat => {
            let assistant = build_assistant(config, false)?;
            ingest_if_present(&assistant, &cli.docs).await?;
            chat_loop(&assistant).await?;
        }
    }

    Ok(())
}

/// Builds the assistant over the configured GLM provider.
///
/// `offline` skips provider construction (no API key needed) for
/// commands that never call the model.
fn build_assistant(config: Config, offline: bool) -> Result<CourseAssistant> {
    let provider: Arc<dyn coursemate::ModelProvider> = if offline {
        Arc::new(NullProvider)
    } else {
        Arc::new(GlmProvider::new(&config.provider)?)
    };
    Ok(CourseAssistant::new(config, provider))
}

/// Provider used by offline commands; any model call is a bug.
struct NullProvider;

#[async_trait::async_trait]
impl coursemate::ModelProvider for NullProvider {
    async fn complete(
        &self,
        _messages: &[coursemate::Message],
        _tools: Option<&[coursemate::ToolDefinition]>,
    ) -> coursemate::Result<coursemate::ModelResponse> {
        Err(coursemate::CoursemateError::Provider(
            "this command does not call the model".to_string(),
        )
        .into())
    }
}

async fn ingest_if_present(assistant: &CourseAssistant, docs: &std::path::Path) -> Result<()> {
    if docs.is_dir() {
        assistant.ingest_folder(docs).await?;
    } else {
        info!("Document folder {} not found, starting with an empty index", docs.display());
    }
    Ok(())
}

fn print_response(response: &QueryResponse) {
    println!("{}", response.answer);
    if !response.sources.is_empty() {
        println!();
        println!("{}", "Sources:".bold());
        for source in &response.sources {
            match &source.link {
                Some(link) => println!("  {} <{}>", source.label.cyan(), link),
                None => println!("  {}", source.label.cyan()),
            }
        }
    }
}

async fn chat_loop(assistant: &CourseAssistant) -> Result<()> {
    println!("{}", "Coursemate chat. Type 'exit' to quit.".bold());
    let mut editor = DefaultEditor::new()?;
    let mut session_id: Option<String> = None;

    loop {
        match editor.readline("you> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
                    break;
                }
                let _ = editor.add_history_entry(line);

                match assistant.handle_query(session_id.as_deref(), line).await {
                    Ok(response) => {
                        session_id = Some(response.session_id.clone());
                        print_response(&response);
                    }
                    Err(err) => {
                        eprintln!("{} {}", "error:".red().bold(), err);
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}
