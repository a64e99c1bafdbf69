// src/main.rs

use anyhow::{bail, Context};
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Logger, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use serde::Serialize;
use std::fs;
use std::sync::Arc;
use trinity_journal::companion::completed_prompts_from_labels;
use trinity_journal::config::{CompletedPromptsArgs, ProcessArgs};
use trinity_journal::{
    health, AppError, Command, CommandLineInput, DocumentStore, JournalPipeline,
    NotionJournalStore, NotionSetup, OpenAiCompletionClient, ProcessingRequest, ServiceConfig,
    UnconfiguredStore,
};

/// Sets up logging configuration.
///
/// Logs go to stderr so stdout carries only the JSON output.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("trinity_journal.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stderr_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let mut builder = Config::builder();
    // HTTP stack internals are noisy at debug level.
    for noisy in ["hyper", "hyper_util", "h2", "reqwest", "rustls"] {
        builder = builder.logger(Logger::builder().build(noisy, LevelFilter::Warn));
    }

    let config = builder
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(log_level)))
                .build("stderr", Box::new(stderr_appender)),
        )
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .build(
            Root::builder()
                .appender("stderr")
                .appender("file")
                .build(LevelFilter::Debug),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", rendered);
    Ok(())
}

/// Builds the document store: Notion when configured, otherwise a store
/// that reports every write as not saved.
fn build_store(config: &ServiceConfig) -> Result<Arc<dyn DocumentStore>, AppError> {
    match &config.notion {
        NotionSetup::Configured(notion) => Ok(Arc::new(NotionJournalStore::new(notion.clone())?)),
        NotionSetup::Unconfigured { reason } => {
            log::warn!("Notion integration is not configured ({}); entries will not be saved", reason);
            Ok(Arc::new(UnconfiguredStore::new(reason.clone())))
        }
    }
}

fn notion_store(config: &ServiceConfig) -> anyhow::Result<NotionJournalStore> {
    match &config.notion {
        NotionSetup::Configured(notion) => Ok(NotionJournalStore::new(notion.clone())?),
        NotionSetup::Unconfigured { reason } => bail!("Notion is not configured: {}", reason),
    }
}

async fn process(args: ProcessArgs) -> anyhow::Result<()> {
    let raw = args.read_request().context("Failed to read the journal request")?;
    let request = ProcessingRequest::try_from(raw).map_err(AppError::from)?;

    let config = ServiceConfig::from_env()?;
    let completion = OpenAiCompletionClient::new(&config.completion()?)
        .context("Failed to create the completion client")?;
    let store = build_store(&config).context("Failed to create the document store")?;
    let pipeline = JournalPipeline::new(Arc::new(completion), store, config.pipeline_settings())?;

    if args.report {
        let report = pipeline.process_with_report(&request).await?;
        print_json(&report, args.pretty)
    } else {
        let result = pipeline.process(&request).await?;
        print_json(&result, args.pretty)
    }
}

async fn completed(args: CompletedPromptsArgs) -> anyhow::Result<()> {
    let prompts = if args.from_notion {
        let config = ServiceConfig::from_env()?;
        notion_store(&config)?
            .completed_prompts_today()
            .await
            .context("Failed to read completed prompts from Notion")?
    } else {
        completed_prompts_from_labels(&args.completed).map_err(AppError::from)?
    };
    print_json(&prompts, false)
}

async fn check_store() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env()?;
    let store = notion_store(&config)?;
    store
        .check_access()
        .await
        .context("Notion database is not accessible")?;
    print_json(
        &serde_json::json!({
            "status": "ok",
            "database_id": store.config().database_id.to_string(),
            "layout": store.config().layout.to_string(),
        }),
        false,
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose).map_err(|e| anyhow::anyhow!("Failed to set up logging: {}", e))?;

    match cli.command {
        Command::Process(args) => process(args).await,
        Command::CompletedPrompts(args) => completed(args).await,
        Command::Health => print_json(&health(), false),
        Command::CheckStore => check_store().await,
    }
}
