// src/config.rs
//! Command-line input and environment-driven service configuration.

use crate::api::{NotionStoreConfig, StoreLayout};
use crate::constants::{
    DEFAULT_COMPLETION_BASE_URL, DEFAULT_COMPLETION_MODEL, DEFAULT_COMPLETION_TEMPERATURE,
    DEFAULT_COMPLETION_TIMEOUT_SECS, DEFAULT_NOTION_TIMEOUT_SECS, REFINE_CONFIDENT_WORDS,
    REFINE_MIN_WORDS,
};
use crate::error::AppError;
use crate::model::RawProcessingRequest;
use crate::pipeline::{PipelineSettings, RefinementPolicy};
use crate::types::{ApiKey, DatabaseId, ModelName, ValidatedUrl, ValidationError};
use clap::{Args, Parser, Subcommand};
use std::io::Read;
use std::str::FromStr;
use std::time::Duration;

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Classify, refine and save spoken journal responses",
    long_about = None
)]
pub struct CommandLineInput {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process one journal response and print the result as JSON
    Process(ProcessArgs),
    /// Print the completed prompts as JSON
    CompletedPrompts(CompletedPromptsArgs),
    /// Print the liveness status as JSON
    Health,
    /// Check that the configured Notion database is reachable
    CheckStore,
}

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// JSON request file, or "-" to read it from stdin
    #[arg(short, long, conflicts_with_all = ["transcription", "current_prompt"])]
    pub input: Option<String>,

    /// Transcribed response text
    #[arg(short, long)]
    pub transcription: Option<String>,

    /// Prompt the user was answering (gratitude, desire or brag)
    #[arg(short = 'p', long)]
    pub current_prompt: Option<String>,

    /// Prompts already completed today, comma separated
    #[arg(short, long, value_delimiter = ',')]
    pub completed: Vec<String>,

    /// Pretty-print the JSON output
    #[arg(long, default_value_t = false)]
    pub pretty: bool,

    /// Print the full pipeline report instead of just the result
    #[arg(long, default_value_t = false)]
    pub report: bool,
}

impl ProcessArgs {
    /// Builds the wire request from `--input` or from the inline flags.
    pub fn read_request(&self) -> Result<RawProcessingRequest, AppError> {
        if let Some(input) = &self.input {
            let text = if input == "-" {
                let mut buffer = String::new();
                std::io::stdin().read_to_string(&mut buffer)?;
                buffer
            } else {
                std::fs::read_to_string(input)?
            };
            return Ok(serde_json::from_str(&text)?);
        }

        match (&self.transcription, &self.current_prompt) {
            (Some(transcription), Some(current_prompt)) => Ok(RawProcessingRequest {
                transcription: transcription.clone(),
                current_prompt: current_prompt.clone(),
                completed_prompts: self.completed.clone(),
            }),
            _ => Err(AppError::MalformedRequest(
                "provide --input, or both --transcription and --current-prompt".to_string(),
            )),
        }
    }
}

#[derive(Args, Debug)]
pub struct CompletedPromptsArgs {
    /// Prompts completed so far, comma separated
    #[arg(short, long, value_delimiter = ',')]
    pub completed: Vec<String>,

    /// Read today's completed prompts from the Notion daily page instead
    #[arg(long, default_value_t = false)]
    pub from_notion: bool,
}

/// Settings for the completion service client.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    pub api_key: ApiKey,
    pub base_url: ValidatedUrl,
    pub model: ModelName,
    pub temperature: f32,
    pub timeout: Duration,
}

/// Whether a Notion store can be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotionSetup {
    Configured(NotionStoreConfig),
    Unconfigured { reason: String },
}

/// Service configuration resolved from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub completion_api_key: Option<ApiKey>,
    pub completion_base_url: ValidatedUrl,
    pub completion_model: ModelName,
    pub completion_temperature: f32,
    pub completion_timeout: Duration,
    pub notion: NotionSetup,
    pub refinement: RefinementPolicy,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let invalid = AppError::InvalidConfiguration;

        let completion_api_key = get("OPENAI_API_KEY")
            .map(ApiKey::new)
            .transpose()
            .map_err(invalid)?;

        let completion_base_url = ValidatedUrl::parse(
            &get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_COMPLETION_BASE_URL.to_string()),
        )
        .map_err(invalid)?;

        let completion_model = ModelName::new(
            get("LLM_MODEL").unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.to_string()),
        )
        .map_err(invalid)?;

        let completion_temperature: f32 =
            parse_setting("LLM_TEMPERATURE", get("LLM_TEMPERATURE"), DEFAULT_COMPLETION_TEMPERATURE)
                .map_err(invalid)?;
        if !(0.0..=2.0).contains(&completion_temperature) {
            return Err(invalid(ValidationError::InvalidSetting {
                name: "LLM_TEMPERATURE",
                value: completion_temperature.to_string(),
                reason: "must be between 0 and 2".to_string(),
            }));
        }

        let completion_timeout = parse_timeout(
            "LLM_TIMEOUT_SECS",
            get("LLM_TIMEOUT_SECS"),
            DEFAULT_COMPLETION_TIMEOUT_SECS,
        )
        .map_err(invalid)?;

        let min_words = parse_setting("REFINE_MIN_WORDS", get("REFINE_MIN_WORDS"), REFINE_MIN_WORDS)
            .map_err(invalid)?;
        let confident_words = parse_setting(
            "REFINE_CONFIDENT_WORDS",
            get("REFINE_CONFIDENT_WORDS"),
            REFINE_CONFIDENT_WORDS,
        )
        .map_err(invalid)?;
        let refinement = RefinementPolicy::new(min_words, confident_words).map_err(invalid)?;

        let notion = match (get("NOTION_API_KEY"), get("NOTION_DATABASE_ID")) {
            (Some(key), Some(database)) => {
                let api_key = ApiKey::notion(key).map_err(invalid)?;
                let database_id = DatabaseId::parse(&database).map_err(invalid)?;
                let layout = get("NOTION_LAYOUT")
                    .map(|v| v.parse::<StoreLayout>())
                    .transpose()
                    .map_err(invalid)?
                    .unwrap_or_default();
                let timeout = parse_timeout(
                    "NOTION_TIMEOUT_SECS",
                    get("NOTION_TIMEOUT_SECS"),
                    DEFAULT_NOTION_TIMEOUT_SECS,
                )
                .map_err(invalid)?;
                NotionSetup::Configured(
                    NotionStoreConfig::new(api_key, database_id)
                        .with_layout(layout)
                        .with_timeout(timeout),
                )
            }
            (None, _) => NotionSetup::Unconfigured {
                reason: "NOTION_API_KEY not set".to_string(),
            },
            (_, None) => NotionSetup::Unconfigured {
                reason: "NOTION_DATABASE_ID not set".to_string(),
            },
        };

        Ok(Self {
            completion_api_key,
            completion_base_url,
            completion_model,
            completion_temperature,
            completion_timeout,
            notion,
            refinement,
        })
    }

    /// Completion client settings. Fails when no API key is configured.
    pub fn completion(&self) -> Result<CompletionConfig, AppError> {
        let api_key = self.completion_api_key.clone().ok_or_else(|| {
            AppError::MissingConfiguration("OPENAI_API_KEY environment variable not set".to_string())
        })?;

        Ok(CompletionConfig {
            api_key,
            base_url: self.completion_base_url.clone(),
            model: self.completion_model.clone(),
            temperature: self.completion_temperature,
            timeout: self.completion_timeout,
        })
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings::new(self.refinement)
    }
}

/// A whole number of seconds, at least one.
fn parse_timeout(
    name: &'static str,
    raw: Option<String>,
    default_secs: u64,
) -> Result<Duration, ValidationError> {
    let secs: u64 = parse_setting(name, raw, default_secs)?;
    if secs == 0 {
        return Err(ValidationError::InvalidSetting {
            name,
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn parse_setting<T: FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ValidationError>
where
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse::<T>()
            .map_err(|e| ValidationError::InvalidSetting {
                name,
                reason: e.to_string(),
                value,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServiceConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]).unwrap();
        assert_eq!(config.completion_model.as_str(), "gpt-4o");
        assert_eq!(config.completion_temperature, 0.0);
        assert_eq!(config.completion_timeout, Duration::from_secs(30));
        assert_eq!(config.refinement, RefinementPolicy::default());
        assert_eq!(
            config.notion,
            NotionSetup::Unconfigured {
                reason: "NOTION_API_KEY not set".to_string()
            }
        );
        assert!(matches!(
            config.completion(),
            Err(AppError::MissingConfiguration(_))
        ));
    }

    #[test]
    fn reads_completion_and_notion_settings() {
        let config = config(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("LLM_MODEL", "gpt-4o-mini"),
            ("LLM_TEMPERATURE", "0.2"),
            ("NOTION_API_KEY", "secret_abc"),
            (
                "NOTION_DATABASE_ID",
                "https://www.notion.so/team/Journal-0123456789abcdef0123456789abcdef?v=1",
            ),
            ("NOTION_LAYOUT", "daily-page"),
            ("NOTION_TIMEOUT_SECS", "12"),
            ("REFINE_CONFIDENT_WORDS", "20"),
        ])
        .unwrap();

        let completion = config.completion().unwrap();
        assert_eq!(completion.model.as_str(), "gpt-4o-mini");
        assert_eq!(
            completion.base_url.endpoint("chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(config.refinement.confident_words(), 20);

        match config.notion {
            NotionSetup::Configured(notion) => {
                assert_eq!(notion.database_id.as_str(), "0123456789abcdef0123456789abcdef");
                assert_eq!(notion.layout, StoreLayout::DailyPage);
                assert_eq!(notion.timeout, Duration::from_secs(12));
            }
            other => panic!("expected configured notion, got {:?}", other),
        }
    }

    #[test]
    fn notion_defaults_to_entry_rows_with_a_timeout() {
        let config = config(&[
            ("NOTION_API_KEY", "secret_abc"),
            ("NOTION_DATABASE_ID", "0123456789abcdef0123456789abcdef"),
        ])
        .unwrap();
        let NotionSetup::Configured(notion) = config.notion else {
            panic!("expected configured notion");
        };
        assert_eq!(notion.layout, StoreLayout::EntryRows);
        assert_eq!(notion.timeout, Duration::from_secs(30));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config(&[("NOTION_API_KEY", "secret_abc"), ("NOTION_DATABASE_ID", "  ")]).unwrap();
        assert_eq!(
            config.notion,
            NotionSetup::Unconfigured {
                reason: "NOTION_DATABASE_ID not set".to_string()
            }
        );
    }

    #[test]
    fn rejects_malformed_settings() {
        for vars in [
            vec![("LLM_TEMPERATURE", "warm")],
            vec![("LLM_TEMPERATURE", "3.5")],
            vec![("LLM_TIMEOUT_SECS", "0")],
            vec![("OPENAI_BASE_URL", "ftp://example.com")],
            vec![("REFINE_MIN_WORDS", "10"), ("REFINE_CONFIDENT_WORDS", "5")],
            vec![("NOTION_API_KEY", "abc"), ("NOTION_DATABASE_ID", "0123456789abcdef0123456789abcdef")],
            vec![("NOTION_API_KEY", "secret_abc"), ("NOTION_DATABASE_ID", "0123456789abcdef0123456789abcdef"), ("NOTION_LAYOUT", "grid")],
            vec![("NOTION_API_KEY", "secret_abc"), ("NOTION_DATABASE_ID", "0123456789abcdef0123456789abcdef"), ("NOTION_TIMEOUT_SECS", "0")],
        ] {
            assert!(
                matches!(config(&vars), Err(AppError::InvalidConfiguration(_))),
                "expected rejection for {:?}",
                vars
            );
        }
    }

    #[test]
    fn process_args_build_inline_requests() {
        let cli = CommandLineInput::parse_from([
            "trinity-journal",
            "process",
            "--transcription",
            "I am proud of my talk",
            "--current-prompt",
            "brag",
            "--completed",
            "gratitude,desire",
        ]);
        let Command::Process(args) = cli.command else {
            panic!("expected process subcommand");
        };
        let request = args.read_request().unwrap();
        assert_eq!(request.current_prompt, "brag");
        assert_eq!(request.completed_prompts, vec!["gratitude", "desire"]);
    }

    #[test]
    fn process_args_require_a_source() {
        let cli = CommandLineInput::parse_from(["trinity-journal", "-v", "process"]);
        assert!(cli.verbose);
        let Command::Process(args) = cli.command else {
            panic!("expected process subcommand");
        };
        assert!(matches!(
            args.read_request(),
            Err(AppError::MalformedRequest(_))
        ));
    }
}
