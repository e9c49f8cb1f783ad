use std::path::PathBuf;

use bitrans_core::{LlmConfig, SplitSide, TranslateConfig, TranslationScope};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::platform::logging::LogDestination;
use crate::platform::SETTINGS_FILENAME;

#[derive(Debug, Parser)]
#[command(name = "bitrans", version)]
#[command(about = "Batch LLM translation for bilingual text projects", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (LLM endpoint, translation settings, prompts).
    #[arg(long, global = true, value_name = "RON", default_value = SETTINGS_FILENAME)]
    pub settings: PathBuf,

    #[arg(long, global = true, value_enum, default_value_t = LogDestination::Both)]
    pub log: LogDestination,

    /// Debug-level diagnostics in the log file.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Translate a .txt or .trs project in batches.
    Translate {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
        /// Required when the project is partially translated.
        #[arg(long, value_enum)]
        scope: Option<ScopeArg>,
        /// Where to save; a .txt target receives the translated text only.
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Extract glossary terms from the source text and merge new ones.
    Glossary {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Split one segment at a character position, aligning the other side.
    Split {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
        /// Zero-based segment index.
        #[arg(long)]
        index: usize,
        #[arg(long, value_enum, default_value_t = SideArg::Original)]
        side: SideArg,
        /// Cursor position in characters.
        #[arg(long)]
        position: usize,
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Write a settings file with defaults and any overrides given.
    InitSettings {
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    All,
    Untranslated,
}

impl From<ScopeArg> for TranslationScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::All => TranslationScope::All,
            ScopeArg::Untranslated => TranslationScope::UntranslatedOnly,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SideArg {
    Original,
    Translated,
}

impl From<SideArg> for SplitSide {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Original => SplitSide::Original,
            SideArg::Translated => SplitSide::Translated,
        }
    }
}

/// Per-run overrides of individual settings.
#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
    /// Chat completions URL.
    #[arg(long, global = true)]
    pub endpoint: Option<String>,
    #[arg(long, global = true)]
    pub api_key: Option<String>,
    #[arg(long, global = true)]
    pub model: Option<String>,
    /// Retries per batch after the first attempt.
    #[arg(long, global = true)]
    pub retries: Option<u32>,
    /// Request timeout in seconds.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
    /// Character budget per batch.
    #[arg(long, global = true)]
    pub max_text_length: Option<usize>,
}

impl Overrides {
    pub fn apply(&self, translate: &mut TranslateConfig, llm: &mut LlmConfig) {
        if let Some(endpoint) = &self.endpoint {
            llm.api = endpoint.clone();
        }
        if let Some(api_key) = &self.api_key {
            llm.api_key = api_key.clone();
        }
        if let Some(model) = &self.model {
            llm.model = model.clone();
        }
        if let Some(retries) = self.retries {
            translate.task_retry_threshold = retries;
        }
        if let Some(timeout) = self.timeout {
            translate.timeout_threshold = timeout;
        }
        if let Some(max_text_length) = self.max_text_length {
            translate.max_text_length = max_text_length;
        }
    }
}
