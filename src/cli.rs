//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Settings;

/// Top-level CLI parser for `codesummariser`.
#[derive(Debug, Parser)]
#[command(
    name = "codesummariser",
    version,
    about = "Summarise source files with an LLM, skipping files that have not changed"
)]
pub struct Cli {
    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Summarise new and changed code files into the summary store.
    Summarise(RunArgs),
    /// Print the token and cost estimate without calling the model.
    Estimate(RunArgs),
    /// List stored summaries, or print the summary for one file.
    Show {
        /// File whose summary to print.
        path: Option<PathBuf>,
        /// Summary store to read (defaults to the configured store).
        #[arg(long)]
        summary_store: Option<PathBuf>,
        /// YAML settings file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Drop stored summaries for files that no longer exist.
    Prune {
        /// Summary store to prune (defaults to the configured store).
        #[arg(long)]
        summary_store: Option<PathBuf>,
        /// YAML settings file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Settings overrides shared by `summarise` and `estimate`.
#[derive(Debug, Default, Clone, Args)]
pub struct RunArgs {
    /// Directories to search for code (repeatable).
    #[arg(long = "search-dirs", num_args = 1..)]
    pub search_dirs: Vec<PathBuf>,
    /// Extensions to summarise, e.g. `.sas` or `.R` (repeatable).
    #[arg(long = "code-exts", num_args = 1..)]
    pub code_exts: Vec<String>,
    /// CSV file summaries are read from and written to.
    #[arg(long)]
    pub summary_store: Option<PathBuf>,
    /// Model used for summarisation and token counting.
    #[arg(long)]
    pub model: Option<String>,
    /// Model context size in tokens, shared by prompt and completion.
    #[arg(long)]
    pub max_tokens: Option<usize>,
    /// Sampling temperature.
    #[arg(long)]
    pub model_temperature: Option<f32>,
    /// Price per thousand tokens used for the estimate.
    #[arg(long = "cost-per-1k-tokens")]
    pub cost_per_1k_tokens: Option<f64>,
    /// Fail if the summary store does not exist yet.
    #[arg(long)]
    pub always_check_existing_summaries: bool,
    /// Search directories recursively.
    #[arg(long)]
    pub recursive: bool,
    /// Do not ask for confirmation before calling the model.
    #[arg(short, long)]
    pub yes: bool,
    /// YAML settings file (defaults to `codesummariser.yaml` if present).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl RunArgs {
    /// Applies every flag that was given on top of `settings`.
    pub fn apply_to(&self, settings: &mut Settings) {
        if !self.search_dirs.is_empty() {
            settings.search_dirs.clone_from(&self.search_dirs);
        }
        if !self.code_exts.is_empty() {
            settings.code_exts.clone_from(&self.code_exts);
        }
        if let Some(store) = &self.summary_store {
            settings.summary_store.clone_from(store);
        }
        if let Some(model) = &self.model {
            settings.model.clone_from(model);
        }
        if let Some(max_tokens) = self.max_tokens {
            settings.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.model_temperature {
            settings.model_temperature = temperature;
        }
        if let Some(cost) = self.cost_per_1k_tokens {
            settings.cost_per_1k_tokens = cost;
        }
        settings.always_check_existing_summaries |= self.always_check_existing_summaries;
        settings.recursive |= self.recursive;
    }
}
