//! Run settings: built-in defaults, optional YAML file, CLI overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SummariserError};
use crate::language::{normalize_extension, Language};
use crate::ports::FileSystem;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "codesummariser.yaml";

/// Resolved configuration for a run.
///
/// Every field has a default, so a YAML file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Root directories to search for code.
    pub search_dirs: Vec<PathBuf>,
    /// Extensions to summarise, with leading dot (`.sas`, `.R`, ...).
    pub code_exts: Vec<String>,
    /// CSV file the summaries are persisted to.
    pub summary_store: PathBuf,
    /// Model identifier sent to the API and used to pick a tokenizer.
    pub model: String,
    /// Model context size, in tokens: prompt plus completion of one request.
    pub max_tokens: usize,
    /// Sampling temperature; lower is more deterministic.
    pub model_temperature: f32,
    /// Price per thousand tokens, for the pre-run estimate only.
    pub cost_per_1k_tokens: f64,
    /// Tokens of trailing context repeated at the start of the next chunk.
    pub chunk_overlap: usize,
    /// Upper bound, in tokens, on the summaries combined in one request.
    pub combine_token_max: usize,
    /// Tokens the model may generate per completion.
    pub completion_max_tokens: u32,
    /// Fail instead of starting fresh when the summary store is missing.
    pub always_check_existing_summaries: bool,
    /// Search the directories recursively.
    pub recursive: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search_dirs: vec![PathBuf::from("data").join("inputs")],
            code_exts: vec![".sas".to_string()],
            summary_store: PathBuf::from("data").join("summaries").join("summary.csv"),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 4096,
            model_temperature: 0.5,
            cost_per_1k_tokens: 0.02,
            chunk_overlap: 25,
            combine_token_max: 3000,
            completion_max_tokens: 256,
            always_check_existing_summaries: false,
            recursive: false,
        }
    }
}

impl Settings {
    /// Loads settings from `explicit`, or from [`DEFAULT_CONFIG_FILE`] if it
    /// exists, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing or any file fails to parse.
    pub fn load(fs: &dyn FileSystem, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fs.exists(&fallback) {
                    debug!("no {DEFAULT_CONFIG_FILE} found, using built-in defaults");
                    return Ok(Self::default());
                }
                fallback
            }
        };
        let contents = fs
            .read_to_string(&path)
            .map_err(|source| SummariserError::Read {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "loaded settings file");
        Self::from_yaml(&contents)
    }

    /// Parses settings from YAML; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed YAML or unknown keys.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Resolves the configured extensions to languages, normalising the
    /// leading dot, dropping duplicates and keeping the configured order.
    ///
    /// # Errors
    ///
    /// Returns [`SummariserError::UnknownExtension`] for unmapped extensions.
    pub fn languages(&self) -> Result<Vec<(String, Language)>> {
        let mut out: Vec<(String, Language)> = Vec::new();
        for ext in &self.code_exts {
            let ext = normalize_extension(ext);
            let lang = Language::from_extension(&ext)?;
            if !out.iter().any(|(seen, _)| *seen == ext) {
                out.push((ext, lang));
            }
        }
        Ok(out)
    }

    /// Checks that the settings can drive a run.
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.search_dirs.is_empty() {
            return Err(SummariserError::Config("no search directories given".into()));
        }
        if self.code_exts.is_empty() {
            return Err(SummariserError::Config("no code extensions given".into()));
        }
        self.languages()?;
        if self.max_tokens == 0 {
            return Err(SummariserError::Config("max tokens must be greater than zero".into()));
        }
        if self.chunk_overlap > self.max_tokens {
            return Err(SummariserError::Config(format!(
                "chunk overlap ({}) is larger than max tokens ({})",
                self.chunk_overlap, self.max_tokens
            )));
        }
        if self.combine_token_max == 0 {
            return Err(SummariserError::Config(
                "combine token max must be greater than zero".into(),
            ));
        }
        let completion = usize::try_from(self.completion_max_tokens).unwrap_or(usize::MAX);
        if completion >= self.max_tokens {
            return Err(SummariserError::Config(format!(
                "completion max tokens ({completion}) leaves no room for a prompt within \
                 max tokens ({})",
                self.max_tokens
            )));
        }
        if self.combine_token_max.saturating_add(completion) > self.max_tokens {
            return Err(SummariserError::Config(format!(
                "combine token max ({}) plus completion max tokens ({completion}) exceeds \
                 max tokens ({})",
                self.combine_token_max, self.max_tokens
            )));
        }
        if !(0.0..=2.0).contains(&self.model_temperature) {
            return Err(SummariserError::Config(format!(
                "model temperature {} is outside 0.0..=2.0",
                self.model_temperature
            )));
        }
        if self.cost_per_1k_tokens < 0.0 {
            return Err(SummariserError::Config("cost per 1k tokens cannot be negative".into()));
        }
        Ok(())
    }
}
