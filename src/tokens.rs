//! Token counting and run cost estimation.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tiktoken_rs::{cl100k_base, get_bpe_from_model, CoreBPE};
use tracing::debug;

use crate::error::{Result, SummariserError};

/// Output tokens assumed per summarised file when estimating cost.
pub const EXPECTED_OUTPUT_TOKENS_PER_FILE: usize = 100;

/// Counts BPE tokens the way the target model would.
#[derive(Clone)]
pub struct TokenCounter {
    bpe: Arc<CoreBPE>,
    model: String,
}

impl TokenCounter {
    /// Loads the tokenizer for `model`, falling back to `cl100k_base` when
    /// the model is not known to tiktoken.
    ///
    /// # Errors
    ///
    /// Returns an error if neither the model nor the fallback encoding loads.
    pub fn for_model(model: &str) -> Result<Self> {
        let bpe = match get_bpe_from_model(model) {
            Ok(bpe) => bpe,
            Err(e) => {
                debug!(model, error = %e, "no tokenizer for model, using cl100k_base");
                cl100k_base().map_err(|e| SummariserError::Tokenizer(e.to_string()))?
            }
        };
        Ok(Self {
            bpe: Arc::new(bpe),
            model: model.to_string(),
        })
    }

    /// Model this counter was built for.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Number of tokens in `text`.
    #[must_use]
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

impl fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCounter").field("model", &self.model).finish_non_exhaustive()
    }
}

/// Expected token usage and price of summarising a set of files.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    /// Number of files included.
    pub files: usize,
    /// Tokens across all file contents.
    pub input_tokens: usize,
    /// Allowance for generated summaries.
    pub expected_output_tokens: usize,
    /// `input_tokens + expected_output_tokens`.
    pub total_tokens: usize,
    /// Price per thousand tokens used for the estimate.
    pub cost_per_1k_tokens: f64,
    /// Estimated total price.
    pub cost: f64,
}

impl CostEstimate {
    /// Builds an estimate from per-file token counts.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_counts(counts: &[usize], cost_per_1k_tokens: f64) -> Self {
        let input_tokens: usize = counts.iter().sum();
        let expected_output_tokens = counts.len() * EXPECTED_OUTPUT_TOKENS_PER_FILE;
        let total_tokens = input_tokens + expected_output_tokens;
        Self {
            files: counts.len(),
            input_tokens,
            expected_output_tokens,
            total_tokens,
            cost_per_1k_tokens,
            cost: total_tokens as f64 * cost_per_1k_tokens / 1000.0,
        }
    }
}

impl fmt::Display for CostEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total input tokens is {}. At ${}/1k prompt tokens, and with a likely {} output \
             tokens, the cost of this run is ${:.2}",
            self.total_tokens, self.cost_per_1k_tokens, self.expected_output_tokens, self.cost
        )
    }
}

/// Counts tokens for each file's contents and prices the run.
///
/// Files are passed as `(path, contents)` pairs so callers decide how they
/// were read.
#[must_use]
pub fn estimate_cost(
    files: &[(PathBuf, String)],
    counter: &TokenCounter,
    cost_per_1k_tokens: f64,
) -> CostEstimate {
    let counts: Vec<usize> = files
        .iter()
        .map(|(path, contents)| {
            let n = counter.count(contents);
            debug!(path = %path.display(), tokens = n, "counted tokens");
            n
        })
        .collect();
    CostEstimate::from_counts(&counts, cost_per_1k_tokens)
}
