//! Chunk-and-reduce summarisation.
//!
//! A file is split into language-aware chunks, each chunk is summarised with
//! the code prompt (map), and the chunk summaries are combined into one
//! (reduce). Summaries that do not fit a single combine request are first
//! collapsed in groups, round by round.

pub mod chain;
pub mod prompts;

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{Result, SummariserError};
use crate::language::Language;
use crate::ports::{CompletionRequest, FileSystem, LlmClient};
use crate::splitter::RecursiveSplitter;
use crate::store::SummaryStore;
use crate::summary::FileSummary;
use crate::tokens::TokenCounter;

use self::chain::{join_summaries, partition, MAX_COLLAPSE_ROUNDS};
use self::prompts::{code_prompt, combine_prompt};

/// Tokens left free where a chunk meets the code prompt around it.
const BOUNDARY_TOKENS: usize = 8;

/// Outcome counts for one summarisation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Files given a new summary.
    pub summarised: usize,
    /// Files whose stored summary was still current.
    pub skipped: usize,
    /// Files that could not be summarised, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl RunReport {
    /// Returns `true` if any file failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} summarised, {} unchanged, {} failed",
            self.summarised,
            self.skipped,
            self.failed.len()
        )
    }
}

/// Drives the model through the map and reduce steps.
pub struct Summariser<'a> {
    llm: &'a dyn LlmClient,
    counter: &'a TokenCounter,
    settings: &'a Settings,
}

impl<'a> Summariser<'a> {
    /// Creates a summariser using `settings` for chunk sizes and model options.
    #[must_use]
    pub fn new(llm: &'a dyn LlmClient, counter: &'a TokenCounter, settings: &'a Settings) -> Self {
        Self {
            llm,
            counter,
            settings,
        }
    }

    /// Largest chunk, in tokens, whose code prompt and completion still fit
    /// within `max_tokens`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the prompt and completion alone use
    /// up the whole context.
    pub fn chunk_budget(&self, language: Language) -> Result<usize> {
        let overhead = self.counter.count(&code_prompt(language, "")) + BOUNDARY_TOKENS;
        let completion = usize::try_from(self.settings.completion_max_tokens).unwrap_or(usize::MAX);
        self.settings
            .max_tokens
            .checked_sub(overhead.saturating_add(completion))
            .filter(|budget| *budget > 0)
            .ok_or_else(|| {
                SummariserError::Config(format!(
                    "max tokens ({}) leaves no room for code after the {language} prompt \
                     ({overhead}) and completion ({completion})",
                    self.settings.max_tokens
                ))
            })
    }

    /// Summarises one file's text.
    ///
    /// Blank text yields an empty summary without calling the model.
    ///
    /// # Errors
    ///
    /// Returns an error if splitting is misconfigured, a completion fails, or
    /// the chunk summaries cannot be reduced within the combine limit.
    pub async fn summarise_text(&self, language: Language, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let budget = self.chunk_budget(language)?;
        let splitter = RecursiveSplitter::for_language(
            language,
            budget,
            self.settings.chunk_overlap,
            |s: &str| self.counter.count(s),
        )?;
        let chunks = splitter.split(text);
        debug!(language = %language, budget, chunks = chunks.len(), "split text");

        let mut summaries = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            debug!(chunk = i + 1, of = chunks.len(), "summarising chunk");
            summaries.push(self.complete(code_prompt(language, chunk)).await?);
        }

        if summaries.is_empty() {
            return Ok(String::new());
        }
        self.reduce(summaries).await
    }

    /// Summarises every file in `files`, skipping those whose stored summary
    /// in `existing` still matches the contents.
    ///
    /// Failures are logged and recorded in the report; the remaining files
    /// are still processed.
    pub async fn summarise_files(
        &self,
        fs: &dyn FileSystem,
        files: &[(PathBuf, Language)],
        existing: &SummaryStore,
    ) -> (SummaryStore, RunReport) {
        let mut fresh = SummaryStore::new();
        let mut report = RunReport::default();

        for (i, (path, language)) in files.iter().enumerate() {
            let contents = match fs.read_to_string(path) {
                Ok(contents) => contents,
                Err(source) => {
                    let err = SummariserError::Read {
                        path: path.clone(),
                        source,
                    };
                    warn!(path = %path.display(), error = %err, "skipping unreadable file");
                    report.failed.push((path.clone(), err.to_string()));
                    continue;
                }
            };

            let record = FileSummary::new(path.clone(), &contents);
            if existing.get(path).is_some_and(|stored| stored.is_current(&record.contents_hash)) {
                info!(path = %path.display(), "unchanged since last run, skipping");
                report.skipped += 1;
                continue;
            }

            info!(path = %path.display(), file = i + 1, of = files.len(), "summarising");
            match self.summarise_text(*language, &contents).await {
                Ok(summary) => {
                    debug!(path = %path.display(), %summary, "summary written");
                    fresh.insert(record.with_summary(&summary));
                    report.summarised += 1;
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to summarise file");
                    report.failed.push((path.clone(), err.to_string()));
                }
            }
        }

        info!(%report, "summarisation finished");
        (fresh, report)
    }

    async fn reduce(&self, mut summaries: Vec<String>) -> Result<String> {
        let limit = self.settings.combine_token_max;
        let measure =
            |group: &[String]| self.counter.count(&combine_prompt(&join_summaries(group)));

        let mut round = 0;
        while measure(summaries.as_slice()) > limit {
            round += 1;
            if round > MAX_COLLAPSE_ROUNDS {
                return Err(SummariserError::Reduce(format!(
                    "summaries still exceed {limit} tokens after {MAX_COLLAPSE_ROUNDS} \
                     collapse rounds"
                )));
            }
            let groups = partition(summaries, limit, &measure)?;
            debug!(round, groups = groups.len(), "collapsing summaries");

            let mut collapsed = Vec::with_capacity(groups.len());
            for group in &groups {
                collapsed.push(self.complete(combine_prompt(&join_summaries(group))).await?);
            }
            summaries = collapsed;
        }

        debug!(summaries = summaries.len(), "combining summaries");
        self.complete(combine_prompt(&join_summaries(&summaries))).await
    }

    async fn complete(&self, prompt: String) -> Result<String> {
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            prompt,
            max_tokens: self.settings.completion_max_tokens,
            temperature: self.settings.model_temperature,
        };
        let response = self.llm.complete(&request).await.map_err(SummariserError::Llm)?;
        debug!(
            prompt_tokens = response.prompt_tokens,
            completion_tokens = response.completion_tokens,
            "completion received"
        );
        Ok(response.text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::adapters::live::LiveFileSystem;
    use crate::error::PortError;
    use crate::ports::{CompletionFuture, CompletionResponse};

    const LONG: &str = "This chunk defines a data step that reads the raw table and writes a \
                        cleaned output table.";

    const WORDY: &str = "This step reads the raw claims table, drops rows with missing member \
                         identifiers, recodes the visit type into three groups, and writes the \
                         cleaned result to the analysis library for the later reporting steps.";

    /// Answers code prompts with `map_reply` and combine prompts with
    /// `combine_reply`, keeping every request it saw.
    struct ScriptedLlm {
        map_reply: String,
        combine_reply: String,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedLlm {
        fn new(map_reply: &str, combine_reply: &str) -> Self {
            Self {
                map_reply: map_reply.into(),
                combine_reply: combine_reply.into(),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.prompt.clone())
                .collect()
        }
    }

    impl LlmClient for ScriptedLlm {
        fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
            self.seen.lock().unwrap().push(request.clone());
            let text = if request.prompt.starts_with("You are an expert") {
                self.map_reply.clone()
            } else {
                self.combine_reply.clone()
            };
            let response: std::result::Result<CompletionResponse, PortError> =
                Ok(CompletionResponse {
                    text,
                    prompt_tokens: 10,
                    completion_tokens: 5,
                });
            Box::pin(async move { response })
        }
    }

    struct FailingLlm;

    impl LlmClient for FailingLlm {
        fn complete(&self, _request: &CompletionRequest) -> CompletionFuture<'_> {
            let response: std::result::Result<CompletionResponse, PortError> =
                Err("rate limited".into());
            Box::pin(async move { response })
        }
    }

    fn counter() -> TokenCounter {
        TokenCounter::for_model("gpt-3.5-turbo").unwrap()
    }

    fn sas_program(steps: usize) -> String {
        (0..steps)
            .map(|i| format!("data step_{i};\n  set raw_{i};\nrun;\n"))
            .collect()
    }

    /// Settings whose map budget is a few dozen tokens, so short programs
    /// still split into several chunks.
    fn small_context(combine_token_max: usize) -> Settings {
        Settings {
            max_tokens: 100,
            completion_max_tokens: 20,
            chunk_overlap: 0,
            combine_token_max,
            ..Settings::default()
        }
    }

    fn is_combine(prompt: &str) -> bool {
        prompt.starts_with("Write a concise summary")
    }

    #[tokio::test]
    async fn single_chunk_still_goes_through_combine() {
        let llm = ScriptedLlm::new("  Sets x to one.\n", "  Assigns one to x.\n");
        let counter = counter();
        let settings = Settings::default();
        let summariser = Summariser::new(&llm, &counter, &settings);

        let summary = summariser
            .summarise_text(Language::R, "x <- 1\n")
            .await
            .unwrap();

        assert_eq!(summary, "Assigns one to x.");
        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("expert R programmer"));
        assert!(is_combine(&prompts[1]));
        assert!(prompts[1].contains("```Sets x to one.```"));
        let seen = llm.seen.lock().unwrap();
        assert_eq!(seen[0].model, "gpt-3.5-turbo");
        assert_eq!(seen[0].max_tokens, 256);
    }

    #[tokio::test]
    async fn blank_text_never_calls_model() {
        let llm = ScriptedLlm::new("x", "y");
        let counter = counter();
        let settings = Settings::default();
        let summariser = Summariser::new(&llm, &counter, &settings);

        let summary = summariser
            .summarise_text(Language::Sas, " \n\t")
            .await
            .unwrap();
        assert_eq!(summary, "");
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn map_requests_fit_the_context_with_default_settings() {
        let llm = ScriptedLlm::new("Part.", "Whole.");
        let counter = counter();
        let settings = Settings::default();
        let summariser = Summariser::new(&llm, &counter, &settings);
        let mut program = String::from("data wide;\n  set raw;\n");
        for i in 0..3000 {
            program.push_str(&format!("  x{i} = y{i} * {i} + 1;\n"));
        }
        program.push_str("run;\n");

        summariser
            .summarise_text(Language::Sas, &program)
            .await
            .unwrap();

        let completion = usize::try_from(settings.completion_max_tokens).unwrap();
        let maps: Vec<_> = llm
            .prompts()
            .into_iter()
            .filter(|p| !is_combine(p))
            .collect();
        assert!(maps.len() > 1, "expected the program to be split");
        for prompt in &maps {
            let request = counter.count(prompt) + completion;
            assert!(request <= settings.max_tokens, "request of {request} tokens");
        }
    }

    #[test]
    fn chunk_budget_leaves_room_for_prompt_and_completion() {
        let llm = ScriptedLlm::new("x", "y");
        let counter = counter();
        let settings = Settings::default();
        let summariser = Summariser::new(&llm, &counter, &settings);

        let budget = summariser.chunk_budget(Language::Sas).unwrap();
        let overhead = counter.count(&code_prompt(Language::Sas, ""));
        assert_eq!(budget + overhead + BOUNDARY_TOKENS + 256, 4096);

        let cramped = Settings {
            max_tokens: 200,
            completion_max_tokens: 190,
            ..Settings::default()
        };
        let summariser = Summariser::new(&llm, &counter, &cramped);
        let err = summariser.chunk_budget(Language::Sas).unwrap_err();
        assert!(matches!(err, SummariserError::Config(_)));
    }

    #[tokio::test]
    async fn many_chunks_are_combined_once() {
        let llm = ScriptedLlm::new("Part.", "Whole program summary.");
        let counter = counter();
        let settings = small_context(3000);
        let summariser = Summariser::new(&llm, &counter, &settings);

        let summary = summariser
            .summarise_text(Language::Sas, &sas_program(12))
            .await
            .unwrap();

        assert_eq!(summary, "Whole program summary.");
        let prompts = llm.prompts();
        assert!(prompts.len() > 2);
        let combines: Vec<_> = prompts.iter().filter(|p| is_combine(p)).collect();
        assert_eq!(combines.len(), 1);
        assert!(is_combine(prompts.last().unwrap()));
        assert!(combines[0].contains("Part.\n\nPart."));
    }

    #[tokio::test]
    async fn oversized_summaries_are_collapsed_before_final_combine() {
        let llm = ScriptedLlm::new(LONG, "Short.");
        let counter = counter();
        let settings = small_context(60);
        let summariser = Summariser::new(&llm, &counter, &settings);

        let summary = summariser
            .summarise_text(Language::Sas, &sas_program(12))
            .await
            .unwrap();

        assert_eq!(summary, "Short.");
        let prompts = llm.prompts();
        let combines: Vec<_> = prompts.iter().filter(|p| is_combine(p)).collect();
        assert!(combines.len() > 1, "expected collapse rounds before the final combine");
        for prompt in combines {
            assert!(counter.count(prompt) <= 60);
        }
    }

    #[tokio::test]
    async fn summary_larger_than_combine_limit_is_an_error() {
        let llm = ScriptedLlm::new(LONG, "Short.");
        let counter = counter();
        let settings = small_context(30);
        let summariser = Summariser::new(&llm, &counter, &settings);

        let err = summariser
            .summarise_text(Language::Sas, &sas_program(12))
            .await
            .unwrap_err();
        assert!(matches!(err, SummariserError::Reduce(_)));
    }

    #[tokio::test]
    async fn collapse_gives_up_after_round_cap() {
        // One reply fits a combine request, two never do, so every round
        // collapses into singletons and the count never shrinks.
        let llm = ScriptedLlm::new(WORDY, WORDY);
        let counter = counter();
        let settings = small_context(85);
        let summariser = Summariser::new(&llm, &counter, &settings);

        let err = summariser
            .summarise_text(Language::Sas, &sas_program(12))
            .await
            .unwrap_err();

        assert!(matches!(err, SummariserError::Reduce(_)), "{err}");
        assert!(err.to_string().contains("collapse rounds"));
        let prompts = llm.prompts();
        let maps = prompts.iter().filter(|p| !is_combine(p)).count();
        let combines = prompts.iter().filter(|p| is_combine(p)).count();
        assert!(maps > 1);
        assert_eq!(combines, MAX_COLLAPSE_ROUNDS * maps);
    }

    #[tokio::test]
    async fn llm_failure_is_reported() {
        let counter = counter();
        let settings = Settings::default();
        let summariser = Summariser::new(&FailingLlm, &counter, &settings);

        let err = summariser
            .summarise_text(Language::Python, "print(1)\n")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn files_are_skipped_summarised_or_failed() {
        let dir = tempfile::tempdir().unwrap();
        let changed = dir.path().join("changed.sas");
        let unchanged = dir.path().join("unchanged.sas");
        let missing = dir.path().join("missing.sas");
        std::fs::write(&changed, "data new; run;\n").unwrap();
        std::fs::write(&unchanged, "data same; run;\n").unwrap();

        let existing: SummaryStore = vec![
            FileSummary::new(changed.clone(), "data old; run;\n").with_summary("Old."),
            FileSummary::new(unchanged.clone(), "data same; run;\n").with_summary("Same."),
        ]
        .into_iter()
        .collect();

        let llm = ScriptedLlm::new("Makes dataset new.", "Creates dataset new.");
        let counter = counter();
        let settings = Settings::default();
        let summariser = Summariser::new(&llm, &counter, &settings);
        let files = vec![
            (changed.clone(), Language::Sas),
            (missing.clone(), Language::Sas),
            (unchanged.clone(), Language::Sas),
        ];

        let (fresh, report) = summariser
            .summarise_files(&LiveFileSystem, &files, &existing)
            .await;

        assert_eq!(report.summarised, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, missing);
        assert!(report.has_failures());
        assert_eq!(report.to_string(), "1 summarised, 1 unchanged, 1 failed");

        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh.get(&changed).unwrap().summary, "Creates dataset new.");
        assert_eq!(llm.prompts().len(), 2);
    }

    #[tokio::test]
    async fn empty_file_gets_empty_summary() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.sql");
        std::fs::write(&empty, "").unwrap();

        let llm = ScriptedLlm::new("x", "y");
        let counter = counter();
        let settings = Settings::default();
        let summariser = Summariser::new(&llm, &counter, &settings);
        let files = [(empty.clone(), Language::Sql)];

        let (fresh, report) = summariser
            .summarise_files(&LiveFileSystem, &files, &SummaryStore::new())
            .await;

        assert_eq!(report.summarised, 1);
        assert_eq!(fresh.get(&empty).unwrap().summary, "");
        assert!(llm.prompts().is_empty());
    }
}
