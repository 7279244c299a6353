//! Prompt templates for the map and combine steps.

use crate::language::Language;

/// Renders the per-chunk prompt for code in `language`.
#[must_use]
pub fn code_prompt(language: Language, code: &str) -> String {
    let lang = language.name();
    format!(
        "You are an expert {lang} programmer. Summarise the following {lang} code, delimited by \
         triple backquotes.:\n\n```{code}```\n\nCONCISE SUMMARY:"
    )
}

/// Renders the prompt that merges several summaries into one.
#[must_use]
pub fn combine_prompt(summaries: &str) -> String {
    format!(
        "Write a concise summary of the following text, delimited by triple backquotes.\n\n\
         ```{summaries}```\n\nCONCISE SUMMARY:"
    )
}
