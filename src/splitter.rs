//! Recursive separator-based text splitting.
//!
//! The splitter tries each separator in order, coarsest first. Pieces that
//! already fit are greedily merged into chunks; pieces that do not are split
//! again with the remaining separators. Separators stay attached to the start
//! of the piece that follows them so that a chunk of code begins at the
//! keyword it was split on.

use std::collections::VecDeque;

use crate::error::{Result, SummariserError};
use crate::language::Language;

/// Measures the size of a piece of text (characters, tokens, ...).
pub type LengthFn<'a> = dyn Fn(&str) -> usize + 'a;

/// Splits text into chunks of bounded length.
pub struct RecursiveSplitter<'a> {
    separators: Vec<&'static str>,
    chunk_size: usize,
    chunk_overlap: usize,
    length: Box<LengthFn<'a>>,
}

impl<'a> RecursiveSplitter<'a> {
    /// Creates a splitter over explicit separators.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `chunk_size` is zero or the overlap
    /// exceeds the chunk size.
    pub fn new(
        separators: Vec<&'static str>,
        chunk_size: usize,
        chunk_overlap: usize,
        length: impl Fn(&str) -> usize + 'a,
    ) -> Result<Self> {
        if chunk_size == 0 {
            return Err(SummariserError::Config("chunk size must be greater than zero".into()));
        }
        if chunk_overlap > chunk_size {
            return Err(SummariserError::Config(format!(
                "chunk overlap ({chunk_overlap}) is larger than chunk size ({chunk_size})"
            )));
        }
        Ok(Self {
            separators,
            chunk_size,
            chunk_overlap,
            length: Box::new(length),
        })
    }

    /// Creates a splitter using the separators for `language`.
    ///
    /// # Errors
    ///
    /// See [`RecursiveSplitter::new`].
    pub fn for_language(
        language: Language,
        chunk_size: usize,
        chunk_overlap: usize,
        length: impl Fn(&str) -> usize + 'a,
    ) -> Result<Self> {
        Self::new(language.separators(), chunk_size, chunk_overlap, length)
    }

    /// Splits `text` into trimmed, non-empty chunks.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[&'static str]) -> Vec<String> {
        let mut chunks = Vec::new();

        let (separator, remaining) = pick_separator(text, separators);
        let pieces = split_keeping_separator(text, separator);

        let mut fitting: Vec<&str> = Vec::new();
        for piece in pieces {
            if (self.length)(piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting));
                fitting.clear();
            }
            if remaining.is_empty() {
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }
        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting));
        }
        chunks
    }

    /// Greedily packs pieces into chunks, keeping up to `chunk_overlap` of
    /// trailing pieces at the start of the next chunk.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut merged = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = (self.length)(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                push_joined(&mut merged, &window);
                while total > self.chunk_overlap
                    || (total + len > self.chunk_size && total > 0)
                {
                    let Some((_, front)) = window.pop_front() else {
                        break;
                    };
                    total -= front;
                }
            }
            window.push_back((piece, len));
            total += len;
        }
        push_joined(&mut merged, &window);
        merged
    }
}

/// Returns the first separator present in `text` and the separators left
/// for recursing into oversize pieces. The empty separator always matches.
fn pick_separator<'s>(
    text: &str,
    separators: &'s [&'static str],
) -> (&'static str, &'s [&'static str]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() {
            return ("", &[]);
        }
        if text.contains(sep) {
            return (*sep, &separators[i + 1..]);
        }
    }
    separators.last().map_or(("", &[]), |last| (*last, &[]))
}

/// Splits on `separator`, attaching each separator occurrence to the
/// following piece. An empty separator splits into characters.
fn split_keeping_separator<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    if separator.is_empty() {
        return text.char_indices().map(|(i, c)| &text[i..i + c.len_utf8()]).collect();
    }
    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces.retain(|p| !p.is_empty());
    pieces
}

fn push_joined(out: &mut Vec<String>, window: &VecDeque<(&str, usize)>) {
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> usize {
        s.chars().count()
    }

    #[test]
    fn short_text_is_single_chunk() {
        let splitter = RecursiveSplitter::for_language(Language::Sas, 100, 0, chars).unwrap();
        let chunks = splitter.split("data a;\n  set b;\nrun;\n");
        assert_eq!(chunks, vec!["data a;\n  set b;\nrun;"]);
    }

    #[test]
    fn separator_is_kept_on_following_piece() {
        let pieces = split_keeping_separator("a\nproc x\nproc y", "\nproc ");
        assert_eq!(pieces, vec!["a", "\nproc x", "\nproc y"]);
    }

    #[test]
    fn empty_separator_splits_into_chars() {
        assert_eq!(split_keeping_separator("héj", ""), vec!["h", "é", "j"]);
    }

    #[test]
    fn picks_first_present_separator() {
        let seps = Language::Sas.separators();
        let (sep, rest) = pick_separator("x\nproc sort; run;", &seps);
        assert_eq!(sep, "\nproc ");
        assert_eq!(rest[0], "\nrun ");
    }

    #[test]
    fn splits_sas_on_step_boundaries() {
        let code = "data one;\n  x = 1;\nrun;\n\
                    proc print data=one;\nrun;\n\
                    proc means data=one;\nrun;";
        let splitter = RecursiveSplitter::for_language(Language::Sas, 30, 0, chars).unwrap();
        let chunks = splitter.split(code);
        assert_eq!(
            chunks,
            vec![
                "data one;\n  x = 1;\nrun;",
                "proc print data=one;\nrun;",
                "proc means data=one;\nrun;",
            ]
        );
        assert!(chunks.iter().all(|c| chars(c) <= 30));
    }

    #[test]
    fn oversize_piece_recurses_to_finer_separators() {
        let long_line = "word ".repeat(20);
        let splitter =
            RecursiveSplitter::new(vec!["\n\n", "\n", " ", ""], 24, 0, chars).unwrap();
        let chunks = splitter.split(&long_line);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| chars(c) <= 24), "{chunks:?}");
        assert!(chunks.iter().all(|c| c.starts_with("word")));
    }

    #[test]
    fn overlap_repeats_trailing_pieces() {
        let splitter = RecursiveSplitter::new(vec![" ", ""], 10, 4, chars).unwrap();
        let chunks = splitter.split("aa bb cc dd ee");
        assert_eq!(chunks, vec!["aa bb cc", "cc dd ee"]);
    }

    #[test]
    fn character_fallback_keeps_overlap_across_long_text() {
        let text = "abcdefghij".repeat(2000);
        let splitter = RecursiveSplitter::new(vec![""], 100, 10, chars).unwrap();
        let chunks = splitter.split(&text);

        assert_eq!(chunks.len(), 223);
        assert!(chunks.iter().all(|c| chars(c) <= 100));
        let mut rebuilt = chunks[0].clone();
        for pair in chunks.windows(2) {
            assert_eq!(&pair[1][..10], &pair[0][pair[0].len() - 10..]);
            rebuilt.push_str(&pair[1][10..]);
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn rejects_overlap_larger_than_chunk() {
        let err = RecursiveSplitter::new(vec![""], 10, 11, chars).err().unwrap();
        assert!(err.to_string().contains("chunk overlap"));
    }

    #[test]
    fn whitespace_only_text_yields_nothing() {
        let splitter = RecursiveSplitter::for_language(Language::Python, 50, 0, chars).unwrap();
        assert!(splitter.split("  \n\n  \n").is_empty());
    }
}
