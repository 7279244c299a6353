//! Grouping rules for the reduce step.
//!
//! Summaries are collapsed in rounds. Each round partitions the current
//! summaries, in order, into groups that fit the combine budget; every group
//! is then collapsed into one summary by the caller.

use crate::error::{Result, SummariserError};

/// Collapse rounds allowed before the reduce step gives up.
pub const MAX_COLLAPSE_ROUNDS: usize = 10;

/// Separator placed between summaries handed to the combine prompt.
pub const SUMMARY_SEPARATOR: &str = "\n\n";

/// Joins summaries into the text of one combine request.
#[must_use]
pub fn join_summaries(summaries: &[String]) -> String {
    summaries.join(SUMMARY_SEPARATOR)
}

/// Partitions `summaries` into consecutive groups whose measured size is at
/// most `limit`.
///
/// `measure` is applied to a candidate group and should include the prompt
/// overhead the group will be sent with.
///
/// # Errors
///
/// Returns [`SummariserError::Reduce`] if a single summary alone exceeds
/// `limit`.
pub fn partition(
    summaries: Vec<String>,
    limit: usize,
    measure: impl Fn(&[String]) -> usize,
) -> Result<Vec<Vec<String>>> {
    let mut groups = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for summary in summaries {
        current.push(summary);
        if measure(&current) > limit {
            if current.len() == 1 {
                return Err(SummariserError::Reduce(format!(
                    "a single chunk summary is longer than the combine limit of {limit} tokens"
                )));
            }
            let overflow = current.pop().into_iter().collect::<Vec<_>>();
            groups.push(std::mem::replace(&mut current, overflow));
            if measure(&current) > limit {
                return Err(SummariserError::Reduce(format!(
                    "a single chunk summary is longer than the combine limit of {limit} tokens"
                )));
            }
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(group: &[String]) -> usize {
        group.iter().map(|s| s.split_whitespace().count()).sum()
    }

    fn s(text: &str) -> String {
        text.to_string()
    }

    #[test]
    fn keeps_order_and_fills_groups_greedily() {
        let groups =
            partition(vec![s("a b"), s("c d"), s("e"), s("f g h"), s("i")], 4, words).unwrap();
        assert_eq!(
            groups,
            vec![vec![s("a b"), s("c d")], vec![s("e"), s("f g h")], vec![s("i")]]
        );
    }

    #[test]
    fn everything_fits_in_one_group() {
        let groups = partition(vec![s("a"), s("b")], 10, words).unwrap();
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn oversize_first_summary_is_an_error() {
        let err = partition(vec![s("a b c d e")], 4, words).unwrap_err();
        assert!(err.to_string().contains("combine limit of 4"));
    }

    #[test]
    fn oversize_later_summary_is_an_error() {
        let err = partition(vec![s("a"), s("b c d e f")], 4, words);
        assert!(matches!(err, Err(SummariserError::Reduce(_))));
    }

    #[test]
    fn join_uses_blank_lines() {
        assert_eq!(join_summaries(&[s("one"), s("two")]), "one\n\ntwo");
    }
}
