//! Sequence Dataset Builder
//!
//! Expands each encoded corpus line into every (prefix, next token) pair and
//! left-pads all prefixes to one shared length.

use crate::error::CorpusError;
use crate::vocabulary::{SENTINEL, TokenId};

/// One next-token training pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingExample {
    pub padded_prefix: Vec<TokenId>,
    pub target_id: TokenId,
}

/// All training pairs for a corpus plus the padded prefix length.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub examples: Vec<TrainingExample>,
    pub max_len: usize,
}

impl Dataset {
    /// Builds the n-gram expansion of `sequences`.
    ///
    /// A line of `n` tokens yields `n - 1` examples; lines with at most one
    /// token yield none. `max_len` is the longest prefix produced across the
    /// whole corpus. Fails with [`CorpusError::NoTrainableExamples`] when no
    /// line yields an example.
    pub fn build(sequences: &[Vec<TokenId>]) -> Result<Self, CorpusError> {
        let max_len = sequences
            .iter()
            .map(|seq| seq.len().saturating_sub(1))
            .max()
            .unwrap_or(0);
        if max_len == 0 {
            return Err(CorpusError::NoTrainableExamples);
        }

        let examples = sequences
            .iter()
            .flat_map(|seq| {
                (1..seq.len()).map(move |i| TrainingExample {
                    padded_prefix: pad_left(&seq[..i], max_len),
                    target_id: seq[i],
                })
            })
            .collect();

        Ok(Self { examples, max_len })
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}

/// Left-pads `ids` with the sentinel up to `max_len`.
///
/// Sequences longer than `max_len` keep only their last `max_len` ids.
pub fn pad_left(ids: &[TokenId], max_len: usize) -> Vec<TokenId> {
    if ids.len() >= max_len {
        return ids[ids.len() - max_len..].to_vec();
    }
    let mut padded = vec![SENTINEL; max_len - ids.len()];
    padded.extend_from_slice(ids);
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_of_n_tokens_yields_n_minus_one_examples() {
        let sequences = vec![vec![1, 2, 3, 4], vec![5, 6], vec![7]];
        let dataset = Dataset::build(&sequences).unwrap();

        assert_eq!(dataset.len(), 3 + 1);
        assert_eq!(dataset.max_len, 3);
    }

    #[test]
    fn test_examples_are_left_padded_prefixes() {
        let sequences = vec![vec![1, 2, 3], vec![4, 5]];
        let dataset = Dataset::build(&sequences).unwrap();

        assert_eq!(
            dataset.examples,
            vec![
                TrainingExample {
                    padded_prefix: vec![0, 1],
                    target_id: 2
                },
                TrainingExample {
                    padded_prefix: vec![1, 2],
                    target_id: 3
                },
                TrainingExample {
                    padded_prefix: vec![0, 4],
                    target_id: 5
                },
            ]
        );
    }

    #[test]
    fn test_all_prefixes_share_length_and_targets_are_real_ids() {
        let sequences = vec![vec![1, 2, 3, 4, 5, 6], vec![7, 8, 9], vec![], vec![10, 1]];
        let dataset = Dataset::build(&sequences).unwrap();

        assert_eq!(dataset.len(), 5 + 2 + 1);
        for example in &dataset.examples {
            assert_eq!(example.padded_prefix.len(), dataset.max_len);
            assert_ne!(example.target_id, SENTINEL);
        }
    }

    #[test]
    fn test_single_token_lines_are_not_trainable() {
        let sequences = vec![vec![1], vec![], vec![2]];
        let err = Dataset::build(&sequences).unwrap_err();
        assert_eq!(err, CorpusError::NoTrainableExamples);
    }

    #[test]
    fn test_pad_left() {
        assert_eq!(pad_left(&[3, 4], 4), vec![0, 0, 3, 4]);
        assert_eq!(pad_left(&[1, 2, 3, 4, 5], 3), vec![3, 4, 5]);
        assert_eq!(pad_left(&[], 2), vec![0, 0]);
    }
}
