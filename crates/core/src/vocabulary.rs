//! Tokenizer and Vocabulary Builder
//!
//! Turns corpus lines into a stable word <-> id mapping. Ids are handed out in
//! first-occurrence order starting at 1; id 0 is the padding/unknown sentinel.

use crate::error::CorpusError;
use std::collections::HashMap;

/// Integer id of a vocabulary word.
pub type TokenId = u32;

/// Reserved id for padding and out-of-vocabulary words.
pub const SENTINEL: TokenId = 0;

/// Characters removed when case folding is enabled.
const FOLD_FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// Splits text into word tokens.
///
/// The default tokenizer keeps words exactly as written. `fold_case` lowercases
/// and strips punctuation first, which makes typed prompts line up with a
/// capitalised corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tokenizer {
    pub fold_case: bool,
}

impl Tokenizer {
    pub fn new(fold_case: bool) -> Self {
        Self { fold_case }
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        if self.fold_case {
            let folded: String = text
                .chars()
                .map(|c| if FOLD_FILTERS.contains(c) { ' ' } else { c })
                .collect::<String>()
                .to_lowercase();
            folded.split_whitespace().map(str::to_string).collect()
        } else {
            text.split_whitespace().map(str::to_string).collect()
        }
    }
}

/// Immutable word index built from one corpus.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    tokenizer: Tokenizer,
    ids: HashMap<String, TokenId>,
    /// `words[id - 1]` is the word for `id`.
    words: Vec<String>,
}

impl Vocabulary {
    /// Builds the vocabulary and encodes every line against it.
    ///
    /// Returns the per-line id sequences in corpus order. Fails with
    /// [`CorpusError::EmptyCorpus`] when `lines` is empty; supplying a default
    /// corpus is the caller's job.
    pub fn build<S: AsRef<str>>(
        lines: &[S],
        tokenizer: Tokenizer,
    ) -> Result<(Self, Vec<Vec<TokenId>>), CorpusError> {
        if lines.is_empty() {
            return Err(CorpusError::EmptyCorpus);
        }

        let mut vocab = Self {
            tokenizer,
            ids: HashMap::new(),
            words: Vec::new(),
        };

        let sequences = lines
            .iter()
            .map(|line| {
                tokenizer
                    .tokenize(line.as_ref())
                    .into_iter()
                    .map(|word| vocab.intern(word))
                    .collect()
            })
            .collect();

        Ok((vocab, sequences))
    }

    fn intern(&mut self, word: String) -> TokenId {
        if let Some(&id) = self.ids.get(&word) {
            return id;
        }
        let id = (self.words.len() + 1) as TokenId;
        self.words.push(word.clone());
        self.ids.insert(word, id);
        id
    }

    /// Number of distinct words plus one for the sentinel.
    pub fn len(&self) -> usize {
        self.words.len() + 1
    }

    /// True when the corpus produced no words at all.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn tokenizer(&self) -> Tokenizer {
        self.tokenizer
    }

    /// Id for `word`, or [`SENTINEL`] when unknown.
    pub fn id(&self, word: &str) -> TokenId {
        self.ids.get(word).copied().unwrap_or(SENTINEL)
    }

    pub fn word(&self, id: TokenId) -> Option<&str> {
        if id == SENTINEL {
            return None;
        }
        self.words.get(id as usize - 1).map(String::as_str)
    }

    /// Tokenizes `text` with the corpus tokenizer; unknown words map to the sentinel.
    pub fn encode(&self, text: &str) -> Vec<TokenId> {
        self.tokenizer
            .tokenize(text)
            .iter()
            .map(|word| self.id(word))
            .collect()
    }

    /// Joins the words for `ids` with single spaces, skipping sentinel ids.
    pub fn decode(&self, ids: &[TokenId]) -> String {
        ids.iter()
            .filter_map(|&id| self.word(id))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_first_occurrence() {
        let lines = ["Oi, como você está?", "Estou bem, e você?"];
        let (vocab, seqs) = Vocabulary::build(&lines, Tokenizer::default()).unwrap();

        assert_eq!(vocab.id("Oi,"), 1);
        assert_eq!(vocab.id("como"), 2);
        assert_eq!(vocab.id("você"), 3);
        assert_eq!(vocab.id("está?"), 4);
        assert_eq!(vocab.id("Estou"), 5);
        assert_eq!(seqs, vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8]]);
    }

    #[test]
    fn test_size_is_distinct_plus_one() {
        let lines = ["a b a", "b c", "d"];
        let (vocab, _) = Vocabulary::build(&lines, Tokenizer::default()).unwrap();

        assert_eq!(vocab.len(), 5);
        for word in ["a", "b", "c", "d"] {
            assert_ne!(vocab.id(word), SENTINEL);
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let lines = ["o gato dorme", "o cão late alto"];
        let (a, seq_a) = Vocabulary::build(&lines, Tokenizer::default()).unwrap();
        let (b, seq_b) = Vocabulary::build(&lines, Tokenizer::default()).unwrap();

        assert_eq!(seq_a, seq_b);
        for word in ["o", "gato", "dorme", "cão", "late", "alto"] {
            assert_eq!(a.id(word), b.id(word));
        }
    }

    #[test]
    fn test_empty_corpus_is_rejected() {
        let lines: [&str; 0] = [];
        let err = Vocabulary::build(&lines, Tokenizer::default()).unwrap_err();
        assert_eq!(err, CorpusError::EmptyCorpus);
    }

    #[test]
    fn test_casing_preserved_by_default() {
        let (vocab, _) = Vocabulary::build(&["Olá olá"], Tokenizer::default()).unwrap();
        assert_eq!(vocab.len(), 3);
        assert_ne!(vocab.id("Olá"), vocab.id("olá"));
    }

    #[test]
    fn test_fold_case_strips_punctuation() {
        let tokenizer = Tokenizer::new(true);
        assert_eq!(
            tokenizer.tokenize("Oi, como você está?"),
            vec!["oi", "como", "você", "está"]
        );

        let (vocab, _) = Vocabulary::build(&["Olá! olá"], tokenizer).unwrap();
        assert_eq!(vocab.len(), 2);
    }

    #[test]
    fn test_encode_maps_unknown_to_sentinel() {
        let (vocab, _) = Vocabulary::build(&["eu sou a luna"], Tokenizer::default()).unwrap();
        assert_eq!(vocab.encode("eu sou o robô"), vec![1, 2, SENTINEL, SENTINEL]);
    }

    #[test]
    fn test_decode_skips_sentinel() {
        let (vocab, _) = Vocabulary::build(&["eu sou a luna"], Tokenizer::default()).unwrap();
        assert_eq!(vocab.decode(&[SENTINEL, 4, 1, 99]), "luna eu");
        assert_eq!(vocab.word(SENTINEL), None);
    }
}
