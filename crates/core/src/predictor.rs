//! Sequence Predictor
//!
//! A trainable next-token classifier over the corpus vocabulary. Every
//! (position-from-end, token) pair in the last `context_window` prefix slots
//! selects one row of an embedding table; the rows are summed into a hidden
//! vector, projected back onto the vocabulary with an output matrix plus bias,
//! and a softmax gives the next-token distribution. Both tables grow linearly
//! with the vocabulary. Weights start from a fixed-seed draw and are fitted
//! with plain SGD in example order, so the same corpus always produces the
//! same model.

use crate::dataset::{Dataset, TrainingExample, pad_left};
use crate::error::{ModelError, PredictorError};
use crate::vocabulary::{SENTINEL, TokenId, Tokenizer, Vocabulary};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

const INIT_SEED: u64 = 0x4c55_4e41;
const INIT_SCALE: f32 = 0.1;

/// Training and generation knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictorConfig {
    /// Passes over the full example set.
    pub epochs: usize,
    pub learning_rate: f32,
    /// How many trailing prefix slots feed the classifier.
    pub context_window: usize,
    /// Width of the hidden vector between the embedding and output tables.
    pub embedding_dim: usize,
    /// Fixed token budget for `generate_response`.
    pub response_tokens: usize,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            learning_rate: 0.1,
            context_window: 4,
            embedding_dim: 32,
            response_tokens: 12,
        }
    }
}

pub struct SequencePredictor {
    vocabulary: Vocabulary,
    config: PredictorConfig,
    /// `context_window * vocab` rows of `embedding_dim`.
    embeddings: Array2<f32>,
    /// `embedding_dim` rows of `vocab`.
    output: Array2<f32>,
    bias: Array1<f32>,
    /// Padded prefix length seen during training; `None` until trained.
    max_len: Option<usize>,
}

impl SequencePredictor {
    /// Creates an untrained predictor for `vocabulary`.
    pub fn new(vocabulary: Vocabulary, config: PredictorConfig) -> Self {
        let vocab = vocabulary.len();
        let config = PredictorConfig {
            context_window: config.context_window.max(1),
            embedding_dim: config.embedding_dim.max(1),
            ..config
        };
        let mut rng = StdRng::seed_from_u64(INIT_SEED);
        let embeddings = Array2::from_shape_fn(
            (config.context_window * vocab, config.embedding_dim),
            |_| rng.random_range(-INIT_SCALE..INIT_SCALE),
        );
        let output = Array2::from_shape_fn((config.embedding_dim, vocab), |_| {
            rng.random_range(-INIT_SCALE..INIT_SCALE)
        });
        Self {
            vocabulary,
            config,
            embeddings,
            output,
            bias: Array1::zeros(vocab),
            max_len: None,
        }
    }

    /// Tokenizes `lines`, expands them into examples and trains a fresh predictor.
    pub fn from_corpus<S: AsRef<str>>(
        lines: &[S],
        tokenizer: Tokenizer,
        config: PredictorConfig,
    ) -> Result<Self, ModelError> {
        let (vocabulary, sequences) = Vocabulary::build(lines, tokenizer)?;
        let dataset = Dataset::build(&sequences)?;
        let mut predictor = Self::new(vocabulary, config);
        predictor.train(&dataset.examples)?;
        Ok(predictor)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.max_len.is_some()
    }

    /// Prefix length the predictor was trained with.
    pub fn max_len(&self) -> Option<usize> {
        self.max_len
    }

    /// Number of trainable weights.
    pub fn parameter_count(&self) -> usize {
        self.embeddings.len() + self.output.len() + self.bias.len()
    }

    /// Fits the weights to `examples`. Callable once per instance.
    pub fn train(&mut self, examples: &[TrainingExample]) -> Result<(), PredictorError> {
        if self.is_trained() {
            return Err(PredictorError::AlreadyTrained);
        }
        let first = examples
            .first()
            .ok_or_else(|| PredictorError::Training("no training examples".to_string()))?;
        let max_len = first.padded_prefix.len();
        let vocab = self.vocabulary.len();
        for example in examples {
            if example.padded_prefix.len() != max_len {
                return Err(PredictorError::Training(format!(
                    "prefix length {} differs from {}",
                    example.padded_prefix.len(),
                    max_len
                )));
            }
            if example.target_id == SENTINEL || example.target_id as usize >= vocab {
                return Err(PredictorError::Training(format!(
                    "target id {} is outside the vocabulary",
                    example.target_id
                )));
            }
        }

        info!(
            examples = examples.len(),
            vocab,
            parameters = self.parameter_count(),
            epochs = self.config.epochs,
            "Training sequence predictor"
        );

        let lr = self.config.learning_rate;
        for epoch in 0..self.config.epochs {
            let mut loss = 0.0f32;
            for example in examples {
                let rows = self.feature_rows(&example.padded_prefix);
                let hidden = self.hidden(&rows);
                let mut grad = self.distribution(&hidden);
                let target = example.target_id as usize;
                loss -= grad[target].max(f32::MIN_POSITIVE).ln();
                grad[target] -= 1.0;

                let hidden_grad = self.output.dot(&grad);
                for (i, &h) in hidden.iter().enumerate() {
                    self.output.row_mut(i).scaled_add(-lr * h, &grad);
                }
                self.bias.scaled_add(-lr, &grad);
                for &row in &rows {
                    self.embeddings.row_mut(row).scaled_add(-lr, &hidden_grad);
                }
            }
            if epoch % 10 == 0 || epoch + 1 == self.config.epochs {
                debug!(epoch, loss = loss / examples.len() as f32, "Epoch finished");
            }
        }

        self.max_len = Some(max_len);
        info!("Sequence predictor trained");
        Ok(())
    }

    /// Next-token distribution for `prefix` left-padded to `max_len`.
    ///
    /// The sentinel always gets probability zero.
    pub fn probabilities(
        &self,
        prefix: &[TokenId],
        max_len: usize,
    ) -> Result<Array1<f32>, PredictorError> {
        if !self.is_trained() {
            return Err(PredictorError::NotTrained);
        }
        let rows = self.feature_rows(&pad_left(prefix, max_len));
        Ok(self.distribution(&self.hidden(&rows)))
    }

    /// Most probable next token id for `prefix` left-padded to `max_len`.
    pub fn predict_next(&self, prefix: &[TokenId], max_len: usize) -> Result<TokenId, PredictorError> {
        let probs = self.probabilities(prefix, max_len)?;
        let mut best = SENTINEL;
        let mut best_p = f32::NEG_INFINITY;
        for (id, &p) in probs.iter().enumerate().skip(1) {
            if p > best_p {
                best = id as TokenId;
                best_p = p;
            }
        }
        Ok(best)
    }

    /// Greedily extends `prompt` for the configured token budget and returns
    /// only the generated words.
    pub fn generate_response(&self, prompt: &str) -> Result<String, PredictorError> {
        let max_len = self.max_len.ok_or(PredictorError::NotTrained)?;
        let mut context = self.vocabulary.encode(prompt);
        let mut generated = Vec::with_capacity(self.config.response_tokens);
        for _ in 0..self.config.response_tokens {
            let next = self.predict_next(&context, max_len)?;
            context.push(next);
            generated.push(next);
        }
        Ok(self.vocabulary.decode(&generated))
    }

    /// Embedding rows active for an already padded prefix.
    fn feature_rows(&self, padded: &[TokenId]) -> Vec<usize> {
        let vocab = self.vocabulary.len();
        padded
            .iter()
            .rev()
            .take(self.config.context_window)
            .enumerate()
            .filter(|&(_, &id)| id != SENTINEL && (id as usize) < vocab)
            .map(|(offset, &id)| offset * vocab + id as usize)
            .collect()
    }

    fn hidden(&self, rows: &[usize]) -> Array1<f32> {
        let mut hidden = Array1::<f32>::zeros(self.config.embedding_dim);
        for &row in rows {
            hidden += &self.embeddings.row(row);
        }
        hidden
    }

    fn distribution(&self, hidden: &Array1<f32>) -> Array1<f32> {
        let mut logits = hidden.dot(&self.output) + &self.bias;
        logits[SENTINEL as usize] = f32::NEG_INFINITY;
        let max = logits.fold(f32::NEG_INFINITY, |acc, &x| acc.max(x));
        let mut exp = logits.mapv(|x| (x - max).exp());
        let sum = exp.sum();
        exp /= sum;
        exp
    }
}
