//! Response sources for conversation mode.

use crate::predictor::SequencePredictor;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Something that can answer a free-form utterance while conversation mode is on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResponseSource: Send + Sync {
    async fn respond(&self, prompt: &str) -> Result<String>;
}

/// Answers from the locally trained [`SequencePredictor`].
pub struct LocalResponder {
    predictor: Arc<SequencePredictor>,
}

impl LocalResponder {
    pub fn new(predictor: Arc<SequencePredictor>) -> Self {
        Self { predictor }
    }
}

#[async_trait]
impl ResponseSource for LocalResponder {
    async fn respond(&self, prompt: &str) -> Result<String> {
        let predictor = Arc::clone(&self.predictor);
        let prompt = prompt.to_string();
        let response =
            tokio::task::spawn_blocking(move || predictor.generate_response(&prompt)).await??;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::PredictorConfig;
    use crate::vocabulary::{Tokenizer, Vocabulary};
    use std::time::Duration;

    #[tokio::test]
    async fn test_local_responder_generates_from_corpus() {
        let config = PredictorConfig {
            response_tokens: 2,
            ..PredictorConfig::default()
        };
        let predictor = SequencePredictor::from_corpus(
            &["eu sou a luna"],
            Tokenizer::default(),
            config,
        )
        .unwrap();
        let responder = LocalResponder::new(Arc::new(predictor));

        assert_eq!(responder.respond("eu sou").await.unwrap(), "a luna");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_local_responder_does_not_block_the_runtime() {
        let config = PredictorConfig {
            response_tokens: 20_000,
            ..PredictorConfig::default()
        };
        let predictor = SequencePredictor::from_corpus(
            &["eu sou a luna"],
            Tokenizer::default(),
            config,
        )
        .unwrap();
        let responder = LocalResponder::new(Arc::new(predictor));

        let result =
            tokio::time::timeout(Duration::from_millis(1), responder.respond("eu")).await;
        assert!(result.is_err(), "generation should be abandoned at the deadline");
    }

    #[tokio::test]
    async fn test_local_responder_surfaces_untrained_model() {
        let (vocab, _) = Vocabulary::build(&["eu sou a luna"], Tokenizer::default()).unwrap();
        let predictor = SequencePredictor::new(vocab, PredictorConfig::default());
        let responder = LocalResponder::new(Arc::new(predictor));

        let err = responder.respond("eu").await.unwrap_err();
        assert!(err.to_string().contains("before it was trained"));
    }
}
