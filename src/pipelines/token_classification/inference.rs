use burn::{
    config::Config as _,
    data::dataloader::batcher::Batcher as BatcherTrait,
    module::Module,
    record::{CompactRecorder, Recorder},
    tensor::backend::Backend,
};
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use super::{Batcher, Infer, ModelConfig, TokenClassifier};

/// A token with its predicted label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenLabel {
    /// The token text
    pub token: String,

    /// The predicted label name
    pub label: String,

    /// The probability of the predicted label
    pub score: f32,
}

/// Load a trained model and a batcher for it from the artifact directory
pub fn load_artifacts<B: Backend, C: ModelConfig>(
    device: &B::Device, // Device on which to perform computation (e.g., CPU or CUDA device)
    artifact_dir: &str, // Directory containing the model config and weights
    model_name: &str,   // The name of the model (e.g., "bert-base-cased")
) -> anyhow::Result<(C::Model<B>, Batcher<B>)> {
    // Load experiment configuration
    let model_config = C::load(format!("{artifact_dir}/config.json").as_str())
        .map_err(|e| anyhow!("Unable to load config file: {}", e))?;

    // Initialize tokenizer
    let tokenizer = Tokenizer::from_pretrained(model_name, None)
        .map_err(|e| anyhow!("Unable to load tokenizer for {}: {}", model_name, e))?;

    let batcher = Batcher::<B>::new(tokenizer, model_config.get_config(), device.clone())?;

    // Load trained model weights
    let record: <C::Model<B> as Module<B>>::Record = CompactRecorder::new()
        .load(format!("{artifact_dir}/model").into(), device)
        .map_err(|e| anyhow!("Unable to load trained model weights: {}", e))?;

    let model = model_config.init::<B>(device).load_record(record);

    Ok((model, batcher))
}

/// Label every token of the given text samples
pub fn infer<B: Backend, C: ModelConfig>(
    device: B::Device,    // Device on which to perform computation (e.g., CPU or CUDA device)
    artifact_dir: &str,   // Directory containing the model config and weights
    model_name: &str,     // The name of the model (e.g., "bert-base-cased")
    samples: Vec<String>, // Text samples for inference
) -> anyhow::Result<Vec<Vec<TokenLabel>>> {
    let (model, batcher) = load_artifacts::<B, C>(&device, artifact_dir, model_name)?;

    label_tokens(&model, &batcher, samples)
}

/// Run the classifier over raw text and pair each non-special token with its best label
pub fn label_tokens<B: Backend, M: TokenClassifier<B>>(
    model: &M,
    batcher: &Batcher<B>,
    samples: Vec<String>,
) -> anyhow::Result<Vec<Vec<TokenLabel>>> {
    let encodings = samples
        .iter()
        .map(|sample| batcher.tokenize(sample))
        .collect::<Result<Vec<_>, _>>()?;

    let input: Infer<B> = batcher.batch(samples);
    let probabilities = model.infer(input);

    let [_, seq_length, _] = probabilities.dims();

    let scores = probabilities
        .clone()
        .max_dim(2)
        .into_data()
        .convert::<f32>()
        .value;

    let label_ids = probabilities.argmax(2).into_data().convert::<i64>().value;

    let labelled = encodings
        .iter()
        .enumerate()
        .map(|(i, encoding)| {
            encoding
                .get_tokens()
                .iter()
                .zip(encoding.get_special_tokens_mask())
                .enumerate()
                .take(seq_length)
                .filter(|(_, (_, special))| **special == 0)
                .map(|(j, (token, _))| {
                    let position = i * seq_length + j;

                    TokenLabel {
                        token: token.clone(),
                        label: batcher.label(label_ids[position] as usize).to_string(),
                        score: scores[position],
                    }
                })
                .collect()
        })
        .collect();

    Ok(labelled)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::pipelines::token_classification::fixtures::{batcher, Scripted};

    #[test]
    fn labels_every_non_special_token() {
        let model = Scripted {
            num_labels: 4,
            label: Some(3),
        };

        let labelled = label_tokens(
            &model,
            &batcher(None),
            vec!["in paris".to_string(), "play".to_string()],
        )
        .unwrap();

        let tokens: Vec<Vec<(&str, &str)>> = labelled
            .iter()
            .map(|sample| {
                sample
                    .iter()
                    .map(|t| (t.token.as_str(), t.label.as_str()))
                    .collect()
            })
            .collect();

        assert_eq!(
            tokens,
            vec![
                vec![("in", "B-city"), ("paris", "B-city")],
                vec![("play", "B-city")],
            ]
        );
        assert!(labelled[0][0].score > 0.99);
    }
}
