use std::{collections::HashMap, path::PathBuf};

use bert_burn::{
    loader::{
        load_embeddings_from_safetensors, load_encoder_from_safetensors,
        load_pooler_from_safetensors,
    },
    model::{BertModelConfig, BertModelRecord},
};
use burn::tensor::backend::Backend;
use candle_core::{safetensors, Device};

/// The encoder part a checkpoint tensor belongs to
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Part {
    /// Word, position and token type embeddings
    Embeddings,

    /// Transformer encoder layers
    Encoder,

    /// Pooling layer
    Pooler,
}

/// Strip the model type prefix from a checkpoint key and find which encoder part it belongs to.
/// Keys outside the encoder (e.g. pretraining heads) yield None.
pub fn classify_key(key: &str, model_type: &str) -> Option<(Part, String)> {
    // If model name prefix present in keys, remove it to load keys consistently
    // across variants (bert-base, roberta-base etc.)
    let prefix = format!("{}.", model_type);
    let key = key.strip_prefix(&prefix).unwrap_or(key).to_string();

    if key.starts_with("encoder.layer.") {
        Some((Part::Encoder, key))
    } else if key.starts_with("embeddings.") {
        Some((Part::Embeddings, key))
    } else if key.starts_with("pooler.") {
        Some((Part::Pooler, key))
    } else {
        None
    }
}

/// Checkpoint tensors grouped by the encoder part they initialize
#[derive(Debug, Default)]
pub struct Checkpoint {
    /// Word, position and token type embedding tensors
    pub embeddings: HashMap<String, candle_core::Tensor>,

    /// Transformer encoder layer tensors
    pub encoder: HashMap<String, candle_core::Tensor>,

    /// Pooling layer tensors, only kept when the model has a pooler
    pub pooler: HashMap<String, candle_core::Tensor>,

    /// Every checkpoint variable sorted by name, with its shape and whether it was assigned
    pub variables: Vec<(String, Vec<usize>, bool)>,
}

impl Checkpoint {
    /// Group checkpoint tensors by encoder part. Pretraining heads and, without a pooler, the
    /// pooling layer are left unassigned.
    pub fn split(
        weights: HashMap<String, candle_core::Tensor>,
        model_type: &str,
        with_pooler: bool,
    ) -> Self {
        let mut checkpoint = Self::default();

        let mut weights: Vec<_> = weights.into_iter().collect();
        weights.sort_by(|(a, _), (b, _)| a.cmp(b));

        for (name, value) in weights {
            let shape = value.dims().to_vec();

            let assigned = match classify_key(&name, model_type) {
                Some((Part::Encoder, key)) => checkpoint.encoder.insert(key, value).is_none(),
                Some((Part::Embeddings, key)) => {
                    checkpoint.embeddings.insert(key, value).is_none()
                }
                Some((Part::Pooler, key)) if with_pooler => {
                    checkpoint.pooler.insert(key, value).is_none()
                }
                _ => false,
            };

            checkpoint.variables.push((name, shape, assigned));
        }

        checkpoint
    }

    /// Log every checkpoint variable, marking those used to initialize the encoder
    pub fn log_variables(&self) {
        log::info!("**** Checkpoint Variables ****");

        for (name, shape, assigned) in &self.variables {
            let init_string = if *assigned { ", *INIT_FROM_CKPT*" } else { "" };

            log::info!("  name = {}, shape = {:?}{}", name, shape, init_string);
        }
    }
}

/// Load the pretrained encoder weights from a safetensors checkpoint, logging every checkpoint
/// variable and whether it was used to initialize the encoder
pub fn load_encoder_record<B: Backend>(
    file_path: PathBuf,
    device: &B::Device,
    config: &BertModelConfig,
) -> anyhow::Result<BertModelRecord<B>> {
    let weights = safetensors::load::<PathBuf>(file_path.clone(), &Device::Cpu)
        .map_err(|e| anyhow!("Error loading weights from {:?}: {}", file_path, e))?;

    let with_pooler = config.with_pooling_layer.unwrap_or(false);

    let checkpoint = Checkpoint::split(weights, &config.model_type, with_pooler);
    checkpoint.log_variables();

    if checkpoint.encoder.is_empty() || checkpoint.embeddings.is_empty() {
        return Err(anyhow!(
            "No {} encoder weights found in {:?}",
            config.model_type,
            file_path
        ));
    }

    let embeddings = load_embeddings_from_safetensors(checkpoint.embeddings, device);
    let encoder = load_encoder_from_safetensors(checkpoint.encoder, device);
    let pooler =
        with_pooler.then(|| load_pooler_from_safetensors(checkpoint.pooler, device));

    Ok(BertModelRecord {
        embeddings,
        encoder,
        pooler,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn strips_the_model_prefix() {
        assert_eq!(
            classify_key("bert.encoder.layer.0.attention.self.query.weight", "bert"),
            Some((
                Part::Encoder,
                "encoder.layer.0.attention.self.query.weight".to_string()
            ))
        );
        assert_eq!(
            classify_key("embeddings.word_embeddings.weight", "bert"),
            Some((Part::Embeddings, "embeddings.word_embeddings.weight".to_string()))
        );
        assert_eq!(
            classify_key("bert.pooler.dense.bias", "bert"),
            Some((Part::Pooler, "pooler.dense.bias".to_string()))
        );
    }

    #[test]
    fn skips_pretraining_heads() {
        assert_eq!(classify_key("cls.predictions.bias", "bert"), None);
        assert_eq!(
            classify_key("cls.seq_relationship.weight", "bert"),
            None
        );
    }

    fn tensor(shape: &[usize]) -> candle_core::Tensor {
        candle_core::Tensor::zeros(shape, candle_core::DType::F32, &Device::Cpu).unwrap()
    }

    fn save_checkpoint(dir: &tempfile::TempDir, names: &[&str]) -> PathBuf {
        let weights: HashMap<String, candle_core::Tensor> = names
            .iter()
            .map(|name| (name.to_string(), tensor(&[2, 3])))
            .collect();

        let path = dir.path().join("model.safetensors");
        safetensors::save(&weights, &path).unwrap();
        path
    }

    fn config() -> BertModelConfig {
        BertModelConfig::new(2, 1, 1e-12, 8, 16, 32, 16, 2, 0.1, "bert".to_string(), 0)
    }

    #[test]
    fn rejects_checkpoints_without_encoder_weights() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_checkpoint(
            &dir,
            &["cls.predictions.bias", "bert.pooler.dense.weight"],
        );

        let result =
            load_encoder_record::<burn::backend::NdArray>(path, &Default::default(), &config());

        match result {
            Err(err) => assert!(err.to_string().contains("No bert encoder weights found")),
            Ok(_) => panic!("expected a checkpoint without encoder weights to be rejected"),
        }
    }

    #[test]
    fn pretraining_heads_are_not_assigned() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_checkpoint(
            &dir,
            &[
                "bert.embeddings.word_embeddings.weight",
                "bert.encoder.layer.0.output.dense.weight",
                "bert.pooler.dense.weight",
                "cls.predictions.bias",
                "cls.seq_relationship.weight",
            ],
        );

        let weights = safetensors::load(&path, &Device::Cpu).unwrap();
        let checkpoint = Checkpoint::split(weights, "bert", false);

        let assigned: Vec<(&str, bool)> = checkpoint
            .variables
            .iter()
            .map(|(name, _, assigned)| (name.as_str(), *assigned))
            .collect();

        assert_eq!(
            assigned,
            vec![
                ("bert.embeddings.word_embeddings.weight", true),
                ("bert.encoder.layer.0.output.dense.weight", true),
                ("bert.pooler.dense.weight", false),
                ("cls.predictions.bias", false),
                ("cls.seq_relationship.weight", false),
            ]
        );
        assert_eq!(checkpoint.variables[0].1, vec![2, 3]);
        assert!(checkpoint
            .encoder
            .contains_key("encoder.layer.0.output.dense.weight"));
        assert!(checkpoint.pooler.is_empty());
    }

    #[test]
    fn keeps_the_pooler_when_the_model_has_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_checkpoint(&dir, &["bert.pooler.dense.weight"]);

        let weights = safetensors::load(&path, &Device::Cpu).unwrap();
        let checkpoint = Checkpoint::split(weights, "bert", true);

        assert!(checkpoint.pooler.contains_key("pooler.dense.weight"));
        assert!(checkpoint.variables[0].2);
    }
}
