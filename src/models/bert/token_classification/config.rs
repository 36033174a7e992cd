//! Adapt BERT to the Token Classification pipeline

use std::{collections::BTreeMap, path::PathBuf};

use bert_burn::model::BertModelConfig;
use burn::{config::Config as _, tensor::backend::Backend};

use crate::{
    pipelines::token_classification::{
        self,
        config::{PAD_LABEL, PAD_LABEL_ID},
        HeadConfig,
    },
    utils::classes::label_map,
};

use super::{loader, Model};

/// The Model Configuration
#[derive(burn::config::Config)]
pub struct Config {
    // -- Fields copied from BertModelConfig because #[serde(flatten)] is not supported yet
    /// Number of attention heads in the multi-head attention
    pub num_attention_heads: usize,
    /// Number of transformer encoder layers/blocks
    pub num_hidden_layers: usize,
    /// Layer normalization epsilon
    pub layer_norm_eps: f64,
    /// Size of bert embedding (e.g., 768 for bert-base)
    pub hidden_size: usize,
    /// Size of the intermediate position wise feedforward layer
    pub intermediate_size: usize,
    /// Size of the vocabulary
    pub vocab_size: usize,
    /// Max position embeddings, for BERT equal to max_seq_len (512)
    pub max_position_embeddings: usize,
    /// Identifier for sentence type in input (e.g., 0 for single sentence, 1 for pair)
    pub type_vocab_size: usize,
    /// Dropout value across layers, typically 0.1
    pub hidden_dropout_prob: f64,
    /// BERT model name (bert)
    pub model_type: String,
    /// Index of the padding token
    pub pad_token_id: usize,
    /// Maximum sequence length for the tokenizer
    pub max_seq_len: Option<usize>,
    // -- End fields copied from BertModelConfig
    /// Standard deviation of the classification head's weight initializer
    #[config(default = 0.02)]
    pub initializer_range: f64,
    /// A map from label ids to label names, id 0 being the padding label
    pub id2label: BTreeMap<usize, String>,
}

impl Config {
    /// Extend a BERT configuration with token labels, reserving the first id for padding
    pub fn new_with_labels(model: BertModelConfig, labels: &[String]) -> Self {
        Config::new(
            model.num_attention_heads,
            model.num_hidden_layers,
            model.layer_norm_eps,
            model.hidden_size,
            model.intermediate_size,
            model.vocab_size,
            model.max_position_embeddings,
            model.type_vocab_size,
            model.hidden_dropout_prob,
            model.model_type,
            model.pad_token_id,
            label_map(PAD_LABEL, labels),
        )
        .with_max_seq_len(model.max_seq_len)
    }

    /// Get the Bert model configuration. Token classification reads every hidden state, so the
    /// pooling layer is left out.
    pub fn get_bert_config(&self) -> BertModelConfig {
        BertModelConfig::new(
            self.num_attention_heads,
            self.num_hidden_layers,
            self.layer_norm_eps,
            self.hidden_size,
            self.intermediate_size,
            self.vocab_size,
            self.max_position_embeddings,
            self.type_vocab_size,
            self.hidden_dropout_prob,
            self.model_type.clone(),
            self.pad_token_id,
        )
        .with_max_seq_len(self.max_seq_len)
        .with_with_pooling_layer(Some(false))
    }

    /// Get the classification head configuration
    pub fn get_head_config(&self) -> HeadConfig {
        HeadConfig::new(self.hidden_size, self.id2label.len())
            .with_dropout(self.hidden_dropout_prob)
            .with_initializer_range(self.initializer_range)
    }

    /// Initialize the model
    pub fn init<B: Backend>(&self, device: &B::Device) -> Model<B> {
        Model {
            model: self.get_bert_config().init(device),
            head: self.get_head_config().init(device),
        }
    }
}

impl token_classification::ModelConfig for Config {
    type Model<B: Backend> = Model<B>;

    /// Initialize the model
    fn init<B: Backend>(&self, device: &B::Device) -> Model<B> {
        self.init(device)
    }

    /// Load a pretrained model configuration
    fn load_pretrained(
        config_file: PathBuf,
        labels: &[String],
        hidden_dropout_prob: f64,
    ) -> anyhow::Result<Self> {
        let mut bert_config = BertModelConfig::load(config_file)
            .map_err(|e| anyhow!("Unable to load Hugging Face Config file: {}", e))?;

        bert_config.hidden_dropout_prob = hidden_dropout_prob;

        let model_config = Config::new_with_labels(bert_config, labels);

        if model_config.id2label.len() <= PAD_LABEL_ID + 1 {
            return Err(anyhow::anyhow!(
                "Classes are not defined in the model configuration"
            ));
        }

        Ok(model_config)
    }

    /// Initialize the model, restoring the encoder from the pretrained checkpoint
    fn load_from_safetensors<B: Backend>(
        &self,
        device: &B::Device,
        model_file: PathBuf,
    ) -> anyhow::Result<Model<B>> {
        let encoder = loader::load_encoder_record(model_file, device, &self.get_bert_config())?;

        let model = self.init(device);

        log::info!("**** Head Variables ****");
        log::info!(
            "  name = output_weights, shape = [{}, {}]",
            self.hidden_size,
            self.id2label.len()
        );
        log::info!("  name = output_bias, shape = [{}]", self.id2label.len());

        Ok(Model {
            model: model.model.load_record(encoder),
            head: model.head,
        })
    }

    fn set_max_seq_len(&mut self, max_seq_len: Option<usize>) {
        self.max_seq_len = max_seq_len;
    }

    fn get_config(&self) -> token_classification::Config {
        token_classification::Config {
            pad_token_id: self.pad_token_id,
            max_position_embeddings: self.max_position_embeddings,
            hidden_size: self.hidden_size,
            max_seq_len: self.max_seq_len,
            hidden_dropout_prob: self.hidden_dropout_prob,
            id2label: self.id2label.clone(),
        }
    }
}
