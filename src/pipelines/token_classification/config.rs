use std::collections::BTreeMap;

use burn::LearningRate;

/// The label reserved for special tokens, continuation sub-tokens and padding
pub static PAD_LABEL: &str = "[PAD]";

/// The label id reserved for [`PAD_LABEL`]
pub const PAD_LABEL_ID: usize = 0;

/// The label used for tokens outside of any entity
pub static OUTSIDE_LABEL: &str = "O";

/// The common model configuration properties needed for the pipeline
#[derive(Debug, Clone)]
pub struct Config {
    /// The padding token ID
    pub pad_token_id: usize,

    /// The max position embeddings
    pub max_position_embeddings: usize,

    /// The size of the hidden state
    pub hidden_size: usize,

    /// An optional max sequence length, if different from max position embeddings
    pub max_seq_len: Option<usize>,

    /// The hidden dropout probability
    pub hidden_dropout_prob: f64,

    /// A mapping from class ids to class name labels
    pub id2label: BTreeMap<usize, String>,
}

impl Config {
    /// The longest tokenized sequence the model accepts
    pub fn max_seq_length(&self) -> usize {
        self.max_seq_len
            .unwrap_or(self.max_position_embeddings)
            .min(self.max_position_embeddings)
    }
}

/// Define configuration struct for the experiment
#[derive(burn::config::Config)]
pub struct Training {
    /// Training batch size
    #[config(default = 32)]
    pub batch_size: usize,

    /// Evaluation batch size
    #[config(default = 8)]
    pub eval_batch_size: usize,

    /// Prediction batch size
    #[config(default = 8)]
    pub predict_batch_size: usize,

    /// Number of epochs
    #[config(default = 3)]
    pub num_epochs: usize,

    /// Maximum tokenized sequence length, longer inputs are truncated
    #[config(default = 128)]
    pub max_seq_length: usize,

    /// Adam epsilon
    #[config(default = 1e-6)]
    pub adam_epsilon: f32,

    /// Decoupled weight decay
    #[config(default = 0.01)]
    pub weight_decay: f32,

    /// Initial learning rate
    #[config(default = 5e-5)]
    pub learning_rate: LearningRate,

    /// Proportion of training steps used for learning rate warmup
    #[config(default = 0.1)]
    pub warmup_proportion: f64,

    /// Dropout rate
    #[config(default = 0.1)]
    pub hidden_dropout_prob: f64,

    /// Initialize the encoder from the pretrained checkpoint, otherwise start from scratch
    #[config(default = true)]
    pub init_checkpoint: bool,

    /// The location of the top-level data directory
    #[config(default = "\"data\".to_string()")]
    pub data_dir: String,

    /// Model name (e.g., "bert-base-cased")
    pub model_name: String,

    /// The Dataset to use (e.g., "snips")
    pub dataset_name: String,

    /// Token class labels for the selected dataset
    pub labels: Vec<String>,
}

impl Training {
    /// Where the trained config, weights, checkpoints and reports are kept
    pub fn artifact_dir(&self) -> String {
        artifact_dir(&self.data_dir, &self.model_name)
    }

    /// Total optimizer steps for a training set of the given size
    pub fn num_train_steps(&self, num_examples: usize) -> usize {
        num_examples.div_ceil(self.batch_size.max(1)) * self.num_epochs
    }

    /// Warmup steps for a training set of the given size
    pub fn num_warmup_steps(&self, num_examples: usize) -> usize {
        (self.num_train_steps(num_examples) as f64 * self.warmup_proportion) as usize
    }
}

/// Where the artifacts of a model trained by this pipeline are kept
pub fn artifact_dir(data_dir: &str, model_name: &str) -> String {
    format!("{}/token-classification/{}", data_dir, model_name)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn training() -> Training {
        Training::new(
            "bert-base-cased".to_string(),
            "snips".to_string(),
            vec!["O".to_string()],
        )
    }

    #[test]
    fn computes_train_and_warmup_steps() {
        let config = training().with_batch_size(32).with_num_epochs(3);

        assert_eq!(config.num_train_steps(100), 12);
        assert_eq!(config.num_warmup_steps(100), 1);
        assert_eq!(config.num_train_steps(0), 0);
    }

    #[test]
    fn places_artifacts_under_the_data_dir() {
        let config = training().with_data_dir("/tmp/data".to_string());

        assert_eq!(
            config.artifact_dir(),
            "/tmp/data/token-classification/bert-base-cased"
        );
    }

    #[test]
    fn caps_the_sequence_length_at_the_position_embeddings() {
        let mut config = Config {
            pad_token_id: 0,
            max_position_embeddings: 512,
            hidden_size: 768,
            max_seq_len: None,
            hidden_dropout_prob: 0.1,
            id2label: BTreeMap::new(),
        };

        assert_eq!(config.max_seq_length(), 512);

        config.max_seq_len = Some(128);
        assert_eq!(config.max_seq_length(), 128);

        config.max_seq_len = Some(1024);
        assert_eq!(config.max_seq_length(), 512);
    }
}
