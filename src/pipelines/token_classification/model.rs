use std::path::PathBuf;

use burn::{
    module::Module,
    tensor::{backend::Backend, Tensor},
};

use super::{
    config::Config,
    features::{Features, Infer},
    head::HeadOutput,
};

/// Anything that can label every token of a batch
pub trait TokenClassifier<B: Backend> {
    /// Run the encoder and head against the batch's labels
    fn classify(&self, features: Features<B>, training: bool) -> HeadOutput<B>;

    /// Label probabilities for an unlabelled batch: [batch_size, seq_length, num_labels]
    fn infer(&self, input: Infer<B>) -> Tensor<B, 3>;
}

/// A trait for configs that can be used for Token Classification models
pub trait ModelConfig: burn::config::Config + Clone {
    /// The model this config builds
    type Model<B: Backend>: Module<B> + TokenClassifier<B>;

    /// Initialize the model with fresh weights
    fn init<B: Backend>(&self, device: &B::Device) -> Self::Model<B>;

    /// Load a pretrained model configuration, extended with the given token labels
    fn load_pretrained(
        config_file: PathBuf,
        labels: &[String],
        hidden_dropout_prob: f64,
    ) -> anyhow::Result<Self>;

    /// Initialize the model with encoder weights from a pretrained checkpoint
    fn load_from_safetensors<B: Backend>(
        &self,
        device: &B::Device,
        model_file: PathBuf,
    ) -> anyhow::Result<Self::Model<B>>;

    /// Set the maximum sequence length
    fn set_max_seq_len(&mut self, max_seq_len: Option<usize>);

    /// Return the Config needed for the token classification pipeline
    fn get_config(&self) -> Config;
}
