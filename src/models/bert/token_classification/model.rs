use bert_burn::{
    data::BertInferenceBatch,
    model::{BertModel, BertModelOutput},
};
use burn::{
    module::Module,
    tensor::{activation::softmax, backend::Backend, Tensor},
};

use crate::pipelines::token_classification::{
    Features, Head, HeadOutput, Infer, TokenClassifier,
};

/// BERT for Token Classification
#[derive(Module, Debug)]
pub struct Model<B: Backend> {
    /// The base BERT model
    pub model: BertModel<B>,

    /// Per-token classification head
    pub head: Head<B>,
}

/// Define model behavior
impl<B: Backend> Model<B> {
    /// The encoder's final hidden states: [batch_size, seq_length, hidden_size]
    pub fn encode(&self, input: Infer<B>) -> Tensor<B, 3> {
        let BertModelOutput { hidden_states, .. } = self.model.forward(BertInferenceBatch {
            tokens: input.input_ids,
            mask_pad: input.input_mask,
        });

        hidden_states
    }

    /// Defines forward pass for training, evaluation and prediction
    pub fn forward(&self, features: Features<B>, training: bool) -> HeadOutput<B> {
        let hidden_states = self.encode(features.input);

        self.head
            .forward(hidden_states, features.label_ids, training)
    }

    /// Defines forward pass for inference
    pub fn infer(&self, input: Infer<B>) -> Tensor<B, 3> {
        let logits = self.head.logits(self.encode(input), false);

        softmax(logits, 2)
    }
}

impl<B: Backend> TokenClassifier<B> for Model<B> {
    fn classify(&self, features: Features<B>, training: bool) -> HeadOutput<B> {
        self.forward(features, training)
    }

    fn infer(&self, input: Infer<B>) -> Tensor<B, 3> {
        self.infer(input)
    }
}
