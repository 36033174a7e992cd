use burn::{
    tensor::{backend::Backend, Int, Tensor},
    train::metric::{AccuracyInput, Adaptor, LossInput},
};
use derive_new::new;

use super::head::HeadOutput;

/// Token classification output adapted for the learner's metrics
#[derive(new)]
pub struct Output<B: Backend> {
    /// The loss.
    pub loss: Tensor<B, 1>,

    /// The logits: [batch_size, seq_length, num_labels]
    pub output: Tensor<B, 3>,

    /// The target label ids: [batch_size, seq_length]
    pub targets: Tensor<B, 2, Int>,
}

impl<B: Backend> Output<B> {
    /// Keep the parts of a head output the learner reports on
    pub fn from_head(head: HeadOutput<B>, targets: Tensor<B, 2, Int>) -> Self {
        Self {
            loss: head.loss,
            output: head.logits,
            targets,
        }
    }
}

impl<B: Backend> Adaptor<AccuracyInput<B>> for Output<B> {
    fn adapt(&self) -> AccuracyInput<B> {
        let [batch_size, seq_length, n_classes] = self.output.dims();

        AccuracyInput::new(
            self.output
                .clone()
                .reshape([batch_size * seq_length, n_classes]),
            self.targets.clone().reshape([batch_size * seq_length]),
        )
    }
}

impl<B: Backend> Adaptor<LossInput<B>> for Output<B> {
    fn adapt(&self) -> LossInput<B> {
        LossInput::new(self.loss.clone())
    }
}
