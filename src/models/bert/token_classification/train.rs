use burn::{
    tensor::backend::{AutodiffBackend, Backend},
    train::{TrainOutput, TrainStep, ValidStep},
};

use crate::pipelines::token_classification::{model_fn, Features, Mode, Output};

use super::Model;

/// Define training step
impl<B: AutodiffBackend> TrainStep<Features<B>, Output<B>> for Model<B> {
    fn step(&self, item: Features<B>) -> TrainOutput<Output<B>> {
        let targets = item.label_ids.clone();

        // Run the model function in train mode, calculate gradients of its loss and return them
        // along with the output
        let output = Output::from_head(model_fn(self, item, Mode::Train).into_output(), targets);
        let grads = output.loss.backward();

        TrainOutput::new(self, grads, output)
    }
}

/// Define validation step
impl<B: Backend> ValidStep<Features<B>, Output<B>> for Model<B> {
    fn step(&self, item: Features<B>) -> Output<B> {
        let targets = item.label_ids.clone();

        // Run the model function in eval mode and return the output
        Output::from_head(model_fn(self, item, Mode::Eval).into_output(), targets)
    }
}
