use burn::tensor::{backend::Backend, Int, Tensor};

use super::{
    features::Features, head::HeadOutput, metrics::EvalMetrics, model::TokenClassifier, Mode,
};

/// What the model function hands back to the harness for each mode. Every variant keeps the
/// head output so the learner can report on it.
#[derive(Debug, Clone)]
pub enum Spec<B: Backend> {
    /// The loss to differentiate
    Train {
        /// Head output, holding the mean loss over the batch
        output: HeadOutput<B>,
    },

    /// The loss and evaluation metrics
    Eval {
        /// Head output, holding the mean loss over the batch
        output: HeadOutput<B>,

        /// Weighted accuracy and loss for the batch
        metrics: EvalMetrics,
    },

    /// Predictions alongside their inputs and labels
    Predict {
        /// Predicted label ids with their inputs
        predictions: Predictions<B>,

        /// Head output the predictions were taken from
        output: HeadOutput<B>,
    },
}

impl<B: Backend> Spec<B> {
    /// The mode this spec was built for
    pub fn mode(&self) -> Mode {
        match self {
            Spec::Train { .. } => Mode::Train,
            Spec::Eval { .. } => Mode::Eval,
            Spec::Predict { .. } => Mode::Predict,
        }
    }

    /// The loss, when the mode computes one
    pub fn loss(&self) -> Option<Tensor<B, 1>> {
        match self {
            Spec::Train { output } | Spec::Eval { output, .. } => Some(output.loss.clone()),
            Spec::Predict { .. } => None,
        }
    }

    /// The head output behind this spec
    pub fn into_output(self) -> HeadOutput<B> {
        match self {
            Spec::Train { output } | Spec::Eval { output, .. } | Spec::Predict { output, .. } => {
                output
            }
        }
    }
}

/// The predict-mode record
#[derive(Debug, Clone)]
pub struct Predictions<B: Backend> {
    /// Token ids: [batch_size, seq_length]
    pub input_ids: Tensor<B, 2, Int>,

    /// Gold label ids: [batch_size, seq_length]
    pub label_ids: Tensor<B, 2, Int>,

    /// Predicted label ids: [batch_size, seq_length]
    pub predicts: Tensor<B, 2, Int>,
}

/// Run the classifier on a batch and assemble the loss, metrics or predictions for the mode
pub fn model_fn<B: Backend, M: TokenClassifier<B>>(
    model: &M,
    features: Features<B>,
    mode: Mode,
) -> Spec<B> {
    features.log_shapes();

    let input_ids = features.input.input_ids.clone();
    let label_ids = features.label_ids.clone();
    let weights = features.example_weights();

    let output = model.classify(features, mode.is_training());

    match mode {
        Mode::Train => Spec::Train { output },
        Mode::Eval => {
            let metrics = EvalMetrics::from_batch(&output, label_ids, weights);

            Spec::Eval { output, metrics }
        }
        Mode::Predict => Spec::Predict {
            predictions: Predictions {
                input_ids,
                label_ids,
                predicts: output.predictions.clone(),
            },
            output,
        },
    }
}
