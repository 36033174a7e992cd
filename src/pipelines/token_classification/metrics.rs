use std::collections::BTreeMap;

use burn::tensor::{backend::Backend, ElementConversion, Int, Tensor};
use serde::{Deserialize, Serialize};

use super::head::HeadOutput;

/// A running weighted mean
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WeightedMean {
    /// Sum of weighted values
    pub total: f64,

    /// Sum of weights
    pub weight: f64,
}

impl WeightedMean {
    /// Add a weighted sum and its total weight
    pub fn update(&mut self, total: f64, weight: f64) {
        self.total += total;
        self.weight += weight;
    }

    /// The current mean, or 0.0 when nothing has been weighed yet
    pub fn value(&self) -> f64 {
        if self.weight == 0.0 {
            0.0
        } else {
            self.total / self.weight
        }
    }
}

/// Streaming evaluation metrics: weighted token accuracy and weighted mean token loss
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EvalMetrics {
    /// Fraction of positions where the prediction matches the label
    pub accuracy: WeightedMean,

    /// Mean cross-entropy per position
    pub loss: WeightedMean,
}

/// The evaluation results as written to disk
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Weighted token accuracy
    pub eval_accuracy: f64,

    /// Weighted mean token loss
    pub eval_loss: f64,
}

impl EvalMetrics {
    /// Metrics for a single batch. Each position is weighted by its example's weight.
    pub fn from_batch<B: Backend>(
        output: &HeadOutput<B>,
        label_ids: Tensor<B, 2, Int>,
        weights: Tensor<B, 1>,
    ) -> Self {
        let [batch_size, seq_length] = label_ids.dims();
        let device = output.predictions.device();

        let token_weights = Tensor::<B, 2>::ones([batch_size, seq_length], &device)
            .mul(weights.to_device(&device).reshape([batch_size, 1]));

        let weight = sum(token_weights.clone());

        let correct = sum(
            output
                .predictions
                .clone()
                .equal(label_ids.to_device(&device))
                .float()
                .mul(token_weights.clone()),
        );

        let loss = sum(output.per_example_loss.clone().mul(token_weights));

        let mut metrics = Self::default();
        metrics.accuracy.update(correct, weight);
        metrics.loss.update(loss, weight);
        metrics
    }

    /// Fold another batch's metrics into these
    pub fn merge(&mut self, other: &EvalMetrics) {
        self.accuracy.update(other.accuracy.total, other.accuracy.weight);
        self.loss.update(other.loss.total, other.loss.weight);
    }

    /// Weighted token accuracy
    pub fn eval_accuracy(&self) -> f64 {
        self.accuracy.value()
    }

    /// Weighted mean token loss
    pub fn eval_loss(&self) -> f64 {
        self.loss.value()
    }

    /// Snapshot the current values
    pub fn report(&self) -> Report {
        Report {
            eval_accuracy: self.eval_accuracy(),
            eval_loss: self.eval_loss(),
        }
    }

    /// Metric names mapped to their current values
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("eval_accuracy", self.eval_accuracy()),
            ("eval_loss", self.eval_loss()),
        ])
    }
}

fn sum<B: Backend>(tensor: Tensor<B, 2>) -> f64 {
    tensor.sum().into_scalar().elem::<f64>()
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::pipelines::token_classification::head::classification_outputs;

    type TestBackend = NdArray;

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-4, "{} != {}", actual, expected);
    }

    fn batch() -> (HeadOutput<TestBackend>, Tensor<TestBackend, 2, Int>) {
        let device = Default::default();

        // first example: one right, one wrong; second example: both right
        let logits = Tensor::<TestBackend, 3>::from_floats(
            [[[0.0, 1.0], [2.0, 0.0]], [[3.0, 0.0], [0.0, 3.0]]],
            &device,
        );
        let labels = Tensor::<TestBackend, 2, Int>::from_ints([[0, 0], [0, 1]], &device);

        (classification_outputs(logits, labels.clone()), labels)
    }

    #[test]
    fn weighs_every_example_equally_by_default() {
        let device = Default::default();
        let (output, labels) = batch();

        let metrics = EvalMetrics::from_batch(
            &output,
            labels,
            Tensor::<TestBackend, 1>::ones([2], &device),
        );

        assert_close(metrics.eval_accuracy(), 0.75);
        assert_close(metrics.accuracy.weight, 4.0);
        assert_close(
            metrics.eval_loss(),
            (1.313_262 + 0.126_928 + 0.048_587 + 0.048_587) / 4.0,
        );
    }

    #[test]
    fn ignores_examples_that_are_not_real() {
        let device = Default::default();
        let (output, labels) = batch();

        let metrics = EvalMetrics::from_batch(
            &output,
            labels,
            Tensor::<TestBackend, 1>::from_floats([0.0, 1.0], &device),
        );

        assert_close(metrics.eval_accuracy(), 1.0);
        assert_close(metrics.eval_loss(), 0.048_587);
    }

    #[test]
    fn merges_batches_as_a_stream() {
        let mut metrics = EvalMetrics::default();

        let mut first = EvalMetrics::default();
        first.accuracy.update(3.0, 4.0);
        first.loss.update(2.0, 4.0);

        let mut second = EvalMetrics::default();
        second.accuracy.update(0.0, 4.0);
        second.loss.update(6.0, 4.0);

        metrics.merge(&first);
        metrics.merge(&second);

        assert_eq!(
            metrics.report(),
            Report {
                eval_accuracy: 3.0 / 8.0,
                eval_loss: 1.0,
            }
        );
    }

    #[test]
    fn reports_zero_without_any_weight() {
        let metrics = EvalMetrics::default();

        assert_eq!(
            metrics.to_map(),
            BTreeMap::from([("eval_accuracy", 0.0), ("eval_loss", 0.0)])
        );
    }

    #[test]
    fn report_serializes_with_metric_names() {
        let report = Report {
            eval_accuracy: 0.5,
            eval_loss: 0.25,
        };

        let json = serde_json::to_value(report).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "eval_accuracy": 0.5, "eval_loss": 0.25 })
        );
    }
}
