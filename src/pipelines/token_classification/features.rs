use burn::tensor::{backend::Backend, Bool, Int, Tensor};
use derive_new::new;

/// An inference batch for token classification
#[derive(Debug, Clone, new)]
pub struct Infer<B: Backend> {
    /// Token ids: [batch_size, seq_length]
    pub input_ids: Tensor<B, 2, Int>,

    /// Padding mask, true at padding locations: [batch_size, seq_length]
    pub input_mask: Tensor<B, 2, Bool>,

    /// Token type ids: [batch_size, seq_length]
    pub segment_ids: Tensor<B, 2, Int>,
}

/// A labelled batch for token classification, used for training, evaluation and prediction
#[derive(Debug, Clone, new)]
pub struct Features<B: Backend> {
    /// Encoder input
    pub input: Infer<B>,

    /// Label ids for every token: [batch_size, seq_length]
    pub label_ids: Tensor<B, 2, Int>,

    /// Per-example weight, 0.0 for padding examples: [batch_size]
    pub is_real_example: Option<Tensor<B, 1>>,
}

impl<B: Backend> Features<B> {
    /// The per-example weights, defaulting to 1.0 for every example
    pub fn example_weights(&self) -> Tensor<B, 1> {
        match &self.is_real_example {
            Some(weights) => weights.clone(),
            None => {
                let [batch_size, _] = self.label_ids.dims();

                Tensor::ones([batch_size], &self.label_ids.device())
            }
        }
    }

    /// Feature names with their shapes, sorted by name
    pub fn shapes(&self) -> Vec<(&'static str, Vec<usize>)> {
        let mut shapes = vec![
            ("input_ids", self.input.input_ids.dims().to_vec()),
            ("input_mask", self.input.input_mask.dims().to_vec()),
            ("label_ids", self.label_ids.dims().to_vec()),
            ("segment_ids", self.input.segment_ids.dims().to_vec()),
        ];

        if let Some(weights) = &self.is_real_example {
            shapes.push(("is_real_example", weights.dims().to_vec()));
        }

        shapes.sort_by_key(|(name, _)| *name);
        shapes
    }

    /// Log the name and shape of each feature
    pub fn log_shapes(&self) {
        log::info!("*** Features ***");

        for (name, shape) in self.shapes() {
            log::info!("  name = {}, shape = {:?}", name, shape);
        }
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use pretty_assertions::assert_eq;

    use super::*;

    type TestBackend = NdArray;

    fn features(is_real_example: Option<Tensor<TestBackend, 1>>) -> Features<TestBackend> {
        let device = Default::default();

        Features::new(
            Infer::new(
                Tensor::from_ints([[101, 7, 102], [101, 102, 0]], &device),
                Tensor::<TestBackend, 2, Int>::from_ints([[0, 0, 0], [0, 0, 1]], &device)
                    .equal_elem(1),
                Tensor::zeros([2, 3], &device),
            ),
            Tensor::from_ints([[0, 1, 0], [0, 0, 0]], &device),
            is_real_example,
        )
    }

    #[test]
    fn defaults_every_example_to_real() {
        let weights = features(None).example_weights();

        assert_eq!(weights.into_data().convert::<f32>().value, vec![1.0, 1.0]);
    }

    #[test]
    fn uses_explicit_example_weights() {
        let device = Default::default();
        let weights = features(Some(Tensor::from_floats([1.0, 0.0], &device))).example_weights();

        assert_eq!(weights.into_data().convert::<f32>().value, vec![1.0, 0.0]);
    }

    #[test]
    fn lists_shapes_sorted_by_name() {
        let device = Default::default();
        let shapes = features(Some(Tensor::from_floats([1.0, 1.0], &device))).shapes();

        assert_eq!(
            shapes,
            vec![
                ("input_ids", vec![2, 3]),
                ("input_mask", vec![2, 3]),
                ("is_real_example", vec![2]),
                ("label_ids", vec![2, 3]),
                ("segment_ids", vec![2, 3]),
            ]
        );
    }
}
