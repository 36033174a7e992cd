//! Shared test doubles for the token classification pipeline

use std::{collections::BTreeMap, str::FromStr};

use burn::{
    backend::NdArray,
    tensor::{Data, Shape, Tensor},
};
use tokenizers::Tokenizer;

use super::{
    head::{classification_outputs, HeadOutput},
    Batcher, Config, Features, Infer, Item, TokenClassifier,
};

pub type TestBackend = NdArray;

pub const TOKENIZER: &str = r#"{
    "version": "1.0",
    "truncation": null,
    "padding": null,
    "added_tokens": [],
    "normalizer": null,
    "pre_tokenizer": { "type": "WhitespaceSplit" },
    "post_processor": {
        "type": "BertProcessing",
        "sep": ["[SEP]", 3],
        "cls": ["[CLS]", 2]
    },
    "decoder": null,
    "model": {
        "type": "WordLevel",
        "vocab": {
            "[PAD]": 0, "[UNK]": 1, "[CLS]": 2, "[SEP]": 3,
            "play": 4, "some": 5, "jazz": 6, "in": 7, "paris": 8
        },
        "unk_token": "[UNK]"
    }
}"#;

pub fn config(max_seq_len: Option<usize>) -> Config {
    Config {
        pad_token_id: 0,
        max_position_embeddings: 16,
        hidden_size: 4,
        max_seq_len,
        hidden_dropout_prob: 0.1,
        id2label: BTreeMap::from([
            (0, "[PAD]".to_string()),
            (1, "O".to_string()),
            (2, "B-music_item".to_string()),
            (3, "B-city".to_string()),
        ]),
    }
}

pub fn batcher(max_seq_len: Option<usize>) -> Batcher<TestBackend> {
    batcher_with(TOKENIZER, max_seq_len)
}

pub fn batcher_with(tokenizer: &str, max_seq_len: Option<usize>) -> Batcher<TestBackend> {
    let tokenizer = Tokenizer::from_str(tokenizer).unwrap();

    Batcher::new(tokenizer, config(max_seq_len), Default::default()).unwrap()
}

#[derive(Clone, Debug)]
pub struct TestItem {
    pub input: String,
    pub labels: String,
    pub real: bool,
}

impl TestItem {
    pub fn new(input: &str, labels: &str) -> Self {
        Self {
            input: input.to_string(),
            labels: labels.to_string(),
            real: true,
        }
    }
}

impl Item for TestItem {
    fn input(&self) -> &str {
        &self.input
    }

    fn class_labels(&self) -> Vec<&str> {
        self.labels.split_whitespace().collect()
    }

    fn is_real_example(&self) -> bool {
        self.real
    }
}

/// Predicts a fixed label everywhere, or the gold label when none is fixed
pub struct Scripted {
    pub num_labels: usize,
    pub label: Option<usize>,
}

impl Scripted {
    fn logits(&self, ids: Vec<i64>, dims: [usize; 2]) -> Tensor<TestBackend, 3> {
        let [batch_size, seq_length] = dims;

        let mut values = vec![0.0f32; batch_size * seq_length * self.num_labels];
        for (position, id) in ids.into_iter().enumerate() {
            let label = self.label.unwrap_or(id as usize);
            values[position * self.num_labels + label] = 10.0;
        }

        Tensor::from_floats(
            Data::new(values, Shape::new([batch_size, seq_length, self.num_labels])),
            &Default::default(),
        )
    }
}

impl TokenClassifier<TestBackend> for Scripted {
    fn classify(&self, features: Features<TestBackend>, _training: bool) -> HeadOutput<TestBackend> {
        let dims = features.label_ids.dims();
        let ids = features.label_ids.clone().into_data().convert::<i64>().value;

        classification_outputs(self.logits(ids, dims), features.label_ids)
    }

    fn infer(&self, input: Infer<TestBackend>) -> Tensor<TestBackend, 3> {
        let dims = input.input_ids.dims();

        burn::tensor::activation::softmax(self.logits(vec![1; dims[0] * dims[1]], dims), 2)
    }
}
