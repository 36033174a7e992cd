use std::collections::BTreeMap;

use burn::{
    data::dataloader,
    nn::attention::generate_padding_mask,
    tensor::{backend::Backend, Data, Shape, Tensor},
};
use tokenizers::{Encoding, Tokenizer, TruncationParams};

use crate::utils::{classes::invert_map, tensors};

use super::{
    config::{Config, OUTSIDE_LABEL, PAD_LABEL_ID},
    features::{Features, Infer},
    Item,
};

/// Batcher Error
#[derive(thiserror::Error, Debug)]
pub enum BatcherError {
    /// The tokenizer rejected the input
    #[error("unable to encode {input:?}: {message}")]
    Encode {
        /// The text that failed to encode
        input: String,

        /// The tokenizer's error message
        message: String,
    },

    /// The tokenizer rejected the truncation settings
    #[error("unable to truncate to {max_length} tokens: {message}")]
    Truncation {
        /// The requested maximum sequence length
        max_length: usize,

        /// The tokenizer's error message
        message: String,
    },
}

/// Struct for batching token classification items
#[derive(Clone)]
pub struct Batcher<B: Backend> {
    /// Tokenizer for converting text to token IDs
    pub tokenizer: Tokenizer,

    /// Maximum sequence length for tokenized text
    pub max_seq_length: usize,

    /// ID of the padding token
    pub pad_token_id: usize,

    /// Label ID used for words whose label is unknown
    pub outside_label_id: usize,

    /// A mapping from class ids to class name labels
    pub id2label: BTreeMap<usize, String>,

    /// A mapping from class name labels to class ids
    pub label2id: BTreeMap<String, usize>,

    /// Device on which to perform computation (e.g., CPU or CUDA device)
    pub device: B::Device,
}

/// A single tokenized item, truncated to the max sequence length
#[derive(Debug, Clone, PartialEq)]
struct Tokenized {
    token_ids: Vec<usize>,
    segment_ids: Vec<usize>,
    label_ids: Vec<usize>,

    /// False when the tokenizer failed and the item was replaced by an empty sequence
    encoded: bool,
}

impl<B: Backend> Batcher<B> {
    /// Creates a new batcher. The tokenizer truncates to the max sequence length before adding
    /// special tokens, so long inputs keep their trailing `[SEP]`.
    pub fn new(
        mut tokenizer: Tokenizer,
        config: Config,
        device: B::Device,
    ) -> Result<Self, BatcherError> {
        let max_seq_length = config.max_seq_length();

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_seq_length,
                ..Default::default()
            }))
            .map_err(|e| BatcherError::Truncation {
                max_length: max_seq_length,
                message: e.to_string(),
            })?;

        let label2id: BTreeMap<String, usize> = invert_map(config.id2label.clone());

        let outside_label_id = label2id
            .get(OUTSIDE_LABEL)
            .copied()
            .unwrap_or(PAD_LABEL_ID);

        Ok(Self {
            tokenizer,
            max_seq_length,
            pad_token_id: config.pad_token_id,
            outside_label_id,
            id2label: config.id2label,
            label2id,
            device,
        })
    }

    /// Tokenize a single text, adding special tokens
    pub fn tokenize(&self, input: &str) -> Result<Encoding, BatcherError> {
        self.tokenizer
            .encode(input, true)
            .map_err(|e| BatcherError::Encode {
                input: input.to_string(),
                message: e.to_string(),
            })
    }

    /// Map word labels to label ids
    pub fn word_label_ids(&self, labels: &[&str]) -> Vec<usize> {
        labels
            .iter()
            .map(|label| {
                self.label2id
                    .get(*label)
                    .copied()
                    .unwrap_or(self.outside_label_id)
            })
            .collect()
    }

    /// Look up the label name for a label id
    pub fn label(&self, id: usize) -> &str {
        self.id2label.get(&id).map(String::as_str).unwrap_or(OUTSIDE_LABEL)
    }

    fn encode(&self, input: &str) -> Option<Encoding> {
        match self.tokenize(input) {
            Ok(encoding) => Some(encoding),
            Err(e) => {
                log::warn!("{}, substituting an empty sequence with no weight", e);
                None
            }
        }
    }

    fn tokenized(&self, input: &str, labels: &[&str]) -> Tokenized {
        let encoding = self.encode(input);
        let encoded = encoding.is_some();
        let encoding = encoding.unwrap_or_default();

        let label_ids = align_labels(
            encoding.get_offsets(),
            encoding.get_special_tokens_mask(),
            &word_spans(input),
            &self.word_label_ids(labels),
        );

        Tokenized {
            token_ids: encoding.get_ids().iter().map(|t| *t as usize).collect(),
            segment_ids: encoding.get_type_ids().iter().map(|t| *t as usize).collect(),
            label_ids,
            encoded,
        }
    }

    fn infer_batch(&self, tokenized: &[Tokenized]) -> Infer<B> {
        let pad_mask = generate_padding_mask(
            self.pad_token_id,
            tokenized.iter().map(|t| t.token_ids.clone()).collect(),
            Some(self.max_seq_length),
            &self.device,
        );

        let seq_length = pad_mask.tensor.dims()[1];

        let segment_ids = tensors::pad_to::<B>(
            0,
            tokenized.iter().map(|t| t.segment_ids.clone()).collect(),
            seq_length,
            &self.device,
        );

        Infer {
            input_ids: pad_mask.tensor,
            input_mask: pad_mask.mask,
            segment_ids,
        }
    }
}

/// Implement Batcher trait for Batcher struct for inference
impl<B: Backend> dataloader::batcher::Batcher<String, Infer<B>> for Batcher<B> {
    /// Collects a vector of raw texts into an inference batch
    fn batch(&self, items: Vec<String>) -> Infer<B> {
        let tokenized: Vec<_> = items
            .iter()
            .map(|input| self.tokenized(input, &[]))
            .collect();

        self.infer_batch(&tokenized)
    }
}

/// Implement Batcher trait for Batcher struct for training, evaluation and prediction
impl<B: Backend, I: Item> dataloader::batcher::Batcher<I, Features<B>> for Batcher<B> {
    /// Collects a vector of token classification items into a labelled batch
    fn batch(&self, items: Vec<I>) -> Features<B> {
        let batch_size = items.len();

        let tokenized: Vec<_> = items
            .iter()
            .map(|item| self.tokenized(item.input(), &item.class_labels()))
            .collect();

        let input = self.infer_batch(&tokenized);
        let seq_length = input.input_ids.dims()[1];

        // Items the tokenizer rejected carry no weight
        let weights: Vec<f32> = items
            .iter()
            .zip(tokenized.iter())
            .map(|(item, t)| {
                if item.is_real_example() && t.encoded {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();

        // Pad the label ids to match the tokenized sequence length
        let label_ids = tensors::pad_to::<B>(
            PAD_LABEL_ID,
            tokenized.into_iter().map(|t| t.label_ids).collect(),
            seq_length,
            &self.device,
        );

        let is_real_example =
            Tensor::from_floats(Data::new(weights, Shape::new([batch_size])), &self.device);

        Features {
            input,
            label_ids,
            is_real_example: Some(is_real_example),
        }
    }
}

/// Byte spans of the whitespace-separated words in the text
pub fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;

    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }

    if let Some(s) = start {
        spans.push((s, text.len()));
    }

    spans
}

/// Assign word labels to tokens. The first token of each word carries the word's label, while
/// special tokens and continuation sub-tokens carry the padding label.
pub fn align_labels(
    offsets: &[(usize, usize)],
    special_tokens_mask: &[u32],
    word_spans: &[(usize, usize)],
    word_label_ids: &[usize],
) -> Vec<usize> {
    let mut previous_word = None;

    offsets
        .iter()
        .enumerate()
        .map(|(i, (start, _))| {
            if special_tokens_mask.get(i) == Some(&1) {
                return PAD_LABEL_ID;
            }

            let word = word_spans
                .iter()
                .position(|(word_start, word_end)| word_start <= start && start < word_end);

            let label = match word {
                Some(w) if previous_word != Some(w) => {
                    word_label_ids.get(w).copied().unwrap_or(PAD_LABEL_ID)
                }
                _ => PAD_LABEL_ID,
            };

            previous_word = word;
            label
        })
        .collect()
}
