/// Execution modes
pub mod mode;

/// Common config for Token Classification
pub mod config;

/// Batched model inputs
pub mod features;

/// Token Classification Items
pub mod item;

/// Batcher
pub mod batcher;

/// The classification head
pub mod head;

/// Evaluation metrics
pub mod metrics;

/// Learner output
pub mod output;

/// Common model config and traits for token classification
pub mod model;

/// The per-mode model function
pub mod estimator;

/// Token Classification Training
pub mod training;

/// Token Classification Evaluation and Prediction
pub mod evaluation;

/// Token Classification Inference
pub mod inference;

#[cfg(test)]
mod fixtures;

pub use batcher::Batcher;
pub use config::Config;
pub use estimator::{model_fn, Predictions, Spec};
pub use evaluation::{evaluate, predict};
pub use features::{Features, Infer};
pub use head::{Head, HeadConfig, HeadOutput};
pub use inference::infer;
pub use item::Item;
pub use metrics::{EvalMetrics, Report};
pub use mode::{Mode, ModeError};
pub use model::{ModelConfig, TokenClassifier};
pub use output::Output;
pub use training::train;
