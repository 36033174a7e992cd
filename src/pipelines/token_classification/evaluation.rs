use burn::{
    data::{dataloader::batcher::Batcher as BatcherTrait, dataset::Dataset},
    tensor::backend::Backend,
};

use crate::{
    datasets::padding::Padded,
    utils::files::write_file,
};

use super::{
    config::PAD_LABEL_ID,
    estimator::{model_fn, Predictions, Spec},
    inference::load_artifacts,
    metrics::{EvalMetrics, Report},
    Batcher, Features, Item, Mode, ModelConfig, TokenClassifier,
};

/// Evaluate a trained model on a dataset, writing `eval_results.json` to the artifact directory
pub async fn evaluate<B, C, I, D>(
    device: B::Device,  // Device on which to perform computation (e.g., CPU or CUDA device)
    artifact_dir: &str, // Directory containing the model config and weights
    model_name: &str,   // The name of the model (e.g., "bert-base-cased")
    dataset: D,         // Evaluation dataset
    batch_size: usize,  // Evaluation batch size
) -> anyhow::Result<Report>
where
    B: Backend,
    C: ModelConfig,
    I: Item,
    D: Dataset<I>,
{
    let (model, batcher) = load_artifacts::<B, C>(&device, artifact_dir, model_name)?;

    log::info!("***** Running evaluation *****");
    log::info!("  Num examples = {}", dataset.len());
    log::info!("  Batch size = {}", batch_size);

    let metrics = eval_metrics(&model, &batcher, &Padded::new(dataset, batch_size), batch_size);

    log::info!("***** Eval results *****");
    for (name, value) in metrics.to_map() {
        log::info!("  {} = {}", name, value);
    }

    let report = metrics.report();

    write_file(
        format!("{artifact_dir}/eval_results.json"),
        &[serde_json::to_string_pretty(&report)?],
    )
    .await?;

    Ok(report)
}

/// Predict labels for a dataset, writing `predictions.txt` to the artifact directory
pub async fn predict<B, C, I, D>(
    device: B::Device,  // Device on which to perform computation (e.g., CPU or CUDA device)
    artifact_dir: &str, // Directory containing the model config and weights
    model_name: &str,   // The name of the model (e.g., "bert-base-cased")
    dataset: D,         // Prediction dataset
    batch_size: usize,  // Prediction batch size
) -> anyhow::Result<Vec<String>>
where
    B: Backend,
    C: ModelConfig,
    I: Item,
    D: Dataset<I>,
{
    let (model, batcher) = load_artifacts::<B, C>(&device, artifact_dir, model_name)?;

    log::info!("***** Running prediction *****");
    log::info!("  Num examples = {}", dataset.len());
    log::info!("  Batch size = {}", batch_size);

    let lines = prediction_lines(&model, &batcher, &Padded::new(dataset, batch_size), batch_size);

    write_file(format!("{artifact_dir}/predictions.txt"), &lines).await?;

    Ok(lines)
}

/// Run the model function in eval mode over every batch and merge the metrics
pub fn eval_metrics<B, M, I, D>(
    model: &M,
    batcher: &Batcher<B>,
    dataset: &D,
    batch_size: usize,
) -> EvalMetrics
where
    B: Backend,
    M: TokenClassifier<B>,
    I: Item,
    D: Dataset<I>,
{
    let mut metrics = EvalMetrics::default();

    for items in batches(dataset, batch_size) {
        let features: Features<B> = batcher.batch(items);

        if let Spec::Eval { metrics: batch, .. } = model_fn(model, features, Mode::Eval) {
            metrics.merge(&batch);
        }
    }

    metrics
}

/// Run the model function in predict mode over every batch, producing one `token label predicted`
/// line per labelled token of each real example, with a blank line after each example
pub fn prediction_lines<B, M, I, D>(
    model: &M,
    batcher: &Batcher<B>,
    dataset: &D,
    batch_size: usize,
) -> Vec<String>
where
    B: Backend,
    M: TokenClassifier<B>,
    I: Item,
    D: Dataset<I>,
{
    let mut lines = Vec::new();

    for items in batches(dataset, batch_size) {
        let real: Vec<bool> = items.iter().map(Item::is_real_example).collect();
        let features: Features<B> = batcher.batch(items);

        if let Spec::Predict { predictions, .. } = model_fn(model, features, Mode::Predict) {
            lines.extend(format_predictions(batcher, predictions, &real));
        }
    }

    lines
}

fn format_predictions<B: Backend>(
    batcher: &Batcher<B>,
    predictions: Predictions<B>,
    real: &[bool],
) -> Vec<String> {
    let [_, seq_length] = predictions.input_ids.dims();

    let input_ids = predictions.input_ids.into_data().convert::<i64>().value;
    let label_ids = predictions.label_ids.into_data().convert::<i64>().value;
    let predicts = predictions.predicts.into_data().convert::<i64>().value;

    let mut lines = Vec::new();

    for (example, is_real) in real.iter().enumerate() {
        if !is_real {
            continue;
        }

        for position in example * seq_length..(example + 1) * seq_length {
            let label_id = label_ids[position] as usize;

            if label_id == PAD_LABEL_ID {
                continue;
            }

            let token = batcher
                .tokenizer
                .id_to_token(input_ids[position] as u32)
                .unwrap_or_else(|| "[UNK]".to_string());

            lines.push(format!(
                "{} {} {}",
                token,
                batcher.label(label_id),
                batcher.label(predicts[position] as usize)
            ));
        }

        lines.push(String::new());
    }

    lines
}

/// Split a dataset into consecutive batches of items
fn batches<'a, I: 'a, D: Dataset<I>>(
    dataset: &'a D,
    batch_size: usize,
) -> impl Iterator<Item = Vec<I>> + 'a {
    let batch_size = batch_size.max(1);
    let len = dataset.len();

    (0..len).step_by(batch_size).map(move |start| {
        (start..(start + batch_size).min(len))
            .filter_map(|index| dataset.get(index))
            .collect()
    })
}
