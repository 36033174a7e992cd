//! Command line tool to fine-tune, evaluate and predict with a token classification model

use anyhow::anyhow;
use burn::backend::{libtorch::LibTorchDevice, Autodiff, LibTorch};
use bert_token_classification::{
    cli::{datasets::Dataset, models::Model, pipelines::Pipeline},
    datasets::{snips, LoadableDataset},
    models::bert,
    pipelines::token_classification::{self, config::artifact_dir},
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: train PIPELINE DATASET [OPTIONS]

Arguments:
  PIPELINE               The pipeline to use (e.g., 'token-classification')
  DATASET                The dataset to use (e.g., 'snips')

Options:
  -h, --help             Print help
  -m, --model            The model to use (e.g., 'bert-base-cased')
  -d, --data-dir         The path to the top-level data directory (defaults to 'data')
  -n, --num-epochs       Number of epochs to train for
  -b, --batch-size       Batch size
  --max-seq-length       Maximum tokenized sequence length
  --do-train             Fine-tune the model (the default when no --do-* flag is given)
  --do-eval              Evaluate the trained model on the test split
  --do-predict           Write predictions for the test split
  --no-init-checkpoint   Start from freshly initialized weights instead of the pretrained ones
  --cpu                  Run on the CPU instead of the first CUDA device
  --no-tui               Disable TUI
";

#[derive(Debug)]
struct Args {
    pipeline: String,
    dataset: String,
    model: Option<String>,
    num_epochs: Option<usize>,
    batch_size: Option<usize>,
    max_seq_length: Option<usize>,
    data_dir: Option<String>,
    do_train: bool,
    do_eval: bool,
    do_predict: bool,
    init_checkpoint: bool,
    use_cpu: bool,
    use_tui: bool,
}

impl Args {
    fn parse() -> anyhow::Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let mut args = Args {
            model: pargs.opt_value_from_str(["-m", "--model"])?,
            num_epochs: pargs.opt_value_from_str(["-n", "--num-epochs"])?,
            batch_size: pargs.opt_value_from_str(["-b", "--batch-size"])?,
            max_seq_length: pargs.opt_value_from_str("--max-seq-length")?,
            data_dir: pargs.opt_value_from_str(["-d", "--data-dir"])?,
            do_train: pargs.contains("--do-train"),
            do_eval: pargs.contains("--do-eval"),
            do_predict: pargs.contains("--do-predict"),
            init_checkpoint: !(pargs.contains("--no-init-checkpoint")),
            use_cpu: pargs.contains("--cpu"),
            use_tui: !(pargs.contains("--no-tui")),
            pipeline: pargs.free_from_str().map_err(|e| match e {
                pico_args::Error::MissingArgument => anyhow!("Missing required argument: PIPELINE"),
                _ => anyhow!("{}", e),
            })?,
            dataset: pargs.free_from_str().map_err(|e| match e {
                pico_args::Error::MissingArgument => anyhow!("Missing required argument: DATASET"),
                _ => anyhow!("{}", e),
            })?,
        };

        if !(args.do_train || args.do_eval || args.do_predict) {
            args.do_train = true;
        }

        Ok(Some(args))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let Some(args) = Args::parse()? else {
        print!("{}", HELP);

        return Ok(());
    };

    let pipeline = Pipeline::try_from(args.pipeline.as_str())?;

    let model = if let Some(model) = args.model.as_deref() {
        Model::try_from(model)?
    } else {
        pipeline.default_model()
    };

    if !model.is_supported(&pipeline) {
        return Err(anyhow!("{} does not support the {} pipeline", model, pipeline));
    }

    let dataset = Dataset::try_from(args.dataset.as_str())?;

    match pipeline {
        Pipeline::TokenClassification => handle_token_classification(&dataset, &model, &args).await,
    }
}

/// The experiment config with command line overrides applied. Labels are left empty until the
/// training split is loaded, since evaluation and prediction read them from the saved model.
fn training_config(
    model: &Model,
    dataset: &Dataset,
    data_dir: &str,
    args: &Args,
) -> token_classification::training::Config {
    let mut config = token_classification::training::Config::new(
        model.to_string(),
        dataset.to_string(),
        Vec::new(),
    )
    .with_data_dir(data_dir.to_string())
    .with_init_checkpoint(args.init_checkpoint);

    if let Some(num_epochs) = args.num_epochs {
        config.num_epochs = num_epochs;
    }

    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
        config.eval_batch_size = batch_size;
        config.predict_batch_size = batch_size;
    }

    if let Some(max_seq_length) = args.max_seq_length {
        config.max_seq_length = max_seq_length;
    }

    config
}

async fn handle_token_classification(
    dataset: &Dataset,
    model: &Model,
    args: &Args,
) -> anyhow::Result<()> {
    let device = if args.use_cpu {
        LibTorchDevice::Cpu
    } else {
        LibTorchDevice::Cuda(0)
    };

    match dataset {
        Dataset::Snips => {
            let data_dir = args.data_dir.clone().unwrap_or_else(|| "data".to_string());

            let mut config = training_config(model, dataset, &data_dir, args);

            if args.do_train {
                let train = snips::Dataset::load(&data_dir, "train").await?;
                let test = snips::Dataset::load(&data_dir, "test").await?;

                config.labels = train.labels.clone();

                token_classification::train::<
                    Autodiff<LibTorch>,
                    bert::token_classification::Config,
                    snips::Item,
                    snips::Dataset,
                >(vec![device], train, test, config.clone(), args.use_tui)
                .await?;
            }

            let artifact_dir = artifact_dir(&data_dir, &model.to_string());

            if args.do_eval {
                let test = snips::Dataset::load(&data_dir, "test").await?;

                token_classification::evaluate::<
                    LibTorch,
                    bert::token_classification::Config,
                    snips::Item,
                    snips::Dataset,
                >(
                    device,
                    &artifact_dir,
                    &config.model_name,
                    test,
                    config.eval_batch_size,
                )
                .await?;
            }

            if args.do_predict {
                let test = snips::Dataset::load(&data_dir, "test").await?;

                let lines = token_classification::predict::<
                    LibTorch,
                    bert::token_classification::Config,
                    snips::Item,
                    snips::Dataset,
                >(
                    device,
                    &artifact_dir,
                    &config.model_name,
                    test,
                    config.predict_batch_size,
                )
                .await?;

                log::info!(
                    "Wrote {} prediction lines to {}/predictions.txt",
                    lines.len(),
                    artifact_dir
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn args() -> Args {
        Args {
            pipeline: "token-classification".to_string(),
            dataset: "snips".to_string(),
            model: None,
            num_epochs: Some(1),
            batch_size: Some(4),
            max_seq_length: None,
            data_dir: None,
            do_train: false,
            do_eval: true,
            do_predict: false,
            init_checkpoint: false,
            use_cpu: true,
            use_tui: false,
        }
    }

    #[test]
    fn builds_the_config_without_reading_the_training_split() {
        let model = Model::Bert("bert-base-cased".to_string());

        let config = training_config(&model, &Dataset::Snips, "/tmp/data", &args());

        assert!(config.labels.is_empty());
        assert_eq!(config.model_name, "bert-base-cased");
        assert_eq!(config.dataset_name, "snips");
        assert_eq!(config.data_dir, "/tmp/data");
        assert_eq!(config.num_epochs, 1);
        assert_eq!(
            (config.batch_size, config.eval_batch_size, config.predict_batch_size),
            (4, 4, 4)
        );
        assert_eq!(config.max_seq_length, 128);
        assert!(!config.init_checkpoint);
    }
}
