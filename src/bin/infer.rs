//! Command line tool to label the tokens of text samples with a trained model

use anyhow::anyhow;
use burn::backend::{libtorch::LibTorchDevice, LibTorch};
use bert_token_classification::{
    cli::{models::Model, pipelines::Pipeline},
    datasets::snips,
    models::bert,
    pipelines::token_classification::{config::artifact_dir, infer},
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: infer PIPELINE [OPTIONS] [TEXT]...

Arguments:
  PIPELINE             The pipeline to use (e.g., 'token-classification')
  TEXT                 Text samples to label (defaults to random samples from the Snips test split)

Options:
  -h, --help           Print help
  -m, --model          The model to use (e.g., 'bert-base-cased')
  -d, --data-dir       The path to the top-level data directory (defaults to 'data')
  --cpu                Run on the CPU instead of the first CUDA device
";

#[derive(Debug)]
struct Args {
    /// The pipeline to use
    pipeline: String,

    /// The model to use
    model: Option<String>,

    /// The top-level data directory
    data_dir: Option<String>,

    /// Run on the CPU
    use_cpu: bool,

    /// Text samples to label
    samples: Vec<String>,
}

impl Args {
    fn parse() -> anyhow::Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let model = pargs.opt_value_from_str(["-m", "--model"])?;
        let data_dir = pargs.opt_value_from_str(["-d", "--data-dir"])?;
        let use_cpu = pargs.contains("--cpu");

        let pipeline = pargs.free_from_str().map_err(|e| match e {
            pico_args::Error::MissingArgument => anyhow!("Missing required argument: PIPELINE"),
            _ => anyhow!("{}", e),
        })?;

        let samples = pargs
            .finish()
            .into_iter()
            .map(|s| {
                s.into_string()
                    .map_err(|s| anyhow!("Text is not valid UTF-8: {:?}", s))
            })
            .collect::<anyhow::Result<_>>()?;

        Ok(Some(Args {
            pipeline,
            model,
            data_dir,
            use_cpu,
            samples,
        }))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let Some(args) = Args::parse()? else {
        println!("{}", HELP);
        return Ok(());
    };

    let pipeline = Pipeline::try_from(args.pipeline.as_str())?;

    let model = if let Some(model) = args.model.as_deref() {
        Model::try_from(model)?
    } else {
        pipeline.default_model()
    };

    let data_dir = args.data_dir.unwrap_or_else(|| "data".to_string());
    let artifact_dir = artifact_dir(&data_dir, &model.to_string());

    let device = if args.use_cpu {
        LibTorchDevice::Cpu
    } else {
        LibTorchDevice::Cuda(0)
    };

    // Fall back to a few labelled samples so the expected slots can be shown alongside
    let samples: Vec<(String, Option<String>)> = if args.samples.is_empty() {
        snips::Dataset::get_samples(&data_dir)
            .await?
            .into_iter()
            .map(|(text, slots)| (text, Some(slots)))
            .collect()
    } else {
        args.samples.into_iter().map(|text| (text, None)).collect()
    };

    let input = samples.iter().map(|(text, _)| text.clone()).collect();

    // Get model predictions
    let predictions = match pipeline {
        Pipeline::TokenClassification => infer::<LibTorch, bert::token_classification::Config>(
            device,
            &artifact_dir,
            &model.to_string(),
            input,
        )?,
    };

    // Print out predictions for each sample
    for (i, ((text, expected), tokens)) in samples.iter().zip(predictions).enumerate() {
        let labels = tokens
            .iter()
            .map(|t| format!("{}/{} ({:.2})", t.token, t.label, t.score))
            .collect::<Vec<_>>()
            .join(" ");

        println!(
            "\n=== Item {i} ===\
             \n- Text: {text}\
             \n- Labels: {labels}"
        );

        if let Some(expected) = expected {
            println!("- Expected: {expected}");
        }

        println!("================");
    }

    Ok(())
}
