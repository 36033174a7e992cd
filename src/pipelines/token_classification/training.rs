use std::fmt::Display;

use burn::{
    config::Config as _,
    data::{
        dataloader::DataLoaderBuilder,
        dataset::{transform::ShuffledDataset, Dataset},
    },
    grad_clipping::GradientClippingConfig,
    lr_scheduler::noam::NoamLrSchedulerConfig,
    module::{AutodiffModule, Module},
    optim::AdamWConfig,
    record::{CompactRecorder, Recorder},
    tensor::backend::AutodiffBackend,
    train::{
        metric::{AccuracyMetric, CudaMetric, LearningRateMetric, LossMetric},
        LearnerBuilder, TrainStep, ValidStep,
    },
};
use tokenizers::Tokenizer;

use crate::utils::{hugging_face::download_hf_model, renderer};

use super::{
    config::{Training, PAD_LABEL_ID},
    Batcher, Features, Item, ModelConfig, Output,
};

/// Training Config
pub type Config = Training;

/// Fine-tune a pretrained encoder with a token classification head, saving the model config and
/// trained weights under the configured artifact directory
pub async fn train<B, C, I, D>(
    devices: Vec<B::Device>, // Devices on which to perform computation (e.g., CPU or CUDA device)
    dataset_train: D,        // Training dataset
    dataset_test: D,         // Testing dataset
    config: Config,          // Experiment configuration
    use_tui: bool,           // Render progress with the TUI instead of the log
) -> anyhow::Result<C>
where
    B: AutodiffBackend,
    C: ModelConfig,
    I: Item + 'static,
    D: Dataset<I> + 'static,
    C::Model<B>: AutodiffModule<B> + TrainStep<Features<B>, Output<B>> + Display + 'static,
    <C::Model<B> as AutodiffModule<B>>::InnerModule: ValidStep<
        Features<<B as AutodiffBackend>::InnerBackend>,
        Output<<B as AutodiffBackend>::InnerBackend>,
    >,
{
    let device = devices
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("At least one training device is required"))?;

    let artifact_dir = config.artifact_dir();

    std::fs::create_dir_all(&artifact_dir)
        .map_err(|e| anyhow!("Unable to create artifact directory {}: {}", artifact_dir, e))?;

    let files = download_hf_model(&config.model_name).await?;

    let mut model_config =
        C::load_pretrained(files.config, &config.labels, config.hidden_dropout_prob)
            .map_err(|e| anyhow!("Unable to load pre-trained model config file: {}", e))?;

    model_config.set_max_seq_len(Some(config.max_seq_length));

    let model = if config.init_checkpoint {
        model_config.load_from_safetensors::<B>(&device, files.weights)?
    } else {
        log::info!("Initializing every variable from scratch");

        model_config.init::<B>(&device)
    };

    log::info!("Model parameters: {}", model.num_params());

    // Initialize tokenizer
    let tokenizer = Tokenizer::from_pretrained(&config.model_name, None)
        .map_err(|e| anyhow!("Unable to load tokenizer for {}: {}", config.model_name, e))?;

    // Initialize batchers for training and testing data
    let batcher_train =
        Batcher::<B>::new(tokenizer.clone(), model_config.get_config(), device.clone())?;
    let batcher_test =
        Batcher::<B::InnerBackend>::new(tokenizer, model_config.get_config(), device.clone())?;

    let num_examples = dataset_train.len();
    let num_train_steps = config.num_train_steps(num_examples);
    let num_warmup_steps = config.num_warmup_steps(num_examples);

    log::info!("***** Running training *****");
    log::info!("  Num examples = {}", num_examples);
    log::info!("  Batch size = {}", config.batch_size);
    log::info!("  Num steps = {}", num_train_steps);
    log::info!("  Num warmup steps = {}", num_warmup_steps);

    let workers = std::thread::available_parallelism()?;

    // Initialize data loaders for training and testing data
    let dataloader_train = DataLoaderBuilder::new(batcher_train)
        .batch_size(config.batch_size)
        .num_workers(workers.into())
        .build(ShuffledDataset::with_seed(dataset_train, 42));

    let dataloader_test = DataLoaderBuilder::new(batcher_test)
        .batch_size(config.eval_batch_size)
        .num_workers(workers.into())
        .build(dataset_test);

    // Initialize optimizer
    let optimizer = AdamWConfig::new()
        .with_epsilon(config.adam_epsilon)
        .with_weight_decay(config.weight_decay)
        .with_grad_clipping(Some(GradientClippingConfig::Norm(1.0)))
        .init();

    // Initialize learning rate scheduler
    let lr_scheduler = NoamLrSchedulerConfig::new(config.learning_rate)
        .with_warmup_steps(num_warmup_steps.max(1))
        .with_model_size(model_config.get_config().hidden_size)
        .init();

    // Initialize learner
    let builder = LearnerBuilder::new(&artifact_dir)
        .metric_train(CudaMetric::new())
        .metric_valid(CudaMetric::new())
        .metric_train_numeric(AccuracyMetric::new().with_pad_token(PAD_LABEL_ID))
        .metric_valid_numeric(AccuracyMetric::new().with_pad_token(PAD_LABEL_ID))
        .metric_train_numeric(LossMetric::new())
        .metric_valid_numeric(LossMetric::new())
        .metric_train_numeric(LearningRateMetric::new())
        .with_file_checkpointer(CompactRecorder::new())
        .devices(devices)
        .num_epochs(config.num_epochs)
        .summary();

    let builder = if use_tui {
        builder
    } else {
        builder.renderer(renderer::Simple::new())
    };

    let learner = builder.build(model, optimizer, lr_scheduler);

    // Train the model
    let model_trained = learner.fit(dataloader_train, dataloader_test);

    // Save the configurations and the trained model
    config
        .save(format!("{artifact_dir}/training.json"))
        .map_err(|e| anyhow!("Unable to save training config: {}", e))?;

    model_config
        .save(format!("{artifact_dir}/config.json"))
        .map_err(|e| anyhow!("Unable to save model config: {}", e))?;

    CompactRecorder::new()
        .record(
            model_trained.into_record(),
            format!("{artifact_dir}/model").into(),
        )
        .map_err(|e| anyhow!("Unable to save trained model weights: {}", e))?;

    log::info!("Saved the trained model to {}", artifact_dir);

    Ok(model_config)
}
