use std::path::PathBuf;

use hf_hub::api::tokio;

/// Local paths to the files of a pretrained model on the Hugging Face Hub
#[derive(Debug, Clone)]
pub struct PretrainedFiles {
    /// The model's `config.json`
    pub config: PathBuf,

    /// The model's `model.safetensors` weights
    pub weights: PathBuf,
}

/// Download model config and weights from Hugging Face Hub
/// If file exists in cache, it will not be downloaded again
// NOTE: Modified from the built-in function to work within an already-async context
pub async fn download_hf_model(model_name: &str) -> anyhow::Result<PretrainedFiles> {
    let api = tokio::Api::new()
        .map_err(|e| anyhow!("Unable to reach the Hugging Face Hub: {}", e))?;
    let repo = api.model(model_name.to_string());

    let weights = repo.get("model.safetensors").await.map_err(|e| {
        anyhow!(
            "Failed to download: {} weights with name: model.safetensors from HuggingFace Hub: {}",
            model_name,
            e
        )
    })?;

    let config = repo.get("config.json").await.map_err(|e| {
        anyhow!(
            "Failed to download: {} config with name: config.json from HuggingFace Hub: {}",
            model_name,
            e
        )
    })?;

    Ok(PretrainedFiles { config, weights })
}
