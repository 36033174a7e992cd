use std::{collections::BTreeSet, path::Path};

use async_trait::async_trait;
use burn::data::dataset::{self, Dataset as _, InMemDataset};
use derive_new::new;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{pipelines::token_classification, utils::files::read_file};

use super::LoadableDataset;

/// The name of the Snips dataset
pub static DATASET: &str = "snips";

/// The file listing the slot labels, one per line
pub static LABELS_FILE: &str = "slot_labels.txt";

/// Define a struct for Snips slot filling items
#[derive(Clone, Debug, Serialize, Deserialize, new)]
pub struct Item {
    /// The text to label
    pub input: String,

    /// The intent class name of the text
    pub intent: String,

    /// The slot class names of the text, one per word
    pub slots: String,
}

impl token_classification::Item for Item {
    fn input(&self) -> &str {
        &self.input
    }

    fn class_labels(&self) -> Vec<&str> {
        self.slots.split_whitespace().collect()
    }
}

/// Struct for the Snips dataset
pub struct Dataset {
    /// Underlying In-Memory dataset
    dataset: InMemDataset<Item>,

    /// The slot labels
    pub labels: Vec<String>,
}

/// Implement the Dataset trait for the Snips dataset
impl dataset::Dataset<Item> for Dataset {
    /// Returns a specific item from the dataset
    fn get(&self, index: usize) -> Option<Item> {
        self.dataset.get(index)
    }

    /// Returns the length of the dataset
    fn len(&self) -> usize {
        self.dataset.len()
    }
}

#[async_trait]
impl LoadableDataset<Item> for Dataset {
    /// Constructs the dataset for a mode (either "train" or "test")
    async fn load(data_dir: &str, mode: &str) -> std::io::Result<Self> {
        let dataset_dir = format!("{}/datasets/{}", data_dir, DATASET);
        let reader = csv::ReaderBuilder::new();

        let dataset: InMemDataset<Item> =
            InMemDataset::from_csv(format!("{}/{}.csv", dataset_dir, mode), &reader)?;

        let labels_file = format!("{}/{}", dataset_dir, LABELS_FILE);

        let labels = if Path::new(&labels_file).exists() {
            read_file(&labels_file)
                .await?
                .into_iter()
                .map(|label| label.trim().to_string())
                .filter(|label| !label.is_empty())
                .collect()
        } else {
            log::warn!(
                "{} not found, collecting labels from the {} split",
                labels_file,
                mode
            );

            collect_labels(&dataset)
        };

        Ok(Self { dataset, labels })
    }
}

impl Dataset {
    /// Returns random samples from the dataset
    pub async fn get_samples(data_dir: &str) -> std::io::Result<Vec<(String, String)>> {
        let mut rng = rand::thread_rng();

        let data = Self::load(data_dir, "test").await?;

        let mut samples = Vec::with_capacity(10);
        if data.is_empty() {
            return Ok(samples);
        }

        for _ in 0..10 {
            let i = rng.gen_range(0..data.len());

            if let Some(item) = data.get(i) {
                samples.push((item.input, item.slots));
            }
        }

        Ok(samples)
    }
}

/// The sorted, unique slot labels of a dataset
fn collect_labels(dataset: &InMemDataset<Item>) -> Vec<String> {
    dataset
        .iter()
        .flat_map(|item| {
            item.slots
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{pipelines::token_classification::Item as _, utils::files::write_file};

    const CSV: &str = "input,intent,slots\n\
                       play some jazz,PlayMusic,O O B-genre\n\
                       weather in paris,GetWeather,O O B-city\n";

    async fn data_dir(with_labels: bool) -> std::io::Result<tempfile::TempDir> {
        let dir = tempfile::tempdir()?;
        let dataset_dir = dir.path().join("datasets").join(DATASET);

        write_file(dataset_dir.join("train.csv"), &[CSV.trim_end().to_string()]).await?;

        if with_labels {
            write_file(
                dataset_dir.join(LABELS_FILE),
                &["O".to_string(), "B-city".to_string(), "B-genre".to_string()],
            )
            .await?;
        }

        Ok(dir)
    }

    #[tokio::test]
    async fn loads_items_and_derives_labels() -> std::io::Result<()> {
        let dir = data_dir(false).await?;

        let dataset = Dataset::load(dir.path().to_str().unwrap(), "train").await?;

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.labels, vec!["B-city", "B-genre", "O"]);

        let item = dataset.get(0).unwrap();
        assert_eq!(item.input(), "play some jazz");
        assert_eq!(item.class_labels(), vec!["O", "O", "B-genre"]);
        assert!(item.is_real_example());

        Ok(())
    }

    #[tokio::test]
    async fn prefers_the_labels_file() -> std::io::Result<()> {
        let dir = data_dir(true).await?;

        let dataset = Dataset::load(dir.path().to_str().unwrap(), "train").await?;

        assert_eq!(dataset.labels, vec!["O", "B-city", "B-genre"]);

        Ok(())
    }
}
