use std::marker::PhantomData;

use burn::data::dataset::Dataset;

use crate::pipelines::token_classification::Item;

/// An item of a [`Padded`] dataset
#[derive(Clone, Debug)]
pub struct PaddedItem<I> {
    /// The wrapped item
    pub item: I,

    /// False for the fake examples appended as padding
    pub real: bool,
}

impl<I: Item> Item for PaddedItem<I> {
    fn input(&self) -> &str {
        self.item.input()
    }

    fn class_labels(&self) -> Vec<&str> {
        self.item.class_labels()
    }

    fn is_real_example(&self) -> bool {
        self.real && self.item.is_real_example()
    }
}

/// Pads a dataset to a multiple of the batch size with fake examples, so every batch is full.
/// Fake examples repeat the first item and carry no weight in evaluation metrics.
pub struct Padded<D, I> {
    dataset: D,
    len: usize,
    _item: PhantomData<fn() -> I>,
}

impl<D: Dataset<I>, I> Padded<D, I> {
    /// Wrap the dataset, padding it to a multiple of `batch_size`
    pub fn new(dataset: D, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        let len = dataset.len().div_ceil(batch_size) * batch_size;

        Self {
            dataset,
            len,
            _item: PhantomData,
        }
    }

    /// The number of real examples
    pub fn num_real(&self) -> usize {
        self.dataset.len()
    }
}

impl<D: Dataset<I>, I> Dataset<PaddedItem<I>> for Padded<D, I> {
    fn get(&self, index: usize) -> Option<PaddedItem<I>> {
        if index < self.dataset.len() {
            self.dataset
                .get(index)
                .map(|item| PaddedItem { item, real: true })
        } else if index < self.len {
            self.dataset
                .get(0)
                .map(|item| PaddedItem { item, real: false })
        } else {
            None
        }
    }

    fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use burn::data::dataset::InMemDataset;
    use pretty_assertions::assert_eq;

    use super::*;

    fn dataset(n: usize) -> InMemDataset<String> {
        InMemDataset::new((0..n).map(|i| i.to_string()).collect())
    }

    #[test]
    fn pads_to_a_multiple_of_the_batch_size() {
        let padded = Padded::new(dataset(5), 4);

        assert_eq!(padded.len(), 8);
        assert_eq!(padded.num_real(), 5);

        let real: Vec<bool> = (0..8).filter_map(|i| padded.get(i)).map(|p| p.real).collect();
        assert_eq!(
            real,
            vec![true, true, true, true, true, false, false, false]
        );

        assert_eq!(padded.get(6).map(|p| p.item), Some("0".to_string()));
        assert!(padded.get(8).is_none());
    }

    #[test]
    fn leaves_full_datasets_alone() {
        assert_eq!(Padded::new(dataset(8), 4).len(), 8);
        assert_eq!(Padded::new(dataset(0), 4).len(), 0);
    }
}
